//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 5.0;

/// Camera manages the view transform for the canvas.
///
/// `world_to_screen(p) = p * zoom + offset` and
/// `screen_to_world(p) = (p - offset) / zoom`. The zoom is kept inside
/// [`MIN_ZOOM`, `MAX_ZOOM`] by every method that changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels.
    offset: Vec2,
    /// Current zoom level.
    zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with a given offset and zoom (zoom is clamped).
    pub fn with_view(offset: Vec2, zoom: f64) -> Self {
        Self {
            offset,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-space length to world units.
    pub fn screen_to_world_distance(&self, distance: f64) -> f64 {
        distance / self.zoom
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.set_zoom_at(screen_point, self.zoom * factor);
    }

    /// Set an absolute zoom, keeping the given screen point fixed.
    pub fn set_zoom_at(&mut self, screen_point: Point, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        let new_zoom = clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        // Convert screen point to world before zoom
        let world_point = self.screen_to_world(screen_point);

        self.zoom = new_zoom;

        // Adjust offset so world_point stays at screen_point
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The world-space rectangle visible in a viewport of the given size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        self.zoom = clamp_zoom(scale_x.min(scale_y));

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        let viewport_center = Point::new(viewport.width / 2.0, viewport.height / 2.0);

        self.offset = Vec2::new(
            viewport_center.x - bounds_center.x * self.zoom,
            viewport_center.y - bounds_center.y * self.zoom,
        );
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert!((camera.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_identity() {
        let camera = Camera::new();
        let screen = Point::new(100.0, 200.0);
        let world = camera.screen_to_world(screen);
        assert!((world.x - screen.x).abs() < f64::EPSILON);
        assert!((world.y - screen.y).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let camera = Camera::with_view(Vec2::new(50.0, 100.0), 1.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_zoom() {
        let camera = Camera::with_view(Vec2::ZERO, 2.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_across_zoom_range() {
        let points = [
            Point::new(123.0, 456.0),
            Point::new(-980.5, 0.25),
            Point::new(0.0, 0.0),
            Point::new(1.0e5, -3.0e4),
        ];
        let pans = [Vec2::ZERO, Vec2::new(30.0, -20.0), Vec2::new(-1234.5, 987.25)];
        let mut zoom = MIN_ZOOM;
        while zoom <= MAX_ZOOM {
            for pan in pans {
                let camera = Camera::with_view(pan, zoom);
                for original in points {
                    let back = camera.world_to_screen(camera.screen_to_world(original));
                    let tolerance = 1e-9 * (1.0 + original.x.abs().max(original.y.abs()));
                    assert!((back.x - original.x).abs() < tolerance);
                    assert!((back.y - original.y).abs() < tolerance);
                }
            }
            zoom += 0.35;
        }
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.001);
        assert!((camera.zoom() - MIN_ZOOM).abs() < f64::EPSILON);

        camera.set_zoom_at(Point::ZERO, 1.0);
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom() - MAX_ZOOM).abs() < f64::EPSILON);

        let camera = Camera::with_view(Vec2::ZERO, 50.0);
        assert!((camera.zoom() - MAX_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_preserves_anchor() {
        let mut camera = Camera::with_view(Vec2::new(40.0, -10.0), 1.3);
        let anchor = Point::new(320.0, 240.0);
        let before = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 1.7);
        let after = camera.screen_to_world(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_zoom_ignored() {
        let mut camera = Camera::new();
        camera.set_zoom_at(Point::ZERO, f64::NAN);
        assert!((camera.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.offset().x - 10.0).abs() < f64::EPSILON);
        assert!((camera.offset().y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_visible_world_rect() {
        let camera = Camera::with_view(Vec2::new(100.0, 50.0), 2.0);
        let rect = camera.visible_world_rect(Size::new(800.0, 600.0));
        assert!((rect.x0 + 50.0).abs() < f64::EPSILON);
        assert!((rect.y0 + 25.0).abs() < f64::EPSILON);
        assert!((rect.width() - 400.0).abs() < f64::EPSILON);
        assert!((rect.height() - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut camera = Camera::new();
        let viewport = Size::new(800.0, 600.0);
        camera.fit_to_bounds(Rect::new(0.0, 0.0, 200.0, 100.0), viewport, 0.0);
        let center = camera.world_to_screen(Point::new(100.0, 50.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
        assert!((camera.zoom() - 4.0).abs() < 1e-9);
    }
}
