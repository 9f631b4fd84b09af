//! Rich text payload, spans and layout measurement.

use super::SerializableColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    SansSerif,
    Serif,
    Monospace,
    Handwritten,
}

impl FontFamily {
    /// Get the font family name as used by the renderer.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::SansSerif => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Monospace => "monospace",
            FontFamily::Handwritten => "cursive",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    fn width_factor(&self) -> f64 {
        match self {
            FontFamily::SansSerif => 0.55,
            FontFamily::Serif => 0.52,
            FontFamily::Monospace => 0.6,
            FontFamily::Handwritten => 0.58,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Formatting flags of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpanStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
}

impl SpanStyle {
    pub const PLAIN: SpanStyle = SpanStyle {
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
    };
}

/// A contiguous run of text sharing one flag combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(flatten)]
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self::styled(text, SpanStyle::PLAIN)
    }

    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.style.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.style.underline = true;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.style.strikethrough = true;
        self
    }

    /// Whitespace-only or empty.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Text element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub spans: Vec<Span>,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default = "SerializableColor::black")]
    pub color: SerializableColor,
}

fn default_font_size() -> f64 {
    TextData::DEFAULT_FONT_SIZE
}

impl TextData {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    pub fn new(spans: Vec<Span>) -> Self {
        Self {
            spans,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            color: SerializableColor::black(),
        }
    }

    /// Concatenated text of every span.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// True when every span is blank (including no spans at all).
    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(Span::is_blank)
    }
}

/// Partial text update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPatch {
    pub spans: Option<Vec<Span>>,
    pub font_size: Option<f64>,
    pub font_family: Option<FontFamily>,
    pub color: Option<SerializableColor>,
}

impl TextPatch {
    pub fn spans(spans: Vec<Span>) -> Self {
        Self {
            spans: Some(spans),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, text: &mut TextData) {
        if let Some(spans) = self.spans {
            text.spans = spans;
        }
        if let Some(size) = self.font_size {
            text.font_size = size.max(1.0);
        }
        if let Some(family) = self.font_family {
            text.font_family = family;
        }
        if let Some(color) = self.color {
            text.color = color;
        }
    }
}

/// Computes the laid-out box of a text payload.
///
/// The store owns one measurer and is the only caller, so a text element's
/// size always comes from the same layout the renderer is expected to use.
pub trait TextMeasurer: std::fmt::Debug + Send + Sync {
    fn measure(&self, text: &TextData) -> Size;
}

/// Character-count based layout used when no real shaper is plugged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasurer;

impl ApproximateMeasurer {
    const LINE_HEIGHT: f64 = 1.2;
    const BOLD_WIDEN: f64 = 1.08;
}

impl TextMeasurer for ApproximateMeasurer {
    fn measure(&self, text: &TextData) -> Size {
        let advance = text.font_size * text.font_family.width_factor();
        let mut lines = 1usize;
        let mut line_width = 0.0f64;
        let mut widest = 0.0f64;
        for span in &text.spans {
            let char_width = if span.style.bold {
                advance * Self::BOLD_WIDEN
            } else {
                advance
            };
            for ch in span.text.chars() {
                if ch == '\n' {
                    widest = widest.max(line_width);
                    line_width = 0.0;
                    lines += 1;
                } else {
                    line_width += char_width;
                }
            }
        }
        widest = widest.max(line_width);
        Size::new(
            widest.max(text.font_size),
            lines as f64 * text.font_size * Self::LINE_HEIGHT,
        )
    }
}
