//! Conversion between span sequences and the editable markup surface.
//!
//! The span list is canonical. The markup tree is what an editing surface
//! manipulates: nested bold/italic/underline/strikethrough containers around
//! text runs and line breaks. [`encode`] and [`decode`] are inverse up to
//! [`normalize`]: `decode(&encode(spans)) == normalize(spans)`.

use crate::elements::{Span, SpanStyle};
use thiserror::Error;

/// A formatting mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl Mark {
    /// Nesting order used by `encode`, outermost first.
    pub const ORDER: [Mark; 4] = [Mark::Bold, Mark::Italic, Mark::Underline, Mark::Strikethrough];

    pub fn is_set(&self, style: SpanStyle) -> bool {
        match self {
            Mark::Bold => style.bold,
            Mark::Italic => style.italic,
            Mark::Underline => style.underline,
            Mark::Strikethrough => style.strikethrough,
        }
    }

    pub fn set(&self, style: &mut SpanStyle, on: bool) {
        match self {
            Mark::Bold => style.bold = on,
            Mark::Italic => style.italic = on,
            Mark::Underline => style.underline = on,
            Mark::Strikethrough => style.strikethrough = on,
        }
    }

    /// HTML tag written by [`Markup::to_html`].
    pub fn tag(&self) -> &'static str {
        match self {
            Mark::Bold => "b",
            Mark::Italic => "i",
            Mark::Underline => "u",
            Mark::Strikethrough => "s",
        }
    }

    fn from_tag(tag: &str) -> Option<Mark> {
        match tag {
            "b" | "strong" => Some(Mark::Bold),
            "i" | "em" => Some(Mark::Italic),
            "u" => Some(Mark::Underline),
            "s" | "strike" | "del" => Some(Mark::Strikethrough),
            _ => None,
        }
    }
}

/// A node of the editable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Text(String),
    Styled { mark: Mark, children: Vec<MarkupNode> },
    LineBreak,
}

/// The editable surface content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    pub nodes: Vec<MarkupNode>,
}

/// Errors from parsing surface HTML.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("closing tag </{0}> without a matching opening tag")]
    UnexpectedClose(String),
    #[error("expected </{expected}>, found </{found}>")]
    Mismatched { expected: String, found: String },
    #[error("unclosed tag <{0}>")]
    Unclosed(String),
    #[error("unterminated tag")]
    UnterminatedTag,
    #[error("unknown entity &{0};")]
    UnknownEntity(String),
}

/// Build the markup tree for a span sequence.
pub fn encode(spans: &[Span]) -> Markup {
    let mut nodes = Vec::new();
    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        let mut content = Vec::new();
        for (i, line) in span.text.split('\n').enumerate() {
            if i > 0 {
                content.push(MarkupNode::LineBreak);
            }
            if !line.is_empty() {
                content.push(MarkupNode::Text(line.to_string()));
            }
        }
        for mark in Mark::ORDER.iter().rev() {
            if mark.is_set(span.style) {
                content = vec![MarkupNode::Styled {
                    mark: *mark,
                    children: content,
                }];
            }
        }
        nodes.extend(content);
    }
    Markup { nodes }
}

/// Flatten a markup tree back into spans.
///
/// Each text node inherits the union of its ancestors' marks. Adjacent runs
/// with identical flags are merged and empty runs are dropped.
pub fn decode(markup: &Markup) -> Vec<Span> {
    let mut runs = Vec::new();
    collect_runs(&markup.nodes, SpanStyle::PLAIN, &mut runs);
    normalize(runs)
}

fn collect_runs(nodes: &[MarkupNode], inherited: SpanStyle, runs: &mut Vec<Span>) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => runs.push(Span::styled(text.clone(), inherited)),
            MarkupNode::LineBreak => runs.push(Span::styled("\n", inherited)),
            MarkupNode::Styled { mark, children } => {
                let mut style = inherited;
                mark.set(&mut style, true);
                collect_runs(children, style, runs);
            }
        }
    }
}

/// Merge adjacent spans with equal flags and drop empty ones.
pub fn normalize(spans: impl IntoIterator<Item = Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.style == span.style => last.text.push_str(&span.text),
            _ => merged.push(span),
        }
    }
    merged
}

/// Turn `mark` on for every span, or off if every non-empty span already has it.
pub fn toggle_mark(spans: &[Span], mark: Mark) -> Vec<Span> {
    let all_set = spans
        .iter()
        .filter(|s| !s.text.is_empty())
        .all(|s| mark.is_set(s.style));
    normalize(spans.iter().cloned().map(|mut span| {
        mark.set(&mut span.style, !all_set);
        span
    }))
}

impl Markup {
    pub fn new(nodes: Vec<MarkupNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Text content with line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        decode(self).into_iter().map(|s| s.text).collect()
    }

    /// Serialize to the HTML subset understood by [`Markup::parse_html`].
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(&self.nodes, &mut out);
        out
    }

    /// Parse surface HTML.
    ///
    /// Understands `b/strong`, `i/em`, `u`, `s/strike/del`, `br`, block tags
    /// `div`/`p` (a line break between blocks) and treats any other tag as a
    /// transparent container. Attributes and comments are ignored.
    pub fn parse_html(html: &str) -> Result<Markup, MarkupError> {
        HtmlParser::default().parse(html)
    }
}

fn write_html(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => escape_into(text, out),
            MarkupNode::LineBreak => out.push_str("<br>"),
            MarkupNode::Styled { mark, children } => {
                out.push('<');
                out.push_str(mark.tag());
                out.push('>');
                write_html(children, out);
                out.push_str("</");
                out.push_str(mark.tag());
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[derive(Debug)]
enum FrameKind {
    Mark(Mark),
    Container,
}

#[derive(Debug)]
struct Frame {
    tag: String,
    kind: FrameKind,
    children: Vec<MarkupNode>,
}

#[derive(Debug, Default)]
struct HtmlParser {
    stack: Vec<Frame>,
    root: Vec<MarkupNode>,
    /// Something has been emitted since the last line break.
    open_line: bool,
    emitted_any: bool,
}

impl HtmlParser {
    fn parse(mut self, html: &str) -> Result<Markup, MarkupError> {
        let mut rest = html;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("<!--") {
                rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            } else if let Some(after) = rest.strip_prefix('<') {
                let end = after.find('>').ok_or(MarkupError::UnterminatedTag)?;
                self.tag(&after[..end])?;
                rest = &after[end + 1..];
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let text = decode_entities(&rest[..end])?;
                self.text(text);
                rest = &rest[end..];
            }
        }
        if let Some(frame) = self.stack.pop() {
            return Err(MarkupError::Unclosed(frame.tag));
        }
        Ok(Markup { nodes: self.root })
    }

    fn tag(&mut self, raw: &str) -> Result<(), MarkupError> {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix('/') {
            return self.close(&tag_name(name));
        }
        let self_closing = raw.ends_with('/');
        let name = tag_name(raw.trim_end_matches('/'));
        match name.as_str() {
            "" => Ok(()),
            "br" => {
                self.emit(MarkupNode::LineBreak);
                self.open_line = false;
                Ok(())
            }
            _ if self_closing => Ok(()),
            "div" | "p" => {
                if self.open_line {
                    self.emit(MarkupNode::LineBreak);
                    self.open_line = false;
                }
                self.open(name, FrameKind::Container);
                Ok(())
            }
            _ => {
                let kind = Mark::from_tag(&name).map_or(FrameKind::Container, FrameKind::Mark);
                self.open(name, kind);
                Ok(())
            }
        }
    }

    fn open(&mut self, tag: String, kind: FrameKind) {
        self.stack.push(Frame {
            tag,
            kind,
            children: Vec::new(),
        });
    }

    fn close(&mut self, name: &str) -> Result<(), MarkupError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| MarkupError::UnexpectedClose(name.to_string()))?;
        if frame.tag != name {
            return Err(MarkupError::Mismatched {
                expected: frame.tag,
                found: name.to_string(),
            });
        }
        let is_block = matches!(name, "div" | "p");
        match frame.kind {
            FrameKind::Mark(mark) => {
                if !frame.children.is_empty() {
                    self.children_mut().push(MarkupNode::Styled {
                        mark,
                        children: frame.children,
                    });
                }
            }
            FrameKind::Container => self.children_mut().extend(frame.children),
        }
        if is_block && self.emitted_any {
            self.open_line = true;
        }
        Ok(())
    }

    fn text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.emit(MarkupNode::Text(text));
        self.open_line = true;
    }

    fn emit(&mut self, node: MarkupNode) {
        self.emitted_any = true;
        self.children_mut().push(node);
    }

    fn children_mut(&mut self) -> &mut Vec<MarkupNode> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }
}

fn tag_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn decode_entities(raw: &str) -> Result<String, MarkupError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find(';').filter(|&end| end <= 10) else {
            out.push('&');
            rest = after;
            continue;
        };
        let name = &after[..end];
        let decoded = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => ' ',
            numeric if numeric.starts_with('#') => numeric_entity(numeric)
                .ok_or_else(|| MarkupError::UnknownEntity(numeric.to_string()))?,
            // Unrecognised names are plain text.
            _ => {
                out.push('&');
                rest = after;
                continue;
            }
        };
        out.push(decoded);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn numeric_entity(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_flag_spans() -> Vec<Span> {
        (0..16u8)
            .map(|bits| {
                Span::styled(
                    format!("s{bits}"),
                    SpanStyle {
                        bold: bits & 1 != 0,
                        italic: bits & 2 != 0,
                        underline: bits & 4 != 0,
                        strikethrough: bits & 8 != 0,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_encode_nests_in_fixed_order() {
        let markup = encode(&[Span::new("x").strikethrough().bold()]);
        assert_eq!(
            markup.nodes,
            vec![MarkupNode::Styled {
                mark: Mark::Bold,
                children: vec![MarkupNode::Styled {
                    mark: Mark::Strikethrough,
                    children: vec![MarkupNode::Text("x".into())],
                }],
            }]
        );
    }

    #[test]
    fn test_roundtrip_all_flag_combinations() {
        let spans = all_flag_spans();
        assert_eq!(decode(&encode(&spans)), normalize(spans.clone()));
        assert_eq!(decode(&encode(&spans)), spans);
    }

    #[test]
    fn test_roundtrip_merges_and_drops_empty() {
        let spans = vec![
            Span::new(""),
            Span::new("a").bold(),
            Span::new("b").bold(),
            Span::new(""),
            Span::new("c\nd"),
            Span::new("\n").italic(),
            Span::new("e"),
        ];
        let expected = vec![
            Span::new("ab").bold(),
            Span::new("c\nd"),
            Span::new("\n").italic(),
            Span::new("e"),
        ];
        assert_eq!(normalize(spans.clone()), expected);
        assert_eq!(decode(&encode(&spans)), expected);
    }

    #[test]
    fn test_roundtrip_empty() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&encode(&[])).is_empty());
        assert!(decode(&encode(&[Span::new("")])).is_empty());
    }

    #[test]
    fn test_decode_inherits_union_of_ancestors() {
        let markup = Markup::new(vec![MarkupNode::Styled {
            mark: Mark::Italic,
            children: vec![
                MarkupNode::Text("a".into()),
                MarkupNode::Styled {
                    mark: Mark::Underline,
                    children: vec![MarkupNode::Text("b".into())],
                },
                MarkupNode::Styled {
                    mark: Mark::Italic,
                    children: vec![MarkupNode::Text("c".into())],
                },
            ],
        }]);
        assert_eq!(
            decode(&markup),
            vec![Span::new("a").italic(), Span::new("b").italic().underline(), Span::new("c").italic()]
        );
    }

    #[test]
    fn test_html_roundtrip() {
        let spans = vec![
            Span::new("1 < 2 & \"q\" "),
            Span::new("bold\nline").bold().italic(),
            Span::new("x").strikethrough(),
        ];
        let html = encode(&spans).to_html();
        assert_eq!(
            html,
            "1 &lt; 2 &amp; &quot;q&quot; <b><i>bold<br>line</i></b><s>x</s>"
        );
        let parsed = Markup::parse_html(&html).unwrap();
        assert_eq!(decode(&parsed), spans);
    }

    #[test]
    fn test_parse_browser_html() {
        let html = r#"<div>Hello <strong>big</strong></div><div><em class="x">world</em>&nbsp;&#33;</div><p><span>end</span></p>"#;
        let spans = decode(&Markup::parse_html(html).unwrap());
        assert_eq!(
            spans,
            vec![
                Span::new("Hello "),
                Span::new("big").bold(),
                Span::new("\n"),
                Span::new("world").italic(),
                Span::new(" !\nend"),
            ]
        );
    }

    #[test]
    fn test_parse_self_closing_and_comments() {
        let markup = Markup::parse_html("a<br/>b<!-- note --><br />c<img src=x />").unwrap();
        assert_eq!(markup.plain_text(), "a\nb\nc");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Markup::parse_html("<b>x</i>"),
            Err(MarkupError::Mismatched {
                expected: "b".into(),
                found: "i".into()
            })
        );
        assert_eq!(
            Markup::parse_html("<u>x"),
            Err(MarkupError::Unclosed("u".into()))
        );
        assert_eq!(
            Markup::parse_html("x</b>"),
            Err(MarkupError::UnexpectedClose("b".into()))
        );
        assert_eq!(Markup::parse_html("<b"), Err(MarkupError::UnterminatedTag));
        assert_eq!(
            Markup::parse_html("&#xZZ;"),
            Err(MarkupError::UnknownEntity("#xZZ".into()))
        );
    }

    #[test]
    fn test_bare_ampersand_kept() {
        assert_eq!(Markup::parse_html("a & b").unwrap().plain_text(), "a & b");
    }

    #[test]
    fn test_unknown_entity_name_kept_as_text() {
        assert_eq!(
            Markup::parse_html("Tom &Jerry; ok").unwrap().plain_text(),
            "Tom &Jerry; ok"
        );
        assert_eq!(
            Markup::parse_html("&bogus; &amp; &#65;").unwrap().plain_text(),
            "&bogus; & A"
        );
    }

    #[test]
    fn test_toggle_mark() {
        let spans = vec![Span::new("a").bold(), Span::new("b")];
        let on = toggle_mark(&spans, Mark::Bold);
        assert_eq!(on, vec![Span::new("ab").bold()]);
        let off = toggle_mark(&on, Mark::Bold);
        assert_eq!(off, vec![Span::new("ab")]);
    }
}
