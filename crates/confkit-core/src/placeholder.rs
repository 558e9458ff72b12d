//! Placeholder scanning
//!
//! Splits a string leaf into literal text and placeholders of the form
//! `${path}` or `${path:default}`:
//! - `${PORT}` - look up `PORT` in the tree
//! - `${PORT:8080}` - fall back to `8080` when `PORT` is absent
//! - `${test.value}` - dotted lookup into a nested mapping
//! - `$PORT` - not a placeholder, kept verbatim
//!
//! Scanning is best-effort and never fails: a placeholder runs from `${` to
//! the first `}` after it, so `${foo${bar}}` is the placeholder `foo${bar`
//! followed by a literal `}`. A placeholder cannot span a line break, and an
//! unterminated `${` is kept as literal text.

use crate::literal;
use crate::value::Value;

const OPEN: &str = "${";
const CLOSE: char = '}';
const DEFAULT_SEPARATOR: char = ':';

/// A single `${...}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The full source text, including `${` and `}`
    pub raw: &'a str,
    /// Dotted lookup path
    pub path: &'a str,
    /// Fallback text used when the path is absent
    pub default: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn new(raw: &'a str, expr: &'a str) -> Self {
        let expr = expr.trim();
        let (path, default) = match expr.split_once(DEFAULT_SEPARATOR) {
            Some((path, default)) => (path.trim(), Some(default)),
            None => (expr, None),
        };
        Self { raw, path, default }
    }
}

/// A piece of a scanned string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied through unchanged
    Literal(&'a str),
    /// A placeholder to substitute
    Placeholder(Placeholder<'a>),
}

/// Left-to-right scanner over a string leaf
pub struct PlaceholderScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PlaceholderScanner<'a> {
    /// Create a new scanner for the given input
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn take_rest(&mut self) -> Segment<'a> {
        let rest = &self.input[self.pos..];
        self.pos = self.input.len();
        Segment::Literal(rest)
    }
}

impl<'a> Iterator for PlaceholderScanner<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }

        let rest = &self.input[self.pos..];
        let mut search_from = 0;

        loop {
            let Some(found) = rest[search_from..].find(OPEN) else {
                return Some(self.take_rest());
            };
            let start = search_from + found;
            let body = &rest[start + OPEN.len()..];

            match body.find([CLOSE, '\n']) {
                Some(end) if body[end..].starts_with(CLOSE) => {
                    if start > 0 {
                        // Flush the literal prefix first
                        self.pos += start;
                        return Some(Segment::Literal(&rest[..start]));
                    }
                    let len = OPEN.len() + end + 1;
                    self.pos += len;
                    return Some(Segment::Placeholder(Placeholder::new(
                        &rest[..len],
                        &body[..end],
                    )));
                }
                // Line break before the closing brace: this `${` is literal
                Some(_) => search_from = start + 1,
                None => return Some(self.take_rest()),
            }
        }
    }
}

/// A string leaf split into literal and placeholder segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Scan a string into a template
    pub fn parse(input: &'a str) -> Self {
        Self {
            segments: PlaceholderScanner::new(input).collect(),
        }
    }

    /// The scanned segments, in source order
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Check if the template contains at least one placeholder
    pub fn has_placeholders(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// The placeholder that makes up the entire string, if any
    pub fn whole(&self) -> Option<&Placeholder<'a>> {
        match self.segments.as_slice() {
            [Segment::Placeholder(p)] => Some(p),
            _ => None,
        }
    }

    /// Substitute every placeholder using `lookup`
    ///
    /// A whole-leaf placeholder takes the parsed type of its substitution
    /// (`"${PORT}"` with `PORT = "8080"` becomes the integer 8080). With any
    /// surrounding text the result is always the spliced string.
    pub fn render<F>(&self, mut lookup: F) -> Value
    where
        F: FnMut(&Placeholder<'a>) -> String,
    {
        if let Some(placeholder) = self.whole() {
            return literal::parse_literal(&lookup(placeholder));
        }

        let mut result = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Placeholder(placeholder) => result.push_str(&lookup(placeholder)),
            }
        }
        Value::String(result)
    }
}

/// Check if a string contains any placeholder
pub fn contains_placeholder(input: &str) -> bool {
    PlaceholderScanner::new(input).any(|s| matches!(s, Segment::Placeholder(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn placeholder<'a>(raw: &'a str, path: &'a str, default: Option<&'a str>) -> Segment<'a> {
        Segment::Placeholder(Placeholder { raw, path, default })
    }

    #[test]
    fn test_scan_literal() {
        let template = Template::parse("hello world");
        assert_eq!(template.segments(), &[Segment::Literal("hello world")]);
        assert!(!template.has_placeholders());
    }

    #[test]
    fn test_scan_empty() {
        assert!(Template::parse("").segments().is_empty());
    }

    #[test]
    fn test_scan_simple() {
        let template = Template::parse("${PORT}");
        assert_eq!(template.segments(), &[placeholder("${PORT}", "PORT", None)]);
        assert!(template.whole().is_some());
    }

    #[test]
    fn test_scan_with_default() {
        let template = Template::parse("${URL:http://example.com}");
        assert_eq!(
            template.segments(),
            &[placeholder(
                "${URL:http://example.com}",
                "URL",
                Some("http://example.com")
            )]
        );
    }

    #[test]
    fn test_scan_empty_default() {
        let template = Template::parse("${NAME:}");
        assert_eq!(template.segments(), &[placeholder("${NAME:}", "NAME", Some(""))]);
    }

    #[test]
    fn test_scan_trims_whitespace() {
        let template = Template::parse("${ PORT : 80}");
        assert_eq!(
            template.segments(),
            &[placeholder("${ PORT : 80}", "PORT", Some(" 80"))]
        );
    }

    #[test]
    fn test_scan_dotted_path() {
        let template = Template::parse("${test.value}");
        assert_eq!(
            template.segments(),
            &[placeholder("${test.value}", "test.value", None)]
        );
    }

    #[test]
    fn test_scan_concatenation() {
        let template = Template::parse("abc${PORT}foo${COUNT}bar");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("abc"),
                placeholder("${PORT}", "PORT", None),
                Segment::Literal("foo"),
                placeholder("${COUNT}", "COUNT", None),
                Segment::Literal("bar"),
            ]
        );
        assert!(template.whole().is_none());
    }

    #[test]
    fn test_scan_adjacent_placeholders() {
        let template = Template::parse("${A}${B}");
        assert_eq!(
            template.segments(),
            &[placeholder("${A}", "A", None), placeholder("${B}", "B", None)]
        );
        assert!(template.whole().is_none());
    }

    #[test]
    fn test_scan_bare_dollar_is_literal() {
        let template = Template::parse("$PORT");
        assert_eq!(template.segments(), &[Segment::Literal("$PORT")]);
        assert!(!contains_placeholder("cost: $5 {approx}"));
    }

    #[test]
    fn test_scan_nested_stops_at_first_close() {
        let template = Template::parse("${foo${bar}}");
        assert_eq!(
            template.segments(),
            &[placeholder("${foo${bar}", "foo${bar", None), Segment::Literal("}")]
        );
    }

    #[test]
    fn test_scan_unterminated_is_literal() {
        let template = Template::parse("prefix ${PORT");
        assert_eq!(template.segments(), &[Segment::Literal("prefix ${PORT")]);

        let template = Template::parse("${A} and ${B");
        assert_eq!(
            template.segments(),
            &[placeholder("${A}", "A", None), Segment::Literal(" and ${B")]
        );
    }

    #[test]
    fn test_scan_line_break_inside_braces() {
        let template = Template::parse("${A\n} ${B}");
        assert_eq!(
            template.segments(),
            &[Segment::Literal("${A\n} "), placeholder("${B}", "B", None)]
        );
    }

    #[test]
    fn test_scan_multibyte_text() {
        let template = Template::parse("héllo ${NAME:wörld}!");
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("héllo "),
                placeholder("${NAME:wörld}", "NAME", Some("wörld")),
                Segment::Literal("!"),
            ]
        );
    }

    #[test]
    fn test_render_whole_leaf_promotes() {
        let template = Template::parse("${PORT}");
        assert_eq!(template.render(|_| "8080".into()), Value::Integer(8080));
    }

    #[test]
    fn test_render_concatenation_stays_string() {
        let template = Template::parse("port=${PORT}");
        assert_eq!(
            template.render(|_| "8080".into()),
            Value::String("port=8080".into())
        );
    }

    #[test]
    fn test_render_nested_degrades() {
        let template = Template::parse("${foo${bar}}");
        assert_eq!(
            template.render(|_| String::new()),
            Value::String("}".into())
        );
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("${PORT}"));
        assert!(contains_placeholder("prefix ${PORT} suffix"));
        assert!(!contains_placeholder("no placeholder"));
        assert!(!contains_placeholder("just $dollar"));
        assert!(!contains_placeholder("${unterminated"));
    }
}
