//! Inline span parsing.
//!
//! Turns one line (or one table cell) of markdown into an ordered sequence
//! of [`StyledRun`]s. At every position the parser tries, in order: bold
//! (`**text**`), hyperlink (`[text](url)`), italic (`*text*`) and inline
//! code (`` `text` ``). Text between matches becomes a run carrying the
//! caller's base style.
//!
//! Nesting goes one level deep: the inside of a bold span is parsed again
//! for italic, link and code spans, but not for another bold span. Italic,
//! code and link text are taken literally.
//!
//! Parsing never fails. An unterminated marker (a stray `**`, an unclosed
//! `[`) is passed through as literal text.

use crate::model::{runs_text, RunStyle, StyledRun};

/// Parse inline markdown into styled runs.
///
/// # Example
///
/// ```
/// use research_export::parser::parse_inline;
/// use research_export::model::RunStyle;
///
/// let runs = parse_inline("Hello **world**", RunStyle::PLAIN);
/// assert_eq!(runs.len(), 2);
/// assert!(runs[1].bold);
/// ```
pub fn parse_inline(text: &str, base: RunStyle) -> Vec<StyledRun> {
    InlineParser::new(base).parse(text)
}

/// Remove inline emphasis markers, keeping only the displayed text.
pub fn strip_inline(text: &str) -> String {
    runs_text(&parse_inline(text, RunStyle::PLAIN))
}

/// Inline span parser.
#[derive(Debug, Clone, Copy)]
pub struct InlineParser {
    base: RunStyle,
    allow_bold: bool,
}

type SpanMatch = (Vec<StyledRun>, usize);

impl InlineParser {
    /// Create a parser whose plain text inherits `base`.
    pub fn new(base: RunStyle) -> Self {
        Self {
            base,
            allow_bold: true,
        }
    }

    /// Parse `text` into runs.
    pub fn parse(&self, text: &str) -> Vec<StyledRun> {
        let mut runs = Vec::new();
        let mut plain = String::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];

            if let Some((spans, consumed)) = self.match_span(rest) {
                self.flush_plain(&mut plain, &mut runs);
                runs.extend(spans.into_iter().filter(|r| !r.is_empty()));
                pos += consumed;
                continue;
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            plain.push(ch);
            pos += ch.len_utf8();
        }

        self.flush_plain(&mut plain, &mut runs);
        runs
    }

    fn flush_plain(&self, plain: &mut String, runs: &mut Vec<StyledRun>) {
        if !plain.is_empty() {
            runs.push(StyledRun::styled(std::mem::take(plain), self.base));
        }
    }

    fn match_span(&self, rest: &str) -> Option<SpanMatch> {
        if self.allow_bold {
            if let Some(m) = self.match_bold(rest) {
                return Some(m);
            }
        }
        self.match_link(rest)
            .or_else(|| self.match_italic(rest))
            .or_else(|| self.match_code(rest))
    }

    fn match_bold(&self, rest: &str) -> Option<SpanMatch> {
        let body = rest.strip_prefix("**")?;
        let close = body.find("**")?;
        if close == 0 {
            return None;
        }

        let inner = InlineParser {
            base: self.base.with_bold(),
            allow_bold: false,
        };
        Some((inner.parse(&body[..close]), close + 4))
    }

    fn match_link(&self, rest: &str) -> Option<SpanMatch> {
        let body = rest.strip_prefix('[')?;
        let text_end = body.find("](")?;
        let after = &body[text_end + 2..];
        let url_end = after.find(')')?;

        let url = after[..url_end].trim();
        if url.is_empty() {
            return None;
        }

        let label = &body[..text_end];
        let display = if label.is_empty() { url } else { label };
        let run = StyledRun {
            link: Some(url.to_string()),
            ..StyledRun::styled(display, self.base)
        };
        // '[' + label + "](" + url + ')'
        Some((vec![run], 1 + text_end + 2 + url_end + 1))
    }

    fn match_italic(&self, rest: &str) -> Option<SpanMatch> {
        let body = rest.strip_prefix('*')?;
        // Skip the first char so the italic text is never empty.
        let first = body.chars().next()?;
        let close = body[first.len_utf8()..].find('*')? + first.len_utf8();

        let run = StyledRun::styled(&body[..close], self.base.with_italic());
        Some((vec![run], close + 2))
    }

    fn match_code(&self, rest: &str) -> Option<SpanMatch> {
        let body = rest.strip_prefix('`')?;
        let close = body.find('`')?;
        if close == 0 {
            return None;
        }

        let run = StyledRun {
            code: true,
            ..StyledRun::styled(&body[..close], self.base)
        };
        Some((vec![run], close + 2))
    }
}
