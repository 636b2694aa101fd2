//! Inline text types.

use serde::{Deserialize, Serialize};

/// A contiguous span of text sharing one inline style combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    /// The displayed text, with emphasis markers removed
    pub text: String,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Inline code (monospace)
    pub code: bool,

    /// Hyperlink target, if this run is a link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl StyledRun {
    /// Create a plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, RunStyle::default())
    }

    /// Create a run with the given base style.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            bold: style.bold,
            italic: style.italic,
            code: false,
            link: None,
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            RunStyle {
                bold: true,
                italic: false,
            },
        )
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::styled(
            text,
            RunStyle {
                bold: false,
                italic: true,
            },
        )
    }

    /// Create an inline code run.
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            code: true,
            ..Self::plain(text)
        }
    }

    /// Create a hyperlink run.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..Self::plain(text)
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if any styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.code || self.link.is_some()
    }

    /// Check whether two runs can be drawn as one segment.
    pub fn same_style(&self, other: &StyledRun) -> bool {
        self.bold == other.bold
            && self.italic == other.italic
            && self.code == other.code
            && self.link == other.link
    }
}

/// Default emphasis inherited by unstyled text.
///
/// Heading text, for instance, is parsed with a bold base style so every run
/// inside it comes out bold without re-stating it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    /// Bold by default
    pub bold: bool,

    /// Italic by default
    pub italic: bool,
}

impl RunStyle {
    /// Plain text style.
    pub const PLAIN: RunStyle = RunStyle {
        bold: false,
        italic: false,
    };

    /// Bold text style.
    pub const BOLD: RunStyle = RunStyle {
        bold: true,
        italic: false,
    };

    /// Add bold to this style.
    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    /// Add italic to this style.
    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }
}

/// Concatenate the displayed text of a run sequence.
pub fn runs_text(runs: &[StyledRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_constructors() {
        assert!(!StyledRun::plain("a").has_styling());
        assert!(StyledRun::bold("a").bold);
        assert!(StyledRun::italic("a").italic);
        assert!(StyledRun::code("a").code);
        assert_eq!(
            StyledRun::link("a", "https://x.org").link.as_deref(),
            Some("https://x.org")
        );
    }

    #[test]
    fn test_styled_inherits_base() {
        let run = StyledRun::styled("Title", RunStyle::BOLD);
        assert!(run.bold);
        assert!(!run.italic);
    }

    #[test]
    fn test_same_style() {
        assert!(StyledRun::bold("a").same_style(&StyledRun::bold("b")));
        assert!(!StyledRun::bold("a").same_style(&StyledRun::plain("a")));
        assert!(!StyledRun::link("a", "x").same_style(&StyledRun::link("a", "y")));
    }

    #[test]
    fn test_runs_text() {
        let runs = vec![StyledRun::plain("Hello "), StyledRun::bold("world")];
        assert_eq!(runs_text(&runs), "Hello world");
    }
}
