//! Greedy word wrapping.
//!
//! Two flavours share the same rules: words are separated by whitespace,
//! words are added to the current line while the line still fits, and a
//! single word wider than the whole line is broken between characters.
//! Both always return at least one line, so an empty string still
//! occupies one line of height.

use super::metrics::{FontVariant, TextMeasure};
use crate::model::StyledRun;

/// Wrap plain text set in one font.
pub fn wrap_text(
    text: &str,
    font: FontVariant,
    size: f32,
    max_width: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure.measure(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure.measure(word, font, size) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = break_word(word, max_width, |s| measure.measure(s, font, size));
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// A styled piece of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Text to draw
    pub text: String,
    /// Font face
    pub font: FontVariant,
    /// Link target
    pub link: Option<String>,
    /// Offset from the line's left edge (mm)
    pub x: f32,
    /// Advance width (mm)
    pub width: f32,
}

/// One wrapped line of styled text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    /// Segments left to right
    pub segments: Vec<Segment>,
    /// Total advance width (mm)
    pub width: f32,
}

impl Line {
    /// Concatenated text of the line.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Check if the line draws nothing.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.is_empty())
    }
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    run: usize,
}

#[derive(Debug, Clone, Default)]
struct Word {
    pieces: Vec<Piece>,
    space_before: bool,
}

impl Word {
    fn push_char(&mut self, ch: char, run: usize) {
        match self.pieces.last_mut() {
            Some(piece) if piece.run == run => piece.text.push(ch),
            _ => self.pieces.push(Piece {
                text: ch.to_string(),
                run,
            }),
        }
    }
}

/// Run-aware wrapper: wraps a sequence of styled runs, keeping each run's
/// font for measuring and drawing.
pub struct RunWrapper<'a> {
    runs: &'a [StyledRun],
    size: f32,
    max_width: f32,
    measure: &'a dyn TextMeasure,
}

impl<'a> RunWrapper<'a> {
    /// Create a wrapper over `runs` at `size` points.
    pub fn new(
        runs: &'a [StyledRun],
        size: f32,
        max_width: f32,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            runs,
            size,
            max_width,
            measure,
        }
    }

    /// Wrap into lines.
    pub fn wrap(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current: Vec<Piece> = Vec::new();
        let mut current_width = 0.0;

        for word in self.words() {
            let word_width = self.pieces_width(&word.pieces);
            // The space takes the preceding run's style, unless that run
            // is a link.
            let space = match (current.last(), word.pieces.first()) {
                (Some(prev), Some(next)) if word.space_before => Some(Piece {
                    text: " ".to_string(),
                    run: if self.runs[prev.run].link.is_some() {
                        next.run
                    } else {
                        prev.run
                    },
                }),
                _ => None,
            };
            let space_width = space
                .as_ref()
                .map(|s| self.piece_width(s))
                .unwrap_or(0.0);

            if current_width + space_width + word_width <= self.max_width {
                current.extend(space);
                current.extend(word.pieces);
                current_width += space_width + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(self.build_line(std::mem::take(&mut current)));
            }

            if word_width <= self.max_width {
                current_width = word_width;
                current = word.pieces;
            } else {
                let mut broken = self.break_pieces(word.pieces);
                current = broken.pop().unwrap_or_default();
                current_width = self.pieces_width(&current);
                lines.extend(broken.into_iter().map(|p| self.build_line(p)));
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(self.build_line(current));
        }
        lines
    }

    fn words(&self) -> Vec<Word> {
        let mut words = Vec::new();
        let mut word = Word::default();
        let mut pending_space = false;

        for (idx, run) in self.runs.iter().enumerate() {
            for ch in run.text.chars() {
                if ch.is_whitespace() {
                    if !word.pieces.is_empty() {
                        words.push(std::mem::take(&mut word));
                    }
                    pending_space = true;
                    continue;
                }
                if word.pieces.is_empty() {
                    word.space_before = pending_space && !words.is_empty();
                    pending_space = false;
                }
                word.push_char(ch, idx);
            }
        }

        if !word.pieces.is_empty() {
            words.push(word);
        }
        words
    }

    fn font(&self, run: usize) -> FontVariant {
        let r = &self.runs[run];
        FontVariant::for_style(r.bold, r.italic, r.code)
    }

    fn piece_width(&self, piece: &Piece) -> f32 {
        self.measure
            .measure(&piece.text, self.font(piece.run), self.size)
    }

    fn pieces_width(&self, pieces: &[Piece]) -> f32 {
        pieces.iter().map(|p| self.piece_width(p)).sum()
    }

    /// Break an overlong word into chunks that each fit the line.
    fn break_pieces(&self, pieces: Vec<Piece>) -> Vec<Vec<Piece>> {
        let mut chunks = Vec::new();
        let mut chunk: Vec<Piece> = Vec::new();
        let mut width = 0.0;

        for piece in pieces {
            let font = self.font(piece.run);
            for ch in piece.text.chars() {
                let mut buf = [0u8; 4];
                let w = self
                    .measure
                    .measure(ch.encode_utf8(&mut buf), font, self.size);
                if width + w > self.max_width && !chunk.is_empty() {
                    chunks.push(std::mem::take(&mut chunk));
                    width = 0.0;
                }
                match chunk.last_mut() {
                    Some(last) if last.run == piece.run => last.text.push(ch),
                    _ => chunk.push(Piece {
                        text: ch.to_string(),
                        run: piece.run,
                    }),
                }
                width += w;
            }
        }

        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }

    fn build_line(&self, pieces: Vec<Piece>) -> Line {
        let mut merged: Vec<Piece> = Vec::new();
        for piece in pieces {
            match merged.last_mut() {
                Some(last) if self.runs[last.run].same_style(&self.runs[piece.run]) => {
                    last.text.push_str(&piece.text)
                }
                _ => merged.push(piece),
            }
        }

        let mut x = 0.0;
        let segments = merged
            .into_iter()
            .map(|piece| {
                let width = self.piece_width(&piece);
                let segment = Segment {
                    font: self.font(piece.run),
                    link: self.runs[piece.run].link.clone(),
                    text: piece.text,
                    x,
                    width,
                };
                x += width;
                segment
            })
            .collect();

        Line { segments, width: x }
    }
}

fn break_word(word: &str, max_width: f32, width_of: impl Fn(&str) -> f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        current.push(ch);
        if width_of(&current) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::FixedWidthMetrics;
    use crate::model::RunStyle;
    use crate::parser::parse_inline;

    // 10pt at half an em: 1.7639 mm per char, so 10 chars ~ 17.64 mm.
    const SIZE: f32 = 10.0;

    fn chars(n: usize) -> f32 {
        FixedWidthMetrics::default().char_width(SIZE) * n as f32 + 0.001
    }

    #[test]
    fn test_wrap_text_fits() {
        let m = FixedWidthMetrics::default();
        let lines = wrap_text("hello world", FontVariant::Regular, SIZE, chars(11), &m);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_wrap_text_breaks_on_spaces() {
        let m = FixedWidthMetrics::default();
        let lines = wrap_text("aaa bbb ccc", FontVariant::Regular, SIZE, chars(7), &m);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_wrap_text_breaks_long_word() {
        let m = FixedWidthMetrics::default();
        let lines = wrap_text("abcdefghij", FontVariant::Regular, SIZE, chars(4), &m);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_empty_is_one_line() {
        let m = FixedWidthMetrics::default();
        let lines = wrap_text("", FontVariant::Regular, SIZE, chars(4), &m);
        assert_eq!(lines, vec![""]);
    }

    #[test]
    fn test_run_wrap_keeps_styles() {
        let m = FixedWidthMetrics::default();
        let runs = parse_inline("Hello **world** and more", RunStyle::PLAIN);
        let lines = RunWrapper::new(&runs, SIZE, chars(11), &m).wrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Hello world");
        assert_eq!(lines[0].segments.len(), 2);
        assert_eq!(lines[0].segments[0].text, "Hello ");
        assert_eq!(lines[0].segments[1].font, FontVariant::Bold);
        assert_eq!(lines[1].text(), "and more");
    }

    #[test]
    fn test_run_wrap_offsets_accumulate() {
        let m = FixedWidthMetrics::default();
        let runs = parse_inline("ab **cd**", RunStyle::PLAIN);
        let lines = RunWrapper::new(&runs, SIZE, chars(50), &m).wrap();

        let segs = &lines[0].segments;
        assert_eq!(segs[0].text, "ab ");
        assert_eq!(segs[0].x, 0.0);
        assert!((segs[1].x - segs[0].width).abs() < 1e-5);
        assert!((lines[0].width - (segs[0].width + segs[1].width)).abs() < 1e-5);
    }

    #[test]
    fn test_run_wrap_punctuation_joins_word() {
        let m = FixedWidthMetrics::default();
        let runs = parse_inline("**bold**, next", RunStyle::PLAIN);
        let lines = RunWrapper::new(&runs, SIZE, chars(5), &m).wrap();
        assert_eq!(lines[0].text(), "bold,");
        assert_eq!(lines[1].text(), "next");
    }

    #[test]
    fn test_run_wrap_link_segment() {
        let m = FixedWidthMetrics::default();
        let runs = parse_inline("go [here](https://a.test)", RunStyle::PLAIN);
        let lines = RunWrapper::new(&runs, SIZE, chars(50), &m).wrap();
        let link = &lines[0].segments[1];
        assert_eq!(link.text, "here");
        assert_eq!(link.link.as_deref(), Some("https://a.test"));
    }

    #[test]
    fn test_run_wrap_lines_fit() {
        let m = FixedWidthMetrics::default();
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        let runs = parse_inline(text, RunStyle::PLAIN);
        let max = chars(14);
        let lines = RunWrapper::new(&runs, SIZE, max, &m).wrap();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= max));
    }

    #[test]
    fn test_run_wrap_empty() {
        let m = FixedWidthMetrics::default();
        let lines = RunWrapper::new(&[], SIZE, chars(5), &m).wrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }
}
