use super::Sentence;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// Internal representation of a labelled span for display.
struct IncludedSpan {
    /// Inclusive token indexes within the sentence
    range: (usize, usize),
    label: String,
}

/// Renders a sentence with labelled spans drawn underneath its tokens.
///
/// ```text
/// der  Mann  sah  sie  .
/// ╰───────╯animate/140 new
///                 ╰─╯animate/99 new
/// ```
pub struct SentenceDisplay<'a> {
    sentence: &'a Sentence,
    include_spans: Vec<IncludedSpan>,
}

impl<'a> std::fmt::Display for SentenceDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const SPACE_PADDING: usize = 2;
        let mut token_idx_to_start_display_char_idx = Vec::new();
        let mut token_idx_to_end_display_char_idx = Vec::new();

        let mut opening_line = String::new();
        for (idx, token) in self.sentence.tokens.iter().enumerate() {
            if idx > 0 {
                opening_line.extend(std::iter::repeat(' ').take(SPACE_PADDING));
            }
            token_idx_to_start_display_char_idx.push(UnicodeWidthStr::width(&*opening_line));
            opening_line.push_str(&token.text);
            token_idx_to_end_display_char_idx.push(UnicodeWidthStr::width(&*opening_line));
        }

        f.write_str(&opening_line)?;

        for span in self.include_spans.iter() {
            f.write_char('\n')?;

            let start_char_idx = token_idx_to_start_display_char_idx[span.range.0];
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;

            let end_char_idx = token_idx_to_end_display_char_idx[span.range.1];
            let char_len = end_char_idx - start_char_idx;
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }

            if char_len > 1 {
                f.write_char('╯')?;
            }

            f.write_str(&span.label)?;
        }

        Ok(())
    }
}

impl<'a> SentenceDisplay<'a> {
    pub fn new(sentence: &'a Sentence) -> Self {
        SentenceDisplay {
            sentence,
            include_spans: Vec::new(),
        }
    }

    /// Include a span given by inclusive global token positions.
    ///
    /// Spans outside the sentence are ignored.
    pub fn include(&mut self, start: usize, end: usize, label: impl Into<String>) {
        let Some((first, last)) = self.sentence.position_range() else {
            return;
        };
        if start < first || end > last || start > end {
            return;
        }
        self.include_spans.push(IncludedSpan {
            range: (start - first, end - first),
            label: label.into(),
        });
    }

    /// Takes self
    pub fn with(mut self, start: usize, end: usize, label: impl Into<String>) -> Self {
        self.include(start, end, label);
        self
    }
}
