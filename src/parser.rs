//! Schema-aware parsing of WebAnno TSV token rows into sentences.
//!
//! Every field is read through the [`ColumnMap`](crate::ColumnMap) of the
//! detected schema, so the same code handles files from 12 to 37 physical
//! columns.

use crate::schema::{split_row, Field, SchemaDescription, FIXED_COLUMNS};
use crate::{Diagnostic, DiagnosticKind, Diagnostics, LayerAnnotation, Sentence, Token};

/// Streams a file into sentence-grouped tokens according to a schema.
pub struct SchemaAwareParser<'s> {
    schema: &'s SchemaDescription,
}

impl<'s> SchemaAwareParser<'s> {
    pub fn new(schema: &'s SchemaDescription) -> Self {
        Self { schema }
    }

    /// Parse `content` into sentences.
    ///
    /// Malformed rows are skipped with a diagnostic; the result may be empty.
    pub fn parse(&self, content: &str, diagnostics: &mut Diagnostics) -> Vec<Sentence> {
        for field in self.schema.columns.missing_fields() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::MissingOptionalColumn,
                format!("schema has no column for {}", field.name()),
            ));
        }

        let mut state = ParseState::default();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_number = idx + 1;
            let line = raw_line.trim_end_matches('\r');

            if let Some(text) = line.strip_prefix("#Text=") {
                state.open_sentence(text);
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if line.trim().is_empty() {
                state.close_sentence();
                continue;
            }

            let row = split_row(line);
            if let Err(message) = self.check_row(&row) {
                diagnostics.push(
                    Diagnostic::warning(DiagnosticKind::MalformedRow, message).at_line(line_number),
                );
                continue;
            }

            if state.current.is_none() {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::ImplicitSentence,
                        "token row before any #Text= marker",
                    )
                    .at_line(line_number),
                );
                state.open_sentence("");
            }

            let token = self.read_token(&row, line_number, &mut state);
            if let Some(sentence) = state.current.as_mut() {
                sentence.tokens.push(token);
            }
        }

        state.close_sentence();
        state.sentences
    }

    fn check_row(&self, row: &[&str]) -> Result<(), String> {
        if row.len() < FIXED_COLUMNS {
            return Err(format!(
                "expected at least {} columns, found {}",
                FIXED_COLUMNS,
                row.len()
            ));
        }
        if self.schema.is_strict() && row.len() != self.schema.column_count {
            return Err(format!(
                "expected {} columns, found {}",
                self.schema.column_count,
                row.len()
            ));
        }
        Ok(())
    }

    fn read_token(&self, row: &[&str], line_number: usize, state: &mut ParseState) -> Token {
        let columns = &self.schema.columns;
        let owned = |field: Field| columns.read(field, row).map(str::to_string);

        let sentence = state
            .current
            .as_ref()
            .map(|s| (s.id, s.tokens.len()))
            .unwrap_or((state.sentences.len() + 1, 0));

        let index_in_sentence = columns
            .read(Field::TokenId, row)
            .and_then(parse_token_index)
            .unwrap_or(sentence.1 + 1);

        // Token text is read raw: a literal "_" is a real token
        let text = columns
            .column(Field::TokenText)
            .and_then(|c| row.get(c))
            .map(|t| t.to_string())
            .unwrap_or_default();

        let position = state.next_position;
        state.next_position += 1;

        Token {
            position,
            sentence_id: sentence.0,
            index_in_sentence,
            line: line_number,
            text,
            grammatical_role: owned(Field::GrammaticalRole),
            thematic_role: owned(Field::ThematicRole),
            animate: LayerAnnotation::new(owned(Field::AnimateLink), owned(Field::AnimateType)),
            inanimate: LayerAnnotation::new(
                owned(Field::InanimateLink),
                owned(Field::InanimateType),
            ),
        }
    }
}

/// Index part of a `sentence-token` id (`3-7` → 7).
fn parse_token_index(token_id: &str) -> Option<usize> {
    let (_, index) = token_id.split_once('-')?;
    // Sub-token ids look like `3-7.1`
    index.split('.').next()?.parse().ok()
}

#[derive(Default)]
struct ParseState {
    sentences: Vec<Sentence>,
    current: Option<Sentence>,
    next_position: usize,
}

impl ParseState {
    fn open_sentence(&mut self, text: &str) {
        match self.current.as_mut() {
            // Multi-line sentence text arrives as consecutive #Text= lines
            Some(sentence) if sentence.is_empty() => {
                if !sentence.text.is_empty() {
                    sentence.text.push('\n');
                }
                sentence.text.push_str(text);
            }
            _ => {
                self.close_sentence();
                self.current = Some(Sentence::new(self.sentences.len() + 1, text));
            }
        }
    }

    fn close_sentence(&mut self) {
        if let Some(sentence) = self.current.take() {
            if !sentence.is_empty() {
                self.sentences.push(sentence);
            }
        }
    }
}
