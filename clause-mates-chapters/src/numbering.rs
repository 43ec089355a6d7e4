use clause_mates::FileAnalysis;
use serde::Serialize;

/// Where one chapter sits in the batch-wide numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileOffsets {
    pub file: usize,
    /// Added to local sentence ids
    pub sentence_offset: usize,
    pub sentence_count: usize,
    /// Added to local token positions
    pub token_offset: usize,
    pub token_count: usize,
}

impl FileOffsets {
    /// Global id of a local (1-based) sentence id.
    pub fn global_sentence(&self, local: usize) -> usize {
        self.sentence_offset + local
    }

    pub fn global_position(&self, local: usize) -> usize {
        self.token_offset + local
    }

    /// The first global sentence id of the file starts a chapter.
    pub fn is_chapter_boundary(&self, local_sentence: usize) -> bool {
        local_sentence == 1
    }
}

/// Contiguous sentence and token ranges for the included files, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalNumbering {
    files: Vec<FileOffsets>,
}

impl GlobalNumbering {
    /// Number `analyses` in the given order; `(file index, analysis)`.
    pub fn assign<'a>(analyses: impl IntoIterator<Item = (usize, &'a FileAnalysis)>) -> Self {
        let mut files = Vec::new();
        let mut sentence_offset = 0;
        let mut token_offset = 0;

        for (file, analysis) in analyses {
            let offsets = FileOffsets {
                file,
                sentence_offset,
                sentence_count: analysis.summary.sentences,
                token_offset,
                token_count: analysis.summary.tokens,
            };
            sentence_offset += offsets.sentence_count;
            token_offset += offsets.token_count;
            files.push(offsets);
        }

        Self { files }
    }

    pub fn get(&self, file: usize) -> Option<&FileOffsets> {
        self.files.iter().find(|f| f.file == file)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileOffsets> {
        self.files.iter()
    }

    pub fn total_sentences(&self) -> usize {
        self.files.iter().map(|f| f.sentence_count).sum()
    }

    /// Global sentence ids that open a chapter.
    pub fn chapter_boundaries(&self) -> Vec<usize> {
        self.files
            .iter()
            .filter(|f| f.sentence_count > 0)
            .map(|f| f.global_sentence(1))
            .collect()
    }
}
