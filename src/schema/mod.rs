//! Structural description of a WebAnno TSV file.
//!
//! The preamble of a TSV 3 file declares the annotation layers and their
//! feature columns in emitted order:
//!
//! ```text
//! #FORMAT=WebAnno TSV 3.3
//! #T_SP=webanno.custom.GrammatischeRolle|grammatischeRolle|thematischeRolle
//! #T_RL=webanno.custom.Relation|relationType|BT_webanno.custom.Lemma
//! #T_CH=webanno.custom.CoreferenceLink|referenceRelation|referenceType
//! ```
//!
//! Columns 0 to 2 always hold the token id, character offsets and token
//! text; every declared feature (including a relation's `BT_` target) adds
//! one column after that. [`FormatDetector`] turns the preamble into a
//! [`SchemaDescription`] whose [`ColumnMap`] is the only place column
//! positions live.

mod detector;

pub use detector::{split_row, FormatDetector};

use serde::Serialize;

use crate::Animacy;

/// Number of fixed leading columns (token id, offsets, text).
pub const FIXED_COLUMNS: usize = 3;

/// Layers needed for a fully compatible schema.
pub const EXPECTED_LAYERS: [LayerKind; 4] = [
    LayerKind::Roles,
    LayerKind::Relation,
    LayerKind::AnimateCoreference,
    LayerKind::InanimateCoreference,
];

/// Layout assumed when a file has no usable preamble (14 columns).
pub const LEGACY_PREAMBLE: &str = "\
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Lemma|value
#T_SP=webanno.custom.GrammatischeRolle|grammatischeRolle|thematischeRolle
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.ner.type.NamedEntity|identifier|value
#T_RL=webanno.custom.Relation|relationType|BT_de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Lemma
#T_CH=webanno.custom.CoreferenceLink|referenceRelation|referenceType
#T_CH=webanno.custom.InanimateCoreferenceLink|referenceRelation|referenceType
";

/// A logical field the pipeline reads from a token row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    TokenId,
    CharOffsets,
    TokenText,
    GrammaticalRole,
    ThematicRole,
    AnimateLink,
    AnimateType,
    InanimateLink,
    InanimateType,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::TokenId,
        Field::CharOffsets,
        Field::TokenText,
        Field::GrammaticalRole,
        Field::ThematicRole,
        Field::AnimateLink,
        Field::AnimateType,
        Field::InanimateLink,
        Field::InanimateType,
    ];

    /// Fields that come from declared layers rather than fixed columns.
    pub const LAYER_FIELDS: [Field; 6] = [
        Field::GrammaticalRole,
        Field::ThematicRole,
        Field::AnimateLink,
        Field::AnimateType,
        Field::InanimateLink,
        Field::InanimateType,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn link(animacy: Animacy) -> Self {
        match animacy {
            Animacy::Animate => Field::AnimateLink,
            Animacy::Inanimate => Field::InanimateLink,
        }
    }

    pub fn kind(animacy: Animacy) -> Self {
        match animacy {
            Animacy::Animate => Field::AnimateType,
            Animacy::Inanimate => Field::InanimateType,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::TokenId => "token_id",
            Field::CharOffsets => "char_offsets",
            Field::TokenText => "token_text",
            Field::GrammaticalRole => "grammatical_role",
            Field::ThematicRole => "thematic_role",
            Field::AnimateLink => "animate_link",
            Field::AnimateType => "animate_type",
            Field::InanimateLink => "inanimate_link",
            Field::InanimateType => "inanimate_type",
        }
    }
}

/// Field → column lookup table, built once per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    positions: [Option<usize>; Field::ALL.len()],
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnMap {
    /// A map with only the fixed columns assigned.
    pub fn new() -> Self {
        let mut positions = [None; Field::ALL.len()];
        positions[Field::TokenId.slot()] = Some(0);
        positions[Field::CharOffsets.slot()] = Some(1);
        positions[Field::TokenText.slot()] = Some(2);
        Self { positions }
    }

    pub fn with(mut self, field: Field, column: usize) -> Self {
        self.set(field, column);
        self
    }

    pub fn set(&mut self, field: Field, column: usize) {
        self.positions[field.slot()] = Some(column);
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.positions[field.slot()]
    }

    pub fn contains(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    /// Read a field from a split row.
    ///
    /// Returns `None` when the field is unmapped, the row is too short, or
    /// the cell holds an empty placeholder (`_`, `*` or nothing).
    pub fn read<'r>(&self, field: Field, row: &[&'r str]) -> Option<&'r str> {
        let value = row.get(self.column(field)?)?.trim();
        if value.is_empty() || value == "_" || value == "*" {
            None
        } else {
            Some(value)
        }
    }

    /// Layer fields with no column.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::LAYER_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }
}

/// Directive that declared a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// `#T_SP=`
    Span,
    /// `#T_CH=`
    Chain,
    /// `#T_RL=`
    Relation,
}

impl DirectiveKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Span => "#T_SP=",
            Self::Chain => "#T_CH=",
            Self::Relation => "#T_RL=",
        }
    }
}

/// What a layer means to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// Grammatical and thematic roles
    Roles,
    /// A relation layer (`#T_RL`)
    Relation,
    AnimateCoreference,
    InanimateCoreference,
    /// Morphological features (extended exports)
    Morphology,
    Other,
}

/// One layer declared in the preamble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerDeclaration {
    pub name: String,
    pub directive: DirectiveKind,
    pub kind: LayerKind,
    /// Feature names in column order
    pub features: Vec<String>,
    /// Column of the first feature
    pub first_column: usize,
}

impl LayerDeclaration {
    /// Columns occupied by this layer.
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.first_column..self.first_column + self.features.len()
    }
}

/// Format variant of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatClass {
    /// 15 columns
    Standard,
    /// More than 20 columns, or 16 to 20 with a morphology layer
    Extended,
    /// 13 or 14 columns
    Legacy,
    /// Fewer than 13 columns
    Incomplete,
}

impl FormatClass {
    pub fn from_column_count(column_count: usize, has_morphology: bool) -> Self {
        match column_count {
            0..=12 => FormatClass::Incomplete,
            13 | 14 => FormatClass::Legacy,
            15 => FormatClass::Standard,
            16..=20 if has_morphology => FormatClass::Extended,
            16..=20 => FormatClass::Standard,
            _ => FormatClass::Extended,
        }
    }
}

/// Detected shape of one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDescription {
    /// Physical columns per token row
    pub column_count: usize,
    pub format: FormatClass,
    /// `#FORMAT=` value, if declared
    pub format_version: Option<String>,
    /// Layers in emitted order
    pub layers: Vec<LayerDeclaration>,
    pub columns: ColumnMap,
    /// Fraction of [`EXPECTED_LAYERS`] present, in `[0, 1]`
    pub compatibility: f64,
    /// False when the preamble was missing or disagreed with the data
    pub verified: bool,
}

impl SchemaDescription {
    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layers.iter().any(|l| l.kind == kind)
    }

    /// Expected layers absent from this schema.
    pub fn missing_layers(&self) -> Vec<LayerKind> {
        EXPECTED_LAYERS
            .iter()
            .copied()
            .filter(|k| !self.has_layer(*k))
            .collect()
    }

    /// Whether rows must match the column count exactly.
    pub fn is_strict(&self) -> bool {
        self.verified && self.compatibility >= 1.0
    }
}

/// Fraction of expected layers present among `layers`.
pub(crate) fn compatibility_score(layers: &[LayerDeclaration]) -> f64 {
    let present = EXPECTED_LAYERS
        .iter()
        .filter(|k| layers.iter().any(|l| l.kind == **k))
        .count();
    present as f64 / EXPECTED_LAYERS.len() as f64
}
