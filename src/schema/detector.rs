//! Preamble-driven schema detection.

use std::collections::BTreeMap;

use super::{
    compatibility_score, ColumnMap, DirectiveKind, Field, FormatClass, LayerDeclaration,
    LayerKind, SchemaDescription, FIXED_COLUMNS, LEGACY_PREAMBLE,
};
use crate::{Animacy, Diagnostic, DiagnosticKind, Diagnostics};

/// Split a token row on tabs.
///
/// WebAnno writes a trailing tab after the last column; the empty field it
/// produces is dropped.
pub fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
    let mut fields: Vec<&str> = line.split('\t').collect();
    if fields.len() > 1 && fields.last().map_or(false, |f| f.is_empty()) {
        fields.pop();
    }
    fields
}

pub(crate) fn is_token_line(line: &str) -> bool {
    !line.trim().is_empty() && !line.starts_with('#')
}

/// Parsed preamble directives.
#[derive(Debug, Default)]
struct Preamble {
    format_version: Option<String>,
    layers: Vec<LayerDeclaration>,
}

impl Preamble {
    fn declared_column_count(&self) -> usize {
        FIXED_COLUMNS + self.layers.iter().map(|l| l.features.len()).sum::<usize>()
    }
}

/// Inspects the preamble and sampled token rows of a file to describe its
/// schema.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    /// Number of token rows sampled for the observed column count
    sample_rows: usize,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self { sample_rows: 50 }
    }
}

impl FormatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rows(sample_rows: usize) -> Self {
        Self {
            sample_rows: sample_rows.max(1),
        }
    }

    /// Describe the schema of `content`.
    ///
    /// Never fails: without a parseable preamble the legacy layout is used
    /// and the description is marked unverified.
    pub fn detect(&self, content: &str, diagnostics: &mut Diagnostics) -> SchemaDescription {
        let preamble = parse_preamble(content);
        let observed = self.observe_column_count(content);

        if preamble.layers.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::UnverifiedSchema,
                "no layer declarations found in preamble, using legacy column map",
            ));
            return self.legacy_with(preamble.format_version, observed, diagnostics);
        }

        let declared = preamble.declared_column_count();
        let mut verified = true;
        if let Some(observed) = observed {
            if observed != declared {
                verified = false;
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::ColumnCountMismatch,
                    format!(
                        "preamble declares {} columns but token rows have {}",
                        declared, observed
                    ),
                ));
            }
        }

        let column_count = observed.unwrap_or(declared);
        let has_morphology = preamble.layers.iter().any(|l| l.kind == LayerKind::Morphology);
        let columns = build_column_map(&preamble.layers);
        let compatibility = compatibility_score(&preamble.layers);

        log::debug!(
            "[schema] {} layers, {} columns, compatibility {:.2}",
            preamble.layers.len(),
            column_count,
            compatibility
        );

        SchemaDescription {
            column_count,
            format: FormatClass::from_column_count(column_count, has_morphology),
            format_version: preamble.format_version,
            layers: preamble.layers,
            columns,
            compatibility,
            verified,
        }
    }

    /// Skip detection and force the legacy layout.
    ///
    /// Rows wider or narrower than the legacy layout are reported, since the
    /// legacy positions then point at the wrong columns.
    pub fn legacy(&self, content: &str, diagnostics: &mut Diagnostics) -> SchemaDescription {
        let preamble = parse_preamble(content);
        self.legacy_with(
            preamble.format_version,
            self.observe_column_count(content),
            diagnostics,
        )
    }

    fn legacy_with(
        &self,
        format_version: Option<String>,
        observed: Option<usize>,
        diagnostics: &mut Diagnostics,
    ) -> SchemaDescription {
        let legacy = parse_preamble(LEGACY_PREAMBLE);
        let declared = legacy.declared_column_count();
        let column_count = observed.unwrap_or(declared);
        if column_count != declared {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::ColumnCountMismatch,
                format!(
                    "legacy column map expects {} columns but token rows have {}",
                    declared, column_count
                ),
            ));
        }

        // Only layers that fit the observed rows count as present
        let layers: Vec<LayerDeclaration> = legacy
            .layers
            .into_iter()
            .filter(|l| l.columns().end <= column_count)
            .collect();
        let has_morphology = layers.iter().any(|l| l.kind == LayerKind::Morphology);

        SchemaDescription {
            column_count,
            format: FormatClass::from_column_count(column_count, has_morphology),
            format_version,
            columns: build_column_map(&layers),
            compatibility: compatibility_score(&layers),
            layers,
            verified: false,
        }
    }

    /// Most common field count among the first sampled token rows.
    fn observe_column_count(&self, content: &str) -> Option<usize> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for line in content.lines().filter(|l| is_token_line(l)).take(self.sample_rows) {
            *counts.entry(split_row(line).len()).or_insert(0) += 1;
        }

        let mut best: Option<(usize, usize)> = None;
        for (width, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((width, count));
            }
        }
        best.map(|(width, _)| width)
    }
}

fn parse_preamble(content: &str) -> Preamble {
    let mut preamble = Preamble::default();
    let mut next_column = FIXED_COLUMNS;
    let mut coreference_layers = 0;

    for line in content.lines() {
        let line = line.trim_end();
        if line.starts_with("#Text=") || is_token_line(line) {
            break;
        }

        if let Some(version) = line.strip_prefix("#FORMAT=") {
            preamble.format_version = Some(version.trim().to_string());
            continue;
        }

        let Some((directive, body)) = [DirectiveKind::Span, DirectiveKind::Chain, DirectiveKind::Relation]
            .iter()
            .find_map(|d| line.strip_prefix(d.prefix()).map(|body| (*d, body)))
        else {
            continue;
        };

        let mut parts = body.split('|');
        let name = match parts.next() {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => continue,
        };
        let mut features: Vec<String> = parts
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        // A layer without features still occupies a placeholder column
        if features.is_empty() {
            features.push("*".to_string());
        }

        let kind = classify_layer(directive, &name, &features, coreference_layers);
        if matches!(
            kind,
            LayerKind::AnimateCoreference | LayerKind::InanimateCoreference
        ) {
            coreference_layers += 1;
        }

        let layer = LayerDeclaration {
            name,
            directive,
            kind,
            features,
            first_column: next_column,
        };
        next_column = layer.columns().end;
        preamble.layers.push(layer);
    }

    preamble
}

fn classify_layer(
    directive: DirectiveKind,
    name: &str,
    features: &[String],
    coreference_layers_seen: usize,
) -> LayerKind {
    let lower = name.to_lowercase();
    let features_lower: Vec<String> = features.iter().map(|f| f.to_lowercase()).collect();
    let any_feature = |needle: &str| features_lower.iter().any(|f| f.contains(needle));

    if directive == DirectiveKind::Relation {
        return LayerKind::Relation;
    }
    if lower.contains("morph") || any_feature("morph") {
        return LayerKind::Morphology;
    }
    if directive == DirectiveKind::Chain || lower.contains("coref") || lower.contains("koref") {
        if lower.contains("inanimate") || lower.contains("unbelebt") || coreference_layers_seen > 0
        {
            return LayerKind::InanimateCoreference;
        }
        return LayerKind::AnimateCoreference;
    }
    if any_feature("gram") || any_feature("them") || lower.contains("role") || lower.contains("rolle")
    {
        return LayerKind::Roles;
    }
    LayerKind::Other
}

fn build_column_map(layers: &[LayerDeclaration]) -> ColumnMap {
    let mut map = ColumnMap::new();

    for layer in layers {
        match layer.kind {
            LayerKind::Roles => map_roles(&mut map, layer),
            LayerKind::AnimateCoreference => map_coreference(&mut map, layer, Animacy::Animate),
            LayerKind::InanimateCoreference => {
                map_coreference(&mut map, layer, Animacy::Inanimate)
            }
            _ => {}
        }
    }

    map
}

fn map_roles(map: &mut ColumnMap, layer: &LayerDeclaration) {
    if map.contains(Field::GrammaticalRole) || map.contains(Field::ThematicRole) {
        return;
    }

    let mut matched = false;
    for (column, feature) in layer.columns().zip(&layer.features) {
        let feature = feature.to_lowercase();
        if feature.contains("gram") && !map.contains(Field::GrammaticalRole) {
            map.set(Field::GrammaticalRole, column);
            matched = true;
        } else if feature.contains("them") && !map.contains(Field::ThematicRole) {
            map.set(Field::ThematicRole, column);
            matched = true;
        }
    }

    if !matched && layer.features.len() >= 2 {
        map.set(Field::GrammaticalRole, layer.first_column);
        map.set(Field::ThematicRole, layer.first_column + 1);
    }
}

fn map_coreference(map: &mut ColumnMap, layer: &LayerDeclaration, animacy: Animacy) {
    let link_field = Field::link(animacy);
    let type_field = Field::kind(animacy);
    if map.contains(link_field) || map.contains(type_field) {
        return;
    }

    let mut unassigned = Vec::new();
    for (column, feature) in layer.columns().zip(&layer.features) {
        let feature = feature.to_lowercase();
        if (feature.contains("relation") || feature.contains("link")) && !map.contains(link_field)
        {
            map.set(link_field, column);
        } else if feature.contains("type") && !map.contains(type_field) {
            map.set(type_field, column);
        } else {
            unassigned.push(column);
        }
    }

    // WebAnno emits chain features as type, then relation
    let mut unassigned = unassigned.into_iter();
    if !map.contains(type_field) {
        if let Some(column) = unassigned.next() {
            map.set(type_field, column);
        }
    }
    if !map.contains(link_field) {
        if let Some(column) = unassigned.next() {
            map.set(link_field, column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_PREAMBLE: &str = "\
#FORMAT=WebAnno TSV 3.3
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Lemma|value
#T_SP=webanno.custom.GrammatischeRolle|grammatischeRolle|thematischeRolle
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.ner.type.NamedEntity|identifier|value
#T_RL=webanno.custom.Relation|relationType|BT_de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Lemma
#T_SP=webanno.custom.Clause|clauseType
#T_CH=webanno.custom.CoreferenceLink|referenceRelation|referenceType
#T_CH=webanno.custom.InanimateCoreferenceLink|referenceRelation|referenceType


";

    fn row(width: usize) -> String {
        let mut cells = vec!["1-1".to_string(), "0-2".to_string(), "er".to_string()];
        cells.extend((FIXED_COLUMNS..width).map(|_| "_".to_string()));
        format!("{}\t\n", cells.join("\t"))
    }

    fn detect(content: &str) -> (SchemaDescription, Diagnostics) {
        let mut diagnostics = Diagnostics::default();
        let schema = FormatDetector::new().detect(content, &mut diagnostics);
        (schema, diagnostics)
    }

    #[test]
    fn test_split_row_drops_trailing_tab() {
        assert_eq!(split_row("1-1\t0-3\tDer\t_\t"), vec!["1-1", "0-3", "Der", "_"]);
        assert_eq!(split_row("1-1\t0-3\tDer"), vec!["1-1", "0-3", "Der"]);
        assert_eq!(split_row("1-1\t0-3\t\t_\t"), vec!["1-1", "0-3", "", "_"]);
    }

    #[test]
    fn test_standard_schema() {
        let content = format!("{}#Text=Er kam .\n{}", STANDARD_PREAMBLE, row(15));
        let (schema, diagnostics) = detect(&content);

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(schema.format, FormatClass::Standard);
        assert_eq!(schema.column_count, 15);
        assert_eq!(schema.format_version.as_deref(), Some("WebAnno TSV 3.3"));
        assert_eq!(schema.layers.len(), 7);
        assert!(schema.verified);
        assert_eq!(schema.compatibility, 1.0);
        assert!(schema.is_strict());

        let map = &schema.columns;
        assert_eq!(map.column(Field::GrammaticalRole), Some(4));
        assert_eq!(map.column(Field::ThematicRole), Some(5));
        assert_eq!(map.column(Field::AnimateLink), Some(11));
        assert_eq!(map.column(Field::AnimateType), Some(12));
        assert_eq!(map.column(Field::InanimateLink), Some(13));
        assert_eq!(map.column(Field::InanimateType), Some(14));
    }

    #[test]
    fn test_layer_kinds_in_emitted_order() {
        let (schema, _) = detect(STANDARD_PREAMBLE);
        let kinds: Vec<LayerKind> = schema.layers.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LayerKind::Other,
                LayerKind::Roles,
                LayerKind::Other,
                LayerKind::Relation,
                LayerKind::Other,
                LayerKind::AnimateCoreference,
                LayerKind::InanimateCoreference,
            ]
        );
        assert_eq!(schema.layers[3].columns(), 8..10);
    }

    #[test]
    fn test_incomplete_schema_without_relation_layer() {
        let preamble = "\
#FORMAT=WebAnno TSV 3.3
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.segmentation.type.Lemma|value
#T_SP=webanno.custom.GrammatischeRolle|grammatischeRolle|thematischeRolle
#T_SP=de.tudarmstadt.ukp.dkpro.core.api.ner.type.NamedEntity|identifier|value
#T_CH=webanno.custom.CoreferenceLink|referenceRelation|referenceType
#T_CH=webanno.custom.InanimateCoreferenceLink|referenceRelation|referenceType

";
        let content = format!("{}#Text=Er kam .\n{}", preamble, row(12));
        let (schema, diagnostics) = detect(&content);

        assert!(diagnostics.is_empty());
        assert_eq!(schema.format, FormatClass::Incomplete);
        assert_eq!(schema.column_count, 12);
        assert_eq!(schema.missing_layers(), vec![LayerKind::Relation]);
        assert_eq!(schema.compatibility, 0.75);
        assert!(!schema.is_strict());
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(8));
        assert_eq!(schema.columns.column(Field::InanimateType), Some(11));
    }

    #[test]
    fn test_extended_schema_with_morphology() {
        let preamble = format!(
            "{}\n#T_SP=de.tudarmstadt.ukp.dkpro.core.api.lexmorph.type.morph.MorphologicalFeatures|animacy|aspect|case|definiteness|degree|gender|mood|number|person|tense\n",
            STANDARD_PREAMBLE.trim_end()
        );
        let content = format!("{}\n\n#Text=Er kam .\n{}", preamble, row(25));
        let (schema, _) = detect(&content);

        assert_eq!(schema.column_count, 25);
        assert_eq!(schema.format, FormatClass::Extended);
        assert!(schema.has_layer(LayerKind::Morphology));
        // Positions from the preamble do not move with the extra columns
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(11));
    }

    #[test]
    fn test_column_count_mismatch_is_unverified() {
        let content = format!("{}#Text=Er kam .\n{}", STANDARD_PREAMBLE, row(14));
        let (schema, diagnostics) = detect(&content);

        assert!(!schema.verified);
        assert_eq!(schema.column_count, 14);
        assert_eq!(schema.format, FormatClass::Legacy);
        assert_eq!(diagnostics.count(DiagnosticKind::ColumnCountMismatch), 1);
        // The preamble map is still used
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(11));
    }

    #[test]
    fn test_missing_preamble_falls_back_to_legacy() {
        let content = format!("#Text=Er kam .\n{}", row(14));
        let (schema, diagnostics) = detect(&content);

        assert_eq!(diagnostics.count(DiagnosticKind::UnverifiedSchema), 1);
        assert!(!schema.verified);
        assert_eq!(schema.format, FormatClass::Legacy);
        assert_eq!(schema.compatibility, 1.0);
        assert_eq!(schema.columns.column(Field::GrammaticalRole), Some(4));
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(10));
        assert_eq!(schema.columns.column(Field::AnimateType), Some(11));
        assert_eq!(schema.columns.column(Field::InanimateLink), Some(12));
        assert_eq!(schema.columns.column(Field::InanimateType), Some(13));
    }

    #[test]
    fn test_legacy_fallback_drops_layers_beyond_rows() {
        let content = format!("#Text=Er kam .\n{}", row(12));
        let (schema, diagnostics) = detect(&content);

        assert_eq!(schema.format, FormatClass::Incomplete);
        assert_eq!(diagnostics.count(DiagnosticKind::ColumnCountMismatch), 1);
        assert!(!schema.has_layer(LayerKind::InanimateCoreference));
        assert_eq!(schema.compatibility, 0.75);
        assert_eq!(schema.columns.column(Field::InanimateLink), None);
    }

    #[test]
    fn test_forced_legacy_reports_wider_rows() {
        let content = format!("{}#Text=Er kam .\n{}", STANDARD_PREAMBLE, row(15));
        let mut diagnostics = Diagnostics::default();
        let schema = FormatDetector::new().legacy(&content, &mut diagnostics);

        assert_eq!(schema.format, FormatClass::Standard);
        assert!(!schema.verified);
        assert_eq!(diagnostics.count(DiagnosticKind::ColumnCountMismatch), 1);
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(10));
    }

    #[test]
    fn test_missing_preamble_with_legacy_width_is_quiet() {
        let content = format!("#Text=Er kam .\n{}", row(14));
        let (_, diagnostics) = detect(&content);

        assert_eq!(diagnostics.count(DiagnosticKind::ColumnCountMismatch), 0);
    }

    #[test]
    fn test_webanno_chain_feature_order_fallback() {
        let preamble = "#T_CH=de.tudarmstadt.ukp.dkpro.core.api.coref.type.CoreferenceLink|a|b\n";
        let (schema, _) = detect(preamble);

        assert_eq!(schema.layers[0].kind, LayerKind::AnimateCoreference);
        assert_eq!(schema.columns.column(Field::AnimateType), Some(3));
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(4));
    }

    #[test]
    fn test_featureless_layer_takes_one_column() {
        let preamble = "\
#T_SP=webanno.custom.Marker|
#T_CH=webanno.custom.CoreferenceLink|referenceType|referenceRelation
";
        let (schema, _) = detect(preamble);
        assert_eq!(schema.layers[0].features, vec!["*".to_string()]);
        assert_eq!(schema.columns.column(Field::AnimateType), Some(4));
        assert_eq!(schema.columns.column(Field::AnimateLink), Some(5));
    }
}
