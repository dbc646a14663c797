//! Error code taxonomy and message classification
//!
//! The consolidation rewrite stamps every regrouped call with a numeric
//! error code. Codes come from a fixed taxonomy; a catalog of known message
//! texts maps representative wordings to codes, and rewritten groups are
//! classified against it by lexical similarity.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Code stamped on groups no catalog entry matches.
pub const ERROR_CODE_UNCLASSIFIED: i32 = -999;

/// Minimum similarity score for a catalog entry to claim a message.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

/// The error code taxonomy for the new emit interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ErrorCode {
    #[serde(rename = "error_code_unclassified")]
    Unclassified,
    #[serde(rename = "error_code_input_invalid")]
    InputInvalid,
    #[serde(rename = "error_code_input_field_not_found")]
    InputFieldNotFound,
    #[serde(rename = "error_code_input_field_blank")]
    InputFieldBlank,
    #[serde(rename = "error_code_input_object_not_found")]
    InputObjectNotFound,
    /// After input processing is done, this is when it can't get an index
    #[serde(rename = "error_code_input_cannot_find_object")]
    InputCannotFindObject,
    #[serde(rename = "error_code_input_topology_problem")]
    InputTopologyProblem,
    #[serde(rename = "error_code_input_unused")]
    InputUnused,
    #[serde(rename = "error_code_input_fatal")]
    InputFatal,
    #[serde(rename = "error_code_runtime_general")]
    RuntimeGeneral,
    #[serde(rename = "error_code_runtime_flow_out_of_range")]
    RuntimeFlowOutOfRange,
    #[serde(rename = "error_code_runtime_temp_out_of_range")]
    RuntimeTempOutOfRange,
    #[serde(rename = "error_code_runtime_airflow_network")]
    RuntimeAirflowNetwork,
    #[serde(rename = "error_code_fatal_general")]
    FatalGeneral,
    #[serde(rename = "error_code_developer_general")]
    DeveloperGeneral,
    #[serde(rename = "error_code_developer_invalid_index")]
    DeveloperInvalidIndex,
}

impl ErrorCode {
    /// The numeric value written into rewritten source.
    pub fn value(self) -> i32 {
        match self {
            Self::Unclassified => ERROR_CODE_UNCLASSIFIED,
            Self::InputInvalid => 1000,
            Self::InputFieldNotFound => 1100,
            Self::InputFieldBlank => 1200,
            Self::InputObjectNotFound => 1300,
            Self::InputCannotFindObject => 1350,
            Self::InputTopologyProblem => 1400,
            Self::InputUnused => 1500,
            Self::InputFatal => 1800,
            Self::RuntimeGeneral => 2000,
            Self::RuntimeFlowOutOfRange => 2100,
            Self::RuntimeTempOutOfRange => 2200,
            Self::RuntimeAirflowNetwork => 2300,
            Self::FatalGeneral => 3000,
            Self::DeveloperGeneral => 4000,
            Self::DeveloperInvalidIndex => 4100,
        }
    }

    /// Look up a code by its catalog name, e.g. `error_code_input_invalid`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "error_code_unclassified" => Ok(Self::Unclassified),
            "error_code_input_invalid" => Ok(Self::InputInvalid),
            "error_code_input_field_not_found" => Ok(Self::InputFieldNotFound),
            "error_code_input_field_blank" => Ok(Self::InputFieldBlank),
            "error_code_input_object_not_found" => Ok(Self::InputObjectNotFound),
            "error_code_input_cannot_find_object" => Ok(Self::InputCannotFindObject),
            "error_code_input_topology_problem" => Ok(Self::InputTopologyProblem),
            "error_code_input_unused" => Ok(Self::InputUnused),
            "error_code_input_fatal" => Ok(Self::InputFatal),
            "error_code_runtime_general" => Ok(Self::RuntimeGeneral),
            "error_code_runtime_flow_out_of_range" => Ok(Self::RuntimeFlowOutOfRange),
            "error_code_runtime_temp_out_of_range" => Ok(Self::RuntimeTempOutOfRange),
            "error_code_runtime_airflow_network" => Ok(Self::RuntimeAirflowNetwork),
            "error_code_fatal_general" => Ok(Self::FatalGeneral),
            "error_code_developer_general" => Ok(Self::DeveloperGeneral),
            "error_code_developer_invalid_index" => Ok(Self::DeveloperInvalidIndex),
            _ => Err(Error::UnknownErrorCode(name.to_string())),
        }
    }
}

/// A known message wording and the code it maps to.
#[derive(Debug, Clone, Deserialize)]
pub struct KnownCall {
    pub message: String,
    pub code: ErrorCode,
}

/// Term-frequency vector for lexical similarity scoring.
///
/// Tokens are lowercased alphanumeric runs; similarity is the cosine of two
/// vectors. This is a deliberately plain measure: the catalog holds the
/// wordings actually used in the codebase, so surface overlap is the signal.
#[derive(Debug, Clone)]
pub struct TermVector {
    counts: HashMap<String, f64>,
    norm: f64,
}

impl TermVector {
    pub fn build(text: &str) -> Self {
        let mut counts: HashMap<String, f64> = HashMap::new();
        for token in text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *counts.entry(token.to_ascii_lowercase()).or_insert(0.0) += 1.0;
        }
        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        Self { counts, norm }
    }

    /// Cosine similarity in [0, 1]; empty vectors score 0 against anything.
    pub fn cosine(&self, other: &Self) -> f64 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        let dot: f64 = self
            .counts
            .iter()
            .filter_map(|(token, count)| other.counts.get(token).map(|c| count * c))
            .sum();
        dot / (self.norm * other.norm)
    }
}

/// Similarity of two texts, scored lexically.
pub fn similarity(a: &str, b: &str) -> f64 {
    TermVector::build(a).cosine(&TermVector::build(b))
}

/// The catalog of known error call wordings.
pub struct CodeCatalog {
    entries: Vec<(KnownCall, TermVector)>,
}

impl CodeCatalog {
    /// Parse a catalog from its YAML form.
    pub fn from_yaml(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            known_error_calls: Vec<KnownCall>,
        }
        let raw: Raw = serde_norway::from_str(content)?;
        let entries = raw
            .known_error_calls
            .into_iter()
            .map(|known| {
                let vector = TermVector::build(&known.message);
                (known, vector)
            })
            .collect();
        Ok(Self { entries })
    }

    /// The catalog shipped with the tool.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(include_str!("actions/known_error_calls.yaml"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a rewritten group text against the known wordings. The best
    /// scoring entry wins if it clears the threshold; everything else stays
    /// unclassified.
    pub fn classify(&self, text: &str) -> i32 {
        let target = TermVector::build(text);
        let mut high_score = 0.0;
        let mut best: Option<ErrorCode> = None;
        for (known, vector) in &self.entries {
            let score = target.cosine(vector);
            if score > high_score {
                high_score = score;
                best = Some(known.code);
            }
        }
        match best {
            Some(code) if high_score > SIMILARITY_THRESHOLD => code.value(),
            _ => ERROR_CODE_UNCLASSIFIED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_lookup_round_trips() {
        assert_eq!(
            ErrorCode::from_name("error_code_unclassified").unwrap().value(),
            ERROR_CODE_UNCLASSIFIED
        );
        assert_eq!(ErrorCode::from_name("error_code_input_invalid").unwrap().value(), 1000);
        assert_eq!(ErrorCode::from_name("error_code_runtime_general").unwrap().value(), 2000);
        assert!(ErrorCode::from_name("something_invalid_here").is_err());
    }

    #[test]
    fn similarity_is_one_for_identical_text() {
        assert!((similarity("flow rate out of range", "flow rate out of range") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_is_zero_for_disjoint_text() {
        assert_eq!(similarity("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn builtin_catalog_parses() {
        let catalog = CodeCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
    }

    #[test]
    fn classify_matches_exact_known_wording() {
        let catalog = CodeCatalog::from_yaml(
            "known_error_calls:\n  - message: \"flow rate is out of range\"\n    code: error_code_runtime_flow_out_of_range\n",
        )
        .unwrap();
        assert_eq!(catalog.classify("flow rate is out of range"), 2100);
        assert_eq!(catalog.classify("entirely unrelated wording"), ERROR_CODE_UNCLASSIFIED);
    }
}
