//! Extraction rule configuration.
//!
//! Label synonyms, boundary labels, noise tokens, and the identity-number
//! skeleton are data, not code, so they can be extended and tested
//! independently of the matching logic. Rules load from a JSON file when
//! `RULES_PATH` is set; otherwise the built-in defaults apply.

use anyhow::{Context, Result};
use regex::{escape, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Rule sets driving name and identity-number extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Synonyms that introduce the holder's name.
    #[serde(default = "default_name_labels")]
    pub name_labels: Vec<String>,
    /// Labels that terminate a name capture.
    #[serde(default = "default_boundary_labels")]
    pub boundary_labels: Vec<String>,
    /// Standalone OCR artifacts stripped before matching (case-sensitive).
    #[serde(default = "default_noise_tokens")]
    pub noise_tokens: Vec<String>,
    /// Digit-group skeleton matching an identity-number candidate.
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,
}

fn default_name_labels() -> Vec<String> {
    vec![
        "Name".to_string(),
        "Nama".to_string(),
        "NM".to_string(),
        "Holder".to_string(),
    ]
}

fn default_boundary_labels() -> Vec<String> {
    vec![
        "Father Name".to_string(),
        "Gender".to_string(),
        "Country".to_string(),
        "Identity".to_string(),
    ]
}

fn default_noise_tokens() -> Vec<String> {
    // "0m" shows up as a standalone word when Tesseract hits hologram glare.
    vec!["0m".to_string()]
}

fn default_id_pattern() -> String {
    r"\b\d{5}[-\s]?\d{7}[-\s]?\d\b".to_string()
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            name_labels: default_name_labels(),
            boundary_labels: default_boundary_labels(),
            noise_tokens: default_noise_tokens(),
            id_pattern: default_id_pattern(),
        }
    }
}

impl ExtractionRules {
    /// Load rules from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {:?}", path))?;

        let rules: ExtractionRules = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {:?}", path))?;

        info!("Loaded extraction rules from {:?}", path);
        Ok(rules)
    }
}

/// Rule sets compiled into matchers, ready for extraction.
pub struct CompiledRules {
    /// Whole-word noise stripper; `None` when the token list is empty.
    pub(crate) noise: Option<Regex>,
    /// Identity-number skeleton matcher.
    pub(crate) id: Regex,
    /// Label-anchored name matcher (case-insensitive, capture group 1).
    pub(crate) name: Regex,
}

impl CompiledRules {
    /// Compile the rule sets. Fails on an empty label set or an invalid
    /// pattern so a bad rules file is caught at startup, not per request.
    pub fn compile(rules: &ExtractionRules) -> Result<Self> {
        if rules.name_labels.is_empty() {
            anyhow::bail!("name label set is empty");
        }

        let noise = if rules.noise_tokens.is_empty() {
            None
        } else {
            let tokens = rules
                .noise_tokens
                .iter()
                .map(|t| escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"\b(?:{})\b", tokens))
                    .context("invalid noise token set")?,
            )
        };

        let id = Regex::new(&rules.id_pattern)
            .with_context(|| format!("invalid id pattern: {}", rules.id_pattern))?;

        let labels = rules
            .name_labels
            .iter()
            .map(|l| escape(l))
            .collect::<Vec<_>>()
            .join("|");

        // A name capture runs lazily from the label to the next line break or
        // boundary label, whichever comes first.
        let mut stops = vec![r"\n".to_string()];
        stops.extend(rules.boundary_labels.iter().map(|l| escape(l)));

        let name = RegexBuilder::new(&format!(
            r"(?:{})\s*[:\-\s]*(.*?)(?:{})",
            labels,
            stops.join("|")
        ))
        .case_insensitive(true)
        .build()
        .context("invalid name label set")?;

        Ok(Self { noise, id, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_compile() {
        let compiled = CompiledRules::compile(&ExtractionRules::default()).unwrap();
        assert!(compiled.id.is_match("12345-1234567-1"));
        assert!(compiled.name.is_match("Name: John Doe\n"));
        assert!(compiled.noise.is_some());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let rules: ExtractionRules = serde_json::from_str("{}").unwrap();
        assert_eq!(rules.name_labels, ExtractionRules::default().name_labels);
        assert_eq!(rules.id_pattern, default_id_pattern());
    }

    #[test]
    fn overridden_labels_are_used() {
        let rules: ExtractionRules =
            serde_json::from_str(r#"{"name_labels": ["Nom"]}"#).unwrap();
        let compiled = CompiledRules::compile(&rules).unwrap();
        assert!(compiled.name.is_match("nom: Jean Dupont\n"));
        assert!(!compiled.name.is_match("Holder: Jean Dupont\n"));
    }

    #[test]
    fn rules_round_trip_through_json() {
        let rules = ExtractionRules::default();
        let json = serde_json::to_string(&rules).unwrap();
        let back: ExtractionRules = serde_json::from_str(&json).unwrap();
        assert_eq!(back.boundary_labels, rules.boundary_labels);
        assert_eq!(back.noise_tokens, rules.noise_tokens);
    }

    #[test]
    fn empty_label_set_is_rejected() {
        let rules = ExtractionRules {
            name_labels: Vec::new(),
            ..Default::default()
        };
        assert!(CompiledRules::compile(&rules).is_err());
    }

    #[test]
    fn invalid_id_pattern_is_rejected() {
        let rules = ExtractionRules {
            id_pattern: "[".to_string(),
            ..Default::default()
        };
        assert!(CompiledRules::compile(&rules).is_err());
    }

    #[test]
    fn empty_noise_list_compiles_to_none() {
        let rules = ExtractionRules {
            noise_tokens: Vec::new(),
            ..Default::default()
        };
        let compiled = CompiledRules::compile(&rules).unwrap();
        assert!(compiled.noise.is_none());
    }
}
