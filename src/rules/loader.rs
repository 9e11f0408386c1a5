//! Reading rule files from disk.

use std::path::Path;

use tracing::info;

use crate::error::{Result, RulesError};
use crate::rules::matcher::RuleSet;
use crate::rules::types::RawRuleSet;
use crate::rules::validator::RuleSetValidator;

/// Parse rule-file JSON into its raw, unvalidated form.
pub fn parse_rules(json: &str) -> std::result::Result<RawRuleSet, RulesError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a rule file.
pub fn load_rules(path: &Path) -> std::result::Result<RawRuleSet, RulesError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RulesError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let raw = parse_rules(&contents)?;
    info!(path = %path.display(), rules = raw.rules.len(), "Loaded rule file");
    Ok(raw)
}

/// Read, parse and validate a rule file in one step.
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let raw = load_rules(path)?;
    Ok(RuleSetValidator::validate(&raw)?)
}
