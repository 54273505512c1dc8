//! Code profiles.
//!
//! A [`CodeProfile`] is everything code-specific the generator needs: the two
//! factor tables plus the options that differ between codes and national
//! annexes (how permanent senses are enumerated, how variable actions
//! accompany an accidental action).
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "name": "my-annex",
//!   "code": "EN 1990",
//!   "annex": "XX",
//!   "version": "1.0.0",
//!   "safety_factors": { "entries": [ ... ] },
//!   "combination_factors": { "A": { "psi0": 0.7, "psi1": 0.5, "psi2": 0.3 } },
//!   "sense_strategy": { "default": "Exhaustive", "overrides": { "UlsAccidental": "Shortcut" } },
//!   "accidental_rule": "Psi1MainPsi2Others"
//! }
//! ```

use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

use super::psi::CombinationFactorPolicy;
use super::safety::SafetyFactorPolicy;
use crate::combinations::LimitStateFamily;
use crate::errors::{ComboError, ComboResult};

/// How favorable/unfavorable senses of origin groups are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SenseStrategy {
    /// Every combination of senses across independent origin groups
    #[default]
    Exhaustive,
    /// All groups unfavorable, then all groups favorable
    Uniform,
    /// All groups unfavorable only
    Shortcut,
}

/// Sense strategy per family, with a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenseStrategies {
    #[serde(default)]
    pub default: SenseStrategy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<LimitStateFamily, SenseStrategy>,
}

impl SenseStrategies {
    /// Same strategy for every family
    pub fn uniform(strategy: SenseStrategy) -> Self {
        SenseStrategies {
            default: strategy,
            overrides: BTreeMap::new(),
        }
    }

    /// Override one family (builder pattern)
    pub fn with_override(mut self, family: LimitStateFamily, strategy: SenseStrategy) -> Self {
        self.overrides.insert(family, strategy);
        self
    }

    /// Strategy in effect for a family
    pub fn for_family(&self, family: LimitStateFamily) -> SenseStrategy {
        self.overrides.get(&family).copied().unwrap_or(self.default)
    }
}

/// Factors for variable actions accompanying an accidental action (EN 1990 6.11b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccidentalRule {
    /// ψ1 for one main accompanying action (enumerated), ψ2 for the rest
    #[default]
    Psi1MainPsi2Others,
    /// ψ2 for every accompanying action
    Psi2All,
}

/// A named, versioned design-code configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeProfile {
    /// Short lookup name (e.g. "en1990")
    pub name: String,

    /// Design code (e.g. "EN 1990")
    pub code: String,

    /// National annex, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annex: Option<String>,

    /// Profile revision
    pub version: Version,

    pub safety_factors: SafetyFactorPolicy,

    pub combination_factors: CombinationFactorPolicy,

    #[serde(default)]
    pub sense_strategy: SenseStrategies,

    #[serde(default)]
    pub accidental_rule: AccidentalRule,
}

impl CodeProfile {
    /// Create a profile with default options
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        version: Version,
        safety_factors: SafetyFactorPolicy,
        combination_factors: CombinationFactorPolicy,
    ) -> Self {
        CodeProfile {
            name: name.into(),
            code: code.into(),
            annex: None,
            version,
            safety_factors,
            combination_factors,
            sense_strategy: SenseStrategies::default(),
            accidental_rule: AccidentalRule::default(),
        }
    }

    /// Set the national annex (builder pattern)
    pub fn with_annex(mut self, annex: impl Into<String>) -> Self {
        self.annex = Some(annex.into());
        self
    }

    /// Set the sense strategies (builder pattern)
    pub fn with_sense_strategy(mut self, strategies: SenseStrategies) -> Self {
        self.sense_strategy = strategies;
        self
    }

    /// Set the accidental rule (builder pattern)
    pub fn with_accidental_rule(mut self, rule: AccidentalRule) -> Self {
        self.accidental_rule = rule;
        self
    }

    /// Display identifier, e.g. "EN 1990 [ES] v1.0.0"
    pub fn identifier(&self) -> String {
        match &self.annex {
            Some(annex) => format!("{} [{}] v{}", self.code, annex, self.version),
            None => format!("{} v{}", self.code, self.version),
        }
    }

    /// Validate both tables.
    pub fn validate(&self) -> ComboResult<()> {
        if self.name.trim().is_empty() {
            return Err(ComboError::invalid_input("name", "\"\"", "Profile name cannot be empty"));
        }
        self.safety_factors.validate()?;
        self.combination_factors.validate()
    }
}
