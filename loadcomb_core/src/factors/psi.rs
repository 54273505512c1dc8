//! Combination factors (ψ) per EN 1990 Table A1.1.
//!
//! Each variable action names a combination-factor group ("A" domestic,
//! "snow", "wind", ...). The group resolves to its ψ0, ψ1, ψ2 values and,
//! optionally, the seismic combination coefficient ψE (EN 1998-1 4.2.4),
//! which defaults to ψ2.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::errors::{ComboError, ComboResult, ConfigTable};

/// ψ values of one group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinationFactors {
    /// Combination value factor
    pub psi0: f64,
    /// Frequent value factor
    pub psi1: f64,
    /// Quasi-permanent value factor
    pub psi2: f64,
    /// Seismic combination coefficient, if it differs from ψ2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psi_e: Option<f64>,
}

impl CombinationFactors {
    /// Create a factor set without a separate seismic coefficient
    pub fn new(psi0: f64, psi1: f64, psi2: f64) -> Self {
        CombinationFactors {
            psi0,
            psi1,
            psi2,
            psi_e: None,
        }
    }

    /// Set the seismic coefficient (builder pattern)
    pub fn with_psi_e(mut self, psi_e: f64) -> Self {
        self.psi_e = Some(psi_e);
        self
    }

    /// Factor applied to variable actions in the seismic combination
    pub fn seismic(&self) -> f64 {
        self.psi_e.unwrap_or(self.psi2)
    }
}

/// Resolves ψ values by the action's combination-factor group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationFactorPolicy {
    groups: BTreeMap<String, CombinationFactors>,
}

impl CombinationFactorPolicy {
    /// Create an empty policy
    pub fn new() -> Self {
        CombinationFactorPolicy::default()
    }

    /// Add or replace a group (builder pattern)
    pub fn with_group(mut self, name: impl Into<String>, factors: CombinationFactors) -> Self {
        self.groups.insert(name.into(), factors);
        self
    }

    /// Group names in sorted order
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// ψ values for a variable action.
    ///
    /// # Errors
    ///
    /// `ComboError::Configuration` if the group is not in the table, and
    /// `ComboError::InvalidInput` if the action has no group at all.
    pub fn factors(&self, action: &Action) -> ComboResult<CombinationFactors> {
        let group = action.psi_group().ok_or_else(|| {
            ComboError::invalid_input(
                "psi_group",
                action.id.clone(),
                format!("{} has no combination-factor group", action.category().description()),
            )
        })?;

        self.groups.get(group).copied().ok_or_else(|| {
            ComboError::configuration(
                ConfigTable::CombinationFactors,
                format!("group '{}'", group),
                &action.id,
            )
        })
    }

    /// Check that every ψ lies in [0, 1] and group names are non-empty.
    pub fn validate(&self) -> ComboResult<()> {
        for (name, f) in &self.groups {
            if name.trim().is_empty() {
                return Err(ComboError::invalid_input(
                    "combination_factors",
                    format!("{:?}", name),
                    "Group names cannot be empty",
                ));
            }
            let values = [("psi0", f.psi0), ("psi1", f.psi1), ("psi2", f.psi2)]
                .into_iter()
                .chain(f.psi_e.map(|v| ("psi_e", v)));
            for (label, value) in values {
                if !(0.0..=1.0).contains(&value) {
                    return Err(ComboError::invalid_input(
                        format!("combination_factors.{}.{}", name, label),
                        value.to_string(),
                        "Combination factors must lie between 0 and 1",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_group() {
        let policy = CombinationFactorPolicy::new()
            .with_group("A", CombinationFactors::new(0.7, 0.5, 0.3))
            .with_group("wind", CombinationFactors::new(0.6, 0.2, 0.0));

        let f = policy.factors(&Action::variable("W1", "wind")).unwrap();
        assert_eq!(f.psi0, 0.6);
        assert_eq!(f.psi1, 0.2);
        assert_eq!(f.psi2, 0.0);
    }

    #[test]
    fn test_unknown_group_is_configuration_error() {
        let policy = CombinationFactorPolicy::new();
        let err = policy.factors(&Action::variable("Q1", "Z")).unwrap_err();
        assert_eq!(
            err,
            ComboError::configuration(ConfigTable::CombinationFactors, "group 'Z'", "Q1")
        );
    }

    #[test]
    fn test_permanent_has_no_group() {
        let policy = CombinationFactorPolicy::new();
        let err = policy.factors(&Action::permanent("G1")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_seismic_defaults_to_psi2() {
        let f = CombinationFactors::new(0.7, 0.5, 0.3);
        assert_eq!(f.seismic(), 0.3);
        assert_eq!(f.with_psi_e(0.15).seismic(), 0.15);
    }

    #[test]
    fn test_validate_range() {
        let ok = CombinationFactorPolicy::new().with_group("A", CombinationFactors::new(0.7, 0.5, 0.3));
        assert!(ok.validate().is_ok());

        let bad = CombinationFactorPolicy::new().with_group("A", CombinationFactors::new(1.2, 0.5, 0.3));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_json_is_a_plain_map() {
        let json = r#"{"A": {"psi0": 0.7, "psi1": 0.5, "psi2": 0.3}}"#;
        let policy: CombinationFactorPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.group_names().collect::<Vec<_>>(), vec!["A"]);
    }
}
