//! # Partial and Combination Factors
//!
//! Code-specific factor tables and the profile that bundles them.
//!
//! ```text
//! E_d = Σ γ_G,j G_k,j  +  γ_P P  +  γ_Q,1 Q_k,1  +  Σ γ_Q,i ψ_0,i Q_k,i     (EN 1990 6.10)
//! ```
//!
//! - [`safety`] - Partial safety factors γ by (category, limit state, situation, sense)
//! - [`psi`] - Combination factors ψ0, ψ1, ψ2 (and seismic ψE) by named group
//! - [`profile`] - A named, versioned code profile with its generation options
//! - [`presets`] - Built-in profiles shipped as embedded JSON

pub mod presets;
pub mod profile;
pub mod psi;
pub mod safety;

pub use presets::{preset, preset_names, presets};
pub use profile::{AccidentalRule, CodeProfile, SenseStrategies, SenseStrategy};
pub use psi::{CombinationFactorPolicy, CombinationFactors};
pub use safety::{SafetyFactorEntry, SafetyFactorPolicy};

use serde::{Deserialize, Serialize};

/// Limit state of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitState {
    /// ULS - safety of people and structure
    Ultimate,
    /// SLS - function, comfort, appearance
    Serviceability,
}

/// Design situation per EN 1990 Section 3.2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Situation {
    PersistentTransient,
    Accidental,
    Seismic,
}

/// Whether a permanent action increases or relieves the effect under study.
///
/// Only permanent-like categories distinguish senses; everything else is
/// looked up with [`Sense::Neutral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    Unfavorable,
    Favorable,
    Neutral,
}

impl std::fmt::Display for LimitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::fmt::Display for Situation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Unfavorable => write!(f, "unfavorable"),
            Sense::Favorable => write!(f, "favorable"),
            Sense::Neutral => write!(f, "neutral"),
        }
    }
}
