//! # Load Combinations
//!
//! Generation, storage and lookup of design load combinations per EN 1990.
//!
//! - [`LimitStateFamily`] - The six combination families (ULS-PT ... SLS-QP)
//! - [`Combination`] - One labeled, immutable combination
//! - [`CombinationDraft`] - A combination before de-duplication and labeling
//! - [`CombinationContainer`] - Per-family, de-duplicated storage
//!
//! ## Family Overview
//!
//! | Family | Prefix | Expression (EN 1990) |
//! |--------|--------|----------------------|
//! | ULS persistent/transient | `ULS-PT` | Σγ_G G + γ_Q,1 Q_1 + Σγ_Q ψ_0 Q_i (6.10) |
//! | ULS accidental | `ULS-A` | ΣG + A_d + ψ_1,1 Q_1 + Σψ_2 Q_i (6.11b) |
//! | ULS seismic | `ULS-E` | ΣG + A_Ed + Σψ_E Q_i (6.12b) |
//! | SLS characteristic | `SLS-C` | ΣG + Q_1 + Σψ_0 Q_i (6.14b) |
//! | SLS frequent | `SLS-F` | ΣG + ψ_1,1 Q_1 + Σψ_2 Q_i (6.15b) |
//! | SLS quasi-permanent | `SLS-QP` | ΣG + Σψ_2 Q_i (6.16b) |

pub mod combination;
pub mod container;
pub(crate) mod generator;
pub(crate) mod senses;
pub(crate) mod subsets;

pub use combination::{CanonicalKey, Combination, CombinationDraft, Term};
pub use container::{CombinationContainer, FamilyStatus, GoverningResults};
pub use senses::EXHAUSTIVE_GROUP_LIMIT;

use serde::{Deserialize, Serialize};

use crate::errors::ComboError;
use crate::factors::{LimitState, Situation};

/// Limit-state family a combination belongs to.
///
/// # Example
/// ```
/// use loadcomb_core::combinations::LimitStateFamily;
///
/// let family: LimitStateFamily = "sls-frequent".parse().unwrap();
/// assert_eq!(family, LimitStateFamily::SlsFrequent);
/// assert_eq!(family.to_string(), "SLS-F");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LimitStateFamily {
    /// ULS, persistent and transient situations
    UlsPersistent,
    /// ULS, accidental situation
    UlsAccidental,
    /// ULS, seismic situation
    UlsSeismic,
    /// SLS, characteristic (irreversible) combination
    SlsCharacteristic,
    /// SLS, frequent combination
    SlsFrequent,
    /// SLS, quasi-permanent combination
    SlsQuasiPermanent,
}

impl LimitStateFamily {
    /// All families in standard order
    pub const ALL: [LimitStateFamily; 6] = [
        LimitStateFamily::UlsPersistent,
        LimitStateFamily::UlsAccidental,
        LimitStateFamily::UlsSeismic,
        LimitStateFamily::SlsCharacteristic,
        LimitStateFamily::SlsFrequent,
        LimitStateFamily::SlsQuasiPermanent,
    ];

    /// Label prefix (e.g. "ULS-PT")
    pub fn prefix(&self) -> &'static str {
        match self {
            LimitStateFamily::UlsPersistent => "ULS-PT",
            LimitStateFamily::UlsAccidental => "ULS-A",
            LimitStateFamily::UlsSeismic => "ULS-E",
            LimitStateFamily::SlsCharacteristic => "SLS-C",
            LimitStateFamily::SlsFrequent => "SLS-F",
            LimitStateFamily::SlsQuasiPermanent => "SLS-QP",
        }
    }

    /// Command-line name (e.g. "uls-persistent")
    pub fn slug(&self) -> &'static str {
        match self {
            LimitStateFamily::UlsPersistent => "uls-persistent",
            LimitStateFamily::UlsAccidental => "uls-accidental",
            LimitStateFamily::UlsSeismic => "uls-seismic",
            LimitStateFamily::SlsCharacteristic => "sls-characteristic",
            LimitStateFamily::SlsFrequent => "sls-frequent",
            LimitStateFamily::SlsQuasiPermanent => "sls-quasi-permanent",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            LimitStateFamily::UlsPersistent => "ULS persistent/transient",
            LimitStateFamily::UlsAccidental => "ULS accidental",
            LimitStateFamily::UlsSeismic => "ULS seismic",
            LimitStateFamily::SlsCharacteristic => "SLS characteristic",
            LimitStateFamily::SlsFrequent => "SLS frequent",
            LimitStateFamily::SlsQuasiPermanent => "SLS quasi-permanent",
        }
    }

    pub fn limit_state(&self) -> LimitState {
        if self.is_serviceability() {
            LimitState::Serviceability
        } else {
            LimitState::Ultimate
        }
    }

    /// Design situation used for γ lookups. SLS families never look up γ
    /// and report the persistent situation.
    pub fn situation(&self) -> Situation {
        match self {
            LimitStateFamily::UlsAccidental => Situation::Accidental,
            LimitStateFamily::UlsSeismic => Situation::Seismic,
            _ => Situation::PersistentTransient,
        }
    }

    pub fn is_serviceability(&self) -> bool {
        matches!(
            self,
            LimitStateFamily::SlsCharacteristic
                | LimitStateFamily::SlsFrequent
                | LimitStateFamily::SlsQuasiPermanent
        )
    }
}

impl std::fmt::Display for LimitStateFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl std::str::FromStr for LimitStateFamily {
    type Err = ComboError;

    /// Accepts the slug ("uls-seismic") or the label prefix ("ULS-E").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimitStateFamily::ALL
            .into_iter()
            .find(|f| f.slug() == s || f.prefix().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ComboError::invalid_input(
                    "family",
                    s,
                    format!(
                        "Expected one of: {}",
                        LimitStateFamily::ALL.map(|f| f.slug()).join(", ")
                    ),
                )
            })
    }
}
