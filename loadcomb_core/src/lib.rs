//! # loadcomb_core - Load Combination Generation Engine
//!
//! `loadcomb_core` turns a catalog of classified actions (self-weight, imposed
//! loads, snow, wind, accidents, earthquakes) into the complete, de-duplicated
//! set of design load combinations a limit-state code requires. Partial
//! factors and combination factors come from a versioned code profile; EN 1990
//! and a Spanish national annex ship built in.
//!
//! ## Design Philosophy
//!
//! - **Explicit Context**: A run reads only its [`GenerationContext`], never global state
//! - **JSON-First**: Inputs, profiles, combinations and diagnostics all serialize
//! - **Rich Errors**: Structured error types, and a failed family never hides the others
//! - **Deterministic**: The same inputs give the same combinations in the same order
//!
//! ## Quick Start
//!
//! ```rust
//! use loadcomb_core::actions::{Action, ActionCatalog};
//! use loadcomb_core::combinations::LimitStateFamily;
//! use loadcomb_core::engine::GenerationContext;
//! use loadcomb_core::factors::preset;
//!
//! let catalog = ActionCatalog::from_actions([
//!     Action::permanent("G1").named("Self-weight"),
//!     Action::variable("Q1", "A").named("Office floor"),
//!     Action::variable("W1", "wind").named("Wind +X"),
//! ])
//! .unwrap()
//! .freeze()
//! .unwrap();
//!
//! let result = GenerationContext::new(&catalog, preset("en1990").unwrap())
//!     .run(&[LimitStateFamily::UlsPersistent, LimitStateFamily::SlsQuasiPermanent]);
//!
//! for combo in result.container.iter() {
//!     println!("{}: {}", combo.label, combo.expression);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`actions`] - Action categories, the catalog, and relation patterns
//! - [`factors`] - Partial safety factors, ψ factors and code profiles
//! - [`combinations`] - Limit-state families, combinations and their container
//! - [`engine`] - The generation context and run orchestration
//! - [`diagnostics`] - Per-family outcomes and pattern warnings
//! - [`errors`] - Structured error types
//! - [`file_io`] - Input documents, profiles and atomic report saves

pub mod actions;
pub mod combinations;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod factors;
pub mod file_io;

// Re-export commonly used types at crate root for convenience
pub use actions::{Action, ActionCatalog, ActionCategory, FrozenCatalog};
pub use combinations::{Combination, CombinationContainer, LimitStateFamily};
pub use engine::{GenerationContext, RunResult};
pub use errors::{ComboError, ComboResult};
pub use file_io::{load_input, load_profile, load_run, save_run, InputDocument};
