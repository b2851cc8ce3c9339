//! RustMin-UFF: molecular energy minimization with the Universal Force Field
//!
//! This library types atoms for UFF, builds bonded and non-bonded interaction
//! lists from a bond graph, and relaxes coordinates with an L-BFGS optimizer
//! that can hold selected atoms fixed.

pub mod atom;
pub mod forcefield;
pub mod grid;
pub mod io;
pub mod optimization;
pub mod structure;
pub mod topology;

// Re-export commonly used types and functions
pub use atom::Atom;
pub use forcefield::uff::{UffForceField, VdwMode};
pub use forcefield::ForceField;
pub use optimization::{
    minimize_energy, minimize_energy_with_config, minimize_subset, minimize_with_force_field,
    FreezeMode, LbfgsResult, MinimizationConfig, MinimizationError, MinimizationResult,
};
pub use structure::{AtomicStructure, Bond, BondOrder};
pub use topology::MolecularTopology;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
