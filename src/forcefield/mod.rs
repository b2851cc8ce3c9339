//! Force field abstraction for energy minimization

pub mod uff;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while setting up a force field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForceFieldError {
    #[error("No UFF atom type for atom {index} (Z={atomic_number})")]
    UntypedAtom { index: usize, atomic_number: u8 },

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Trait representing a force field over a flat coordinate buffer
///
/// Positions and gradients are laid out as `[x0, y0, z0, x1, y1, z1, ...]`.
/// The Send + Sync bounds allow independent minimizations on rayon workers.
pub trait ForceField: Send + Sync {
    /// Get the name of the force field
    fn name(&self) -> &'static str;

    /// Total energy (kcal/mol) and its gradient
    ///
    /// `gradients` is overwritten: it is zeroed first, then every term
    /// accumulates into it.
    fn energy_and_gradients(&self, positions: &[f64], gradients: &mut [f64]) -> f64;

    /// Total energy (kcal/mol)
    fn energy(&self, positions: &[f64]) -> f64 {
        let mut scratch = vec![0.0; positions.len()];
        self.energy_and_gradients(positions, &mut scratch)
    }
}

/// One named contribution to the total energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyComponent {
    pub name: String,
    pub energy: f64,
}

impl EnergyComponent {
    pub fn new(name: &str, energy: f64) -> Self {
        Self {
            name: name.to_string(),
            energy,
        }
    }
}
