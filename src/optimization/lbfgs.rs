//! Limited-memory BFGS minimizer over flat Cartesian coordinates
//!
//! Uses the two-loop recursion for the search direction and a backtracking
//! Armijo line search. Frozen atoms have their gradient zeroed on every
//! evaluation and are never written, so they keep their exact input values.

use std::collections::VecDeque;

use log::{debug, trace, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::forcefield::ForceField;

/// Parameters for L-BFGS minimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizationConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,

    /// Converged when the RMS of the free gradient components drops below this
    pub gradient_rms_tolerance: f64,

    /// Number of correction pairs kept
    pub memory_size: usize,

    /// Armijo sufficient-decrease parameter
    pub line_search_c1: f64,

    /// Line search gives up below this step length
    pub line_search_min_step: f64,

    /// Maximum backtracking trials per line search
    pub line_search_max_iter: usize,

    /// Largest distance any atom may move in one step (Angstroms), off if <= 0
    pub max_displacement: f64,
}

impl Default for MinimizationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,          // Enough for small molecules
            gradient_rms_tolerance: 1e-4, // kcal/(mol*A)
            memory_size: 8,               // Correction pairs
            line_search_c1: 1e-4,         // Armijo condition parameter
            line_search_min_step: 1e-16,  // Smallest trial step
            line_search_max_iter: 40,     // Halvings before giving up
            max_displacement: 0.3,        // Angstroms per step
        }
    }
}

/// Outcome of an L-BFGS run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LbfgsResult {
    /// Energy at the returned positions (kcal/mol)
    pub energy: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// True if the gradient RMS fell below the tolerance
    pub converged: bool,
}

/// One (s, y) curvature pair with `rho = 1 / (s . y)`
struct CorrectionPair {
    s: DVector<f64>,
    y: DVector<f64>,
    rho: f64,
}

/// L-BFGS optimizer
#[derive(Debug, Clone, Default)]
pub struct LbfgsOptimizer {
    pub config: MinimizationConfig,
}

impl LbfgsOptimizer {
    /// Create a new optimizer with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new optimizer with custom parameters
    pub fn with_config(config: MinimizationConfig) -> Self {
        Self { config }
    }

    /// Minimize `force_field` starting from `positions`, updating them in place
    ///
    /// `frozen` lists atom indices (not coordinate indices). Duplicates are
    /// ignored; out-of-range indices are skipped with a warning. On
    /// line-search failure the last accepted positions are kept and the
    /// result reports `converged = false`.
    pub fn minimize(
        &self,
        force_field: &dyn ForceField,
        positions: &mut [f64],
        frozen: &[usize],
    ) -> LbfgsResult {
        let config = &self.config;
        let n = positions.len();
        let free = free_mask(n, frozen);
        let num_free = free.iter().filter(|&&f| f).count();

        let mut x = DVector::from_column_slice(positions);
        let mut g = DVector::zeros(n);
        let mut energy = self.evaluate(force_field, &x, &mut g, &free);

        let mut history: VecDeque<CorrectionPair> = VecDeque::with_capacity(config.memory_size);
        let mut trial = x.clone();
        let mut trial_g = DVector::zeros(n);

        for iteration in 0..config.max_iterations {
            let rms = gradient_rms(&g, num_free);
            if iteration % 50 == 0 {
                debug!(
                    "L-BFGS iteration {}: energy {:.6}, gradient RMS {:.3e}",
                    iteration, energy, rms
                );
            }
            if rms < config.gradient_rms_tolerance {
                positions.copy_from_slice(x.as_slice());
                return LbfgsResult {
                    energy,
                    iterations: iteration,
                    converged: true,
                };
            }

            let mut direction = two_loop_direction(&g, &history);
            mask(&mut direction, &free);
            let mut slope = direction.dot(&g);
            if slope >= 0.0 {
                trace!("Not a descent direction, resetting history");
                history.clear();
                direction = -&g;
                slope = direction.dot(&g);
            }

            let mut step = 1.0;
            let largest_move = max_atom_displacement(&direction);
            if config.max_displacement > 0.0 && largest_move > config.max_displacement {
                step = config.max_displacement / largest_move;
            }

            let mut accepted = None;
            for _ in 0..config.line_search_max_iter {
                if step < config.line_search_min_step {
                    break;
                }
                for i in 0..n {
                    if free[i] {
                        trial[i] = x[i] + step * direction[i];
                    }
                }
                let trial_energy = self.evaluate(force_field, &trial, &mut trial_g, &free);
                if trial_energy <= energy + config.line_search_c1 * step * slope {
                    accepted = Some(trial_energy);
                    break;
                }
                step *= 0.5;
            }

            let Some(new_energy) = accepted else {
                warn!(
                    "Line search failed at iteration {} (energy {:.6}, gradient RMS {:.3e})",
                    iteration, energy, rms
                );
                positions.copy_from_slice(x.as_slice());
                return LbfgsResult {
                    energy,
                    iterations: iteration,
                    converged: false,
                };
            };

            let s = &trial - &x;
            let y = &trial_g - &g;
            let sy = s.dot(&y);
            if sy > 1e-10 && config.memory_size > 0 {
                if history.len() == config.memory_size {
                    history.pop_front();
                }
                history.push_back(CorrectionPair { s, y, rho: 1.0 / sy });
            }

            trace!(
                "Iteration {}: step {:.3e}, energy {:.6} -> {:.6}",
                iteration,
                step,
                energy,
                new_energy
            );

            x.copy_from(&trial);
            g.copy_from(&trial_g);
            energy = new_energy;
        }

        positions.copy_from_slice(x.as_slice());
        let converged = gradient_rms(&g, num_free) < config.gradient_rms_tolerance;
        LbfgsResult {
            energy,
            iterations: config.max_iterations,
            converged,
        }
    }

    /// Energy and gradient with frozen components zeroed
    fn evaluate(
        &self,
        force_field: &dyn ForceField,
        x: &DVector<f64>,
        g: &mut DVector<f64>,
        free: &[bool],
    ) -> f64 {
        let energy = force_field.energy_and_gradients(x.as_slice(), g.as_mut_slice());
        mask(g, free);
        energy
    }
}

/// Minimize with an explicit configuration
pub fn minimize_with_force_field(
    force_field: &dyn ForceField,
    positions: &mut [f64],
    config: &MinimizationConfig,
    frozen: &[usize],
) -> LbfgsResult {
    LbfgsOptimizer::with_config(config.clone()).minimize(force_field, positions, frozen)
}

/// Per-coordinate mask, false for the three coordinates of each frozen atom
fn free_mask(num_coords: usize, frozen: &[usize]) -> Vec<bool> {
    let num_atoms = num_coords / 3;
    let mut free = vec![true; num_coords];
    for &atom in frozen {
        if atom >= num_atoms {
            warn!(
                "Ignoring frozen atom index {} (only {} atoms)",
                atom, num_atoms
            );
            continue;
        }
        free[3 * atom..3 * atom + 3].fill(false);
    }
    free
}

fn mask(v: &mut DVector<f64>, free: &[bool]) {
    for (value, &is_free) in v.iter_mut().zip(free) {
        if !is_free {
            *value = 0.0;
        }
    }
}

fn gradient_rms(g: &DVector<f64>, num_free: usize) -> f64 {
    if num_free == 0 {
        return 0.0;
    }
    (g.norm_squared() / num_free as f64).sqrt()
}

fn max_atom_displacement(direction: &DVector<f64>) -> f64 {
    direction
        .as_slice()
        .chunks_exact(3)
        .map(|d| (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt())
        .fold(0.0, f64::max)
}

/// L-BFGS two-loop recursion, steepest descent when the history is empty
fn two_loop_direction(g: &DVector<f64>, history: &VecDeque<CorrectionPair>) -> DVector<f64> {
    let Some(latest) = history.back() else {
        return -g;
    };

    let mut q = g.clone();
    let mut alpha = vec![0.0; history.len()];
    for (i, pair) in history.iter().enumerate().rev() {
        alpha[i] = pair.rho * pair.s.dot(&q);
        q.axpy(-alpha[i], &pair.y, 1.0);
    }

    // Initial Hessian approximation (scaled identity)
    let gamma = latest.s.dot(&latest.y) / latest.y.norm_squared();
    let mut r = q * gamma;

    for (i, pair) in history.iter().enumerate() {
        let beta = pair.rho * pair.y.dot(&r);
        r.axpy(alpha[i] - beta, &pair.s, 1.0);
    }

    -r
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    /// Separable anisotropic quadratic `sum k_i (x_i - c_i)^2`
    struct Quadratic {
        k: Vec<f64>,
        c: Vec<f64>,
    }

    impl Quadratic {
        fn new(n: usize) -> Self {
            Self {
                k: (0..n).map(|i| 1.0 + (i % 5) as f64 * 3.0).collect(),
                c: (0..n).map(|i| (i as f64 * 0.7).sin()).collect(),
            }
        }
    }

    impl ForceField for Quadratic {
        fn name(&self) -> &'static str {
            "quadratic"
        }

        fn energy_and_gradients(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
            let mut e = 0.0;
            for i in 0..positions.len() {
                let d = positions[i] - self.c[i];
                e += self.k[i] * d * d;
                gradients[i] = 2.0 * self.k[i] * d;
            }
            e
        }
    }

    /// Reports the negated gradient, so no step ever decreases the energy
    struct WrongGradient;

    impl ForceField for WrongGradient {
        fn name(&self) -> &'static str {
            "wrong"
        }

        fn energy_and_gradients(&self, positions: &[f64], gradients: &mut [f64]) -> f64 {
            for (g, x) in gradients.iter_mut().zip(positions) {
                *g = -2.0 * x;
            }
            positions.iter().map(|x| x * x).sum()
        }
    }

    #[test]
    fn test_default_config() {
        let config = MinimizationConfig::default();
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.gradient_rms_tolerance, 1e-4);
        assert_eq!(config.memory_size, 8);
        assert_eq!(config.line_search_max_iter, 40);
        assert_eq!(config.max_displacement, 0.3);

        let partial: MinimizationConfig = serde_json::from_str(r#"{"max_iterations": 20}"#).unwrap();
        assert_eq!(partial.max_iterations, 20);
        assert_eq!(partial.memory_size, 8);
    }

    #[test]
    fn test_quadratic_converges_to_minimum() {
        let ff = Quadratic::new(12);
        let mut x = vec![2.0; 12];
        let result = LbfgsOptimizer::new().minimize(&ff, &mut x, &[]);
        assert!(result.converged);
        assert!(result.iterations > 0);
        for (xi, ci) in x.iter().zip(&ff.c) {
            assert_approx_eq!(xi, ci, 1e-3);
        }
        assert!(result.energy < 1e-7);
    }

    #[test]
    fn test_frozen_atoms_bit_identical() {
        let ff = Quadratic::new(9);
        let start = vec![1.5, 0.5, 0.25, 3.0, -0.0, 1.0, 0.1, 0.2, 0.3];
        let mut x = start.clone();
        let result = minimize_with_force_field(&ff, &mut x, &MinimizationConfig::default(), &[1, 1]);
        assert!(result.converged);
        for i in 3..6 {
            assert_eq!(x[i].to_bits(), start[i].to_bits());
        }
        assert_eq!(x[4].to_bits(), (-0.0f64).to_bits());
        assert_approx_eq!(x[0], ff.c[0], 1e-3);
        assert_approx_eq!(x[8], ff.c[8], 1e-3);
    }

    #[test]
    fn test_invalid_frozen_index_ignored() {
        let ff = Quadratic::new(6);
        let mut x = vec![1.0; 6];
        let result = minimize_with_force_field(&ff, &mut x, &MinimizationConfig::default(), &[5]);
        assert!(result.converged);
    }

    #[test]
    fn test_all_frozen_is_converged() {
        let ff = Quadratic::new(6);
        let mut x = vec![1.0; 6];
        let result = LbfgsOptimizer::new().minimize(&ff, &mut x, &[0, 1]);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(x, vec![1.0; 6]);
    }

    #[test]
    fn test_empty_problem() {
        let ff = Quadratic::new(0);
        let mut x: Vec<f64> = Vec::new();
        let result = LbfgsOptimizer::new().minimize(&ff, &mut x, &[]);
        assert!(result.converged);
        assert_eq!(result.energy, 0.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_iteration_budget() {
        let ff = Quadratic::new(30);
        let mut x = vec![5.0; 30];
        let config = MinimizationConfig {
            max_iterations: 2,
            ..MinimizationConfig::default()
        };
        let result = minimize_with_force_field(&ff, &mut x, &config, &[]);
        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_energy_never_increases() {
        let ff = Quadratic::new(15);
        let start = vec![-3.0; 15];
        let mut previous = ff.energy(&start);
        for budget in 1..15 {
            let mut x = start.clone();
            let config = MinimizationConfig {
                max_iterations: budget,
                ..MinimizationConfig::default()
            };
            let result = minimize_with_force_field(&ff, &mut x, &config, &[]);
            assert!(result.energy <= previous + 1e-12, "budget {}", budget);
            assert_approx_eq!(result.energy, ff.energy(&x), 1e-12);
            previous = result.energy;
        }
    }

    #[test]
    fn test_step_respects_max_displacement() {
        let ff = Quadratic::new(3);
        let mut x = vec![100.0, 0.0, 0.0];
        let config = MinimizationConfig {
            max_iterations: 1,
            ..MinimizationConfig::default()
        };
        minimize_with_force_field(&ff, &mut x, &config, &[]);
        let moved = ((x[0] - 100.0).powi(2) + x[1].powi(2) + x[2].powi(2)).sqrt();
        assert!(moved <= 0.3 + 1e-12);
        assert!(moved > 0.0);
    }

    #[test]
    fn test_non_positive_max_displacement_disables_cap() {
        let ff = Quadratic::new(6);
        for cap in [0.0, -1.0] {
            let mut x = vec![5.0; 6];
            let config = MinimizationConfig {
                max_displacement: cap,
                ..MinimizationConfig::default()
            };
            let result = minimize_with_force_field(&ff, &mut x, &config, &[]);
            assert!(result.converged, "cap {}", cap);
            assert!(result.iterations > 0);
            for (xi, ci) in x.iter().zip(&ff.c) {
                assert_approx_eq!(*xi, *ci, 1e-3);
            }
        }
    }

    #[test]
    fn test_line_search_failure_stops_early() {
        let start = vec![1.0, 2.0, -1.0];
        let mut x = start.clone();
        let result = LbfgsOptimizer::new().minimize(&WrongGradient, &mut x, &[]);
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(x, start);
        assert_approx_eq!(result.energy, 6.0, 1e-12);
    }
}
