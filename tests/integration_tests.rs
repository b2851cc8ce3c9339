//! Integration tests for the rustmin-uff minimization library

use assert_approx_eq::assert_approx_eq;
use nalgebra::Vector3;
use rayon::prelude::*;
use rustmin_uff::forcefield::uff::params::{calc_bond_rest_length, get_uff_params};
use rustmin_uff::io::{read_structure, write_structure};
use rustmin_uff::{
    minimize_energy, minimize_energy_with_config, minimize_subset, AtomicStructure, BondOrder,
    ForceField, FreezeMode, MinimizationConfig, MinimizationError, MolecularTopology,
    UffForceField, VdwMode,
};
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to test data directory
fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test_data")
}

fn ethanol() -> AtomicStructure {
    read_structure(test_data_dir().join("ethanol.json")).expect("Failed to read ethanol.json")
}

fn uff_energy(structure: &AtomicStructure) -> f64 {
    let topology = MolecularTopology::from_structure(structure);
    let force_field = UffForceField::from_topology(&topology).expect("Failed to type structure");
    force_field.energy(&topology.positions)
}

fn position(structure: &AtomicStructure, id: u32) -> Vector3<f64> {
    structure.atom(id).expect("unknown atom id").position
}

/// Dihedral angle a-b-c-d in degrees
fn dihedral(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>, d: Vector3<f64>) -> f64 {
    let n1 = (b - a).cross(&(c - b));
    let n2 = (c - b).cross(&(d - c));
    n1.angle(&n2).to_degrees()
}

#[test]
fn test_diatomic_relaxes_to_rest_length() {
    let mut s = AtomicStructure::new();
    let a = s.add_atom(6, Vector3::new(0.0, 0.0, 0.0));
    let b = s.add_atom(6, Vector3::new(1.8, 0.1, -0.2));
    s.add_bond(a, b, BondOrder::Single).unwrap();

    let result = minimize_energy(&mut s).unwrap();
    assert!(result.converged, "{}", result.message);

    let c3 = get_uff_params("C_3").unwrap();
    let r0 = calc_bond_rest_length(1.0, c3, c3);
    assert_approx_eq!(s.atoms[0].distance(&s.atoms[1]), r0, 1e-3);
    assert_approx_eq!(result.energy, 0.0, 1e-6);
}

#[test]
fn test_uncapped_steps_still_converge() {
    let mut s = AtomicStructure::new();
    let a = s.add_atom(6, Vector3::new(0.0, 0.0, 0.0));
    let b = s.add_atom(6, Vector3::new(1.814, 0.0, 0.0));
    s.add_bond(a, b, BondOrder::Single).unwrap();

    let config = MinimizationConfig {
        max_displacement: 0.0,
        ..MinimizationConfig::default()
    };
    let result = minimize_energy_with_config(&mut s, &config, VdwMode::AllPairs).unwrap();
    assert!(result.converged, "{}", result.message);
    assert!(result.iterations > 0);

    let c3 = get_uff_params("C_3").unwrap();
    let r0 = calc_bond_rest_length(1.0, c3, c3);
    assert_approx_eq!(s.atoms[0].distance(&s.atoms[1]), r0, 1e-3);
}

#[test]
fn test_ethanol_from_file() {
    let mut s = ethanol();
    assert_eq!(s.num_atoms(), 9);
    assert_eq!(s.num_bonds(), 8);

    let initial = uff_energy(&s);
    let result = minimize_energy(&mut s).unwrap();
    assert!(result.converged, "{}", result.message);
    assert!(result.energy < initial);
    assert!(result
        .message
        .starts_with("UFF minimization converged after"));
    assert_approx_eq!(uff_energy(&s), result.energy, 1e-6);
}

#[test]
fn test_minimization_is_idempotent() {
    let mut s = ethanol();
    let first = minimize_energy(&mut s).unwrap();
    let relaxed = s.clone();
    let second = minimize_energy(&mut s).unwrap();

    assert!(second.converged);
    assert_approx_eq!(first.energy, second.energy, 1e-6);
    for (a, b) in s.atoms.iter().zip(&relaxed.atoms) {
        assert!(a.distance(b) < 1e-3, "atom {} moved", a.id);
    }
}

#[test]
fn test_ethane_goes_staggered() {
    let mut s = AtomicStructure::new();
    let c1 = s.add_atom(6, Vector3::new(0.0, 0.0, 0.0));
    let c2 = s.add_atom(6, Vector3::new(1.53, 0.0, 0.0));
    let mut h_ids = Vec::new();
    for (carbon, x, offset) in [(c1, -0.36, 0.0_f64), (c2, 1.89, 10.0)] {
        for k in 0..3 {
            let a = (120.0 * k as f64 + offset).to_radians();
            let h = s.add_atom(1, Vector3::new(x, 1.03 * a.cos(), 1.03 * a.sin()));
            s.add_bond(carbon, h, BondOrder::Single).unwrap();
            h_ids.push(h);
        }
    }
    s.add_bond(c1, c2, BondOrder::Single).unwrap();

    let result = minimize_energy(&mut s).unwrap();
    assert!(result.converged, "{}", result.message);

    let phi = dihedral(
        position(&s, h_ids[0]),
        position(&s, c1),
        position(&s, c2),
        position(&s, h_ids[3]),
    );
    let cos3 = (3.0 * phi.to_radians()).cos();
    assert!((cos3 + 1.0).abs() < 0.05, "dihedral {} is not staggered", phi);
}

#[test]
fn test_formaldehyde_becomes_planar() {
    let mut s = AtomicStructure::new();
    let c = s.add_atom(6, Vector3::new(0.0, 0.0, 0.3));
    let o = s.add_atom(8, Vector3::new(1.2, 0.0, 0.0));
    let h1 = s.add_atom(1, Vector3::new(-0.55, 0.94, 0.0));
    let h2 = s.add_atom(1, Vector3::new(-0.55, -0.94, 0.0));
    s.add_bond(c, o, BondOrder::Double).unwrap();
    s.add_bond(c, h1, BondOrder::Single).unwrap();
    s.add_bond(c, h2, BondOrder::Single).unwrap();

    let result = minimize_energy(&mut s).unwrap();
    assert!(result.converged, "{}", result.message);

    let (pc, po, p1, p2) = (
        position(&s, c),
        position(&s, o),
        position(&s, h1),
        position(&s, h2),
    );
    let normal = (p1 - po).cross(&(p2 - po)).normalize();
    assert!((pc - po).dot(&normal).abs() < 0.02);
}

#[test]
fn test_free_ids_only_moves_selection() {
    let mut s = ethanol();
    let before = s.clone();
    let free: HashSet<u32> = [4].into_iter().collect();
    let result = minimize_subset(
        &mut s,
        &MinimizationConfig::default(),
        VdwMode::AllPairs,
        &FreezeMode::FreeIds(free),
    )
    .unwrap();

    assert!(result.converged, "{}", result.message);
    for (a, b) in s.atoms.iter().zip(&before.atoms) {
        if a.id != 4 {
            assert_eq!(a, b);
        }
    }
    assert!(uff_energy(&s) < uff_energy(&before));
}

#[test]
fn test_freeze_ids_keeps_atoms_fixed() {
    let mut s = ethanol();
    let before = s.clone();
    let frozen: HashSet<u32> = [1, 2, 3].into_iter().collect();
    minimize_subset(
        &mut s,
        &MinimizationConfig::default(),
        VdwMode::AllPairs,
        &FreezeMode::FreezeIds(frozen.clone()),
    )
    .unwrap();

    for id in frozen {
        assert_eq!(position(&s, id), position(&before, id));
    }
    assert_ne!(position(&s, 4), position(&before, 4));
}

#[test]
fn test_unsupported_element_leaves_structure_untouched() {
    let mut s = ethanol();
    let x = s.add_atom(115, Vector3::new(5.0, 0.0, 0.0));
    s.add_bond(3, x, BondOrder::Single).unwrap();
    let before = s.clone();

    let err = minimize_energy(&mut s).unwrap_err();
    assert!(matches!(err, MinimizationError::ForceField(_)));
    assert!(err.to_string().contains("Z=115"));
    assert_eq!(s, before);
}

#[test]
fn test_cutoff_and_all_pairs_agree() {
    let mut all = ethanol();
    let mut cut = ethanol();
    let config = MinimizationConfig::default();
    let r_all = minimize_energy_with_config(&mut all, &config, VdwMode::AllPairs).unwrap();
    let r_cut = minimize_energy_with_config(&mut cut, &config, VdwMode::Cutoff(30.0)).unwrap();
    assert!(r_all.converged && r_cut.converged);
    assert_approx_eq!(r_all.energy, r_cut.energy, 1e-3);
}

#[test]
fn test_iteration_budget_reports_not_converged() {
    let mut s = ethanol();
    let config = MinimizationConfig {
        max_iterations: 1,
        ..MinimizationConfig::default()
    };
    let result = minimize_energy_with_config(&mut s, &config, VdwMode::AllPairs).unwrap();
    assert!(!result.converged);
    assert_eq!(result.iterations, 1);
    assert!(result
        .message
        .starts_with("UFF minimization did not converge after 1 iterations"));
}

#[test]
fn test_placeholder_atoms_are_ignored() {
    let mut s = ethanol();
    let dummy = s.add_atom(0, Vector3::new(0.5, 0.5, 0.5));
    minimize_energy(&mut s).unwrap();
    assert_eq!(position(&s, dummy), Vector3::new(0.5, 0.5, 0.5));
}

#[test]
fn test_parallel_minimizations_are_deterministic() {
    let structures: Vec<AtomicStructure> = (0..4).map(|_| ethanol()).collect();
    let results: Vec<(f64, AtomicStructure)> = structures
        .into_par_iter()
        .map(|mut s| {
            let r = minimize_energy(&mut s).unwrap();
            (r.energy, s)
        })
        .collect();

    for (energy, s) in &results[1..] {
        assert_eq!(*energy, results[0].0);
        assert_eq!(s, &results[0].1);
    }
}

#[test]
fn test_minimized_structure_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ethanol_min.json");

    let mut s = ethanol();
    let result = minimize_energy(&mut s).unwrap();
    write_structure(&s, &path).unwrap();

    let reloaded = read_structure(&path).unwrap();
    assert_eq!(reloaded.bonds, s.bonds);
    for (a, b) in reloaded.atoms.iter().zip(&s.atoms) {
        assert_eq!((a.id, a.atomic_number), (b.id, b.atomic_number));
        assert!(a.distance(b) < 1e-12);
    }
    assert_approx_eq!(uff_energy(&reloaded), result.energy, 1e-6);
}
