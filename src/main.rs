//! Main executable for rustmin-uff

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rustmin_uff::forcefield::uff::typer::assign_uff_types;
use rustmin_uff::io::{read_structure, write_structure, write_xyz};
use rustmin_uff::{
    minimize_subset, AtomicStructure, ForceField, FreezeMode, MinimizationConfig,
    MinimizationResult, MolecularTopology, UffForceField, VdwMode,
};

/// Command-line arguments for the application
#[derive(Parser, Debug)]
#[clap(
    name = "uffmin",
    version = rustmin_uff::VERSION,
    about = "Relax molecular geometries with the Universal Force Field"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Minimize one or more structures
    Minimize {
        /// JSON structure files
        #[clap(value_parser, required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (single input only)
        #[clap(long, short, value_parser)]
        out: Option<PathBuf>,

        /// Output directory for minimized structures
        #[clap(long, value_parser)]
        dir: Option<PathBuf>,

        /// Also write an XYZ file next to each output
        #[clap(long)]
        xyz: bool,

        /// JSON file with a minimization config; flags below override it
        #[clap(long, short, value_parser)]
        config: Option<PathBuf>,

        /// Maximum number of L-BFGS iterations
        #[clap(long)]
        max_iterations: Option<usize>,

        /// Gradient RMS convergence tolerance (kcal/mol/A)
        #[clap(long)]
        tolerance: Option<f64>,

        /// Number of L-BFGS correction pairs
        #[clap(long)]
        memory: Option<usize>,

        /// Largest per-atom move in one step (Angstroms)
        #[clap(long)]
        max_displacement: Option<f64>,

        /// Only evaluate van der Waals pairs within this distance (Angstroms)
        #[clap(long)]
        vdw_cutoff: Option<f64>,

        /// Atom ids to hold fixed (comma separated)
        #[clap(long, value_delimiter = ',')]
        freeze: Vec<u32>,

        /// Randomly displace free atoms by up to this amount before minimizing
        #[clap(long)]
        perturb: Option<f64>,

        /// Seed for --perturb
        #[clap(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the UFF energy breakdown of a structure
    Energy {
        /// JSON structure file
        #[clap(value_parser)]
        input: PathBuf,

        /// Only evaluate van der Waals pairs within this distance (Angstroms)
        #[clap(long)]
        vdw_cutoff: Option<f64>,
    },

    /// Print the UFF atom type assigned to every atom
    Types {
        /// JSON structure file
        #[clap(value_parser)]
        input: PathBuf,
    },
}

/// Settings shared by every file of a minimize run
struct MinimizeOptions {
    config: MinimizationConfig,
    vdw_mode: VdwMode,
    freeze: FreezeMode,
    perturb: Option<f64>,
    seed: u64,
    xyz: bool,
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Parse command-line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Minimize {
            inputs,
            out,
            dir,
            xyz,
            config,
            max_iterations,
            tolerance,
            memory,
            max_displacement,
            vdw_cutoff,
            freeze,
            perturb,
            seed,
        } => {
            if out.is_some() && inputs.len() > 1 {
                bail!("--out can only be used with a single input; use --dir instead");
            }
            if let Some(amplitude) = perturb {
                if amplitude <= 0.0 {
                    bail!("--perturb must be positive, got {}", amplitude);
                }
            }

            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => MinimizationConfig::default(),
            };
            if let Some(v) = max_iterations {
                config.max_iterations = v;
            }
            if let Some(v) = tolerance {
                config.gradient_rms_tolerance = v;
            }
            if let Some(v) = memory {
                config.memory_size = v;
            }
            if let Some(v) = max_displacement {
                config.max_displacement = v;
            }

            let freeze = if freeze.is_empty() {
                FreezeMode::FreeAll
            } else {
                FreezeMode::FreezeIds(freeze.into_iter().collect::<HashSet<u32>>())
            };

            let options = MinimizeOptions {
                config,
                vdw_mode: vdw_mode(vdw_cutoff),
                freeze,
                perturb,
                seed,
                xyz,
            };

            if let Some(dir_path) = &dir {
                std::fs::create_dir_all(dir_path).with_context(|| {
                    format!("Failed to create output directory: {}", dir_path.display())
                })?;
            }

            // One independent minimization per input file
            let outcomes: Vec<(PathBuf, Result<MinimizationResult>)> = inputs
                .par_iter()
                .enumerate()
                .map(|(index, input)| {
                    let output = output_path(input, out.as_deref(), dir.as_deref());
                    let outcome = minimize_file(input, &output, index, &options);
                    (input.clone(), outcome)
                })
                .collect();

            let mut failures = 0;
            for (input, outcome) in outcomes {
                match outcome {
                    Ok(result) => {
                        println!("{}: {}", input.display(), result.message);
                        if !result.converged {
                            warn!("{} did not converge", input.display());
                        }
                    }
                    Err(e) => {
                        error!("{}: {:#}", input.display(), e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} inputs failed", failures, inputs.len());
            }
            info!("Minimization completed successfully");
        }

        Commands::Energy { input, vdw_cutoff } => {
            let structure = load_structure(&input)?;
            let mode = vdw_mode(vdw_cutoff);
            let topology = match mode {
                VdwMode::AllPairs => MolecularTopology::from_structure(&structure),
                VdwMode::Cutoff(_) => MolecularTopology::from_structure_bonded_only(&structure),
            };
            let force_field = UffForceField::from_topology_with_vdw_mode(&topology, mode)
                .with_context(|| format!("Failed to set up UFF for {}", input.display()))?;

            info!("Using {} force field", force_field.name());
            for component in force_field.energy_components(&topology.positions) {
                println!("{:<16} {:>14.4}", component.name, component.energy);
            }
            println!(
                "{:<16} {:>14.4} kcal/mol",
                "total",
                force_field.energy(&topology.positions)
            );
        }

        Commands::Types { input } => {
            let structure = load_structure(&input)?;
            let topology = MolecularTopology::from_structure_bonded_only(&structure);
            let types = assign_uff_types(&topology.atomic_numbers, &topology.neighbors)
                .with_context(|| format!("Failed to type atoms in {}", input.display()))?;

            for (idx, atom_type) in types.iter().enumerate() {
                let id = topology.atom_ids[idx];
                let symbol = structure.atom(id).map_or("X", |a| a.symbol());
                println!("{:>6} {:<2} {}", id, symbol, atom_type);
            }
        }
    }

    Ok(())
}

fn vdw_mode(cutoff: Option<f64>) -> VdwMode {
    match cutoff {
        Some(r) => VdwMode::Cutoff(r),
        None => VdwMode::AllPairs,
    }
}

fn load_config(path: &Path) -> Result<MinimizationConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn load_structure(path: &Path) -> Result<AtomicStructure> {
    info!("Loading structure: {}", path.display());
    read_structure(path).with_context(|| format!("Failed to read structure: {}", path.display()))
}

/// `--out`, else `<dir>/<stem>_min.json`, else `<stem>_min.json` beside the input
fn output_path(input: &Path, out: Option<&Path>, dir: Option<&Path>) -> PathBuf {
    if let Some(out_path) = out {
        return out_path.to_path_buf();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "structure".to_string());
    let file_name = format!("{}_min.json", stem);
    match dir {
        Some(dir_path) => dir_path.join(file_name),
        None => input.with_file_name(file_name),
    }
}

fn minimize_file(
    input: &Path,
    output: &Path,
    index: usize,
    options: &MinimizeOptions,
) -> Result<MinimizationResult> {
    let mut structure = load_structure(input)?;

    if let Some(amplitude) = options.perturb {
        let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(index as u64));
        perturb(&mut structure, &options.freeze, amplitude, &mut rng);
    }

    let result = minimize_subset(
        &mut structure,
        &options.config,
        options.vdw_mode,
        &options.freeze,
    )
    .with_context(|| format!("Minimization failed for {}", input.display()))?;

    info!("Writing minimized structure to {}", output.display());
    write_structure(&structure, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if options.xyz {
        let xyz_path = output.with_extension("xyz");
        write_xyz(&structure, &result.message, &xyz_path)
            .with_context(|| format!("Failed to write {}", xyz_path.display()))?;
    }

    Ok(result)
}

/// Jitter every non-frozen atom uniformly within `amplitude` per coordinate
fn perturb(structure: &mut AtomicStructure, freeze: &FreezeMode, amplitude: f64, rng: &mut StdRng) {
    for atom in &mut structure.atoms {
        let frozen = match freeze {
            FreezeMode::FreeAll => false,
            FreezeMode::FreezeIds(ids) => ids.contains(&atom.id),
            FreezeMode::FreeIds(ids) => !ids.contains(&atom.id),
        };
        if frozen {
            continue;
        }
        for k in 0..3 {
            atom.position[k] += rng.gen_range(-amplitude..=amplitude);
        }
    }
}
