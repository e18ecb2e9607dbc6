use crate::utils::parser::{parse_bool, parse_selection};
use clap::{Args, Parser, Subcommand};
use ringsmith::core::selection::AtomSelection;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Ringsmith CLI - builds circular homo-oligomeric assemblies (rings) from a single protein subunit.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to place subunits in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a ring of N copies of a subunit around the z-axis.
    Build(BuildArgs),
    /// Fit a circle to the xy-projection of a structure and report its radius.
    Fit(FitArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    // --- Core Arguments ---
    /// Input PDB file, relative to the top directory. Its first chain is the
    /// subunit that gets copied, and the fit and alignment reference.
    #[arg(long, alias = "in_structure", required = true, value_name = "PATH")]
    pub in_structure: PathBuf,

    /// Number of subunits in the ring (1 to 52).
    #[arg(long, alias = "no_subunits", value_name = "INT")]
    pub no_subunits: Option<usize>,

    /// Directory the input is read from and the output is written to.
    #[arg(long, value_name = "DIR")]
    pub topdir: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Geometry Overrides ---
    /// Rotation of every subunit around the z-axis, in degrees.
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub z_rotation: Option<f64>,

    /// Rotation of every subunit around its radial axis, in degrees.
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub xy_rotation: Option<f64>,

    /// Rotation of every subunit around its tangential axis, in degrees.
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub tilt: Option<f64>,

    /// Ring radius in Angstroms. When omitted, the radius is fitted to the input.
    #[arg(long, value_name = "ANGSTROM")]
    pub in_radius: Option<f64>,

    // --- Assembly Overrides ---
    /// Separate PDB file whose first chain is used as the subunit.
    #[arg(long, value_name = "PATH")]
    pub monomer: Option<PathBuf>,

    /// Atoms used to superpose each copy onto the input (all, protein, backbone, ca, chain X).
    #[arg(long, value_name = "SEL", value_parser = parse_selection)]
    pub align_selection: Option<AtomSelection>,

    /// Whether to delete the per-subunit files written to intermediate_structures.
    #[arg(long, value_name = "BOOL", value_parser = parse_bool)]
    pub delete_intermediates: Option<bool>,

    /// Output path, overriding the generated file name.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    /// Input PDB file.
    #[arg(long, alias = "in_structure", required = true, value_name = "PATH")]
    pub in_structure: PathBuf,

    /// Atoms whose xy-projection is fitted (all, protein, backbone, ca, chain X).
    #[arg(long, value_name = "SEL", value_parser = parse_selection)]
    pub selection: Option<AtomSelection>,

    /// Write the fit result to this file as TOML.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
