use clap::{Args, Parser, Subcommand, ValueEnum};
use peletop::core::solvent::SolventModel;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The PELE Platform Developers",
    version,
    about = "peletop - Build PELE topology templates, rotamer libraries and solvent parameter files from parameterized small molecules.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the topology template (atoms, bonds, angles, torsions) of a molecule.
    Template(TemplateArgs),
    /// Build the rotamer library of a molecule at a given sampling resolution.
    Rotamers(RotamersArgs),
    /// Build the implicit-solvent parameter file of a molecule.
    Solvent(SolventArgs),
}

/// Arguments for the `template` subcommand.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Path to the input structure file (PDB with CONECT records).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the molecule's parameter set in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub parameters: PathBuf,

    /// Path for the output JSON file; stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `rotamers` subcommand.
#[derive(Args, Debug)]
pub struct RotamersArgs {
    /// Path to the input structure file (PDB with CONECT records).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the molecule's parameter set in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub parameters: PathBuf,

    /// Sampling resolution in degrees, strictly between 0 and 360.
    #[arg(short, long, default_value_t = 30.0, value_name = "DEGREES")]
    pub resolution: f64,

    /// Path for the output rotamer library; stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `solvent` subcommand.
#[derive(Args, Debug)]
pub struct SolventArgs {
    /// Path to the input structure file (PDB with CONECT records).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the molecule's parameter set in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub parameters: PathBuf,

    /// Generalized-Born variant to emit the template for.
    #[arg(short, long, default_value = "obc2", value_name = "MODEL")]
    pub model: SolventModelArg,

    /// Path for the output JSON file; stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SolventModelArg {
    Obc1,
    Obc2,
}

impl From<SolventModelArg> for SolventModel {
    fn from(arg: SolventModelArg) -> Self {
        match arg {
            SolventModelArg::Obc1 => SolventModel::Obc1,
            SolventModelArg::Obc2 => SolventModel::Obc2,
        }
    }
}
