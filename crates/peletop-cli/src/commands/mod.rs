pub mod rotamers;
pub mod solvent;
pub mod template;

use crate::error::Result;
use peletop::core::params::MoleculeParameters;
use peletop::workflows::Molecule;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Loads the structure and its parameter set, and runs the parameterization
/// step shared by every subcommand.
fn parameterized_molecule(
    input: &Path,
    parameters: &Path,
) -> Result<(Molecule, MoleculeParameters)> {
    let mut molecule = Molecule::from_pdb_file(input)?;
    info!(
        "Loaded molecule '{}' with {} atoms.",
        molecule.name(),
        molecule.structure().atom_count()
    );

    let parameters = MoleculeParameters::load(parameters)?;
    molecule.parameterize(&parameters)?;
    Ok((molecule, parameters))
}

/// The requested output file, or stdout when no path was given.
fn output_writer(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stdout())),
    }
}
