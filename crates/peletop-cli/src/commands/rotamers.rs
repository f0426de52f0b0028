use super::{output_writer, parameterized_molecule};
use crate::cli::RotamersArgs;
use crate::error::Result;
use tracing::info;

pub fn run(args: RotamersArgs) -> Result<()> {
    let (mut molecule, _) = parameterized_molecule(&args.input, &args.parameters)?;

    molecule.build_rotamer_library(args.resolution)?;
    let library = molecule.rotamer_library().expect("library just built");
    let atoms = &molecule.template().expect("parameterization just ran").atoms;

    info!(
        "Rotamer library for '{}': {} branches at {} degrees.",
        library.name,
        library.branches().len(),
        args.resolution,
    );

    let mut writer = output_writer(&args.output)?;
    library.write_pele(atoms, &mut writer)?;
    Ok(())
}
