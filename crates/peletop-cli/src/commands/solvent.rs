use super::{output_writer, parameterized_molecule};
use crate::cli::SolventArgs;
use crate::error::Result;
use peletop::core::solvent::SolventTemplate;
use std::io::Write;
use tracing::info;

pub fn run(args: SolventArgs) -> Result<()> {
    let (molecule, parameters) = parameterized_molecule(&args.input, &args.parameters)?;

    let template =
        SolventTemplate::from_parameters(args.model.into(), &parameters, molecule.structure())?;
    info!(
        "Solvent template for '{}' using the {:?} model.",
        molecule.name(),
        args.model,
    );

    let mut writer = output_writer(&args.output)?;
    template.write_json(&mut writer)?;
    writeln!(writer)?;
    Ok(())
}
