use super::{output_writer, parameterized_molecule};
use crate::cli::TemplateArgs;
use crate::error::Result;
use std::io::Write;
use tracing::info;

pub fn run(args: TemplateArgs) -> Result<()> {
    let (molecule, _) = parameterized_molecule(&args.input, &args.parameters)?;
    let template = molecule.template().expect("parameterization just ran");

    info!(
        "Template for '{}': {} atoms, {} bonds, {} angles, {} propers, {} impropers.",
        molecule.name(),
        template.atoms.len(),
        template.bonds.len(),
        template.angles.len(),
        template.propers.len(),
        template.impropers.len(),
    );

    let mut writer = output_writer(&args.output)?;
    serde_json::to_writer_pretty(&mut writer, template)
        .map_err(|e| crate::error::CliError::Io(e.into()))?;
    writeln!(writer)?;
    Ok(())
}
