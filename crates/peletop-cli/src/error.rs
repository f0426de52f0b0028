use peletop::core::io::pdb::PdbError;
use peletop::core::params::ParameterLoadError;
use peletop::core::solvent::SolventTemplateError;
use peletop::workflows::PipelineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to read structure: {0}")]
    Structure(#[from] PdbError),

    #[error("Failed to load parameters: {0}")]
    Parameters(#[from] ParameterLoadError),

    #[error("Failed to build solvent template: {0}")]
    Solvent(#[from] SolventTemplateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
