//! The user-facing pipeline: load a structure, parameterize it into a
//! topology template, then partition it into a rotamer library.

pub mod molecule;

pub use molecule::{Molecule, PipelineError};
