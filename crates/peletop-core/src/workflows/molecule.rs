use crate::core::graph::InvalidTopologyError;
use crate::core::io::pdb::{self, PdbError};
use crate::core::models::structure::MoleculeStructure;
use crate::core::params::MoleculeParameters;
use crate::core::rotamers::{
    DisconnectedMoleculeError, InvalidResolutionError, RotamerGraph, RotamerLibrary,
};
use crate::core::template::{Template, TemplateBuilder, TemplateError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Everything that can abort a molecule's processing run. Every variant is
/// fatal for that molecule and surfaces the underlying error unmodified;
/// there is no partial or resumable state.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidTopology(#[from] InvalidTopologyError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Disconnected(#[from] DisconnectedMoleculeError),

    #[error(transparent)]
    InvalidResolution(#[from] InvalidResolutionError),

    #[error("the molecule has not been parameterized yet")]
    NotParameterized,
}

/// One molecule moving through the pipeline: its chemical structure, and the
/// template and rotamer library derived from it.
///
/// Collaborators (the parameter set, the sampling resolution) are passed
/// into each step explicitly; the type holds no configuration of its own.
#[derive(Debug, Clone)]
pub struct Molecule {
    structure: MoleculeStructure,
    forcefield: Option<String>,
    template: Option<Template>,
    rotamer_library: Option<RotamerLibrary>,
}

impl Molecule {
    pub fn from_structure(structure: MoleculeStructure) -> Self {
        Self {
            structure,
            forcefield: None,
            template: None,
            rotamer_library: None,
        }
    }

    /// Loads the molecule from a PDB file.
    ///
    /// # Errors
    ///
    /// Returns [`PdbError`] when the file cannot be read or parsed.
    pub fn from_pdb_file(path: &Path) -> Result<Self, PdbError> {
        info!("Loading molecule from {}", path.display());
        Ok(Self::from_structure(pdb::read_file(path)?))
    }

    pub fn name(&self) -> &str {
        &self.structure.name
    }

    pub fn structure(&self) -> &MoleculeStructure {
        &self.structure
    }

    /// The force field the molecule was parameterized with, when known.
    pub fn forcefield(&self) -> Option<&str> {
        self.forcefield.as_deref()
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn rotamer_library(&self) -> Option<&RotamerLibrary> {
        self.rotamer_library.as_ref()
    }

    /// Materializes the topology template from a parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the parameter tables are inconsistent
    /// or point outside the structure.
    pub fn parameterize(
        &mut self,
        parameters: &MoleculeParameters,
    ) -> Result<&Template, PipelineError> {
        info!("Building topology template for {}", self.name());
        let template = TemplateBuilder::new(parameters, &self.structure).build()?;
        self.forcefield = parameters.forcefield.clone();
        self.template = Some(template);
        Ok(self.template.as_ref().unwrap())
    }

    /// Builds the rotamer library at the given sampling resolution, filling
    /// in the core flags and parent links on the template's atoms along the
    /// way.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotParameterized`] before
    /// [`Molecule::parameterize`] has run, and otherwise surfaces the graph
    /// errors unmodified: malformed bonds, a molecule not connected to its
    /// core, or a resolution outside (0, 360) degrees.
    pub fn build_rotamer_library(
        &mut self,
        resolution: f64,
    ) -> Result<&RotamerLibrary, PipelineError> {
        let template = self.template.as_mut().ok_or(PipelineError::NotParameterized)?;

        info!("Generating rotamer library for {}", self.structure.name);
        let connectivity = self.structure.to_graph()?;
        let rotamer_graph = RotamerGraph::new(&connectivity);
        rotamer_graph.assign_parents(&mut template.atoms)?;
        let library =
            rotamer_graph.build_library(&template.atoms, &self.structure.name, resolution)?;

        self.rotamer_library = Some(library);
        Ok(self.rotamer_library.as_ref().unwrap())
    }
}
