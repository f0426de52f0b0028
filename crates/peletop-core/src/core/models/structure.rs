use crate::core::graph::{ConnectivityGraph, InvalidTopologyError};
use crate::core::utils::elements;
use nalgebra::Point3;

/// One atom as handed over by the chemical-structure provider: identity,
/// element and coordinates, but no force-field parameters yet.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureAtom {
    /// Stable, 0-based index of the atom within the molecule.
    pub index: usize,
    /// PDB-style atom name, exactly as the source file spells it.
    pub pdb_name: String,
    /// Element symbol (e.g. "C", "Cl").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl StructureAtom {
    pub fn is_hydrogen(&self) -> bool {
        elements::is_hydrogen(&self.element)
    }

    pub fn is_heavy(&self) -> bool {
        !self.is_hydrogen()
    }
}

/// The chemical structure of one molecule: atom list plus bond list, the raw
/// material for both the topology template and the rotamer graph.
///
/// Read-only for the lifetime of a processing run; every downstream record
/// refers back to these atoms through their indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeStructure {
    /// Molecule name, up to three upper-case characters (PELE residue-name
    /// convention).
    pub name: String,
    pub atoms: Vec<StructureAtom>,
    /// Undirected bonds as unordered atom-index pairs.
    pub bonds: Vec<(usize, usize)>,
}

impl MoleculeStructure {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Sets the molecule name following the PELE residue-name convention:
    /// names shorter than three characters are ignored, longer ones are
    /// truncated to three and upper-cased.
    pub fn set_name(&mut self, name: &str) {
        if name.len() > 2 {
            self.name = name[0..3].to_uppercase();
        }
    }

    /// Materializes the bond list into a connectivity graph.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTopologyError`] when a bond references an atom index
    /// outside the atom list or both of its endpoints are the same atom.
    pub fn to_graph(&self) -> Result<ConnectivityGraph, InvalidTopologyError> {
        ConnectivityGraph::from_bonds(self.atom_count(), &self.bonds)
    }
}
