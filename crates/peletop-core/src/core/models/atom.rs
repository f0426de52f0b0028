use nalgebra::Point3;
use serde::Serialize;

/// Parent link of an atom in the rotamer spanning tree.
///
/// The tree root is modeled with a dedicated variant rather than a
/// self-referential index, so that "this atom is the root" can never be
/// confused with a parent that merely happens to compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Parentage {
    /// No parent assigned yet; the spanning-tree pass has not run.
    #[default]
    Unassigned,
    /// This atom is the root of the spanning tree.
    Root,
    /// The atom hangs off the given parent atom index.
    Child(usize),
}

impl Parentage {
    pub fn is_root(&self) -> bool {
        matches!(self, Parentage::Root)
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, Parentage::Unassigned)
    }

    /// The parent atom index, or `None` for the root and unassigned atoms.
    pub fn parent_index(&self) -> Option<usize> {
        match self {
            Parentage::Child(index) => Some(*index),
            _ => None,
        }
    }
}

/// A fully parameterized atom record of a PELE topology template.
///
/// Nonbonded parameters (`sigma`, `epsilon`, `charge`) are always populated by
/// the template builder. The implicit-solvent fields and the OPLS type tag are
/// `Option`s: `None` means "no source assigned one", which downstream
/// consumers must be able to tell apart from a legitimate zero.
///
/// `core` and `parent` stay at their defaults until the rotamer-graph pass
/// revisits the already-built atoms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Atom {
    /// Stable, 0-based index of the atom within the molecule.
    pub index: usize,
    /// PDB-style atom name, with spaces replaced by underscores.
    pub pdb_name: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Van der Waals sigma in Angstroms.
    pub sigma: f64,
    /// Van der Waals well depth in kcal/mol.
    pub epsilon: f64,
    /// Partial atomic charge in elementary charge units.
    pub charge: f64,
    /// OPLS-style atom type tag, when a source supplies one.
    pub opls_type: Option<String>,
    /// Implicit-solvent Born radius in Angstroms, pending assignment.
    pub born_radius: Option<f64>,
    /// SASA radius in Angstroms (half the van der Waals sigma when no
    /// explicit solvent-radius source exists).
    pub sasa_radius: Option<f64>,
    /// SGB nonpolar gamma term, pending assignment.
    pub nonpolar_gamma: Option<f64>,
    /// SGB nonpolar alpha term, pending assignment.
    pub nonpolar_alpha: Option<f64>,
    /// Whether the atom belongs to the rigid core; unset until the
    /// rotamer-graph pass classifies it.
    pub core: Option<bool>,
    /// Parent link in the rotamer spanning tree.
    pub parent: Parentage,
}

impl Atom {
    /// Creates an atom with the given identity and position; every other
    /// field starts at its "unassigned" default.
    pub fn new(index: usize, pdb_name: &str, position: Point3<f64>) -> Self {
        Self {
            index,
            pdb_name: pdb_name.to_string(),
            position,
            sigma: 0.0,
            epsilon: 0.0,
            charge: 0.0,
            opls_type: None,
            born_radius: None,
            sasa_radius: None,
            nonpolar_gamma: None,
            nonpolar_alpha: None,
            core: None,
            parent: Parentage::Unassigned,
        }
    }

    pub fn set_as_core(&mut self) {
        self.core = Some(true);
    }

    pub fn set_as_branch(&mut self) {
        self.core = Some(false);
    }

    pub fn is_core(&self) -> bool {
        self.core == Some(true)
    }
}
