//! Assembly of the flat topology template: one typed record per atom, bond,
//! angle and torsion, with PELE field conventions applied at this boundary
//! (underscored atom names, radian angles, optional-parameter defaults).

use crate::core::models::atom::Atom;
use crate::core::models::structure::MoleculeStructure;
use crate::core::models::topology::{Angle, Bond, Improper, Proper};
use crate::core::params::{
    InconsistentParameterSetError, MoleculeParameters, TorsionClass, TorsionKey, TorsionTables,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// `2^(1/6)`, the factor between the Lennard-Jones minimum and sigma.
const RMIN_TO_SIGMA_DIVISOR: f64 = 1.122_462_048_309_373;

/// The assembled topology records of one molecule, in emission order.
/// Immutable once built, except that the rotamer-graph pass later fills in
/// each atom's `core` flag and `parent` link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    pub angles: Vec<Angle>,
    pub propers: Vec<Proper>,
    pub impropers: Vec<Improper>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error(transparent)]
    InconsistentParameters(#[from] InconsistentParameterSetError),

    #[error("parameter tables reference atom index {index}, but the structure has {atom_count} atoms")]
    UnknownAtom { index: usize, atom_count: usize },

    #[error("no van der Waals sigma or rmin_half available for atom {index}")]
    MissingSigma { index: usize },

    #[error("missing {table} entry for atom {index}")]
    MissingAtomParameter { table: &'static str, index: usize },

    #[error("the parameter set covers {covered} atoms, but the structure has {atom_count}")]
    IncompleteAtomSet { covered: usize, atom_count: usize },
}

/// Builds [`Template`]s from a parameter set and the matching chemical
/// structure, both borrowed for the duration of the build.
pub struct TemplateBuilder<'a> {
    parameters: &'a MoleculeParameters,
    structure: &'a MoleculeStructure,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(parameters: &'a MoleculeParameters, structure: &'a MoleculeStructure) -> Self {
        Self {
            parameters,
            structure,
        }
    }

    /// Materializes every record family in one pass.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the parameter tables point outside the
    /// structure, lack a required nonbonded entry, or the torsion tables are
    /// internally inconsistent.
    pub fn build(&self) -> Result<Template, TemplateError> {
        let atoms = self.build_atoms()?;
        // Every structure atom must end up with a record: parent references
        // and rotamer branches later address atoms by position.
        if atoms.len() != self.structure.atom_count() {
            return Err(TemplateError::IncompleteAtomSet {
                covered: atoms.len(),
                atom_count: self.structure.atom_count(),
            });
        }

        Ok(Template {
            atoms,
            bonds: self.build_bonds(),
            angles: self.build_angles(),
            propers: self.build_torsions(&self.parameters.propers, TorsionClass::Proper)?,
            impropers: self.build_torsions(&self.parameters.impropers, TorsionClass::Improper)?,
        })
    }

    /// One atom record per vdW-table key, in index order.
    ///
    /// Sigma falls back to `2 * rmin_half / 2^(1/6)` when the source reports
    /// no sigma at all; the SASA radius is derived as half the sigma. Fields
    /// with no source stay `None` so downstream consumers can tell
    /// "unassigned" from zero.
    fn build_atoms(&self) -> Result<Vec<Atom>, TemplateError> {
        let params = self.parameters;
        let sigmas_all_missing = params.vdw_sigmas.values().all(Option::is_none);

        let mut atoms = Vec::with_capacity(params.vdw_sigmas.len());
        for (&key, &sigma) in &params.vdw_sigmas {
            let [index] = key;
            let source = self.structure.atoms.get(index).ok_or_else(|| {
                TemplateError::UnknownAtom {
                    index,
                    atom_count: self.structure.atom_count(),
                }
            })?;

            let sigma = if sigmas_all_missing {
                params
                    .vdw_rmin_halves
                    .get(&key)
                    .map(|rmin_half| 2.0 * rmin_half / RMIN_TO_SIGMA_DIVISOR)
                    .ok_or(TemplateError::MissingSigma { index })?
            } else {
                sigma.ok_or(TemplateError::MissingSigma { index })?
            };

            // PELE atom names use underscores instead of whitespace.
            let pdb_name = source.pdb_name.replace(' ', "_");

            let mut atom = Atom::new(index, &pdb_name, source.position);
            atom.sigma = sigma;
            atom.epsilon = *params.vdw_epsilons.get(&key).ok_or(
                TemplateError::MissingAtomParameter {
                    table: "epsilon",
                    index,
                },
            )?;
            atom.charge =
                *params
                    .charges
                    .get(&key)
                    .ok_or(TemplateError::MissingAtomParameter {
                        table: "charge",
                        index,
                    })?;
            atom.sasa_radius = Some(sigma / 2.0);
            atom.opls_type = params.opls_types.get(&key).cloned();
            atom.born_radius = params.born_radii.get(&key).copied();
            atom.nonpolar_gamma = params.nonpolar_gammas.get(&key).copied();
            atom.nonpolar_alpha = params.nonpolar_alphas.get(&key).copied();
            atoms.push(atom);
        }
        Ok(atoms)
    }

    fn build_bonds(&self) -> Vec<Bond> {
        self.parameters
            .bond_ks
            .iter()
            .enumerate()
            .map(|(index, (&[atom1, atom2], &spring_constant))| Bond {
                index,
                atom1,
                atom2,
                spring_constant,
                eq_dist: self.parameters.bond_lengths[&[atom1, atom2]],
            })
            .collect()
    }

    fn build_angles(&self) -> Vec<Angle> {
        self.parameters
            .angle_ks
            .iter()
            .enumerate()
            .map(|(index, (&[atom1, atom2, atom3], &spring_constant))| Angle {
                index,
                atom1,
                atom2,
                atom3,
                spring_constant,
                // Angles arrive in degrees; normalize once, here.
                eq_angle: self.parameters.angle_eqs[&[atom1, atom2, atom3]].to_radians(),
            })
            .collect()
    }

    /// Emits one torsion record per quadruple per periodicity term.
    ///
    /// A term is emitted only when periodicity, phase, force constant and
    /// divisor are all present and nonzero; anything else is skipped. This
    /// mirrors the upstream toolkit behavior, where a zero field and an
    /// unset one cannot be told apart, and is deliberate policy rather than
    /// a defect. When the source omitted divisors altogether, every term's
    /// divisor defaults to 1.
    fn build_torsions<T>(
        &self,
        tables: &TorsionTables,
        class: TorsionClass,
    ) -> Result<Vec<T>, InconsistentParameterSetError>
    where
        T: FromTorsionTerm,
    {
        tables.validate(class)?;

        let mut records = Vec::new();
        for (term, periodicities) in tables.periodicities.iter().enumerate() {
            for (&key, &periodicity) in periodicities {
                let phase = tables.phases[term][&key];
                let k = tables.ks[term][&key];
                let idivf = match tables.idivfs.get(term) {
                    Some(idivfs) => idivfs[&key],
                    None => 1,
                };

                if periodicity != 0 && phase != 0.0 && k != 0.0 && idivf != 0 {
                    records.push(T::from_term(key, periodicity, phase.to_radians(), k, idivf));
                } else {
                    debug!(
                        "skipping {} torsion term {:?} with a missing or zero field",
                        class, key
                    );
                }
            }
        }
        Ok(records)
    }
}

/// Constructor hook shared by the proper and improper record types, so both
/// families run through one emission path.
trait FromTorsionTerm {
    fn from_term(key: TorsionKey, periodicity: u32, phase: f64, k: f64, idivf: u32) -> Self;
}

impl FromTorsionTerm for Proper {
    fn from_term([atom1, atom2, atom3, atom4]: TorsionKey, periodicity: u32, phase: f64, k: f64, idivf: u32) -> Self {
        Self {
            atom1,
            atom2,
            atom3,
            atom4,
            periodicity,
            phase,
            k,
            idivf,
        }
    }
}

impl FromTorsionTerm for Improper {
    fn from_term([atom1, atom2, atom3, atom4]: TorsionKey, periodicity: u32, phase: f64, k: f64, idivf: u32) -> Self {
        Self {
            atom1,
            atom2,
            atom3,
            atom4,
            periodicity,
            phase,
            k,
            idivf,
        }
    }
}
