//! PELE implicit-solvent templates: the generalized-Born constants and
//! per-atom radius/scale pairs of one molecule, serialized to the JSON shape
//! PELE's solvent machinery reads.

use crate::core::models::structure::MoleculeStructure;
use crate::core::params::{MoleculeParameters, SolventParams};
use serde_json::{Map, Value, json};
use std::io::{self, Write};
use thiserror::Error;
use tracing::warn;

/// The generalized-Born variant a template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolventModel {
    Obc1,
    Obc2,
}

impl SolventModel {
    pub fn name(&self) -> &'static str {
        match self {
            SolventModel::Obc1 => "OBC1",
            SolventModel::Obc2 => "OBC2",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolventTemplateError {
    #[error("the parameter set carries no solvent block")]
    MissingSolventBlock,
    #[error("no solvent radius/scale entry for atom {index}")]
    MissingAtomEntry { index: usize },
}

/// A ready-to-emit solvent template for one molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct SolventTemplate {
    model: SolventModel,
    molecule_name: String,
    solvent_dielectric: f64,
    solute_dielectric: f64,
    surface_area_penalty: f64,
    solvent_radius: f64,
    /// Per-atom `(pdb_name, radius, scale)`, in atom-index order. Names are
    /// already underscored.
    atoms: Vec<(String, f64, f64)>,
}

impl SolventTemplate {
    /// Collects the solvent constants and per-atom parameters for every atom
    /// of `structure`.
    ///
    /// OBC1 is accepted for completeness but PELE does not implement it; a
    /// warning is logged and the template is built anyway.
    ///
    /// # Errors
    ///
    /// Returns [`SolventTemplateError`] when the parameter set has no
    /// solvent block or lacks an entry for one of the structure's atoms.
    pub fn from_parameters(
        model: SolventModel,
        parameters: &MoleculeParameters,
        structure: &MoleculeStructure,
    ) -> Result<Self, SolventTemplateError> {
        if model == SolventModel::Obc1 {
            warn!("OBC1 is not implemented in PELE");
        }

        let solvent: &SolventParams = parameters
            .solvent
            .as_ref()
            .ok_or(SolventTemplateError::MissingSolventBlock)?;

        let mut atoms = Vec::with_capacity(structure.atom_count());
        for atom in &structure.atoms {
            let key = [atom.index];
            let radius = solvent
                .radii
                .get(&key)
                .ok_or(SolventTemplateError::MissingAtomEntry { index: atom.index })?;
            let scale = solvent
                .scales
                .get(&key)
                .ok_or(SolventTemplateError::MissingAtomEntry { index: atom.index })?;
            atoms.push((atom.pdb_name.replace(' ', "_"), *radius, *scale));
        }

        Ok(Self {
            model,
            molecule_name: structure.name.clone(),
            solvent_dielectric: solvent.solvent_dielectric,
            solute_dielectric: solvent.solute_dielectric,
            surface_area_penalty: solvent.surface_area_penalty,
            solvent_radius: solvent.solvent_radius,
            atoms,
        })
    }

    /// The template as the nested JSON value PELE expects:
    /// `SolventParameters` -> `General` constants plus one object per atom
    /// under the molecule's name.
    pub fn to_json(&self) -> Value {
        let mut atom_map = Map::new();
        for (name, radius, scale) in &self.atoms {
            atom_map.insert(
                name.clone(),
                json!({
                    "radius": round_to(*radius, 5),
                    "scale": round_to(*scale, 5),
                }),
            );
        }

        let mut solvent_parameters = Map::new();
        solvent_parameters.insert("Name".to_string(), json!(self.model.name()));
        solvent_parameters.insert(
            "General".to_string(),
            json!({
                "solvent_dielectric": round_to(self.solvent_dielectric, 5),
                "solute_dielectric": round_to(self.solute_dielectric, 5),
                "solvent_radius": round_to(self.solvent_radius, 5),
                "surface_area_penalty": round_to(self.surface_area_penalty, 8),
            }),
        );
        solvent_parameters.insert(self.molecule_name.clone(), Value::Object(atom_map));

        json!({ "SolventParameters": Value::Object(solvent_parameters) })
    }

    /// Writes the pretty-printed JSON template.
    pub fn write_json(&self, writer: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())?;
        Ok(())
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::StructureAtom;
    use nalgebra::Point3;
    use std::collections::BTreeMap;

    fn structure() -> MoleculeStructure {
        MoleculeStructure {
            name: "LIG".to_string(),
            atoms: vec![
                StructureAtom {
                    index: 0,
                    pdb_name: " C1 ".to_string(),
                    element: "C".to_string(),
                    position: Point3::origin(),
                },
                StructureAtom {
                    index: 1,
                    pdb_name: " H1 ".to_string(),
                    element: "H".to_string(),
                    position: Point3::origin(),
                },
            ],
            bonds: vec![(0, 1)],
        }
    }

    fn parameters() -> MoleculeParameters {
        MoleculeParameters {
            solvent: Some(SolventParams {
                solvent_dielectric: 78.3,
                solute_dielectric: 1.0,
                surface_area_penalty: 0.0054321999,
                solvent_radius: 1.4,
                radii: BTreeMap::from([([0], 1.9999999), ([1], 1.2)]),
                scales: BTreeMap::from([([0], 0.72), ([1], 0.85)]),
            }),
            ..MoleculeParameters::default()
        }
    }

    #[test]
    fn template_collects_constants_and_per_atom_entries() {
        let template =
            SolventTemplate::from_parameters(SolventModel::Obc2, &parameters(), &structure())
                .unwrap();
        let value = template.to_json();

        let root = &value["SolventParameters"];
        assert_eq!(root["Name"], "OBC2");
        assert_eq!(root["General"]["solvent_dielectric"], 78.3);
        assert_eq!(root["General"]["solvent_radius"], 1.4);
        // Rounded to eight decimals.
        assert_eq!(root["General"]["surface_area_penalty"], 0.00543220);
        // Atom names are underscored, radii rounded to five decimals.
        assert_eq!(root["LIG"]["_C1_"]["radius"], 2.0);
        assert_eq!(root["LIG"]["_C1_"]["scale"], 0.72);
        assert_eq!(root["LIG"]["_H1_"]["radius"], 1.2);
    }

    #[test]
    fn missing_solvent_block_is_an_error() {
        let result = SolventTemplate::from_parameters(
            SolventModel::Obc2,
            &MoleculeParameters::default(),
            &structure(),
        );
        assert_eq!(result, Err(SolventTemplateError::MissingSolventBlock));
    }

    #[test]
    fn missing_atom_entry_is_an_error() {
        let mut params = parameters();
        params.solvent.as_mut().unwrap().radii.remove(&[1]);

        let result =
            SolventTemplate::from_parameters(SolventModel::Obc2, &params, &structure());
        assert_eq!(
            result,
            Err(SolventTemplateError::MissingAtomEntry { index: 1 })
        );
    }

    #[test]
    fn obc1_is_accepted() {
        let template =
            SolventTemplate::from_parameters(SolventModel::Obc1, &parameters(), &structure())
                .unwrap();
        assert_eq!(template.to_json()["SolventParameters"]["Name"], "OBC1");
    }

    #[test]
    fn write_json_produces_parseable_output() {
        let template =
            SolventTemplate::from_parameters(SolventModel::Obc2, &parameters(), &structure())
                .unwrap();
        let mut out = Vec::new();
        template.write_json(&mut out).unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, template.to_json());
    }
}
