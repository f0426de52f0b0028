//! The parameter-provider data model: per-atom, per-bond, per-angle and
//! per-torsion force-field constants keyed by fixed-size atom-index tuples,
//! plus the TOML file format they are loaded from.
//!
//! The file format is entry lists (`[[vdw]]`, `[[bonds]]`, ...); loading
//! folds the entries into the tuple-keyed tables the template builder
//! consumes. Angles and torsion phases arrive in degrees and are kept that
//! way here; the degree-to-radian conversion happens once, in the builder.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Lookup key for per-atom tables.
pub type AtomKey = [usize; 1];
/// Lookup key for per-bond tables.
pub type BondKey = [usize; 2];
/// Lookup key for per-angle tables.
pub type AngleKey = [usize; 3];
/// Lookup key for per-torsion tables.
pub type TorsionKey = [usize; 4];

/// Which torsion family a table describes; propers and impropers share all
/// of the table machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorsionClass {
    Proper,
    Improper,
}

impl fmt::Display for TorsionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TorsionClass::Proper => write!(f, "proper"),
            TorsionClass::Improper => write!(f, "improper"),
        }
    }
}

/// The parameter provider's torsion tables for one torsion class, as
/// parallel per-term maps: slot `t` of each `Vec` holds the `t`-th
/// periodicity term for every quadruple that has one.
///
/// `idivfs` may be empty as a whole (the source omitted divisors entirely);
/// the builder then defaults every divisor to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TorsionTables {
    pub periodicities: Vec<BTreeMap<TorsionKey, u32>>,
    /// Phase offsets in degrees.
    pub phases: Vec<BTreeMap<TorsionKey, f64>>,
    pub ks: Vec<BTreeMap<TorsionKey, f64>>,
    pub idivfs: Vec<BTreeMap<TorsionKey, u32>>,
}

/// The parameter-provider tables for a given torsion class disagree with
/// each other. This is a broken provider contract, not a property of the
/// molecule; nothing downstream can repair it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InconsistentParameterSetError {
    #[error(
        "{class} torsion tables have mismatched term counts (periodicities: {periodicities}, phases: {phases}, ks: {ks}, idivfs: {idivfs})"
    )]
    TermCountMismatch {
        class: TorsionClass,
        periodicities: usize,
        phases: usize,
        ks: usize,
        idivfs: usize,
    },
    #[error("{class} torsion tables disagree on atom quadruples in term {term}")]
    KeySetMismatch { class: TorsionClass, term: usize },
}

impl TorsionTables {
    /// Checks that the parallel tables agree: equal term counts
    /// (`idivfs` may instead be absent altogether) and, per term, identical
    /// quadruple key sets.
    ///
    /// # Errors
    ///
    /// Returns [`InconsistentParameterSetError`] describing the first
    /// disagreement found.
    pub fn validate(&self, class: TorsionClass) -> Result<(), InconsistentParameterSetError> {
        let terms = self.periodicities.len();
        let idivfs_ok = self.idivfs.is_empty() || self.idivfs.len() == terms;
        if self.phases.len() != terms || self.ks.len() != terms || !idivfs_ok {
            return Err(InconsistentParameterSetError::TermCountMismatch {
                class,
                periodicities: terms,
                phases: self.phases.len(),
                ks: self.ks.len(),
                idivfs: self.idivfs.len(),
            });
        }

        for term in 0..terms {
            let keys: Vec<&TorsionKey> = self.periodicities[term].keys().collect();
            let phases: Vec<&TorsionKey> = self.phases[term].keys().collect();
            let ks: Vec<&TorsionKey> = self.ks[term].keys().collect();
            if keys != phases || keys != ks {
                return Err(InconsistentParameterSetError::KeySetMismatch { class, term });
            }
            if let Some(idivfs) = self.idivfs.get(term) {
                let idivf_keys: Vec<&TorsionKey> = idivfs.keys().collect();
                if keys != idivf_keys {
                    return Err(InconsistentParameterSetError::KeySetMismatch { class, term });
                }
            }
        }
        Ok(())
    }
}

/// Everything the parameter provider knows about one molecule, folded into
/// tuple-keyed tables. Read-only input for a single processing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeParameters {
    /// Name of the force field the parameters came from, when known.
    pub forcefield: Option<String>,
    /// Van der Waals sigma per atom, in Angstroms. A `None` value means the
    /// source reported the radius as `rmin_half` instead.
    pub vdw_sigmas: BTreeMap<AtomKey, Option<f64>>,
    /// Van der Waals rmin-half per atom, the fallback sigma source.
    pub vdw_rmin_halves: BTreeMap<AtomKey, f64>,
    /// Van der Waals well depth per atom, in kcal/mol.
    pub vdw_epsilons: BTreeMap<AtomKey, f64>,
    /// Partial charge per atom, in elementary charge units.
    pub charges: BTreeMap<AtomKey, f64>,
    /// Equilibrium bond length per bonded pair, in Angstroms.
    pub bond_lengths: BTreeMap<BondKey, f64>,
    /// Bond spring constant per bonded pair, in kcal/mol/A^2.
    pub bond_ks: BTreeMap<BondKey, f64>,
    /// Equilibrium angle per angle triple, in degrees.
    pub angle_eqs: BTreeMap<AngleKey, f64>,
    /// Angle spring constant per angle triple, in kcal/mol/rad^2.
    pub angle_ks: BTreeMap<AngleKey, f64>,
    pub propers: TorsionTables,
    pub impropers: TorsionTables,
    /// Implicit-solvent Born radius per atom, when the provider has one.
    pub born_radii: BTreeMap<AtomKey, f64>,
    /// SGB nonpolar gamma per atom, when the provider has one.
    pub nonpolar_gammas: BTreeMap<AtomKey, f64>,
    /// SGB nonpolar alpha per atom, when the provider has one.
    pub nonpolar_alphas: BTreeMap<AtomKey, f64>,
    /// OPLS-style atom type per atom, when the provider has one.
    pub opls_types: BTreeMap<AtomKey, String>,
    /// Generalized-Born solvent block, when the provider has one.
    pub solvent: Option<SolventParams>,
}

/// Generalized-Born solvent constants plus per-atom radius/scale pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SolventParams {
    pub solvent_dielectric: f64,
    pub solute_dielectric: f64,
    /// Surface-area penalty in kcal/mol/A^2.
    pub surface_area_penalty: f64,
    /// Probe radius of the solvent in Angstroms.
    pub solvent_radius: f64,
    /// GBSA radius per atom, in Angstroms.
    pub radii: BTreeMap<AtomKey, f64>,
    /// GBSA scale factor per atom.
    pub scales: BTreeMap<AtomKey, f64>,
}

#[derive(Debug, Error)]
pub enum ParameterLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVdwEntry {
    atom: usize,
    sigma: Option<f64>,
    rmin_half: Option<f64>,
    epsilon: f64,
    charge: f64,
    opls_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBondEntry {
    atoms: BondKey,
    spring_constant: f64,
    eq_dist: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAngleEntry {
    atoms: AngleKey,
    spring_constant: f64,
    eq_angle: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTorsionEntry {
    atoms: TorsionKey,
    periodicity: u32,
    phase: f64,
    k: f64,
    idivf: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSgbEntry {
    atom: usize,
    born_radius: Option<f64>,
    nonpolar_gamma: Option<f64>,
    nonpolar_alpha: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSolventAtomEntry {
    atom: usize,
    radius: f64,
    scale: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSolventBlock {
    solvent_dielectric: f64,
    solute_dielectric: f64,
    surface_area_penalty: f64,
    solvent_radius: f64,
    #[serde(default)]
    atoms: Vec<RawSolventAtomEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParameterFile {
    forcefield: Option<String>,
    #[serde(default)]
    vdw: Vec<RawVdwEntry>,
    #[serde(default)]
    bonds: Vec<RawBondEntry>,
    #[serde(default)]
    angles: Vec<RawAngleEntry>,
    #[serde(default)]
    propers: Vec<RawTorsionEntry>,
    #[serde(default)]
    impropers: Vec<RawTorsionEntry>,
    #[serde(default)]
    sgb: Vec<RawSgbEntry>,
    solvent: Option<RawSolventBlock>,
}

impl MoleculeParameters {
    /// Loads a parameter set from its TOML file representation.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterLoadError`] when the file cannot be read or is not
    /// valid TOML of the expected shape.
    pub fn load(path: &Path) -> Result<Self, ParameterLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParameterLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawParameterFile =
            toml::from_str(&content).map_err(|e| ParameterLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawParameterFile) -> Self {
        let mut params = Self {
            forcefield: raw.forcefield,
            ..Self::default()
        };

        for entry in raw.vdw {
            let key = [entry.atom];
            params.vdw_sigmas.insert(key, entry.sigma);
            if let Some(rmin_half) = entry.rmin_half {
                params.vdw_rmin_halves.insert(key, rmin_half);
            }
            params.vdw_epsilons.insert(key, entry.epsilon);
            params.charges.insert(key, entry.charge);
            if let Some(opls_type) = entry.opls_type {
                params.opls_types.insert(key, opls_type);
            }
        }

        for entry in raw.bonds {
            params.bond_ks.insert(entry.atoms, entry.spring_constant);
            params.bond_lengths.insert(entry.atoms, entry.eq_dist);
        }

        for entry in raw.angles {
            params.angle_ks.insert(entry.atoms, entry.spring_constant);
            params.angle_eqs.insert(entry.atoms, entry.eq_angle);
        }

        params.propers = fold_torsion_entries(raw.propers);
        params.impropers = fold_torsion_entries(raw.impropers);

        for entry in raw.sgb {
            let key = [entry.atom];
            if let Some(born_radius) = entry.born_radius {
                params.born_radii.insert(key, born_radius);
            }
            if let Some(gamma) = entry.nonpolar_gamma {
                params.nonpolar_gammas.insert(key, gamma);
            }
            if let Some(alpha) = entry.nonpolar_alpha {
                params.nonpolar_alphas.insert(key, alpha);
            }
        }

        if let Some(solvent) = raw.solvent {
            let mut radii = BTreeMap::new();
            let mut scales = BTreeMap::new();
            for entry in solvent.atoms {
                radii.insert([entry.atom], entry.radius);
                scales.insert([entry.atom], entry.scale);
            }
            params.solvent = Some(SolventParams {
                solvent_dielectric: solvent.solvent_dielectric,
                solute_dielectric: solvent.solute_dielectric,
                surface_area_penalty: solvent.surface_area_penalty,
                solvent_radius: solvent.solvent_radius,
                radii,
                scales,
            });
        }

        params
    }
}

/// Folds a flat entry list into parallel per-term tables: the n-th entry for
/// a given quadruple lands in term slot n. Divisors are folded only from
/// entries that carry one, so a source that omits `idivf` everywhere yields
/// empty `idivfs` and the builder's default-to-1 path.
fn fold_torsion_entries(entries: Vec<RawTorsionEntry>) -> TorsionTables {
    let mut tables = TorsionTables::default();
    let mut term_of: BTreeMap<TorsionKey, usize> = BTreeMap::new();

    for entry in entries {
        let term = term_of.entry(entry.atoms).or_insert(0);
        if tables.periodicities.len() == *term {
            tables.periodicities.push(BTreeMap::new());
            tables.phases.push(BTreeMap::new());
            tables.ks.push(BTreeMap::new());
        }
        tables.periodicities[*term].insert(entry.atoms, entry.periodicity);
        tables.phases[*term].insert(entry.atoms, entry.phase);
        tables.ks[*term].insert(entry.atoms, entry.k);
        if let Some(idivf) = entry.idivf {
            while tables.idivfs.len() <= *term {
                tables.idivfs.push(BTreeMap::new());
            }
            tables.idivfs[*term].insert(entry.atoms, idivf);
        }
        *term += 1;
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE_PARAMS: &str = r#"
forcefield = "openff_unconstrained-1.2.0"

[[vdw]]
atom = 0
sigma = 3.48
epsilon = 0.0868
charge = -0.13
[[vdw]]
atom = 1
sigma = 2.58
epsilon = 0.0157
charge = 0.13

[[bonds]]
atoms = [0, 1]
spring_constant = 376.9
eq_dist = 1.094

[[angles]]
atoms = [0, 1, 2]
spring_constant = 33.78
eq_angle = 110.5

[[propers]]
atoms = [0, 1, 2, 3]
periodicity = 1
phase = 0.0
k = 1.2
[[propers]]
atoms = [0, 1, 2, 3]
periodicity = 3
phase = 180.0
k = 0.5

[[sgb]]
atom = 0
born_radius = 1.45

[solvent]
solvent_dielectric = 78.3
solute_dielectric = 1.0
surface_area_penalty = 0.005
solvent_radius = 1.4

[[solvent.atoms]]
atom = 0
radius = 1.2
scale = 0.85
"#;

    fn load_sample() -> MoleculeParameters {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.toml");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", SAMPLE_PARAMS).unwrap();
        MoleculeParameters::load(&path).unwrap()
    }

    #[test]
    fn load_folds_entries_into_tuple_keyed_tables() {
        let params = load_sample();

        assert_eq!(
            params.forcefield.as_deref(),
            Some("openff_unconstrained-1.2.0")
        );
        assert_eq!(params.vdw_sigmas.get(&[0]), Some(&Some(3.48)));
        assert_eq!(params.vdw_epsilons.get(&[1]), Some(&0.0157));
        assert_eq!(params.charges.get(&[0]), Some(&-0.13));
        assert_eq!(params.bond_ks.get(&[0, 1]), Some(&376.9));
        assert_eq!(params.bond_lengths.get(&[0, 1]), Some(&1.094));
        assert_eq!(params.angle_eqs.get(&[0, 1, 2]), Some(&110.5));
        assert_eq!(params.born_radii.get(&[0]), Some(&1.45));
        assert!(params.nonpolar_gammas.is_empty());
    }

    #[test]
    fn repeated_quadruples_become_successive_terms() {
        let params = load_sample();

        assert_eq!(params.propers.periodicities.len(), 2);
        assert_eq!(params.propers.periodicities[0].get(&[0, 1, 2, 3]), Some(&1));
        assert_eq!(params.propers.periodicities[1].get(&[0, 1, 2, 3]), Some(&3));
        assert_eq!(params.propers.phases[1].get(&[0, 1, 2, 3]), Some(&180.0));
        // No entry carried a divisor, so the table stays empty as a whole.
        assert!(params.propers.idivfs.is_empty());
    }

    #[test]
    fn solvent_block_is_optional_but_complete_when_present() {
        let params = load_sample();
        let solvent = params.solvent.as_ref().unwrap();

        assert_eq!(solvent.solvent_dielectric, 78.3);
        assert_eq!(solvent.solvent_radius, 1.4);
        assert_eq!(solvent.radii.get(&[0]), Some(&1.2));
        assert_eq!(solvent.scales.get(&[0]), Some(&0.85));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("params.toml");
        let mut file = File::create(&path).unwrap();
        write!(file, "[[vdw]]\natom = \"zero\"\n").unwrap();

        assert!(matches!(
            MoleculeParameters::load(&path),
            Err(ParameterLoadError::Toml { .. })
        ));
    }

    #[test]
    fn validate_accepts_consistent_tables() {
        let params = load_sample();
        assert!(params.propers.validate(TorsionClass::Proper).is_ok());
        assert!(params.impropers.validate(TorsionClass::Improper).is_ok());
    }

    #[test]
    fn validate_rejects_term_count_mismatch() {
        let mut tables = load_sample().propers;
        tables.phases.pop();

        assert_eq!(
            tables.validate(TorsionClass::Proper),
            Err(InconsistentParameterSetError::TermCountMismatch {
                class: TorsionClass::Proper,
                periodicities: 2,
                phases: 1,
                ks: 2,
                idivfs: 0,
            })
        );
    }

    #[test]
    fn validate_rejects_key_set_mismatch() {
        let mut tables = load_sample().propers;
        tables.ks[1].insert([4, 5, 6, 7], 2.0);

        assert_eq!(
            tables.validate(TorsionClass::Proper),
            Err(InconsistentParameterSetError::KeySetMismatch {
                class: TorsionClass::Proper,
                term: 1,
            })
        );
    }

    #[test]
    fn partially_present_divisors_fail_validation() {
        let entries = vec![
            RawTorsionEntry {
                atoms: [0, 1, 2, 3],
                periodicity: 1,
                phase: 0.0,
                k: 1.0,
                idivf: Some(1),
            },
            RawTorsionEntry {
                atoms: [1, 2, 3, 4],
                periodicity: 1,
                phase: 0.0,
                k: 1.0,
                idivf: None,
            },
        ];
        let tables = fold_torsion_entries(entries);

        assert_eq!(
            tables.validate(TorsionClass::Proper),
            Err(InconsistentParameterSetError::KeySetMismatch {
                class: TorsionClass::Proper,
                term: 0,
            })
        );
    }
}
