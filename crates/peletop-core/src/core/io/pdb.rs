//! A compact PDB reader for single-ligand structures: ATOM/HETATM records
//! plus CONECT connectivity, no bond inference.

use crate::core::models::structure::{MoleculeStructure, StructureAtom};
use crate::core::utils::elements;
use nalgebra::Point3;
use std::collections::{BTreeSet, HashMap};
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("The file contains no ATOM or HETATM records")]
    NoAtoms,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Unknown element symbol '{symbol}'")]
    UnknownElement { symbol: String },
    #[error("CONECT references unknown atom serial {serial}")]
    DanglingConect { serial: usize },
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// Reads a ligand structure from a PDB stream.
///
/// The molecule name is taken from the first record's residue name,
/// truncated and upper-cased per the PELE convention. Atom indices follow
/// record order; CONECT serials are resolved against the records seen.
///
/// # Errors
///
/// Returns [`PdbError`] on malformed records, duplicate serials, unknown
/// elements, CONECT references to absent atoms, or a file without atoms.
pub fn read_from(reader: &mut impl BufRead) -> Result<MoleculeStructure, PdbError> {
    let mut structure = MoleculeStructure::default();
    let mut serial_to_index: HashMap<usize, usize> = HashMap::new();
    let mut bonds: BTreeSet<(usize, usize)> = BTreeSet::new();

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;
        let record_type = slice_and_trim(&line, 0, 6);

        match record_type {
            "ATOM" | "HETATM" => {
                let serial = parse_int(&line, 6, 11, line_num)?;
                let name = slice_and_trim(&line, 12, 16);
                if name.is_empty() {
                    return Err(PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::MissingRequiredField {
                            columns: "13-16".into(),
                        },
                    });
                }
                let residue_name = slice_and_trim(&line, 17, 20);
                let x = parse_float(&line, 30, 38, line_num)?;
                let y = parse_float(&line, 38, 46, line_num)?;
                let z = parse_float(&line, 46, 54, line_num)?;
                let element = parse_element(&line, name, line_num)?;

                let index = structure.atoms.len();
                if serial_to_index.insert(serial, index).is_some() {
                    return Err(PdbError::Inconsistency(format!(
                        "Duplicate atom serial: {}",
                        serial
                    )));
                }
                if structure.atoms.is_empty() {
                    structure.set_name(residue_name);
                }

                // Keep the name as spelled; the template builder applies the
                // underscore convention.
                structure.atoms.push(StructureAtom {
                    index,
                    pdb_name: line.get(12..16).unwrap_or(name).to_string(),
                    element,
                    position: Point3::new(x, y, z),
                });
            }
            "CONECT" => {
                let origin = parse_int(&line, 6, 11, line_num)?;
                let origin = resolve_serial(&serial_to_index, origin, line_num)?;
                for columns in [(11, 16), (16, 21), (21, 26), (26, 31)] {
                    let field = slice_and_trim(&line, columns.0, columns.1);
                    if field.is_empty() {
                        continue;
                    }
                    let serial = parse_int(&line, columns.0, columns.1, line_num)?;
                    let partner = resolve_serial(&serial_to_index, serial, line_num)?;
                    bonds.insert((origin.min(partner), origin.max(partner)));
                }
            }
            _ => {}
        }
    }

    if structure.atoms.is_empty() {
        return Err(PdbError::NoAtoms);
    }

    structure.bonds = bonds.into_iter().collect();
    Ok(structure)
}

/// Reads a ligand structure from a PDB file on disk.
pub fn read_file(path: &Path) -> Result<MoleculeStructure, PdbError> {
    let file = std::fs::File::open(path)?;
    read_from(&mut io::BufReader::new(file))
}

fn parse_int(line: &str, start: usize, end: usize, line_num: usize) -> Result<usize, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// Element from columns 77-78, falling back to the first alphabetic
/// character of the atom name for files that leave the element field blank.
fn parse_element(line: &str, atom_name: &str, line_num: usize) -> Result<String, PdbError> {
    let symbol = slice_and_trim(line, 76, 78);
    let symbol = if symbol.is_empty() {
        atom_name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_string())
            .unwrap_or_default()
    } else {
        symbol.to_string()
    };

    if elements::atomic_number(&symbol).is_none() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::UnknownElement { symbol },
        });
    }
    Ok(symbol)
}

fn resolve_serial(
    serial_to_index: &HashMap<usize, usize>,
    serial: usize,
    line_num: usize,
) -> Result<usize, PdbError> {
    serial_to_index
        .get(&serial)
        .copied()
        .ok_or(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::DanglingConect { serial },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ETHANOL_FRAGMENT: &str = "\
HETATM    1  C1  ETL A   1       0.007   1.000   0.000  1.00  0.00           C
HETATM    2  C2  ETL A   1       1.515   1.000   0.000  1.00  0.00           C
HETATM    3  O1  ETL A   1       2.015   1.000   1.350  1.00  0.00           O
CONECT    1    2
CONECT    2    1    3
CONECT    3    2
END
";

    fn read(text: &str) -> Result<MoleculeStructure, PdbError> {
        read_from(&mut Cursor::new(text))
    }

    #[test]
    fn atoms_and_bonds_are_read_in_record_order() {
        let structure = read(ETHANOL_FRAGMENT).unwrap();

        assert_eq!(structure.name, "ETL");
        assert_eq!(structure.atom_count(), 3);
        assert_eq!(structure.atoms[0].pdb_name, " C1 ");
        assert_eq!(structure.atoms[0].element, "C");
        assert_eq!(structure.atoms[2].element, "O");
        assert!((structure.atoms[1].position.x - 1.515).abs() < 1e-9);
        // Symmetric CONECT records collapse into one bond each.
        assert_eq!(structure.bonds, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn hydrogen_classification_survives_parsing() {
        let text = "\
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    2  H1  LIG A   1       1.000   0.000   0.000  1.00  0.00           H
CONECT    1    2
";
        let structure = read(text).unwrap();
        assert!(structure.atoms[0].is_heavy());
        assert!(structure.atoms[1].is_hydrogen());
    }

    #[test]
    fn element_falls_back_to_the_atom_name() {
        let text =
            "HETATM    1  N1  LIG A   1       0.000   0.000   0.000  1.00  0.00\n";
        let structure = read(text).unwrap();
        assert_eq!(structure.atoms[0].element, "N");
    }

    #[test]
    fn unknown_element_is_rejected() {
        let text = "\
HETATM    1  X1  LIG A   1       0.000   0.000   0.000  1.00  0.00           Xq
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::UnknownElement { .. },
                ..
            }
        ));
    }

    #[test]
    fn dangling_conect_is_rejected() {
        let text = "\
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
CONECT    1    9
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 2,
                kind: PdbParseErrorKind::DanglingConect { serial: 9 },
            }
        ));
    }

    #[test]
    fn duplicate_serial_is_rejected() {
        let text = "\
HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C
HETATM    1  C2  LIG A   1       1.000   0.000   0.000  1.00  0.00           C
";
        assert!(matches!(read(text), Err(PdbError::Inconsistency(_))));
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(read("END\n"), Err(PdbError::NoAtoms)));
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        let text = "\
HETATM    1  C1  LIG A   1       x.000   0.000   0.000  1.00  0.00           C
";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::InvalidFloat { .. },
                ..
            }
        ));
    }
}
