//! Static element data for the atom kinds small-molecule ligands are made of.

use phf::phf_map;

/// Atomic numbers keyed by upper-case element symbol.
///
/// Covers the organic subset plus the halogens and the handful of metals that
/// show up in ligand structures; anything outside this table is rejected at
/// the I/O boundary rather than silently carried along.
pub static ATOMIC_NUMBERS: phf::Map<&'static str, u8> = phf_map! {
    "H" => 1,
    "B" => 5,
    "C" => 6,
    "N" => 7,
    "O" => 8,
    "F" => 9,
    "NA" => 11,
    "MG" => 12,
    "SI" => 14,
    "P" => 15,
    "S" => 16,
    "CL" => 17,
    "K" => 19,
    "CA" => 20,
    "MN" => 25,
    "FE" => 26,
    "CO" => 27,
    "NI" => 28,
    "CU" => 29,
    "ZN" => 30,
    "SE" => 34,
    "BR" => 35,
    "I" => 53,
};

/// Looks up the atomic number for an element symbol, case-insensitively.
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ATOMIC_NUMBERS.get(symbol.to_ascii_uppercase().as_str()).copied()
}

pub fn is_hydrogen(symbol: &str) -> bool {
    atomic_number(symbol) == Some(1)
}
