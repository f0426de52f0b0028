//! Partitioning of the spanning tree into independently sampled rotamer
//! branches, and the resulting library.

use super::graph::RotamerGraph;
use crate::core::models::atom::Atom;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use thiserror::Error;

/// Requested sampling resolution outside the open interval (0, 360) degrees.
#[derive(Debug, Error, PartialEq)]
#[error("rotamer resolution {resolution} is outside the open interval (0, 360) degrees")]
pub struct InvalidResolutionError {
    pub resolution: f64,
}

/// One rotatable bond, oriented along the spanning tree: `atom1` is the
/// parent-side endpoint, `atom2` the child whose subtree turns with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotamer {
    pub atom1: usize,
    pub atom2: usize,
    /// Sampling step in degrees.
    pub resolution: f64,
}

/// An independently rotatable arm of the molecule.
///
/// One branch per connected non-core component that carries at least one
/// rotatable bond. The pivot is the branch's rotatable bond nearest the
/// core; the remaining rotatable bonds follow core-outward. The rotating
/// atom set is the pivot child's full subtree, so rotating sets of distinct
/// branches never share an atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// The (parent, child) bond the whole branch pivots around.
    pub pivot: (usize, usize),
    /// Every rotatable bond of the branch, nearest-to-core first.
    pub rotamers: Vec<Rotamer>,
    /// The atoms displaced when the pivot is torqued, ascending.
    pub rotating_atoms: BTreeSet<usize>,
}

impl Branch {
    /// The sampling step stamped on this branch's rotatable bonds.
    pub fn resolution(&self) -> f64 {
        self.rotamers[0].resolution
    }
}

/// The rotamer library of one molecule: its branches, ordered by the pivot
/// child's atom index. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotamerLibrary {
    /// PELE residue name of the molecule.
    pub name: String,
    branches: Vec<Branch>,
}

impl RotamerLibrary {
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Writes the library in PELE's rotamer-library text format, one
    /// `sidelib` line per rotatable bond and a `newgrp` separator between
    /// branches.
    pub fn write_pele(&self, atoms: &[Atom], writer: &mut impl Write) -> io::Result<()> {
        writeln!(writer, "rot assign res {} &", self.name)?;
        for (position, branch) in self.branches.iter().enumerate() {
            if position > 0 {
                writeln!(writer, "     newgrp &")?;
            }
            for rotamer in &branch.rotamers {
                writeln!(
                    writer,
                    "   sidelib FREE{} {} {} &",
                    format_resolution(rotamer.resolution),
                    atoms[rotamer.atom1].pdb_name,
                    atoms[rotamer.atom2].pdb_name,
                )?;
            }
        }
        Ok(())
    }
}

fn format_resolution(resolution: f64) -> String {
    if resolution.fract() == 0.0 {
        format!("{}", resolution as i64)
    } else {
        format!("{}", resolution)
    }
}

impl<'a> RotamerGraph<'a> {
    /// Partitions the rotatable bonds into branches and stamps each with the
    /// sampling resolution.
    ///
    /// A bond qualifies as rotatable when both endpoints have degree >= 2,
    /// it closes no ring, and it is not internal to the core. `atoms` must
    /// already carry the core flags and parent links from
    /// [`RotamerGraph::assign_parents`].
    ///
    /// A molecule without a single rotatable bond yields an empty library.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidResolutionError`] unless `0 < resolution < 360`.
    pub fn build_library(
        &self,
        atoms: &[Atom],
        name: &str,
        resolution: f64,
    ) -> Result<RotamerLibrary, InvalidResolutionError> {
        if !(resolution > 0.0 && resolution < 360.0) {
            return Err(InvalidResolutionError { resolution });
        }

        let connectivity = self.connectivity();

        // Rotation candidates, oriented parent -> child along the tree.
        let mut candidates: Vec<(usize, usize)> = Vec::new();
        for (i, j) in connectivity.bonds() {
            if connectivity.degree(i) < 2 || connectivity.degree(j) < 2 {
                continue;
            }
            if self.rings().is_ring_bond(i, j) {
                continue;
            }
            if atoms[i].is_core() && atoms[j].is_core() {
                continue;
            }
            if atoms[j].parent.parent_index() == Some(i) {
                candidates.push((i, j));
            } else if atoms[i].parent.parent_index() == Some(j) {
                candidates.push((j, i));
            }
        }

        // Subtree bookkeeping over the parent links.
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); atoms.len()];
        for atom in atoms {
            if let Some(parent) = atom.parent.parent_index() {
                children[parent].push(atom.index);
            }
        }

        // Group candidates into branches: every edge between two non-core
        // atoms is a tree edge (anything else would close a ring and sit in
        // the core), so the non-core component of a candidate's child is
        // identified by the child's core-adjacent ancestor.
        let mut groups: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
        for &(parent, child) in &candidates {
            groups
                .entry(self.branch_anchor(atoms, child))
                .or_default()
                .push((parent, child));
        }

        let mut branches = Vec::with_capacity(groups.len());
        for (_, mut bonds) in groups {
            bonds.sort_by_key(|&(_, child)| (self.depth_from_core(atoms, child), child));
            let pivot = bonds[0];
            let rotamers = bonds
                .into_iter()
                .map(|(atom1, atom2)| Rotamer {
                    atom1,
                    atom2,
                    resolution,
                })
                .collect();
            branches.push(Branch {
                pivot,
                rotamers,
                rotating_atoms: subtree(&children, pivot.1),
            });
        }
        branches.sort_by_key(|branch| branch.pivot.1);

        Ok(RotamerLibrary {
            name: name.to_string(),
            branches,
        })
    }

    /// The first non-core atom on `atom`'s parent chain counted from the
    /// core, i.e. the atom that attaches the whole arm.
    fn branch_anchor(&self, atoms: &[Atom], atom: usize) -> usize {
        let mut anchor = atom;
        loop {
            match atoms[anchor].parent.parent_index() {
                Some(parent) if !atoms[parent].is_core() => anchor = parent,
                _ => return anchor,
            }
        }
    }

    /// Parent-chain steps from `atom` up to the nearest core atom.
    fn depth_from_core(&self, atoms: &[Atom], atom: usize) -> usize {
        let mut depth = 0;
        let mut current = atom;
        while !atoms[current].is_core() {
            match atoms[current].parent.parent_index() {
                Some(parent) => {
                    depth += 1;
                    current = parent;
                }
                None => break,
            }
        }
        depth
    }
}

/// `root` plus every atom whose parent chain passes through it.
fn subtree(children: &[Vec<usize>], root: usize) -> BTreeSet<usize> {
    let mut atoms = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(atom) = stack.pop() {
        if atoms.insert(atom) {
            stack.extend(children[atom].iter().copied());
        }
    }
    atoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::ConnectivityGraph;
    use nalgebra::Point3;

    fn atoms(count: usize) -> Vec<Atom> {
        (0..count)
            .map(|index| Atom::new(index, &format!("_C{}_", index + 1), Point3::origin()))
            .collect()
    }

    fn prepared(
        atom_count: usize,
        bonds: &[(usize, usize)],
    ) -> (ConnectivityGraph, Vec<Atom>) {
        let graph = ConnectivityGraph::from_bonds(atom_count, bonds).unwrap();
        let mut atoms = atoms(atom_count);
        RotamerGraph::new(&graph).assign_parents(&mut atoms).unwrap();
        (graph, atoms)
    }

    #[test]
    fn resolution_bounds_are_exclusive() {
        let (graph, atoms) = prepared(2, &[(0, 1)]);
        let rotamer_graph = RotamerGraph::new(&graph);

        for bad in [0.0, 360.0, -30.0, 400.0] {
            let err = rotamer_graph
                .build_library(&atoms, "LIG", bad)
                .unwrap_err();
            assert_eq!(err, InvalidResolutionError { resolution: bad });
        }
        assert!(rotamer_graph.build_library(&atoms, "LIG", 30.0).is_ok());
    }

    #[test]
    fn linear_chain_has_one_rotatable_bond() {
        // 0-1-2-3: core is atom 1; only 1-2 has degree >= 2 on both ends
        // outside the core interior.
        let (graph, atoms) = prepared(4, &[(0, 1), (1, 2), (2, 3)]);
        let rotamer_graph = RotamerGraph::new(&graph);

        let library = rotamer_graph.build_library(&atoms, "LIG", 30.0).unwrap();

        assert_eq!(library.branches().len(), 1);
        let branch = &library.branches()[0];
        assert_eq!(branch.pivot, (1, 2));
        assert_eq!(branch.rotamers.len(), 1);
        assert_eq!(branch.rotating_atoms, BTreeSet::from([2, 3]));
        assert_eq!(branch.resolution(), 30.0);
    }

    #[test]
    fn two_atom_molecule_has_no_branches() {
        let (graph, atoms) = prepared(2, &[(0, 1)]);
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 30.0)
            .unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn ring_bonds_are_never_rotatable() {
        // Benzene-like ring with no substituents.
        let (graph, atoms) = prepared(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 30.0)
            .unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn nested_rotatable_bonds_stay_in_one_branch() {
        // Ring 0-1-2, then chain 2-3-4-5-6 hanging off atom 2.
        let (graph, atoms) = prepared(
            7,
            &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 5), (5, 6)],
        );
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 30.0)
            .unwrap();

        assert_eq!(library.branches().len(), 1);
        let branch = &library.branches()[0];
        assert_eq!(branch.pivot, (2, 3));
        // Core-outward order: 2-3, then 3-4, then 4-5. The terminal bond
        // 5-6 is not rotatable.
        let bonds: Vec<_> = branch
            .rotamers
            .iter()
            .map(|r| (r.atom1, r.atom2))
            .collect();
        assert_eq!(bonds, vec![(2, 3), (3, 4), (4, 5)]);
        assert_eq!(branch.rotating_atoms, BTreeSet::from([3, 4, 5, 6]));
    }

    #[test]
    fn separate_arms_become_disjoint_branches() {
        // Ring 0-1-2 with a two-bond arm on atom 1 and another on atom 2.
        let (graph, atoms) = prepared(
            9,
            &[
                (0, 1),
                (1, 2),
                (2, 0),
                (1, 3),
                (3, 4),
                (4, 5),
                (2, 6),
                (6, 7),
                (7, 8),
            ],
        );
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 45.0)
            .unwrap();

        assert_eq!(library.branches().len(), 2);
        let first = &library.branches()[0];
        let second = &library.branches()[1];

        // Ordered by pivot child index.
        assert_eq!(first.pivot, (1, 3));
        assert_eq!(second.pivot, (2, 6));
        assert_eq!(first.rotating_atoms, BTreeSet::from([3, 4, 5]));
        assert_eq!(second.rotating_atoms, BTreeSet::from([6, 7, 8]));
        assert!(first.rotating_atoms.is_disjoint(&second.rotating_atoms));
        assert_eq!(first.resolution(), 45.0);
        assert_eq!(second.resolution(), 45.0);
    }

    #[test]
    fn terminal_only_arms_yield_no_branch() {
        // Ring 0-1-2 with single-atom substituents: nothing to rotate.
        let (graph, atoms) = prepared(5, &[(0, 1), (1, 2), (2, 0), (0, 3), (1, 4)]);
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 30.0)
            .unwrap();
        assert!(library.is_empty());
    }

    #[test]
    fn library_construction_is_deterministic() {
        let bonds = [
            (0, 1),
            (1, 2),
            (2, 0),
            (1, 3),
            (3, 4),
            (4, 5),
            (2, 6),
            (6, 7),
            (7, 8),
        ];
        let (graph, atoms) = prepared(9, &bonds);
        let rotamer_graph = RotamerGraph::new(&graph);

        let first = rotamer_graph.build_library(&atoms, "LIG", 30.0).unwrap();
        let second = rotamer_graph.build_library(&atoms, "LIG", 30.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn pele_listing_groups_branches_with_newgrp() {
        let (graph, atoms) = prepared(
            9,
            &[
                (0, 1),
                (1, 2),
                (2, 0),
                (1, 3),
                (3, 4),
                (4, 5),
                (2, 6),
                (6, 7),
                (7, 8),
            ],
        );
        let library = RotamerGraph::new(&graph)
            .build_library(&atoms, "LIG", 30.0)
            .unwrap();

        let mut out = Vec::new();
        library.write_pele(&atoms, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
rot assign res LIG &
   sidelib FREE30 _C2_ _C4_ &
   sidelib FREE30 _C4_ _C5_ &
     newgrp &
   sidelib FREE30 _C3_ _C7_ &
   sidelib FREE30 _C7_ _C8_ &
";
        assert_eq!(text, expected);
    }
}
