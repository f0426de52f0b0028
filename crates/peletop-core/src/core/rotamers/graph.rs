//! Core selection and spanning-tree construction over the molecular graph.
//!
//! The rotamer model splits a molecule into a rigid core (ring systems, or a
//! single central atom for acyclic molecules) and branches hanging off it.
//! Every atom gets exactly one parent; following parent links from anywhere
//! terminates at the single root inside the core.

use crate::core::graph::{ConnectivityGraph, RingInfo};
use crate::core::models::atom::{Atom, Parentage};
use std::collections::BTreeSet;
use thiserror::Error;

/// The connectivity graph is not a single connected component relative to
/// the selected core. Fatal: the rotamer model assumes every atom is
/// reachable from the core.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("atoms {unreachable:?} are not connected to the molecule core")]
pub struct DisconnectedMoleculeError {
    /// The atom indices no path from the core reaches, ascending.
    pub unreachable: Vec<usize>,
}

/// The rotamer view of one molecule's connectivity: ring perception plus the
/// selected core, ready to assign parents and partition branches.
#[derive(Debug, Clone)]
pub struct RotamerGraph<'a> {
    connectivity: &'a ConnectivityGraph,
    rings: RingInfo,
    core: BTreeSet<usize>,
}

impl<'a> RotamerGraph<'a> {
    /// Perceives rings and selects the core of `connectivity`. The graph
    /// must hold at least one atom.
    pub fn new(connectivity: &'a ConnectivityGraph) -> Self {
        debug_assert!(connectivity.atom_count() > 0);
        let rings = RingInfo::perceive(connectivity);
        let core = select_core(connectivity, &rings);
        Self {
            connectivity,
            rings,
            core,
        }
    }

    pub fn connectivity(&self) -> &ConnectivityGraph {
        self.connectivity
    }

    pub fn rings(&self) -> &RingInfo {
        &self.rings
    }

    /// The selected core: every ring-system atom (plus junctions and the
    /// linkers joining separate ring systems), or the single most central
    /// atom when the molecule is acyclic. Never empty for a non-empty
    /// molecule.
    pub fn core(&self) -> &BTreeSet<usize> {
        &self.core
    }

    /// Flags every atom as core or branch and assigns each one its parent:
    /// the lowest-index core atom becomes the tree root, the remaining core
    /// atoms chain toward it over core-only edges, and branch atoms hang off
    /// the core along shortest paths (lowest-index parent on ties).
    ///
    /// This is the one pass that mutates already-built atoms.
    ///
    /// # Errors
    ///
    /// Returns [`DisconnectedMoleculeError`] when any atom is unreachable
    /// from the core.
    pub fn assign_parents(&self, atoms: &mut [Atom]) -> Result<(), DisconnectedMoleculeError> {
        debug_assert_eq!(atoms.len(), self.connectivity.atom_count());

        for atom in atoms.iter_mut() {
            if self.core.contains(&atom.index) {
                atom.set_as_core();
            } else {
                atom.set_as_branch();
            }
        }

        let root = *self.core.first().expect("core is never empty");
        atoms[root].parent = Parentage::Root;
        self.assign_core_parents(root, atoms);

        let tree = self
            .connectivity
            .multi_source_bfs(self.core.iter().copied());
        let mut unreachable = Vec::new();
        for atom in atoms.iter_mut() {
            if self.core.contains(&atom.index) {
                continue;
            }
            match tree.parents[atom.index] {
                Some(parent) => atom.parent = Parentage::Child(parent),
                None => unreachable.push(atom.index),
            }
        }

        if unreachable.is_empty() {
            Ok(())
        } else {
            Err(DisconnectedMoleculeError { unreachable })
        }
    }

    /// BFS from the root over edges with both endpoints in the core, so the
    /// rigid part of the tree never routes through a branch atom.
    fn assign_core_parents(&self, root: usize, atoms: &mut [Atom]) {
        let mut frontier = vec![root];
        let mut visited = BTreeSet::from([root]);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for &u in &frontier {
                for &v in self.connectivity.neighbors(u) {
                    if self.core.contains(&v) && visited.insert(v) {
                        atoms[v].parent = Parentage::Child(u);
                        next.push(v);
                    }
                }
            }
            next.sort_unstable();
            frontier = next;
        }
    }
}

/// Selects the rotamer-tree core.
///
/// With rings: the union of all ring atoms, plus every atom bonded to two or
/// more ring atoms, plus the shortest linker paths needed to join disjoint
/// ring systems into one connected set. Without rings: the single atom of
/// minimal eccentricity, ties broken toward the lowest index.
fn select_core(connectivity: &ConnectivityGraph, rings: &RingInfo) -> BTreeSet<usize> {
    if !rings.has_rings() {
        return BTreeSet::from([most_central_atom(connectivity)]);
    }

    let mut core: BTreeSet<usize> = rings.ring_atoms().clone();

    // Bridge/junction atoms held by two or more rings belong to the rigid
    // part even when no cycle passes through them.
    for atom in 0..connectivity.atom_count() {
        if core.contains(&atom) {
            continue;
        }
        let ring_neighbors = connectivity
            .neighbors(atom)
            .iter()
            .filter(|&&n| rings.is_ring_atom(n))
            .count();
        if ring_neighbors >= 2 {
            core.insert(atom);
        }
    }

    // Ring systems joined by acyclic linkers: absorb shortest-path atoms,
    // nearest pair of components first, until the core is connected.
    loop {
        let components = core_components(connectivity, &core);
        if components.len() <= 1 {
            break;
        }
        let first = &components[0];
        let rest: BTreeSet<usize> = core.difference(first).copied().collect();

        let tree = connectivity.multi_source_bfs(first.iter().copied());
        let target = rest
            .iter()
            .filter_map(|&atom| tree.distances[atom].map(|d| (d, atom)))
            .min();
        let Some((_, target)) = target else {
            // No path exists; leave the core split and let the spanning-tree
            // pass report the disconnected molecule.
            break;
        };

        let mut walk = target;
        while let Some(parent) = tree.parents[walk] {
            core.insert(walk);
            walk = parent;
        }
    }

    core
}

/// Connected components of the subgraph induced by `core`, ordered by their
/// smallest atom index.
fn core_components(connectivity: &ConnectivityGraph, core: &BTreeSet<usize>) -> Vec<BTreeSet<usize>> {
    let mut components = Vec::new();
    let mut seen = BTreeSet::new();
    for &start in core {
        if seen.contains(&start) {
            continue;
        }
        let mut component = BTreeSet::new();
        let mut stack = vec![start];
        seen.insert(start);
        while let Some(u) = stack.pop() {
            component.insert(u);
            for &v in connectivity.neighbors(u) {
                if core.contains(&v) && seen.insert(v) {
                    stack.push(v);
                }
            }
        }
        components.push(component);
    }
    components
}

fn most_central_atom(connectivity: &ConnectivityGraph) -> usize {
    let mut best = 0;
    let mut best_eccentricity = usize::MAX;
    for atom in 0..connectivity.atom_count() {
        let eccentricity = connectivity.eccentricity(atom);
        if eccentricity < best_eccentricity {
            best = atom;
            best_eccentricity = eccentricity;
        }
    }
    best
}
