//! Ring perception over the connectivity graph.
//!
//! Uses a cycle basis (Paton's spanning-tree algorithm): every edge that lies
//! on any cycle of the molecule appears in at least one basis cycle, which is
//! all the rotamer machinery needs to tell ring bonds from rotatable ones.

use super::ConnectivityGraph;
use std::collections::{BTreeSet, HashSet};

/// Ring membership of a molecule's atoms and bonds, derived once from the
/// connectivity graph and queried read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingInfo {
    cycles: Vec<Vec<usize>>,
    ring_atoms: BTreeSet<usize>,
    ring_bonds: HashSet<(usize, usize)>,
}

impl RingInfo {
    /// Computes the cycle basis of `graph` and caches atom/bond ring
    /// membership.
    pub fn perceive(graph: &ConnectivityGraph) -> Self {
        let cycles = cycle_basis(graph);

        let mut ring_atoms = BTreeSet::new();
        let mut ring_bonds = HashSet::new();
        for cycle in &cycles {
            for (pos, &atom) in cycle.iter().enumerate() {
                ring_atoms.insert(atom);
                let next = cycle[(pos + 1) % cycle.len()];
                ring_bonds.insert(bond_key(atom, next));
            }
        }

        Self {
            cycles,
            ring_atoms,
            ring_bonds,
        }
    }

    /// The basis cycles, each an ordered closed path of atom indices.
    pub fn cycles(&self) -> &[Vec<usize>] {
        &self.cycles
    }

    pub fn has_rings(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.ring_atoms.contains(&atom)
    }

    pub fn is_ring_bond(&self, i: usize, j: usize) -> bool {
        self.ring_bonds.contains(&bond_key(i, j))
    }

    /// All atoms that belong to at least one cycle, ascending.
    pub fn ring_atoms(&self) -> &BTreeSet<usize> {
        &self.ring_atoms
    }

    /// Disjoint ring systems: connected components of the ring atoms under
    /// ring bonds alone. Fused and spiro rings share atoms and therefore
    /// coalesce into one system; rings joined only by acyclic linkers stay
    /// separate. Systems are ordered by their smallest atom index.
    pub fn ring_systems(&self) -> Vec<BTreeSet<usize>> {
        let mut systems = Vec::new();
        let mut seen = BTreeSet::new();

        for &start in &self.ring_atoms {
            if seen.contains(&start) {
                continue;
            }
            let mut system = BTreeSet::new();
            let mut stack = vec![start];
            seen.insert(start);
            while let Some(atom) = stack.pop() {
                system.insert(atom);
                for &(a, b) in &self.ring_bonds {
                    let other = if a == atom {
                        b
                    } else if b == atom {
                        a
                    } else {
                        continue;
                    };
                    if seen.insert(other) {
                        stack.push(other);
                    }
                }
            }
            systems.push(system);
        }
        systems
    }
}

fn bond_key(i: usize, j: usize) -> (usize, usize) {
    (i.min(j), i.max(j))
}

/// Paton's cycle-basis algorithm over a spanning tree, with roots taken in
/// ascending index order so the basis is reproducible for a given graph.
fn cycle_basis(graph: &ConnectivityGraph) -> Vec<Vec<usize>> {
    let atom_count = graph.atom_count();
    let mut cycles = Vec::new();
    let mut pred: Vec<Option<usize>> = vec![None; atom_count];
    let mut used: Vec<Option<BTreeSet<usize>>> = vec![None; atom_count];

    for root in 0..atom_count {
        if used[root].is_some() {
            continue;
        }
        pred[root] = Some(root);
        used[root] = Some(BTreeSet::new());
        let mut stack = vec![root];

        while let Some(z) = stack.pop() {
            let zused = used[z].clone().unwrap_or_default();
            for &nbr in graph.neighbors(z) {
                if used[nbr].is_none() {
                    pred[nbr] = Some(z);
                    used[nbr] = Some(BTreeSet::from([z]));
                    stack.push(nbr);
                } else if !zused.contains(&nbr) {
                    // Non-tree edge: walk the predecessor chain of z until a
                    // node already known to nbr closes the cycle.
                    let nbr_used = used[nbr].clone().unwrap_or_default();
                    let mut cycle = vec![nbr, z];
                    let mut p = pred[z].expect("visited atom has a predecessor");
                    while !nbr_used.contains(&p) {
                        cycle.push(p);
                        p = pred[p].expect("visited atom has a predecessor");
                    }
                    cycle.push(p);
                    cycles.push(cycle);
                    if let Some(nbr_used) = used[nbr].as_mut() {
                        nbr_used.insert(z);
                    }
                }
            }
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from(atom_count: usize, bonds: &[(usize, usize)]) -> ConnectivityGraph {
        ConnectivityGraph::from_bonds(atom_count, bonds).unwrap()
    }

    #[test]
    fn acyclic_molecule_has_no_rings() {
        // Neopentane-like star plus a tail.
        let graph = graph_from(6, &[(0, 1), (0, 2), (0, 3), (0, 4), (4, 5)]);
        let rings = RingInfo::perceive(&graph);

        assert!(!rings.has_rings());
        assert!(rings.ring_atoms().is_empty());
        assert!(!rings.is_ring_bond(0, 1));
    }

    #[test]
    fn simple_ring_is_fully_detected() {
        // Cyclohexane skeleton.
        let graph = graph_from(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let rings = RingInfo::perceive(&graph);

        assert_eq!(rings.cycles().len(), 1);
        assert_eq!(rings.cycles()[0].len(), 6);
        assert!((0..6).all(|i| rings.is_ring_atom(i)));
        assert!(rings.is_ring_bond(5, 0));
        assert!(rings.is_ring_bond(2, 1));
    }

    #[test]
    fn ring_with_substituent_excludes_the_substituent() {
        // Methylcyclopropane: triangle 0-1-2 plus substituent 3 on atom 0.
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 0), (0, 3)]);
        let rings = RingInfo::perceive(&graph);

        assert!(rings.is_ring_atom(0));
        assert!(!rings.is_ring_atom(3));
        assert!(rings.is_ring_bond(2, 0));
        assert!(!rings.is_ring_bond(0, 3));
    }

    #[test]
    fn fused_bicycle_yields_two_basis_cycles_and_one_system() {
        // Two triangles sharing the edge 1-2.
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 0), (1, 3), (3, 2)]);
        let rings = RingInfo::perceive(&graph);

        assert_eq!(rings.cycles().len(), 2);
        assert!((0..4).all(|i| rings.is_ring_atom(i)));
        assert!(rings.is_ring_bond(1, 2));

        let systems = rings.ring_systems();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0], BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn linker_joined_rings_stay_separate_systems() {
        // Triangle 0-1-2, linker 2-3-4, triangle 4-5-6.
        let graph = graph_from(
            7,
            &[
                (0, 1),
                (1, 2),
                (2, 0),
                (2, 3),
                (3, 4),
                (4, 5),
                (5, 6),
                (6, 4),
            ],
        );
        let rings = RingInfo::perceive(&graph);

        assert!(!rings.is_ring_atom(3));
        assert!(!rings.is_ring_bond(2, 3));
        assert!(!rings.is_ring_bond(3, 4));

        let systems = rings.ring_systems();
        assert_eq!(systems.len(), 2);
        assert_eq!(systems[0], BTreeSet::from([0, 1, 2]));
        assert_eq!(systems[1], BTreeSet::from([4, 5, 6]));
    }

    #[test]
    fn spiro_rings_form_one_system() {
        // Two triangles sharing only atom 2.
        let graph = graph_from(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4), (4, 2)]);
        let rings = RingInfo::perceive(&graph);

        assert_eq!(rings.cycles().len(), 2);
        assert_eq!(rings.ring_systems().len(), 1);
    }

    #[test]
    fn perception_is_deterministic() {
        let bonds = [(0, 1), (1, 2), (2, 3), (3, 0), (2, 4), (4, 5)];
        let a = RingInfo::perceive(&graph_from(6, &bonds));
        let b = RingInfo::perceive(&graph_from(6, &bonds));
        assert_eq!(a, b);
    }
}
