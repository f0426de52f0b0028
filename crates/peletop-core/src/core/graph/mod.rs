pub mod rings;

pub use rings::RingInfo;

use thiserror::Error;

/// Malformed connectivity input. Fatal for the molecule being processed:
/// a bond that points outside the atom set or at its own atom cannot be
/// repaired downstream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTopologyError {
    #[error("bond ({atom1}, {atom2}) references an atom outside the molecule ({atom_count} atoms)")]
    DanglingBond {
        atom1: usize,
        atom2: usize,
        atom_count: usize,
    },
    #[error("self-loop bond on atom {atom}")]
    SelfLoop { atom: usize },
}

/// Undirected connectivity over the atoms of one molecule.
///
/// Neighbor lists are kept sorted so every traversal over the graph visits
/// atoms in a reproducible order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectivityGraph {
    adjacency: Vec<Vec<usize>>,
}

impl ConnectivityGraph {
    /// Creates a bond-less graph over `atom_count` atoms.
    pub fn new(atom_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); atom_count],
        }
    }

    /// Builds a graph from an explicit bond list.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTopologyError`] on the first dangling or self-loop
    /// bond.
    pub fn from_bonds(
        atom_count: usize,
        bonds: &[(usize, usize)],
    ) -> Result<Self, InvalidTopologyError> {
        let mut graph = Self::new(atom_count);
        for &(i, j) in bonds {
            graph.add_bond(i, j)?;
        }
        Ok(graph)
    }

    /// Inserts an undirected edge between `i` and `j`. Re-adding an existing
    /// bond is a no-op, so each unordered pair is stored at most once.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTopologyError`] when either index is out of range or
    /// `i == j`.
    pub fn add_bond(&mut self, i: usize, j: usize) -> Result<(), InvalidTopologyError> {
        let atom_count = self.atom_count();
        if i >= atom_count || j >= atom_count {
            return Err(InvalidTopologyError::DanglingBond {
                atom1: i,
                atom2: j,
                atom_count,
            });
        }
        if i == j {
            return Err(InvalidTopologyError::SelfLoop { atom: i });
        }
        if !self.adjacency[i].contains(&j) {
            let pos = self.adjacency[i].partition_point(|&n| n < j);
            self.adjacency[i].insert(pos, j);
            let pos = self.adjacency[j].partition_point(|&n| n < i);
            self.adjacency[j].insert(pos, i);
        }
        Ok(())
    }

    pub fn atom_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Neighbors of `i`, sorted ascending.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjacency[i]
    }

    pub fn degree(&self, i: usize) -> usize {
        self.adjacency[i].len()
    }

    pub fn contains_bond(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i).is_some_and(|n| n.contains(&j))
    }

    /// Iterates every bond once, as `(min, max)` index pairs in ascending
    /// order.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, nbrs)| nbrs.iter().filter(move |&&j| i < j).map(move |&j| (i, j)))
    }

    /// Breadth-first distances from `start`; `None` for unreachable atoms.
    pub fn bfs_distances(&self, start: usize) -> Vec<Option<usize>> {
        let mut distances = vec![None; self.atom_count()];
        distances[start] = Some(0);
        let mut frontier = vec![start];
        let mut depth = 0;
        while !frontier.is_empty() {
            depth += 1;
            let mut next = Vec::new();
            for &u in &frontier {
                for &v in self.neighbors(u) {
                    if distances[v].is_none() {
                        distances[v] = Some(depth);
                        next.push(v);
                    }
                }
            }
            frontier = next;
        }
        distances
    }

    /// The largest BFS distance from `i` to any reachable atom.
    pub fn eccentricity(&self, i: usize) -> usize {
        self.bfs_distances(i)
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(0)
    }

    /// Level-synchronous BFS from several sources at once, as if they were
    /// one contracted root.
    ///
    /// Each newly discovered atom records the neighbor it was reached
    /// through. Within a level the frontier is walked in ascending index
    /// order and only the first discovery sticks, so ties between
    /// equally-short paths always resolve to the lowest-index parent.
    pub fn multi_source_bfs(&self, sources: impl IntoIterator<Item = usize>) -> BfsTree {
        let mut distances = vec![None; self.atom_count()];
        let mut parents = vec![None; self.atom_count()];

        let mut frontier: Vec<usize> = sources.into_iter().collect();
        frontier.sort_unstable();
        frontier.dedup();
        for &s in &frontier {
            distances[s] = Some(0);
        }

        let mut depth = 0;
        while !frontier.is_empty() {
            depth += 1;
            let mut next = Vec::new();
            for &u in &frontier {
                for &v in self.neighbors(u) {
                    if distances[v].is_none() {
                        distances[v] = Some(depth);
                        parents[v] = Some(u);
                        next.push(v);
                    }
                }
            }
            next.sort_unstable();
            frontier = next;
        }

        BfsTree { distances, parents }
    }
}

/// The result of a (multi-source) BFS: per-atom distance and the neighbor
/// each atom was first reached through. Sources have distance 0 and no
/// parent, unreachable atoms have neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsTree {
    pub distances: Vec<Option<usize>>,
    pub parents: Vec<Option<usize>>,
}
