use crate::corridor::Corridor;
use crate::error::{CorridorError, Result};
use crate::sequence::CorridorSequence;
use crate::CorridorId;
use pathfinding::directed::{dijkstra::dijkstra, yen::yen};
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Path costs are measured in multiples of this length.
const LENGTH_QUANTUM: f64 = 0.001; // m

/// A set of corridors and the connections between them.
#[derive(Clone, Debug, Default)]
pub struct CorridorNetwork {
    /// The corridors in the network.
    corridors: SlotMap<CorridorId, Arc<Corridor>>,
    /// The corridors which follow on from each corridor.
    successors: SecondaryMap<CorridorId, SmallVec<[CorridorId; 4]>>,
}

/// A series of connected corridors, in driving order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorridorPath(pub Vec<CorridorId>);

/// Alternative paths between the same two corridors, shortest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorridorPaths(pub Vec<CorridorPath>);

impl CorridorNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a corridor to the network, and returns its new ID.
    pub fn add_corridor(&mut self, corridor: Corridor) -> CorridorId {
        let id = self
            .corridors
            .insert_with_key(|id| Arc::new(corridor.with_id(id)));
        self.successors.insert(id, SmallVec::new());
        id
    }

    /// Gets a reference to the corridor with the given ID.
    pub fn get(&self, id: CorridorId) -> Option<&Arc<Corridor>> {
        self.corridors.get(id)
    }

    /// The number of corridors in the network.
    pub fn len(&self) -> usize {
        self.corridors.len()
    }

    /// Returns true if the network holds no corridors.
    pub fn is_empty(&self) -> bool {
        self.corridors.is_empty()
    }

    /// Iterates over the corridors in the network.
    pub fn iter(&self) -> impl Iterator<Item = (CorridorId, &Arc<Corridor>)> + '_ {
        self.corridors.iter()
    }

    /// Specifies that the end of the `from` corridor joins the start of the `to` corridor.
    pub fn connect(&mut self, from: CorridorId, to: CorridorId) -> Result<()> {
        if !self.corridors.contains_key(to) {
            return Err(CorridorError::UnknownCorridor(to));
        }
        let successors = self
            .successors
            .get_mut(from)
            .ok_or(CorridorError::UnknownCorridor(from))?;
        if !successors.contains(&to) {
            successors.push(to);
        }
        Ok(())
    }

    /// Gets the corridors which follow on from the given corridor.
    pub fn successors(&self, id: CorridorId) -> &[CorridorId] {
        self.successors.get(id).map(|s| s.as_slice()).unwrap_or(&[])
    }

    /// Finds the shortest path from one corridor to another, if one exists.
    /// The length of a path is the length of all but its last corridor.
    pub fn find_path(&self, from: CorridorId, to: CorridorId) -> Option<CorridorPath> {
        if !self.corridors.contains_key(from) {
            return None;
        }
        let (path, cost) = dijkstra(&from, |id| self.weighted_successors(*id), |id| *id == to)?;
        log::debug!(
            "found path of {} corridors, {:.3} m",
            path.len(),
            cost as f64 * LENGTH_QUANTUM
        );
        Some(CorridorPath(path))
    }

    /// Finds up to `k` paths from one corridor to another, which don't visit
    /// any corridor twice, ordered from shortest to longest.
    pub fn find_paths(&self, from: CorridorId, to: CorridorId, k: usize) -> CorridorPaths {
        if k == 0 || !self.corridors.contains_key(from) {
            return CorridorPaths::default();
        }
        let paths = yen(&from, |id| self.weighted_successors(*id), |id| *id == to, k);
        log::debug!("found {} of {} requested paths", paths.len(), k);
        CorridorPaths(paths.into_iter().map(|(path, _)| CorridorPath(path)).collect())
    }

    /// Creates a sequence from the corridors along a path.
    pub fn sequence(&self, path: &CorridorPath) -> Result<CorridorSequence> {
        let corridors = path
            .0
            .iter()
            .map(|id| {
                self.corridors
                    .get(*id)
                    .cloned()
                    .ok_or(CorridorError::UnknownCorridor(*id))
            })
            .collect::<Result<Vec<_>>>()?;
        CorridorSequence::new(corridors)
    }

    fn weighted_successors(&self, id: CorridorId) -> impl Iterator<Item = (CorridorId, u64)> + '_ {
        let cost = self
            .corridors
            .get(id)
            .map(|c| (c.length_reference_line() / LENGTH_QUANTUM).round() as u64)
            .unwrap_or(0);
        self.successors(id).iter().map(move |next| (*next, cost))
    }
}

impl CorridorPath {
    /// The number of corridors along the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the path has no corridors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The IDs of the corridors along the path.
    pub fn ids(&self) -> &[CorridorId] {
        &self.0
    }
}

impl CorridorPaths {
    /// The number of paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no paths.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the paths, shortest first.
    pub fn iter(&self) -> impl Iterator<Item = &CorridorPath> + '_ {
        self.0.iter()
    }
}

impl fmt::Display for CorridorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Corridor-Path:")?;
        for id in &self.0 {
            write!(f, " -> {:?}", id)?;
        }
        Ok(())
    }
}

impl fmt::Display for CorridorPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Corridor-Paths ---")?;
        for path in &self.0 {
            writeln!(f, "{}", path)?;
        }
        write!(f, "----------------------")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point2d;
    use assert_approx_eq::assert_approx_eq;
    use slotmap::Key;

    fn straight(x1: f64, y1: f64, x2: f64, y2: f64) -> Corridor {
        let points = [Point2d::new(x1, y1), Point2d::new(x2, y2)];
        Corridor::with_offsets(&points, 1.75, -1.75).unwrap()
    }

    /// A short route a -> b -> d, and a long route a -> c -> d.
    fn diamond() -> (CorridorNetwork, [CorridorId; 4]) {
        let mut network = CorridorNetwork::new();
        let a = network.add_corridor(straight(0.0, 0.0, 50.0, 0.0));
        let b = network.add_corridor(straight(50.0, 0.0, 100.0, 0.0));
        let c = network.add_corridor(straight(50.0, 0.0, 100.0, 60.0));
        let d = network.add_corridor(straight(100.0, 0.0, 150.0, 0.0));
        network.connect(a, b).unwrap();
        network.connect(a, c).unwrap();
        network.connect(b, d).unwrap();
        network.connect(c, d).unwrap();
        (network, [a, b, c, d])
    }

    #[test]
    fn corridors_are_stamped_with_ids() {
        let (network, ids) = diamond();
        assert_eq!(network.len(), 4);
        for id in ids {
            assert!(!id.is_null());
            assert_eq!(network.get(id).unwrap().id(), id);
        }
        assert_eq!(network.successors(ids[0]), &[ids[1], ids[2]]);
        assert!(network.successors(ids[3]).is_empty());
    }

    #[test]
    fn connecting_twice_is_idempotent() {
        let (mut network, [a, b, ..]) = diamond();
        network.connect(a, b).unwrap();
        assert_eq!(network.successors(a).len(), 2);
    }

    #[test]
    fn unknown_corridors_are_rejected() {
        let (mut network, [a, ..]) = diamond();
        let missing = {
            let mut scratch = CorridorNetwork::new();
            scratch.add_corridor(straight(0.0, 0.0, 1.0, 0.0));
            scratch.add_corridor(straight(0.0, 0.0, 1.0, 0.0));
            scratch.add_corridor(straight(0.0, 0.0, 1.0, 0.0));
            scratch.add_corridor(straight(0.0, 0.0, 1.0, 0.0));
            scratch.add_corridor(straight(0.0, 0.0, 1.0, 0.0))
        };
        assert_eq!(network.connect(a, missing), Err(CorridorError::UnknownCorridor(missing)));
        assert!(network.get(missing).is_none());

        let path = CorridorPath(vec![a, missing]);
        assert_eq!(
            network.sequence(&path).unwrap_err(),
            CorridorError::UnknownCorridor(missing)
        );
        assert_eq!(
            network.sequence(&CorridorPath::default()).unwrap_err(),
            CorridorError::EmptySequence
        );
    }

    #[test]
    fn shortest_path() {
        let (network, [a, b, _, d]) = diamond();
        let path = network.find_path(a, d).unwrap();
        assert_eq!(path, CorridorPath(vec![a, b, d]));

        let sequence = network.sequence(&path).unwrap();
        assert_eq!(sequence.len(), 3);
        assert_approx_eq!(sequence.total_length(), 150.0);
        assert!(network.find_path(d, a).is_none());
    }

    #[test]
    fn alternative_paths() {
        let (network, [a, b, c, d]) = diamond();
        let paths = network.find_paths(a, d, 5);
        assert_eq!(
            paths,
            CorridorPaths(vec![CorridorPath(vec![a, b, d]), CorridorPath(vec![a, c, d])])
        );
        assert!(network.find_paths(a, d, 0).is_empty());
        assert_eq!(network.find_paths(a, d, 1).len(), 1);
    }

    #[test]
    fn display() {
        let (network, [a, b, _, d]) = diamond();
        let path = network.find_path(a, d).unwrap();
        let text = path.to_string();
        assert!(text.starts_with("Corridor-Path: -> "));
        assert_eq!(text.matches(" -> ").count(), 3);
        assert_eq!(text, format!("Corridor-Path: -> {:?} -> {:?} -> {:?}", a, b, d));

        let paths = network.find_paths(a, d, 2).to_string();
        assert!(paths.starts_with("--- Corridor-Paths ---\n"));
        assert_eq!(paths.lines().count(), 4);
    }
}
