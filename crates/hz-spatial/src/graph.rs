//! The partition graph: occupancy by tracked movers, relevance, and the
//! populate/depopulate pass.
//!
//! # Occupancy
//!
//! Each tracked mover (a survivor) keeps a list of the partitions it
//! overlaps.  Leaving the only partition on the list is deferred until the
//! mover enters another one, so the list is never empty once the mover has
//! entered anything.  Trigger volumes have gaps; a mover in a gap stays
//! where it was last seen.
//!
//! # Relevance
//!
//! ```text
//! relevant            = occupied ∪ non-gated neighbors of occupied
//! relevant_unoccupied = non-gated neighbors of occupied − occupied
//! ```
//!
//! Every occupancy change runs a repopulation pass: irrelevant partitions
//! lose all their AI, and relevant-but-unoccupied partitions that are not in
//! the recent-entry history request spawns up to their target.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use hz_core::{EntityId, PartitionId, SimRng, SpawnerId, Vec3};

use crate::{Aabb, Partition, SpatialError, SpatialResult, SpawnRequest, Spawner};

/// How many recently entered partitions are skipped when populating.
pub const HISTORY_LEN: usize = 2;

/// Outcome of one repopulation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Repopulation {
    /// AI to destroy, in partition then id order.
    pub despawn:  Vec<EntityId>,
    /// Spawn requests to append to the shared queue.
    pub requests: Vec<SpawnRequest>,
}

impl Repopulation {
    pub fn is_empty(&self) -> bool {
        self.despawn.is_empty() && self.requests.is_empty()
    }

    fn absorb(&mut self, other: Repopulation) {
        self.despawn.extend(other.despawn);
        self.requests.extend(other.requests);
    }
}

#[derive(Clone, Debug, Default)]
struct Occupancy {
    /// May hold duplicates when overlapping volumes are entered twice.
    partitions:      Vec<PartitionId>,
    /// Exits deferred because they would have emptied `partitions`.
    pending_removal: Vec<PartitionId>,
}

impl Occupancy {
    fn remove_one(&mut self, partition: PartitionId) -> bool {
        match self.partitions.iter().position(|&p| p == partition) {
            Some(i) => {
                self.partitions.remove(i);
                true
            }
            None => false,
        }
    }
}

// ── PartitionGraph ────────────────────────────────────────────────────────────

pub struct PartitionGraph {
    partitions: Vec<Partition>,
    spawners:   Vec<Spawner>,
    movers:     BTreeMap<EntityId, Occupancy>,
    /// Most recent first.
    history:    [Option<PartitionId>; HISTORY_LEN],
    ai_owner:   FxHashMap<EntityId, PartitionId>,
    rng:        SimRng,
}

impl PartitionGraph {
    pub fn new(rng: SimRng) -> Self {
        Self {
            partitions: Vec::new(),
            spawners:   Vec::new(),
            movers:     BTreeMap::new(),
            history:    [None; HISTORY_LEN],
            ai_owner:   FxHashMap::default(),
            rng,
        }
    }

    // ── Level construction ────────────────────────────────────────────────

    pub fn add_partition(&mut self, name: impl Into<String>, bounds: Aabb, target_walkers: u32) -> PartitionId {
        let id = PartitionId(self.partitions.len() as u16);
        self.partitions.push(Partition::new(id, name.into(), bounds, target_walkers));
        id
    }

    /// Make `a` and `b` neighbors of each other.
    pub fn connect(&mut self, a: PartitionId, b: PartitionId) -> SpatialResult<()> {
        self.get(b)?;
        let pa = self.get_mut(a)?;
        if !pa.neighbors.contains(&b) {
            pa.neighbors.push(b);
        }
        let pb = self.get_mut(b)?;
        if !pb.neighbors.contains(&a) {
            pb.neighbors.push(a);
        }
        Ok(())
    }

    pub fn set_gated(&mut self, partition: PartitionId, gated: bool) -> SpatialResult<()> {
        self.get_mut(partition)?.gated = gated;
        Ok(())
    }

    pub fn add_spawner(&mut self, partition: PartitionId, bounds: Aabb) -> SpatialResult<SpawnerId> {
        let id = SpawnerId(self.spawners.len() as u32);
        self.get_mut(partition)?.spawners.push(id);
        self.spawners.push(Spawner { id, partition, bounds });
        Ok(id)
    }

    /// Warn about partitions that can never be populated or never become
    /// relevant through a neighbor.  Returns how many warnings were logged.
    pub fn validate(&self) -> usize {
        let mut warnings = 0;
        for p in &self.partitions {
            if p.neighbors.is_empty() {
                warn!(partition = %p.name, "spatial partition has no neighbors");
                warnings += 1;
            }
            if p.spawners.is_empty() {
                warn!(partition = %p.name, "spatial partition has no spawners");
                warnings += 1;
            }
        }
        warnings
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn get(&self, id: PartitionId) -> SpatialResult<&Partition> {
        self.partitions.get(id.index()).ok_or(SpatialError::PartitionNotFound(id))
    }

    fn get_mut(&mut self, id: PartitionId) -> SpatialResult<&mut Partition> {
        self.partitions.get_mut(id.index()).ok_or(SpatialError::PartitionNotFound(id))
    }

    pub fn spawner(&self, id: SpawnerId) -> SpatialResult<&Spawner> {
        self.spawners.get(id.index()).ok_or(SpatialError::SpawnerNotFound(id))
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Partitions whose trigger volume contains `point`.
    pub fn containing(&self, point: Vec3) -> impl Iterator<Item = PartitionId> + '_ {
        self.partitions.iter().filter(move |p| p.bounds.contains(point)).map(|p| p.id)
    }

    /// The partitions `mover` currently occupies (possibly with duplicates).
    pub fn occupied_by(&self, mover: EntityId) -> &[PartitionId] {
        self.movers.get(&mover).map_or(&[], |o| o.partitions.as_slice())
    }

    pub fn movers(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.movers.keys().copied()
    }

    pub fn history(&self) -> &[Option<PartitionId>; HISTORY_LEN] {
        &self.history
    }

    pub fn is_occupied(&self, partition: PartitionId) -> bool {
        self.movers.values().any(|o| o.partitions.contains(&partition))
    }

    pub fn occupied(&self) -> BTreeSet<PartitionId> {
        self.movers.values().flat_map(|o| o.partitions.iter().copied()).collect()
    }

    pub fn relevant(&self) -> BTreeSet<PartitionId> {
        let occupied = self.occupied();
        let mut out = self.open_neighbors(&occupied);
        out.extend(occupied);
        out
    }

    pub fn relevant_but_unoccupied(&self) -> BTreeSet<PartitionId> {
        let occupied = self.occupied();
        let mut out = self.open_neighbors(&occupied);
        out.retain(|p| !occupied.contains(p));
        out
    }

    fn open_neighbors(&self, of: &BTreeSet<PartitionId>) -> BTreeSet<PartitionId> {
        of.iter()
            .filter_map(|&p| self.partitions.get(p.index()))
            .flat_map(|p| p.neighbors.iter().copied())
            .filter(|&n| self.partitions.get(n.index()).is_some_and(|np| !np.gated))
            .collect()
    }

    /// Owning partition of a live AI.
    pub fn owner_of(&self, ai: EntityId) -> Option<PartitionId> {
        self.ai_owner.get(&ai).copied()
    }

    pub fn active_ai_total(&self) -> usize {
        self.partitions.iter().map(|p| p.active_ai.len()).sum()
    }

    // ── Movers ────────────────────────────────────────────────────────────

    /// Start tracking `mover` with no occupied partitions.
    pub fn register_mover(&mut self, mover: EntityId) {
        self.movers.entry(mover).or_default();
    }

    /// Stop tracking `mover` and repopulate around whoever is left.
    pub fn unregister_mover(&mut self, mover: EntityId) -> Repopulation {
        if self.movers.remove(&mover).is_some() {
            self.repopulate()
        } else {
            Repopulation::default()
        }
    }

    /// `mover` entered `partition`'s trigger volume.
    pub fn report_enter(&mut self, mover: EntityId, partition: PartitionId) -> SpatialResult<Repopulation> {
        self.get(partition)?;
        let occ = self.movers.entry(mover).or_default();

        // Re-entering a partition whose exit was deferred just cancels the exit.
        let cancelled = match occ.pending_removal.iter().position(|&p| p == partition) {
            Some(i) => {
                occ.pending_removal.remove(i);
                true
            }
            None => false,
        };
        if !(cancelled && occ.partitions.contains(&partition)) {
            occ.partitions.push(partition);
        }
        for stale in std::mem::take(&mut occ.pending_removal) {
            if stale != partition && occ.partitions.len() > 1 {
                occ.remove_one(stale);
            }
        }

        if self.history[0] != Some(partition) {
            self.history.rotate_right(1);
            self.history[0] = Some(partition);
        }
        trace!(mover = %mover, partition = %partition, "partition entered");
        Ok(self.repopulate())
    }

    /// `mover` left `partition`'s trigger volume.
    pub fn report_exit(&mut self, mover: EntityId, partition: PartitionId) -> SpatialResult<Repopulation> {
        self.get(partition)?;
        let occ = self.movers.entry(mover).or_default();
        if occ.partitions.len() > 1 {
            occ.remove_one(partition);
            trace!(mover = %mover, partition = %partition, "partition exited");
            Ok(self.repopulate())
        } else {
            trace!(mover = %mover, partition = %partition, "partition exit deferred");
            occ.pending_removal.push(partition);
            Ok(Repopulation::default())
        }
    }

    // ── AI ownership ──────────────────────────────────────────────────────

    /// A freshly spawned AI now belongs to `partition`.
    pub fn register_ai(&mut self, ai: EntityId, partition: PartitionId) -> SpatialResult<()> {
        self.get_mut(partition)?.active_ai.insert(ai);
        if let Some(old) = self.ai_owner.insert(ai, partition) {
            if old != partition {
                if let Ok(p) = self.get_mut(old) {
                    p.active_ai.remove(&ai);
                }
            }
        }
        Ok(())
    }

    /// An AI walked into `partition`; it changes owner.
    pub fn ai_entered(&mut self, ai: EntityId, partition: PartitionId) -> SpatialResult<()> {
        self.register_ai(ai, partition)
    }

    /// Drop `ai` without counting a kill.
    pub fn unregister_ai(&mut self, ai: EntityId) {
        if let Some(owner) = self.ai_owner.remove(&ai) {
            if let Some(p) = self.partitions.get_mut(owner.index()) {
                p.active_ai.remove(&ai);
            }
        }
    }

    /// `ai` died.  Outside a horde the kill counts against its partition.
    pub fn report_ai_death(&mut self, ai: EntityId, horde_active: bool) {
        let Some(owner) = self.ai_owner.remove(&ai) else {
            return;
        };
        if let Some(p) = self.partitions.get_mut(owner.index()) {
            p.active_ai.remove(&ai);
            if !horde_active {
                p.walkers_killed += 1;
            }
        }
    }

    // ── Population ────────────────────────────────────────────────────────

    /// Depopulate every irrelevant partition, then populate the relevant
    /// but unoccupied ones outside the history.
    pub fn repopulate(&mut self) -> Repopulation {
        let relevant = self.relevant();
        let mut out = Repopulation::default();

        for i in 0..self.partitions.len() {
            let id = self.partitions[i].id;
            if !relevant.contains(&id) {
                out.absorb(self.depopulate(id));
            }
        }
        for id in self.relevant_but_unoccupied() {
            if self.history.contains(&Some(id)) {
                continue;
            }
            out.absorb(self.populate(id));
        }
        if !out.is_empty() {
            debug!(despawn = out.despawn.len(), spawn = out.requests.len(), "repopulated");
        }
        out
    }

    /// Request one spawn per missing walker, each at a random spawner the
    /// partition owns.
    pub fn populate(&mut self, id: PartitionId) -> Repopulation {
        let mut out = Repopulation::default();
        let Some(p) = self.partitions.get(id.index()) else {
            return out;
        };
        let deficit = p.deficit();
        if deficit == 0 {
            return out;
        }
        if p.spawners.is_empty() {
            warn!(partition = %p.name, deficit, "cannot populate: no spawners");
            return out;
        }
        for _ in 0..deficit {
            if let Some(&spawner) = self.rng.choose(&p.spawners) {
                out.requests.push(SpawnRequest::normal(spawner));
            }
        }
        trace!(partition = %p.name, deficit, "populating");
        out
    }

    /// Destroy everything the partition owns.
    pub fn depopulate(&mut self, id: PartitionId) -> Repopulation {
        let mut out = Repopulation::default();
        let Some(p) = self.partitions.get_mut(id.index()) else {
            return out;
        };
        if p.active_ai.is_empty() {
            return out;
        }
        trace!(partition = %p.name, count = p.active_ai.len(), "depopulating");
        out.despawn = std::mem::take(&mut p.active_ai).into_iter().collect();
        for ai in &out.despawn {
            self.ai_owner.remove(ai);
        }
        out
    }

    /// Forget every mover, AI, and the history.  Level geometry stays.
    pub fn reset(&mut self) {
        self.movers.clear();
        self.history = [None; HISTORY_LEN];
        self.ai_owner.clear();
        for p in &mut self.partitions {
            p.active_ai.clear();
            p.walkers_killed = 0;
        }
    }
}
