//! The subsystems every tick phase reaches into, kept apart from the entity
//! tables so a phase can borrow a zombie mutably and a subsystem at once.

use hz_core::{EventChannel, SimRng};
use hz_perception::{DamageEvent, DeathEvent, Perception};
use hz_spatial::{HordeConfig, HordeManager, PartitionGraph, ProximityIndex, StalkerConfig, TriggerTracker};

/// Seed offset for the horde manager's stream.
const HORDE_STREAM: u64 = 0x0407_de00;

pub struct SimContext {
    pub perception: Perception,
    pub partitions: PartitionGraph,
    pub horde:      HordeManager,
    /// Which partition volumes each body was inside last tick.
    pub triggers:   TriggerTracker,
    /// Zombie positions at the start of the tick, for separation.
    pub proximity:  ProximityIndex,
    pub damage:     EventChannel<DamageEvent>,
    pub deaths:     EventChannel<DeathEvent>,
}

impl SimContext {
    pub fn new(seed: u64, partitions: PartitionGraph, horde: HordeConfig, stalkers: StalkerConfig) -> Self {
        let horde_rng = SimRng::new(seed).child(HORDE_STREAM);
        Self {
            perception: Perception::new(seed),
            partitions,
            horde:      HordeManager::new(horde, stalkers, horde_rng),
            triggers:   TriggerTracker::new(),
            proximity:  ProximityIndex::new(),
            damage:     EventChannel::new(),
            deaths:     EventChannel::new(),
        }
    }

    /// Forget every entity.  Level geometry and configuration stay.
    pub fn teardown(&mut self) {
        self.perception.clear();
        self.partitions.reset();
        self.horde.reset();
        self.triggers.clear();
        self.proximity = ProximityIndex::new();
        self.damage.clear();
        self.deaths.clear();
    }
}
