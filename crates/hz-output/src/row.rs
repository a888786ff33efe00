//! Plain data row types written by output backends.

/// One entity at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshotRow {
    pub entity_id:   u32,
    pub tick:        u64,
    /// `"Horde"` or `"Survivor"`.
    pub faction:     &'static str,
    /// `"Normal"`, `"Stalker"`, or empty for survivors.
    pub zombie_type: &'static str,
    pub x:           f32,
    pub y:           f32,
    pub z:           f32,
    /// Horizontal speed in m/s.
    pub speed:       f32,
    pub health:      f32,
    pub aggroed:     bool,
    /// `u32::MAX` when there is no target.
    pub target_id:   u32,
    /// `u32::MAX` when outside every partition.
    pub partition:   u32,
}

/// Tallies of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:          u64,
    pub sim_time_secs: f64,
    pub spawned:       u64,
    pub despawned:     u64,
    pub zombie_deaths: u64,
    pub aggro_changes: u64,
    pub melee_hits:    u64,
    pub shots:         u64,
    pub zombies_alive: u64,
    pub aggroed:       u64,
    pub queued_spawns: u64,
    pub horde_active:  bool,
}

/// One partition at a snapshot tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRow {
    pub tick:           u64,
    pub name:           String,
    pub active:         u64,
    pub target:         u32,
    pub walkers_killed: u32,
    pub occupied:       bool,
}
