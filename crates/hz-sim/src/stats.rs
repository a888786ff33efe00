//! The population report behind the `aistats` command.

use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HordeStatus {
    Inactive,
    /// Seconds remaining.
    Timed(f32),
    Forever,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartitionStats {
    pub name:           String,
    pub active:         usize,
    pub target:         u32,
    pub walkers_killed: u32,
    pub occupied:       bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AiStats {
    pub zombies_alive:   usize,
    pub survivors_alive: usize,
    pub aggroed:         usize,
    pub queued_spawns:   usize,
    pub total_slain:     u64,
    pub dropped_spawns:  u64,
    pub horde:           HordeStatus,
    pub partitions:      Vec<PartitionStats>,
}

impl fmt::Display for AiStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partitions:")?;
        for p in &self.partitions {
            writeln!(f, "{} zombies: {}", p.name, p.active)?;
        }
        let current: Vec<&str> = self
            .partitions
            .iter()
            .filter(|p| p.occupied)
            .map(|p| p.name.as_str())
            .collect();
        writeln!(f, "Current: {}", current.join(", "))?;
        writeln!(f, "Total: {}", self.zombies_alive)?;
        writeln!(f, "Zombies Slain: {}", self.total_slain)?;
        match self.horde {
            HordeStatus::Inactive => write!(f, "Horde is inactive"),
            HordeStatus::Timed(left) => write!(f, "Horde is ACTIVE! Time left: {left:.1}"),
            HordeStatus::Forever => write!(f, "Horde is ACTIVE! Time left: forever"),
        }
    }
}
