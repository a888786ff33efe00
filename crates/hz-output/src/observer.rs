//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use hz_core::math::flatten;
use hz_core::{EntityId, PartitionId, SimConfig, Tick, ZombieType};
use hz_sim::{AgentSnapshot, AiStats, SimObserver, TickSummary};
use tracing::warn;

use crate::row::{AgentSnapshotRow, PartitionRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes tick summaries, agent snapshots, and
/// partition stats to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    dt_secs:    f64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` to convert ticks
    /// to simulated seconds.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            dt_secs: f64::from(config.fixed_dt_secs),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the writer.  `run` does this on its own; call it after driving
    /// the sim with `run_ticks`.
    pub fn finish(&mut self) -> OutputResult<()> {
        self.writer.finish()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!(error = %e, "output write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, summary: &TickSummary) {
        let count = |n: usize| n as u64;
        let row = TickSummaryRow {
            tick:          tick.0,
            sim_time_secs: tick.0 as f64 * self.dt_secs,
            spawned:       count(summary.spawned),
            despawned:     count(summary.despawned),
            zombie_deaths: count(summary.zombie_deaths),
            aggro_changes: count(summary.aggro_changes),
            melee_hits:    count(summary.melee_hits),
            shots:         count(summary.shots),
            zombies_alive: count(summary.zombies_alive),
            aggroed:       count(summary.aggroed),
            queued_spawns: count(summary.queued_spawns),
            horde_active:  summary.horde_active,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, stats: &AiStats, agents: &[AgentSnapshot]) {
        let rows: Vec<AgentSnapshotRow> = agents.iter().map(|a| snapshot_row(tick, a)).collect();
        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }

        let partitions: Vec<PartitionRow> = stats
            .partitions
            .iter()
            .map(|p| PartitionRow {
                tick:           tick.0,
                name:           p.name.clone(),
                active:         p.active as u64,
                target:         p.target,
                walkers_killed: p.walkers_killed,
                occupied:       p.occupied,
            })
            .collect();
        if !partitions.is_empty() {
            let result = self.writer.write_partitions(&partitions);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}

fn snapshot_row(tick: Tick, a: &AgentSnapshot) -> AgentSnapshotRow {
    AgentSnapshotRow {
        entity_id:   a.entity.0,
        tick:        tick.0,
        faction:     a.faction.name(),
        zombie_type: match a.zombie_type {
            Some(ZombieType::Normal) => "Normal",
            Some(ZombieType::Stalker) => "Stalker",
            None => "",
        },
        x:           a.position.x,
        y:           a.position.y,
        z:           a.position.z,
        speed:       flatten(a.velocity).length(),
        health:      a.health,
        aggroed:     a.aggroed,
        target_id:   a.target.unwrap_or(EntityId::INVALID).0,
        partition:   a.partition.map_or(u32::MAX, |p: PartitionId| u32::from(p.0)),
    }
}
