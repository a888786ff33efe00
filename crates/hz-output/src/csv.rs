//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `agent_snapshots.csv`
//! - `tick_summaries.csv`
//! - `partition_stats.csv`

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;
use tracing::debug;

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, OutputResult, PartitionRow, TickSummaryRow};

pub const SNAPSHOT_HEADER: [&str; 12] = [
    "entity_id",
    "tick",
    "faction",
    "zombie_type",
    "x",
    "y",
    "z",
    "speed",
    "health",
    "aggroed",
    "target_id",
    "partition",
];

pub const SUMMARY_HEADER: [&str; 12] = [
    "tick",
    "sim_time_secs",
    "spawned",
    "despawned",
    "zombie_deaths",
    "aggro_changes",
    "melee_hits",
    "shots",
    "zombies_alive",
    "aggroed",
    "queued_spawns",
    "horde_active",
];

pub const PARTITION_HEADER: [&str; 6] = ["tick", "partition", "active", "target", "walkers_killed", "occupied"];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    snapshots:  Writer<File>,
    summaries:  Writer<File>,
    partitions: Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open (or truncate) the CSV files in it, and
    /// write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;

        let mut snapshots = Writer::from_path(dir.join("agent_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        let mut partitions = Writer::from_path(dir.join("partition_stats.csv"))?;
        partitions.write_record(PARTITION_HEADER)?;

        debug!(dir = %dir.display(), "csv output opened");
        Ok(Self {
            snapshots,
            summaries,
            partitions,
            finished: false,
        })
    }
}

fn flag(b: bool) -> String {
    u8::from(b).to_string()
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record(&[
                row.entity_id.to_string(),
                row.tick.to_string(),
                row.faction.to_owned(),
                row.zombie_type.to_owned(),
                format!("{:.3}", row.x),
                format!("{:.3}", row.y),
                format!("{:.3}", row.z),
                format!("{:.3}", row.speed),
                row.health.to_string(),
                flag(row.aggroed),
                row.target_id.to_string(),
                row.partition.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            format!("{:.3}", row.sim_time_secs),
            row.spawned.to_string(),
            row.despawned.to_string(),
            row.zombie_deaths.to_string(),
            row.aggro_changes.to_string(),
            row.melee_hits.to_string(),
            row.shots.to_string(),
            row.zombies_alive.to_string(),
            row.aggroed.to_string(),
            row.queued_spawns.to_string(),
            flag(row.horde_active),
        ])?;
        Ok(())
    }

    fn write_partitions(&mut self, rows: &[PartitionRow]) -> OutputResult<()> {
        for row in rows {
            self.partitions.write_record(&[
                row.tick.to_string(),
                row.name.clone(),
                row.active.to_string(),
                row.target.to_string(),
                row.walkers_killed.to_string(),
                flag(row.occupied),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.snapshots.flush()?;
        self.summaries.flush()?;
        self.partitions.flush()?;
        Ok(())
    }
}
