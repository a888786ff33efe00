//! `hz-output`: simulation output writers for the horde sim.
//!
//! | Backend | Files created                                                        |
//! |---------|----------------------------------------------------------------------|
//! | CSV     | `agent_snapshots.csv`, `tick_summaries.csv`, `partition_stats.csv`   |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `hz_sim::SimObserver`.  A tick
//! summary row is written every tick; snapshot and partition rows every
//! `config.output_interval_ticks`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hz_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SimOutputObserver::new(writer, &sim.config);
//! sim.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentSnapshotRow, PartitionRow, TickSummaryRow};
pub use writer::OutputWriter;
