//! Rankboard – turns a periodically re-uploaded advisor-performance
//! spreadsheet export into a stable, typed document and serves it for a
//! ranked dashboard.
//!
//! The pipeline, leaf first:
//! * [`datatype`] – the semantic type of each column (percent / number / text)
//!   as tagged by the producer, plus safe numeric coercion and display formatting.
//! * [`resolve`] – maps roles such as rank, employee or score onto the actual
//!   column headers through case-insensitive, priority-ordered candidate lists.
//! * [`ranking`] – orders rows by the resolved rank column; rows without a
//!   numeric rank go last in their original order.
//! * [`rules`] – pass/fail thresholds for percent columns.
//! * [`cache`] – the [`cache::FreshnessCache`], which re-reads the JSON artifact
//!   only when it is newer than the cached copy.
//! * [`producer`] – the [`producer::DocumentProducer`] capability; the shipped
//!   implementation runs an external parser command.
//! * [`ingest`] – the [`ingest::Pipeline`]: persist the upload, run the
//!   producer, refresh the cache, and adopt a pre-existing spreadsheet at boot.
//! * [`view`] – the leaderboard served to the dashboard.
//! * [`interface`] – sequence numbers and cancellation for dashboard fetches.
//! * [`server`] – the HTTP endpoints.
//!
//! ## Data flow
//! upload → persist `latest.xlsx` → producer writes `latest.json` → cache
//! reloads → roles resolved and rows ranked → served.
//!
//! ## Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use rankboard::ingest::{Pipeline, StorageLayout};
//! use rankboard::producer::{CommandProducer, ParserConfig};
//!
//! # async fn run() -> rankboard::Result<()> {
//! let producer = Arc::new(CommandProducer::from_env(&ParserConfig::default()));
//! let pipeline = Pipeline::open(StorageLayout::new("storage"), producer).await?;
//! let document = pipeline.ingest_path("report.xlsx".as_ref()).await?;
//! println!("{} rows", document.rows().len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod datatype;
pub mod document;
pub mod error;
pub mod ingest;
pub mod interface;
pub mod producer;
pub mod ranking;
pub mod resolve;
pub mod rules;
pub mod server;
pub mod view;

pub use error::{BoardError, ParserDiagnostic, Result};
