//! # Recal Core Library
//!
//! A calendar event library built around recurrence templates, materialized
//! and virtual occurrences, and copy-on-write series splits.
//!
//! ## Features
//!
//! - **Template-Based Recurrence**: One template describes a whole series;
//!   individual occurrences only become rows when they exist or diverge
//! - **Virtual Month Expansion**: Month views mix persisted occurrences with
//!   projections computed on the fly, truncated at series boundaries
//! - **Copy-on-Write Edits**: Editing one occurrence splits the series into a
//!   lineage-linked branch template instead of mutating the original
//! - **Soft Retirement**: Superseded occurrences are retired, never deleted,
//!   so lineage stays reconstructible
//! - **Transactional Safety**: Every multi-step mutation runs in a single
//!   SQLite transaction
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: Pure cadence stepping and virtual occurrence fill
//! - [`edit`]: Divergence detection and branch merging rules
//! - [`repository`]: Data access layer with Repository pattern
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use recal_core::{
//!     db,
//!     models::{Cadence, NewEventData},
//!     repository::{EventRepository, SqliteRepository},
//! };
//! use serde_json::{Map, Value};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("events.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let mut payload = Map::new();
//!     payload.insert("title".to_string(), Value::from("Team sync"));
//!
//!     let event = repo
//!         .create_event(NewEventData {
//!             start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!             is_recurring: true,
//!             cadence: Cadence::Weekly,
//!             end_of_recurring: None,
//!             payload,
//!         })
//!         .await?;
//!     println!("Created occurrence on {}", event.start_date);
//!
//!     let june = repo.expand_month(6).await?;
//!     println!("{} occurrences in June", june.len());
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod edit;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
