//! # pmplanner Core Library
//!
//! Core business logic for preventive-maintenance planning. Every operation
//! is available through the standalone `pmplanner` CLI, which is a thin layer
//! over this library.
//!
//! ## Architecture
//!
//! - **Scheduler**: expands recurring definitions into a month of DRAFT work
//!   items, packed into the site's opening hours
//! - **Guard**: per-worker overlap and weekly-hour-cap checks shared by every
//!   write path
//! - **Lifecycle**: manual block edits, splitting items into groups, and
//!   publishing a period (optionally consolidating split groups)
//! - **Logistics**: delivery/pickup windows and the weekly grid for machinery
//! - **Storage**: SQLite and in-memory adapters behind the [`ports`] traits,
//!   plus TOML-based configuration
//!
//! ## Key Components
//!
//! - [`DraftGenerator`]: monthly draft generation
//! - [`DraftLifecycle`]: create/edit/delete/split/publish
//! - [`LogisticsPlanner`]: machinery agenda
//! - [`ScheduleDb`]: SQLite persistence
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod logistics;
pub mod ports;
pub mod schedule;
pub mod scheduler;
pub mod storage;

pub use calendar::Period;
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use guard::{CapacityPolicy, Guard};
pub use lifecycle::DraftLifecycle;
pub use logistics::{GridCell, GridEntry, LogisticsPlanner, Machine, MachineAgenda, UsageInterval};
pub use ports::{ChangeSet, DefinitionStore, HoursStore, ItemQuery, MachineryStore, TaskStore};
pub use schedule::{
    BlockEdit, Definition, NewBlock, Priority, PublishSummary, SplitBlock, WorkItem, WorkState,
};
pub use scheduler::DraftGenerator;
pub use storage::{Config, Fixture, MemoryStore, ScheduleDb};
