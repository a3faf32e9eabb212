//! Patrol Core Library
//!
//! Hours accounting and lottery engine for patrol contests: converts closed
//! patrol sessions into period-classified hours, enforces per-day caps,
//! maintains per-participant aggregates, and draws reward winners.

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod lottery;
pub mod models;
pub mod periods;
pub mod storage;

pub use config::{ConfigError, ContestDefaults, EngineConfig};
pub use directory::ContestDirectory;
pub use engine::{apply_daily_cap, HoursEngine, RecordOutcome};
pub use error::{Error, Result};
pub use lottery::{LotteryEngine, LotteryResults};
pub use models::*;
pub use periods::PeriodWindow;
pub use storage::{
    ContestRepository, ContestStore, Database, HoursTotals, LedgerRepository, LedgerStore,
    ParticipantRepository, ParticipantStore, Storage,
};
