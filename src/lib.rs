//! git-timesheet: estimate a daily timesheet from Git history.
//!
//! Commits are collected from a repository, grouped per day and task, sized
//! with configurable heuristics, backfilled into light days and nudged toward
//! a weekly target. The estimation core in [`estimation`] is pure; the other
//! modules handle git, windows, configuration and rendering.

pub mod cli;
pub mod commit;
pub mod config;
pub mod error;
pub mod estimation;
pub mod gitio;
pub mod model;
pub mod params;
pub mod range_processor;
pub mod reconcile;
pub mod render;
pub mod util;
pub mod window;

pub use config::EstimatorConfig;
pub use error::TimesheetError;
pub use estimation::build_timesheet;
pub use model::{CommitRecord, TaskWork, Timesheet, TimesheetDay, TimesheetSummary};
