//! Appointment scheduling.
//!
//! Save pipeline: Validate → Resolve combination → Generate reference → Persist.
//! Conflict detection is advisory and recomputed on demand.

mod combination;
mod naming;
mod overlap;
mod service;

pub use combination::*;
pub use naming::*;
pub use overlap::*;
pub use service::*;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Scheduling errors.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Appointment date cannot be in the past ({start} < {now})")]
    StartInPast {
        start: NaiveDateTime,
        now: NaiveDateTime,
    },

    #[error("Invalid duration: {0} hours")]
    InvalidDuration(f64),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
