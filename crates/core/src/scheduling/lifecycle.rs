//! Visit lifecycle state machine
//!
//! `NotStarted → InProgress → Completed`, with `Cancelled` reachable only
//! from `InProgress`. The absence of a visit log *is* the `NotStarted`
//! state; a log always carries its start instant. These checks are pure —
//! the orchestrator runs them before touching persistence.

use chrono::{DateTime, Duration, Utc};

use carelog_domain::constants::{MIN_VISIT_DURATION_MINUTES, VISIT_START_BUFFER_MINUTES};
use carelog_domain::{CarelogError, Result, Task, TimeWindow, VisitLog};

/// Preconditions for starting a visit.
///
/// The visit must not already be started, and `now` must fall inside
/// `[schedule start − buffer, schedule end]`.
pub fn check_start(window: TimeWindow, visit: Option<&VisitLog>, now: DateTime<Utc>) -> Result<()> {
    if visit.is_some() {
        return Err(CarelogError::VisitAlreadyStarted);
    }

    let earliest = window.start - Duration::minutes(VISIT_START_BUFFER_MINUTES);
    if now < earliest {
        return Err(CarelogError::VisitTooEarly { buffer_minutes: VISIT_START_BUFFER_MINUTES });
    }

    if now > window.end {
        return Err(CarelogError::VisitTooLate);
    }

    Ok(())
}

/// Preconditions for ending a visit.
///
/// Requires a started, unterminated visit that has run for at least the
/// minimum duration. The boundary is inclusive: ending exactly at
/// `start + minimum` succeeds.
pub fn check_end(visit: Option<&VisitLog>, now: DateTime<Utc>) -> Result<()> {
    let Some(visit) = visit else {
        return Err(CarelogError::VisitNotStarted);
    };

    if visit.end_time.is_some() {
        return Err(CarelogError::VisitAlreadyEnded);
    }

    let min_end = visit.start_time + Duration::minutes(MIN_VISIT_DURATION_MINUTES);
    if now < min_end {
        return Err(CarelogError::VisitTooShort { minimum_minutes: MIN_VISIT_DURATION_MINUTES });
    }

    Ok(())
}

/// Preconditions for cancelling a visit: started but not yet ended.
pub fn check_cancel(visit: Option<&VisitLog>) -> Result<()> {
    let Some(visit) = visit else {
        return Err(CarelogError::VisitNotStarted);
    };

    if visit.end_time.is_some() {
        return Err(CarelogError::CannotCancelCompleted);
    }

    Ok(())
}

/// Number of tasks still blocking the visit from ending.
#[must_use]
pub fn outstanding_tasks(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.blocks_visit_end()).count()
}

/// Task-completion gate for ending a visit: every task must be completed or
/// excused with a recorded reason.
pub fn check_tasks_complete(tasks: &[Task]) -> Result<()> {
    let outstanding = outstanding_tasks(tasks);
    if outstanding > 0 {
        return Err(CarelogError::IncompleteTasks { outstanding });
    }
    Ok(())
}
