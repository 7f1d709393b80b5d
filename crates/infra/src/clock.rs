//! System clock implementation of the core `Clock` port.

use carelog_core::Clock;
use chrono::{DateTime, Utc};

/// Process-wide wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
