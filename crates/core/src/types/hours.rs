//! Business-hours gate.
//!
//! Decides whether the store is open from the current instant, a daily
//! opening window and a fixed UTC offset. There is no DST handling: the
//! store's clock is a fixed offset from UTC.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Seconds in one hour.
const SECONDS_PER_HOUR: i32 = 3600;

/// Errors that can occur when building [`BusinessHours`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HoursError {
    /// The opening window is empty or exceeds one day.
    #[error("opening window must satisfy open < close <= 24 (got {open}..{close})")]
    InvalidWindow {
        /// Opening hour.
        open: u32,
        /// Closing hour.
        close: u32,
    },
    /// The UTC offset is outside the representable range.
    #[error("UTC offset must be between -23 and 23 hours (got {0})")]
    InvalidOffset(i32),
}

/// Result of the gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Messages go to the model.
    Open,
    /// Messages go to the waiting queue.
    Closed,
}

impl GateStatus {
    /// Returns true if the store is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Daily opening window in the store's local time.
///
/// The store is open iff the local hour is in `[open_hour, close_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    open_hour: u32,
    close_hour: u32,
    offset: FixedOffset,
}

impl Default for BusinessHours {
    /// 08h to 18h at UTC-3.
    fn default() -> Self {
        Self {
            open_hour: 8,
            close_hour: 18,
            offset: FixedOffset::west_opt(3 * SECONDS_PER_HOUR).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl BusinessHours {
    /// Build an opening window.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidWindow`] unless `open_hour < close_hour <= 24`,
    /// and [`HoursError::InvalidOffset`] if the offset is not a valid whole-hour offset.
    pub fn new(open_hour: u32, close_hour: u32, utc_offset_hours: i32) -> Result<Self, HoursError> {
        if open_hour >= close_hour || close_hour > 24 {
            return Err(HoursError::InvalidWindow {
                open: open_hour,
                close: close_hour,
            });
        }

        let offset = utc_offset_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(FixedOffset::east_opt)
            .ok_or(HoursError::InvalidOffset(utc_offset_hours))?;

        Ok(Self {
            open_hour,
            close_hour,
            offset,
        })
    }

    /// Opening hour (inclusive).
    #[must_use]
    pub const fn open_hour(&self) -> u32 {
        self.open_hour
    }

    /// Closing hour (exclusive).
    #[must_use]
    pub const fn close_hour(&self) -> u32 {
        self.close_hour
    }

    /// The store's fixed UTC offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Hour of day at `now` in the store's timezone.
    #[must_use]
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.offset).hour()
    }

    /// Gate decision at `now`.
    ///
    /// `force_closed` is the manual override and wins over the clock.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>, force_closed: bool) -> GateStatus {
        if force_closed {
            return GateStatus::Closed;
        }

        let hour = self.local_hour(now);
        if (self.open_hour..self.close_hour).contains(&hour) {
            GateStatus::Open
        } else {
            GateStatus::Closed
        }
    }

    /// Human-readable window, e.g. `08h às 18h`.
    #[must_use]
    pub fn window_label(&self) -> String {
        format!("{:02}h às {:02}h", self.open_hour, self.close_hour)
    }
}
