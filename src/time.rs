use hifitime::{Duration, Epoch};
use std::ops::Range;
use std::str::FromStr;

use crate::constants::SecondsOfDay;
use crate::magshell_errors::MagshellError;

/// Per-observation decomposition the engine call protocol expects:
/// calendar year, day of year (1-based) and seconds elapsed in the UTC day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeParts {
    pub year: i32,
    pub doy: u16,
    pub ut: SecondsOfDay,
}

/// Ordered set of observation epochs.
///
/// This is the time-object interface consumed by the buffer builder: an already-correct
/// sequence of instants exposing the (year, day-of-year, seconds-of-day) decomposition
/// the engine buffers are filled from.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeArray {
    epochs: Vec<Epoch>,
}

impl TimeArray {
    pub fn new(epochs: Vec<Epoch>) -> Self {
        TimeArray { epochs }
    }

    /// Parse a set of ISO date strings (e.g. `"2001-02-02T12:00:00"`, UTC assumed).
    ///
    /// Return
    /// ------
    /// * A new `TimeArray`, or [`MagshellError::InvalidTime`] on the first malformed entry.
    pub fn from_iso(dates: &[&str]) -> Result<Self, MagshellError> {
        let epochs = dates
            .iter()
            .map(|d| Epoch::from_str(d).map_err(|e| MagshellError::InvalidTime(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TimeArray { epochs })
    }

    /// Build a regularly spaced range of epochs, end inclusive.
    pub fn range(start: Epoch, end: Epoch, step: Duration) -> Self {
        let mut epochs = Vec::new();
        let mut t = start;
        while t <= end {
            epochs.push(t);
            t += step;
        }
        TimeArray { epochs }
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn epoch(&self, idx: usize) -> Epoch {
        self.epochs[idx]
    }

    /// Contiguous sub-array for chunked dispatch.
    pub fn slice(&self, range: Range<usize>) -> TimeArray {
        TimeArray {
            epochs: self.epochs[range].to_vec(),
        }
    }

    /// Decompose the `idx`-th epoch into the engine's (year, doy, ut) triple.
    pub fn parts(&self, idx: usize) -> TimeParts {
        decompose(self.epochs[idx])
    }
}

/// Decompose an epoch into calendar year, 1-based day of year and UTC seconds of day.
pub fn decompose(epoch: Epoch) -> TimeParts {
    let (year, month, day, hour, minute, second, nanos) = epoch.to_gregorian_utc();
    let ut = f64::from(hour) * 3600.0
        + f64::from(minute) * 60.0
        + f64::from(second)
        + f64::from(nanos) * 1e-9;
    TimeParts {
        year,
        doy: day_of_year(year, month, day),
        ut,
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn day_of_year(year: i32, month: u8, day: u8) -> u16 {
    // Cumulative days before each month, non-leap.
    const CUM_DAYS: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let mut doy = CUM_DAYS[(month - 1) as usize] + u16::from(day);
    if month > 2 && is_leap_year(year) {
        doy += 1;
    }
    doy
}
