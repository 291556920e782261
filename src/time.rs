//! # Coefficient epochs and calendar handling
//!
//! IRTAM coefficient sets are published every 15 minutes. This module maps a
//! requested instant (a calendar date plus decimal UT hours) onto the nearest
//! coefficient epoch and produces the timestamp strings used in file names and
//! archive queries.
//!
//! ## Rounding rule
//!
//! The seconds of day are rounded to the nearest multiple of the cadence with
//! ties going **up** (round-half-up): `00:07:30` resolves to `00:15`, while
//! `00:07:29.999` resolves to `00:00`. A slot falling on `24:00` rolls over to
//! midnight of the next day, across month and year boundaries.
//!
//! ## See also
//! ------------
//! * [`crate::coefficients::layout`] – File names built from [`CoeffEpoch`].
//! * [`crate::coefficients::store::CoefficientStore`] – Cache keyed by [`CoeffEpoch`].
use std::fmt;

use hifitime::{Epoch, Unit};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Hour, CADENCE_MINUTES, CADENCE_SECONDS, MINUTES_PER_DAY},
    irtam_errors::IrtamError,
};

/// A calendar date (UTC) used as the origin of a run's time array.
///
/// Only existing Gregorian dates can be built, including through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCalendarDate")]
pub struct CalendarDate {
    year: i32,
    month: u8,
    day: u8,
}

#[derive(Deserialize)]
struct RawCalendarDate {
    year: i32,
    month: u8,
    day: u8,
}

impl TryFrom<RawCalendarDate> for CalendarDate {
    type Error = IrtamError;

    fn try_from(raw: RawCalendarDate) -> Result<Self, Self::Error> {
        CalendarDate::new(raw.year, raw.month, raw.day)
    }
}

impl CalendarDate {
    /// Create a validated calendar date.
    ///
    /// Return
    /// ------
    /// * The date, or [`IrtamError::InvalidGridOrTimeInput`] if the day does not exist.
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, IrtamError> {
        Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|e| {
            IrtamError::InvalidGridOrTimeInput(format!(
                "invalid date {year:04}-{month:02}-{day:02}: {e}"
            ))
        })?;
        Ok(CalendarDate { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Midnight (UTC) of this date.
    pub fn midnight(&self) -> Epoch {
        Epoch::from_gregorian_utc_at_midnight(self.year, self.month, self.day)
    }

    /// Instant located `hours` decimal hours after midnight of this date.
    ///
    /// `hours` may be negative or exceed 24 to address neighbouring days.
    pub fn instant(&self, hours: Hour) -> Epoch {
        self.midnight() + Unit::Hour * hours
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A UTC timestamp quantized to the 15-minute IRTAM cadence.
///
/// The derived ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCoeffEpoch")]
pub struct CoeffEpoch {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
}

#[derive(Deserialize)]
struct RawCoeffEpoch {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
}

impl TryFrom<RawCoeffEpoch> for CoeffEpoch {
    type Error = IrtamError;

    fn try_from(raw: RawCoeffEpoch) -> Result<Self, Self::Error> {
        CoeffEpoch::new(raw.year, raw.month, raw.day, raw.hour, raw.minute)
    }
}

impl CoeffEpoch {
    /// Create an epoch from its calendar fields.
    ///
    /// Arguments
    /// ---------
    /// * `year`, `month`, `day`: UTC calendar date
    /// * `hour`, `minute`: UTC time of day, `minute` must be a multiple of the cadence
    ///
    /// Return
    /// ------
    /// * The epoch, or [`IrtamError::InvalidEpoch`] for a non-existent date or an
    ///   off-cadence time.
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> Result<Self, IrtamError> {
        if hour > 23 || minute > 59 || i64::from(minute) % CADENCE_MINUTES != 0 {
            return Err(IrtamError::InvalidEpoch(format!(
                "{hour:02}:{minute:02} is not on the {CADENCE_MINUTES}-minute cadence"
            )));
        }
        Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|e| {
            IrtamError::InvalidEpoch(format!("{year:04}-{month:02}-{day:02}: {e}"))
        })?;
        Ok(CoeffEpoch {
            year,
            month,
            day,
            hour,
            minute,
        })
    }

    /// Nearest coefficient epoch to an arbitrary instant (round-half-up).
    pub fn nearest(instant: Epoch) -> Self {
        let (year, month, day, hour, minute, second, nanos) = instant.to_gregorian_utc();

        let cadence_ns = i128::from(CADENCE_SECONDS) * 1_000_000_000;
        let seconds_of_day =
            (i128::from(hour) * 60 + i128::from(minute)) * 60 + i128::from(second);
        let ns_of_day = seconds_of_day * 1_000_000_000 + i128::from(nanos);

        let slot = (ns_of_day + cadence_ns / 2) / cadence_ns;
        let minute_of_day = slot as i64 * CADENCE_MINUTES;

        if minute_of_day >= MINUTES_PER_DAY {
            // Noon keeps the day arithmetic clear of leap seconds.
            let next = Epoch::from_gregorian_utc_at_noon(year, month, day) + Unit::Day * 1_i64;
            let (year, month, day, ..) = next.to_gregorian_utc();
            return CoeffEpoch {
                year,
                month,
                day,
                hour: 0,
                minute: 0,
            };
        }

        CoeffEpoch {
            year,
            month,
            day,
            hour: (minute_of_day / 60) as u8,
            minute: (minute_of_day % 60) as u8,
        }
    }

    /// Nearest coefficient epoch to `hours` decimal hours after midnight of `date`.
    ///
    /// Return
    /// ------
    /// * The epoch, or [`IrtamError::InvalidGridOrTimeInput`] if `hours` is not finite.
    pub fn from_decimal_hours(date: &CalendarDate, hours: Hour) -> Result<Self, IrtamError> {
        if !hours.is_finite() {
            return Err(IrtamError::InvalidGridOrTimeInput(format!(
                "non-finite time value {hours}"
            )));
        }
        Ok(CoeffEpoch::nearest(date.instant(hours)))
    }

    /// The epoch as a [`hifitime::Epoch`] in UTC.
    pub fn to_epoch(&self) -> Epoch {
        Epoch::from_gregorian_utc(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            0,
            0,
        )
    }

    /// Signed number of minutes from this epoch to `instant`.
    pub fn minutes_until(&self, instant: Epoch) -> f64 {
        (instant - self.to_epoch()).to_unit(Unit::Minute)
    }

    /// UT of the epoch in decimal hours.
    pub fn decimal_hours(&self) -> Hour {
        f64::from(self.hour) + f64::from(self.minute) / 60.0
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// `YYYYMMDD_HHMMSS`, as used in coefficient file names.
    pub fn file_stamp(&self) -> String {
        format!(
            "{:04}{:02}{:02}_{:02}{:02}00",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }

    /// `YYYY.MM.DDTHH:MM:SS`, as expected by the GAMBIT archive.
    pub fn query_stamp(&self) -> String {
        format!(
            "{:04}.{:02}.{:02}T{:02}:{:02}:00",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }

    /// Year subdirectory of the dated storage layout.
    pub fn year_dir(&self) -> String {
        format!("{:04}", self.year)
    }

    /// Month-day subdirectory of the dated storage layout.
    pub fn month_day_dir(&self) -> String {
        format!("{:02}{:02}", self.month, self.day)
    }
}

impl fmt::Display for CoeffEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:00 UTC",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}
