use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::engine::EngineError;
use crate::model::{Ms, Span};

/// A wall-clock `HH:mm` time, validated at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WallTime {
    pub hour: u8,
    pub minute: u8,
}

impl WallTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, EngineError> {
        if hour > 23 || minute > 59 {
            return Err(EngineError::InvalidTimeFormat(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    /// Strict `HH:mm` — anything else fails here, never deep in slot arithmetic.
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let bad = || EngineError::InvalidTimeFormat(text.to_string());
        let (h, m) = text.split_once(':').ok_or_else(bad)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(bad());
        }
        let hour: u8 = h.parse().map_err(|_| bad())?;
        let minute: u8 = m.parse().map_err(|_| bad())?;
        Self::new(hour, minute).map_err(|_| bad())
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WallTime {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for WallTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Working hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub is_open: bool,
    pub open: WallTime,
    pub close: WallTime,
}

impl DayHours {
    pub fn open(open: WallTime, close: WallTime) -> Self {
        Self { is_open: true, open, close }
    }

    pub fn closed() -> Self {
        let midnight = WallTime { hour: 0, minute: 0 };
        Self { is_open: false, open: midnight, close: midnight }
    }
}

/// A tenant's working-hours/lunch/capacity configuration. Owned by the
/// business profile; read-only to the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPolicy {
    /// The business's local timezone. Open/close/lunch comparisons and day
    /// boundaries are computed here, never in the host default zone.
    pub timezone: Tz,
    /// Index 0 = Monday … 6 = Sunday.
    working_hours: [DayHours; 7],
    lunch: Option<(WallTime, WallTime)>,
    /// Max appointments whose intervals may mutually overlap at any instant.
    pub appointment_capacity: u32,
}

impl CalendarPolicy {
    pub fn new(
        timezone: Tz,
        working_hours: [DayHours; 7],
        lunch: Option<(WallTime, WallTime)>,
        appointment_capacity: u32,
    ) -> Result<Self, EngineError> {
        for day in &working_hours {
            if day.is_open && day.open >= day.close {
                return Err(EngineError::InvalidPolicy("open time must precede close time"));
            }
        }
        if let Some((start, end)) = lunch
            && start >= end {
                return Err(EngineError::InvalidPolicy("lunch start must precede lunch end"));
            }
        if appointment_capacity == 0 {
            return Err(EngineError::InvalidPolicy("appointment capacity must be at least 1"));
        }
        Ok(Self { timezone, working_hours, lunch, appointment_capacity })
    }

    pub fn hours_for(&self, date: NaiveDate) -> &DayHours {
        &self.working_hours[date.weekday().num_days_from_monday() as usize]
    }

    /// Combine a calendar date with a wall-clock time in the business's local
    /// timezone. Ambiguous local times (DST fold) resolve to the earliest
    /// mapping; nonexistent ones (DST gap) are a policy error.
    pub fn instant_at(&self, date: NaiveDate, time: WallTime) -> Result<Ms, EngineError> {
        let naive = date
            .and_hms_opt(time.hour as u32, time.minute as u32, 0)
            .ok_or(EngineError::InvalidPolicy("wall-clock time out of range"))?;
        let local = self
            .timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or(EngineError::InvalidPolicy("local time does not exist in timezone"))?;
        Ok(local.timestamp_millis())
    }

    /// `[local midnight, next local midnight)` for the given date.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<Span, EngineError> {
        let next = date
            .succ_opt()
            .ok_or(EngineError::LimitExceeded("date out of range"))?;
        let midnight = WallTime { hour: 0, minute: 0 };
        let start = self.instant_at(date, midnight)?;
        let end = self.instant_at(next, midnight)?;
        Ok(Span::new(start, end))
    }

    /// The open interval for the date, or `None` when the day is closed.
    pub fn open_span(&self, date: NaiveDate) -> Result<Option<Span>, EngineError> {
        let hours = self.hours_for(date);
        if !hours.is_open {
            return Ok(None);
        }
        let start = self.instant_at(date, hours.open)?;
        let end = self.instant_at(date, hours.close)?;
        Ok(Some(Span::new(start, end)))
    }

    /// The lunch interval for the date, or `None` when no lunch is configured.
    pub fn lunch_span(&self, date: NaiveDate) -> Result<Option<Span>, EngineError> {
        let Some((start, end)) = self.lunch else {
            return Ok(None);
        };
        let s = self.instant_at(date, start)?;
        let e = self.instant_at(date, end)?;
        Ok(Some(Span::new(s, e)))
    }

    /// The calendar date an instant falls on in the business's timezone.
    pub fn local_date_of(&self, instant: Ms) -> Result<NaiveDate, EngineError> {
        let utc = chrono::DateTime::<Utc>::from_timestamp_millis(instant)
            .ok_or(EngineError::LimitExceeded("timestamp out of range"))?;
        Ok(utc.with_timezone(&self.timezone).date_naive())
    }
}
