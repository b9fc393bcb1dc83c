//! Forecast cycles, the four daily model runs at 00, 06, 12, and 18 UTC.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

use crate::errors::GfsFetchErr;

/// A model run identified by its initialization time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cycle {
    init_time: NaiveDateTime,
}

impl Cycle {
    /// Hours between two consecutive runs.
    pub const HOURS_BETWEEN_RUNS: u32 = 6;

    /// Run used when a date is given without a valid synoptic hour, the last of the day.
    const LAST_RUN_OF_DAY: u32 = 18;

    /// Create a cycle, the hour must be one of 0, 6, 12, or 18.
    pub fn new(date: NaiveDate, hour: u32) -> Result<Self, GfsFetchErr> {
        if !Self::is_synoptic(hour) {
            return Err(GfsFetchErr::InvalidDateTime(format!(
                "value for time (UTC) must be one of 0, 6, 12, 18, not {}",
                hour
            )));
        }

        let init_time = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| GfsFetchErr::InvalidDateTime(format!("{} {}Z", date, hour)))?;

        Ok(Cycle { init_time })
    }

    /// The most recent run at or before `now`.
    pub fn latest(now: NaiveDateTime) -> Self {
        let past_run = (now.hour() % Self::HOURS_BETWEEN_RUNS) * 3600 + now.minute() * 60
            + now.second();
        let init_time = now
            - Duration::seconds(i64::from(past_run))
            - Duration::nanoseconds(i64::from(now.nanosecond()));

        Cycle { init_time }
    }

    /// Pick the run from an optional date and hour.
    ///
    /// With neither the latest run before `now` is used. An hour without a date is a run of the
    /// day of `now` and must be a synoptic hour. A date with a missing or non-synoptic hour is its
    /// 18 UTC run.
    pub fn resolve(
        date: Option<NaiveDate>,
        hour: Option<u32>,
        now: NaiveDateTime,
    ) -> Result<Self, GfsFetchErr> {
        match (date, hour) {
            (None, None) => Ok(Self::latest(now)),
            (None, Some(hour)) => Self::new(now.date(), hour),
            (Some(date), hour) => {
                let hour = hour
                    .filter(|&hr| Self::is_synoptic(hr))
                    .unwrap_or(Self::LAST_RUN_OF_DAY);
                Self::new(date, hour)
            }
        }
    }

    /// Parse a `YYYYMMDDHH` string.
    pub fn parse(datetime: &str) -> Result<Self, GfsFetchErr> {
        let invalid = || GfsFetchErr::InvalidDateTime(datetime.to_owned());

        if datetime.len() != 10 || !datetime.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(&datetime[..8], "%Y%m%d")?;
        let hour: u32 = datetime[8..].parse().map_err(|_| invalid())?;

        Self::new(date, hour)
    }

    /// One run earlier.
    pub fn previous(self) -> Self {
        Cycle {
            init_time: self.init_time - Duration::hours(i64::from(Self::HOURS_BETWEEN_RUNS)),
        }
    }

    /// Initialization time of the run.
    pub fn init_time(&self) -> NaiveDateTime {
        self.init_time
    }

    /// Hour of the run, 0, 6, 12, or 18.
    pub fn hour(&self) -> u32 {
        self.init_time.hour()
    }

    /// The date as used in the directory names on the server, `YYYYMMDD`.
    pub fn yyyymmdd(&self) -> String {
        self.init_time.format("%Y%m%d").to_string()
    }

    fn is_synoptic(hour: u32) -> bool {
        hour < 24 && hour % Self::HOURS_BETWEEN_RUNS == 0
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.init_time.format("%Y%m%d%H"))
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_latest_rounds_down() {
        let now = at(ymd(2025, 1, 23), 17, 59, 3);
        assert_eq!(Cycle::latest(now), Cycle::new(ymd(2025, 1, 23), 12).unwrap());

        let now = at(ymd(2025, 1, 23), 0, 0, 0);
        assert_eq!(Cycle::latest(now), Cycle::new(ymd(2025, 1, 23), 0).unwrap());
    }

    #[test]
    fn test_resolve() {
        let now = at(ymd(2025, 1, 23), 9, 30, 0);

        let resolve = |date, hour| Cycle::resolve(date, hour, now).unwrap().to_string();

        assert_eq!(resolve(None, None), "2025012306");
        assert_eq!(resolve(None, Some(0)), "2025012300");
        assert_eq!(resolve(None, Some(18)), "2025012318");
        assert_eq!(resolve(Some(ymd(2025, 1, 20)), Some(12)), "2025012012");
        assert_eq!(resolve(Some(ymd(2025, 1, 20)), Some(7)), "2025012018");
        assert_eq!(resolve(Some(ymd(2025, 1, 20)), None), "2025012018");
    }

    #[test]
    fn test_resolve_hour_without_date_must_be_synoptic() {
        let now = at(ymd(2025, 1, 23), 9, 30, 0);
        match Cycle::resolve(None, Some(7), now) {
            Err(GfsFetchErr::InvalidDateTime(_)) => {}
            res => panic!("unexpected {:?}", res),
        }
    }

    #[test]
    fn test_previous_crosses_midnight() {
        let cycle = Cycle::new(ymd(2025, 3, 1), 0).unwrap();
        let prev = cycle.previous();
        assert_eq!(prev.to_string(), "2025022818");
        assert_eq!(prev.yyyymmdd(), "20250228");
        assert_eq!(prev.hour(), 18);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Cycle::parse("2025012312").unwrap(),
            Cycle::new(ymd(2025, 1, 23), 12).unwrap()
        );
        assert!(Cycle::parse("2025012313").is_err());
        assert!(Cycle::parse("20250123").is_err());
        assert!(Cycle::parse("2025x12312").is_err());
        assert!(Cycle::parse("2025023012").is_err());
    }
}
