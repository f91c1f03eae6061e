//! Five-field cron expressions
//!
//! `minute hour day-of-month month day-of-week`, each field accepting `*`,
//! single values, ranges (`1-5`), steps (`*/15`, `0-30/10`) and comma lists.
//! Day-of-week runs 0-7 with both 0 and 7 meaning Sunday. When both day
//! fields are restricted a day matches if either one does.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use machine_core::{BriefError, Result};
use std::fmt;
use std::str::FromStr;

/// How far ahead `next_after` searches before giving up (e.g. "0 0 30 2 *").
const SEARCH_LIMIT_DAYS: i64 = 366 * 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    source: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(expr, "expected 5 fields"));
        }

        let minutes = parse_field(fields[0], 0, 59).map_err(|e| invalid(expr, &e))?;
        let hours = parse_field(fields[1], 0, 23).map_err(|e| invalid(expr, &e))?;
        let days_of_month = parse_field(fields[2], 1, 31).map_err(|e| invalid(expr, &e))?;
        let months = parse_field(fields[3], 1, 12).map_err(|e| invalid(expr, &e))?;
        let mut days_of_week = parse_field(fields[4], 0, 7).map_err(|e| invalid(expr, &e))?;
        if days_of_week & (1 << 7) != 0 {
            days_of_week |= 1;
        }

        Ok(Self {
            source: expr.trim().to_string(),
            minutes,
            hours,
            days_of_month,
            months,
            days_of_week,
            dom_restricted: !fields[2].starts_with('*'),
            dow_restricted: !fields[4].starts_with('*'),
        })
    }

    /// First matching minute strictly after `after`, in `after`'s timezone.
    ///
    /// Local times that do not exist (DST gaps) are skipped.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = after.timezone();
        let start = after.naive_local().with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);
        let limit = start + Duration::days(SEARCH_LIMIT_DAYS);
        let mut t = start;

        while t < limit {
            if !bit(self.months, t.month()) {
                t = first_of_next_month(t.date())?;
                continue;
            }
            if !self.day_matches(t.date()) {
                t = (t.date() + Duration::days(1)).and_hms_opt(0, 0, 0)?;
                continue;
            }
            if !bit(self.hours, t.hour()) {
                t = t.with_minute(0)? + Duration::hours(1);
                continue;
            }
            if !bit(self.minutes, t.minute()) {
                t += Duration::minutes(1);
                continue;
            }
            match tz.from_local_datetime(&t).earliest() {
                Some(found) => return Some(found),
                None => t += Duration::minutes(1),
            }
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        let dom = bit(self.days_of_month, date.day());
        let dow = bit(self.days_of_week, date.weekday().num_days_from_sunday());
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }
}

impl FromStr for CronSchedule {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn invalid(expr: &str, reason: &str) -> BriefError {
    BriefError::Config(format!("invalid cron expression '{}': {}", expr, reason))
}

fn bit(mask: u64, value: u32) -> bool {
    mask & (1u64 << value) != 0
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDateTime> {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)?.and_hms_opt(0, 0, 0)
}

fn parse_field(field: &str, min: u32, max: u32) -> std::result::Result<u64, String> {
    let mut mask = 0u64;
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((r, s)) => {
                let step: u32 = s.parse().map_err(|_| format!("bad step '{}'", s))?;
                if step == 0 {
                    return Err("step must be positive".to_string());
                }
                if step > max {
                    return Err(format!("step {} exceeds {}", step, max));
                }
                (r, step)
            }
            None => (part, 1),
        };

        let (lo, hi) = if range == "*" {
            (min, max)
        } else if let Some((a, b)) = range.split_once('-') {
            (parse_value(a, min, max)?, parse_value(b, min, max)?)
        } else {
            let v = parse_value(range, min, max)?;
            // "5/10" means from 5 to the end of the field, stepping by 10.
            if part.contains('/') {
                (v, max)
            } else {
                (v, v)
            }
        };
        if lo > hi {
            return Err(format!("range {}-{} is reversed", lo, hi));
        }

        for v in (lo..=hi).step_by(step as usize) {
            mask |= 1u64 << v;
        }
    }
    Ok(mask)
}

fn parse_value(s: &str, min: u32, max: u32) -> std::result::Result<u32, String> {
    let v: u32 = s.parse().map_err(|_| format!("bad value '{}'", s))?;
    if v < min || v > max {
        return Err(format!("{} out of range {}-{}", v, min, max));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_hourly() {
        let cron = CronSchedule::parse("0 * * * *").unwrap();
        assert_eq!(cron.next_after(&at(2025, 1, 1, 10, 0)), Some(at(2025, 1, 1, 11, 0)));
        assert_eq!(cron.next_after(&at(2025, 1, 1, 10, 59)), Some(at(2025, 1, 1, 11, 0)));
        assert_eq!(cron.next_after(&at(2025, 12, 31, 23, 30)), Some(at(2026, 1, 1, 0, 0)));
    }

    #[test]
    fn test_daily_at_ten() {
        let cron = CronSchedule::parse("0 10 * * *").unwrap();
        assert_eq!(cron.next_after(&at(2025, 3, 4, 9, 0)), Some(at(2025, 3, 4, 10, 0)));
        assert_eq!(cron.next_after(&at(2025, 3, 4, 10, 0)), Some(at(2025, 3, 5, 10, 0)));
    }

    #[test]
    fn test_steps_lists_and_weekdays() {
        let cron = CronSchedule::parse("*/15 9-17 * * 1-5").unwrap();
        // 2025-03-08 is a Saturday.
        assert_eq!(cron.next_after(&at(2025, 3, 8, 12, 0)), Some(at(2025, 3, 10, 9, 0)));
        assert_eq!(cron.next_after(&at(2025, 3, 10, 9, 0)), Some(at(2025, 3, 10, 9, 15)));

        let cron = CronSchedule::parse("5,35 0 1 * *").unwrap();
        assert_eq!(cron.next_after(&at(2025, 1, 1, 0, 5)), Some(at(2025, 1, 1, 0, 35)));
        assert_eq!(cron.next_after(&at(2025, 1, 1, 0, 35)), Some(at(2025, 2, 1, 0, 5)));
    }

    #[test]
    fn test_sunday_as_seven() {
        let cron = CronSchedule::parse("0 12 * * 7").unwrap();
        // 2025-03-09 is a Sunday.
        assert_eq!(cron.next_after(&at(2025, 3, 5, 0, 0)), Some(at(2025, 3, 9, 12, 0)));
    }

    #[test]
    fn test_day_of_month_or_day_of_week() {
        // The 1st of the month or any Monday.
        let cron = CronSchedule::parse("0 0 1 * 1").unwrap();
        // 2025-03-01 is a Saturday; next is Monday 2025-03-03.
        assert_eq!(cron.next_after(&at(2025, 3, 1, 0, 0)), Some(at(2025, 3, 3, 0, 0)));
    }

    #[test]
    fn test_stepped_wildcard_day_is_unrestricted() {
        // "*/2" in day-of-month does not switch on the either-day rule,
        // so only Mondays match. 2025-03-05 is a Wednesday.
        let cron = CronSchedule::parse("0 0 */2 * 1").unwrap();
        assert_eq!(cron.next_after(&at(2025, 3, 4, 0, 0)), Some(at(2025, 3, 10, 0, 0)));

        let cron = CronSchedule::parse("0 0 1 * */7").unwrap();
        assert_eq!(cron.next_after(&at(2025, 3, 4, 0, 0)), Some(at(2025, 4, 1, 0, 0)));
    }

    #[test]
    fn test_impossible_date_gives_none() {
        let cron = CronSchedule::parse("0 0 30 2 *").unwrap();
        assert_eq!(cron.next_after(&at(2025, 1, 1, 0, 0)), None);
    }

    #[test]
    fn test_rejects_malformed() {
        for expr in [
            "",
            "* * * *",
            "60 * * * *",
            "* 24 * * *",
            "*/0 * * * *",
            "5-1 * * * *",
            "a * * * *",
            "* * 0 * *",
            "5-59/4294967295 * * * *",
            "* * * * */8",
        ] {
            let err = CronSchedule::parse(expr).unwrap_err();
            assert!(matches!(err, BriefError::Config(_)), "{expr}");
        }
    }
}
