/*
Copyright 2023 Shelfmelt Authors

This file is part of Shelfmelt.

Shelfmelt is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

Shelfmelt is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with Shelfmelt. If not, see https://www.gnu.org/licenses/.
*/

//! Decoding of CF-convention time axes into years.
//!
//! Climate models frequently use calendars without leap days
//! so for those the year is computed arithmetically instead
//! of via the Gregorian calendar.

use crate::{errors::CalendarError, Float};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Calendars defined by CF conventions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Calendar {
    Gregorian,
    NoLeap,
    AllLeap,
    Day360,
}

impl Calendar {
    pub fn from_attribute(name: &str) -> Result<Self, CalendarError> {
        match name.trim().to_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Gregorian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            _ => Err(CalendarError::UnsupportedCalendar(name.to_string())),
        }
    }

    /// Month lengths of calendars with fixed year length.
    fn month_lengths(&self) -> Option<[u32; 12]> {
        match self {
            Calendar::Gregorian => None,
            Calendar::NoLeap => Some([31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]),
            Calendar::AllLeap => Some([31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]),
            Calendar::Day360 => Some([30; 12]),
        }
    }
}

/// Reference date fields as written in the units,
/// whether the date exists depends on the calendar.
#[derive(Copy, Clone, PartialEq, Debug)]
struct ReferenceDate {
    year: i32,
    month: u32,
    day: u32,
    seconds: Float,
}

impl ReferenceDate {
    fn invalid(&self, calendar: Calendar) -> CalendarError {
        CalendarError::InvalidReferenceDate {
            date: format!("{}-{:02}-{:02}", self.year, self.month, self.day),
            calendar,
        }
    }
}

/// Time axis units in form `<unit> since <reference date>`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TimeUnits {
    seconds_per_unit: Float,
    reference: ReferenceDate,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self, CalendarError> {
        let malformed = || CalendarError::MalformedUnits(units.to_string());

        let (unit, reference) = units.split_once(" since ").ok_or_else(malformed)?;

        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "days" | "day" | "d" => 86_400.0,
            "hours" | "hour" | "h" => 3_600.0,
            "minutes" | "minute" | "min" => 60.0,
            "seconds" | "second" | "s" => 1.0,
            _ => return Err(malformed()),
        };

        let reference = parse_reference(reference.trim()).ok_or_else(malformed)?;

        Ok(TimeUnits {
            seconds_per_unit,
            reference,
        })
    }
}

/// Parses reference date, with or without time of day.
/// Single-digit months and days (`1850-1-1`) are accepted.
fn parse_reference(reference: &str) -> Option<ReferenceDate> {
    let mut parts = reference.split(|c: char| c == ' ' || c == 'T');
    let date = parts.next()?;
    let time = parts.next().unwrap_or("00:00:00").trim_end_matches('Z');

    let mut date_fields = date.splitn(3, '-');
    let year = date_fields.next()?.parse::<i32>().ok()?;
    let month = date_fields.next()?.parse::<u32>().ok()?;
    let day = date_fields.next()?.parse::<u32>().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut time_fields = time.splitn(3, ':');
    let hours = time_fields.next()?.parse::<u32>().ok()?;
    let minutes = time_fields.next().map_or(Some(0), |m| m.parse::<u32>().ok())?;
    let seconds = time_fields
        .next()
        .map_or(Some(0.0), |s| s.parse::<Float>().ok())?;

    if hours > 23 || minutes > 59 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    Some(ReferenceDate {
        year,
        month,
        day,
        seconds: Float::from(hours * 3600 + minutes * 60) + seconds,
    })
}

/// Start of the time axis, resolved in a given calendar.
enum Origin {
    Gregorian(NaiveDateTime),
    Fixed {
        year: i32,
        /// Days from the start of `year`, including time of day.
        day: Float,
        year_length: Float,
    },
}

impl Origin {
    fn resolve(reference: ReferenceDate, calendar: Calendar) -> Result<Self, CalendarError> {
        match calendar.month_lengths() {
            None => {
                let offset = Duration::milliseconds((reference.seconds * 1000.0).round() as i64);
                let datetime =
                    NaiveDate::from_ymd_opt(reference.year, reference.month, reference.day)
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .and_then(|midnight| midnight.checked_add_signed(offset))
                        .ok_or_else(|| reference.invalid(calendar))?;

                Ok(Origin::Gregorian(datetime))
            }
            Some(lengths) => {
                let month = reference.month as usize - 1;

                if reference.day > lengths[month] {
                    return Err(reference.invalid(calendar));
                }

                let month_start: u32 = lengths[..month].iter().sum();
                let day =
                    Float::from(month_start + reference.day - 1) + reference.seconds / 86_400.0;

                Ok(Origin::Fixed {
                    year: reference.year,
                    day,
                    year_length: Float::from(lengths.iter().sum::<u32>()),
                })
            }
        }
    }
}

/// Computes the year of every time value.
pub fn decode_years(
    values: &[Float],
    units: &TimeUnits,
    calendar: Calendar,
) -> Result<Vec<i32>, CalendarError> {
    let origin = Origin::resolve(units.reference, calendar)?;

    values
        .iter()
        .map(|&value| decode_year(value, units.seconds_per_unit, &origin))
        .collect()
}

fn decode_year(
    value: Float,
    seconds_per_unit: Float,
    origin: &Origin,
) -> Result<i32, CalendarError> {
    if !value.is_finite() {
        return Err(CalendarError::OutOfRange(value));
    }

    let seconds = value * seconds_per_unit;

    // roughly 30 million years, beyond that chrono cannot represent dates
    if seconds.abs() > 1.0e15 {
        return Err(CalendarError::OutOfRange(value));
    }

    match *origin {
        Origin::Gregorian(reference) => {
            let offset = Duration::milliseconds((seconds * 1000.0).round() as i64);
            let datetime = reference
                .checked_add_signed(offset)
                .ok_or(CalendarError::OutOfRange(value))?;

            Ok(datetime.year())
        }
        Origin::Fixed {
            year,
            day,
            year_length,
        } => {
            let days = day + seconds / 86_400.0;
            let years = (days / year_length).floor();

            Ok(year + years as i32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_years, Calendar, TimeUnits};
    use crate::errors::CalendarError;

    #[test]
    fn gregorian_years() {
        let units = TimeUnits::parse("days since 1850-01-01 00:00:00").unwrap();
        let years = decode_years(&[15.5, 365.0, 730.5], &units, Calendar::Gregorian).unwrap();

        assert_eq!(years, vec![1850, 1851, 1852]);
    }

    #[test]
    fn noleap_does_not_drift() {
        let units = TimeUnits::parse("days since 1850-1-1").unwrap();

        // mid-January 250 years later in a 365 day calendar
        let value = 250.0 * 365.0 + 15.5;
        let years = decode_years(&[value], &units, Calendar::NoLeap).unwrap();
        assert_eq!(years, vec![2100]);

        // the same value on the Gregorian calendar lands 2 months earlier
        let years = decode_years(&[value], &units, Calendar::Gregorian).unwrap();
        assert_eq!(years, vec![2099]);
    }

    #[test]
    fn day360_and_hours() {
        let units = TimeUnits::parse("hours since 2000-07-01").unwrap();

        // 180 days brings 360-day calendar exactly to the next year
        let years = decode_years(&[179.0 * 24.0, 180.0 * 24.0], &units, Calendar::Day360).unwrap();
        assert_eq!(years, vec![2000, 2001]);
    }

    #[test]
    fn noleap_reference_after_february_of_leap_year() {
        let units = TimeUnits::parse("days since 2000-12-31").unwrap();
        let years = decode_years(&[0.0, 0.5, 1.0], &units, Calendar::NoLeap).unwrap();
        assert_eq!(years, vec![2000, 2000, 2001]);

        // 2000-12-31 in a 365 day calendar
        let units = TimeUnits::parse("days since 2000-03-01").unwrap();
        let years = decode_years(&[305.0, 306.0], &units, Calendar::NoLeap).unwrap();
        assert_eq!(years, vec![2000, 2001]);
    }

    #[test]
    fn all_leap_reference_after_february_of_common_year() {
        // 2001-03-01 is 60 days into a 366 day year
        let units = TimeUnits::parse("days since 2001-03-01").unwrap();
        let years = decode_years(&[305.0, 306.0], &units, Calendar::AllLeap).unwrap();

        assert_eq!(years, vec![2001, 2002]);
    }

    #[test]
    fn reference_dates_follow_calendar() {
        let units = TimeUnits::parse("days since 2000-02-30").unwrap();
        let years = decode_years(&[300.0, 301.0], &units, Calendar::Day360).unwrap();
        assert_eq!(years, vec![2000, 2001]);

        assert!(matches!(
            decode_years(&[0.0], &units, Calendar::Gregorian),
            Err(CalendarError::InvalidReferenceDate {
                calendar: Calendar::Gregorian,
                ..
            })
        ));

        let units = TimeUnits::parse("days since 2001-02-29").unwrap();
        assert!(decode_years(&[0.0], &units, Calendar::AllLeap).is_ok());
        assert!(matches!(
            decode_years(&[0.0], &units, Calendar::NoLeap),
            Err(CalendarError::InvalidReferenceDate { .. })
        ));
    }

    #[test]
    fn calendar_names() {
        assert_eq!(Calendar::from_attribute("365_day").unwrap(), Calendar::NoLeap);
        assert_eq!(
            Calendar::from_attribute("proleptic_gregorian").unwrap(),
            Calendar::Gregorian
        );
        assert!(matches!(
            Calendar::from_attribute("julian"),
            Err(CalendarError::UnsupportedCalendar(_))
        ));
    }

    #[test]
    fn malformed_units() {
        assert!(TimeUnits::parse("days after 1850-01-01").is_err());
        assert!(TimeUnits::parse("fortnights since 1850-01-01").is_err());
        assert!(TimeUnits::parse("days since yesterday").is_err());
        assert!(TimeUnits::parse("days since 2000-13-01").is_err());
        assert!(TimeUnits::parse("days since 2000-01-01 25:00").is_err());
        assert!(TimeUnits::parse("seconds since 1970-01-01T00:00:00Z").is_ok());
    }
}
