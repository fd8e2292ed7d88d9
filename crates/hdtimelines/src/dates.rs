//! Resolution of historical date text into ordinal day spans.

use crate::constants::CIRCA_YEARS;
use crate::error::{Result, TimelineError};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Resolved date: outer bounds plus the midpoint used for sorting and labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub earliest: i64,
    pub latest: i64,
    pub mid: i64,
    pub precision: Precision,
    /// Still in progress (an open end date, or a living person)
    pub ongoing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Year,
    Month,
    Day,
}

/// How slash-separated dates are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// ISO forms only
    #[default]
    Default,
    Mdy,
    Dmy,
}

/// Precision of dates shown in hover text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverPrecision {
    #[default]
    Day,
    Year,
}

#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    pub order: DateOrder,
    /// Ordinal used for ongoing spans
    pub today: i64,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(DateOrder::Default)
    }
}

impl DateResolver {
    pub fn new(order: DateOrder) -> Self {
        Self {
            order,
            today: date_to_ordinal(Local::now().date_naive()),
        }
    }

    pub fn with_today(mut self, today: i64) -> Self {
        self.today = today;
        self
    }

    /// Resolves `text`; empty text gives `None`, or an ongoing span when
    /// `missing_as_ongoing` is set.
    pub fn resolve(&self, text: &str, missing_as_ongoing: bool) -> Result<Option<DateSpan>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(missing_as_ongoing.then(|| self.ongoing()));
        }
        if text.eq_ignore_ascii_case("ongoing") {
            return Ok(Some(self.ongoing()));
        }

        let lower = text.to_ascii_lowercase();
        let circa = ["c.", "circa", "ca."]
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix))
            .map(|rest| &text[text.len() - rest.len()..]);

        match circa {
            Some(rest) => {
                let inner = self.parse_exact(rest.trim()).ok_or_else(|| TimelineError::bad_date(text))?;
                let earliest = shift_years(inner.earliest, -CIRCA_YEARS)
                    .ok_or_else(|| TimelineError::bad_date(text))?;
                let latest = shift_years(inner.latest, CIRCA_YEARS)
                    .ok_or_else(|| TimelineError::bad_date(text))?;
                Ok(Some(DateSpan {
                    earliest,
                    latest,
                    ..inner
                }))
            }
            None => self
                .parse_exact(text)
                .map(Some)
                .ok_or_else(|| TimelineError::bad_date(text)),
        }
    }

    /// Mid ordinal of `text`
    pub fn to_ordinal(&self, text: &str) -> Result<Option<i64>> {
        Ok(self.resolve(text, false)?.map(|span| span.mid))
    }

    fn ongoing(&self) -> DateSpan {
        DateSpan {
            earliest: self.today,
            latest: self.today,
            mid: self.today,
            precision: Precision::Day,
            ongoing: true,
        }
    }

    fn parse_exact(&self, text: &str) -> Option<DateSpan> {
        if text.contains('/') {
            let parts: Vec<&str> = text.split('/').map(str::trim).collect();
            let [a, b, year] = parts.as_slice() else {
                return None;
            };
            let (month, day) = match self.order {
                DateOrder::Default => return None,
                DateOrder::Mdy => (a, b),
                DateOrder::Dmy => (b, a),
            };
            return day_span(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?);
        }

        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let parts: Vec<&str> = body.split('-').collect();
        let year: i32 = parts.first()?.parse().ok()?;
        let year = if negative { -year } else { year };

        match parts.as_slice() {
            [_] => {
                let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
                let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
                let mid = NaiveDate::from_ymd_opt(year, 6, 15)?;
                Some(span_of(first, last, mid, Precision::Year))
            }
            [_, month] => {
                let month: u32 = month.parse().ok()?;
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                let next = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)?
                };
                let last = next.pred_opt()?;
                let mid = NaiveDate::from_ymd_opt(year, month, 15)?;
                Some(span_of(first, last, mid, Precision::Month))
            }
            [_, month, day] => day_span(year, month.parse().ok()?, day.parse().ok()?),
            _ => None,
        }
    }
}

fn day_span(year: i32, month: u32, day: u32) -> Option<DateSpan> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(span_of(date, date, date, Precision::Day))
}

fn span_of(first: NaiveDate, last: NaiveDate, mid: NaiveDate, precision: Precision) -> DateSpan {
    DateSpan {
        earliest: date_to_ordinal(first),
        latest: date_to_ordinal(last),
        mid: date_to_ordinal(mid),
        precision,
        ongoing: false,
    }
}

fn shift_years(ordinal: i64, years: i32) -> Option<i64> {
    let date = ordinal_to_date(ordinal)?;
    let shifted = date
        .with_year(date.year() + years)
        // Feb 29 in a non-leap target year
        .or_else(|| date.pred_opt()?.with_year(date.year() + years))?;
    Some(date_to_ordinal(shifted))
}

/// Day count with 0001-01-01 as day 1
pub fn date_to_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

pub fn ordinal_to_date(ordinal: i64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(i32::try_from(ordinal).ok()?)
}

/// Fractional year, for the `years` axis mode
pub fn to_years(ordinal: i64) -> f64 {
    match ordinal_to_date(ordinal) {
        Some(date) => {
            let year = date.year();
            let start = NaiveDate::from_ymd_opt(year, 1, 1).map_or(ordinal, date_to_ordinal);
            let days = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                366.0
            } else {
                365.0
            };
            f64::from(year) + (ordinal - start) as f64 / days
        }
        None => 1.0 + (ordinal - 1) as f64 / 365.2425,
    }
}

/// Hover-text rendering of an ordinal; years before 1 CE are shown as BC.
pub fn format_ordinal(ordinal: i64, precision: HoverPrecision) -> String {
    let Some(date) = ordinal_to_date(ordinal) else {
        return ordinal.to_string();
    };
    let year = date.year();
    if year <= 0 {
        return format!("{} BC", 1 - year);
    }
    match precision {
        HoverPrecision::Day => date.format("%Y-%m-%d").to_string(),
        HoverPrecision::Year => year.to_string(),
    }
}

/// Hover text for a resolved span, at the span's own precision if coarser
pub fn format_span(span: &DateSpan, precision: HoverPrecision) -> String {
    let precision = match span.precision {
        Precision::Day => precision,
        _ => HoverPrecision::Year,
    };
    let text = format_ordinal(span.mid, precision);
    if span.earliest < span.latest && span.precision == Precision::Year && span.latest - span.earliest > 366 {
        format!("c. {}", text)
    } else {
        text
    }
}

/// Whole years between two ordinals
pub fn age_years(birth: i64, death: i64) -> Option<i32> {
    let (b, d) = (ordinal_to_date(birth)?, ordinal_to_date(death)?);
    let mut age = d.year() - b.year();
    if (d.month(), d.day()) < (b.month(), b.day()) {
        age -= 1;
    }
    Some(age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ord(y: i32, m: u32, d: u32) -> i64 {
        date_to_ordinal(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn resolver() -> DateResolver {
        DateResolver::new(DateOrder::Default).with_today(ord(2025, 3, 1))
    }

    #[test]
    fn test_ordinal_epoch() {
        assert_eq!(ord(1, 1, 1), 1);
        assert_eq!(ordinal_to_date(1), NaiveDate::from_ymd_opt(1, 1, 1));
    }

    #[test]
    fn test_resolve_day() {
        let span = resolver().resolve("1066-12-25", false).unwrap().unwrap();
        let day = ord(1066, 12, 25);
        assert_eq!((span.earliest, span.latest, span.mid), (day, day, day));
        assert_eq!(span.precision, Precision::Day);
        assert!(!span.ongoing);
    }

    #[test]
    fn test_resolve_year_and_month() {
        let year = resolver().resolve("2025", false).unwrap().unwrap();
        assert_eq!(year.earliest, ord(2025, 1, 1));
        assert_eq!(year.latest, ord(2025, 12, 31));
        assert_eq!(year.mid, ord(2025, 6, 15));

        let month = resolver().resolve("1900-02", false).unwrap().unwrap();
        assert_eq!(month.earliest, ord(1900, 2, 1));
        assert_eq!(month.latest, ord(1900, 2, 28));
        assert_eq!(month.mid, ord(1900, 2, 15));

        let december = resolver().resolve("1999-12", false).unwrap().unwrap();
        assert_eq!(december.latest, ord(1999, 12, 31));
    }

    #[test]
    fn test_resolve_circa() {
        let span = resolver().resolve("c. 1028", false).unwrap().unwrap();
        assert_eq!(span.earliest, ord(1023, 1, 1));
        assert_eq!(span.latest, ord(1033, 12, 31));
        assert_eq!(span.mid, ord(1028, 6, 15));

        let leap = resolver().resolve("circa 1604-02-29", false).unwrap().unwrap();
        assert_eq!(leap.earliest, ord(1599, 2, 28));
        assert_eq!(leap.latest, ord(1609, 2, 28));
    }

    #[test]
    fn test_resolve_bce_year() {
        let span = resolver().resolve("-43", false).unwrap().unwrap();
        assert!(span.earliest < 0);
        assert_eq!(format_ordinal(span.mid, HoverPrecision::Year), "44 BC");
    }

    #[test]
    fn test_resolve_empty_and_ongoing() {
        let r = resolver();
        assert_eq!(r.resolve("", false).unwrap(), None);
        assert_eq!(r.resolve("   ", false).unwrap(), None);

        let alive = r.resolve("", true).unwrap().unwrap();
        assert!(alive.ongoing);
        assert_eq!(alive.mid, ord(2025, 3, 1));

        let open = r.resolve("Ongoing", false).unwrap().unwrap();
        assert!(open.ongoing);
    }

    #[test]
    fn test_resolve_slash_orders() {
        assert!(resolver().resolve("03/04/1900", false).is_err());

        let mdy = DateResolver::new(DateOrder::Mdy).with_today(0);
        assert_eq!(mdy.to_ordinal("03/04/1900").unwrap(), Some(ord(1900, 3, 4)));

        let dmy = DateResolver::new(DateOrder::Dmy).with_today(0);
        assert_eq!(dmy.to_ordinal("03/04/1900").unwrap(), Some(ord(1900, 4, 3)));
    }

    #[test]
    fn test_resolve_rejects_garbage() {
        let r = resolver();
        for text in ["yesterday", "1900-13", "1900-02-30", "1-2-3-4", "c. soon"] {
            let err = r.resolve(text, false).unwrap_err();
            assert!(matches!(err, TimelineError::DateParse { .. }), "{text}");
        }
    }

    #[test]
    fn test_to_years() {
        assert!((to_years(ord(2000, 1, 1)) - 2000.0).abs() < 1e-9);
        let mid = to_years(ord(2001, 7, 2));
        assert!(mid > 2001.49 && mid < 2001.51);
    }

    #[test]
    fn test_format_and_age() {
        assert_eq!(format_ordinal(ord(1815, 6, 18), HoverPrecision::Day), "1815-06-18");
        assert_eq!(format_ordinal(ord(1815, 6, 18), HoverPrecision::Year), "1815");

        let circa = resolver().resolve("c. 1028", false).unwrap().unwrap();
        assert_eq!(format_span(&circa, HoverPrecision::Day), "c. 1028");
        let month = resolver().resolve("1900-02", false).unwrap().unwrap();
        assert_eq!(format_span(&month, HoverPrecision::Day), "1900");

        assert_eq!(age_years(ord(1816, 4, 21), ord(1855, 3, 31)), Some(38));
        assert_eq!(age_years(ord(1816, 4, 21), ord(1855, 4, 21)), Some(39));
    }
}
