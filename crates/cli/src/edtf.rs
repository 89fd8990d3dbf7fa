//! Extended Date/Time Format checks for the DATE column.
//!
//! Accepts EDTF level 0 and level 1, plus the level 2 set and list forms
//! (`[1667,1668,1670..1672]`, `{1960,1961-12}`) catalogers use for ranges.
//! Validity only; nothing here normalizes a value.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:Y(-?[1-9]\d{4,})|(-?[0-9X]{4}))(?:-([0-9X]{2})(?:-([0-9X]{2}))?)?([?~%])?$")
            .expect("static pattern")
    })
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})(Z|[+-]\d{2}(?::\d{2})?)?$")
            .expect("static pattern")
    })
}

/// Earliest calendar day a concrete date denotes, for interval ordering.
/// `None` when any digit is unspecified or the year is extended.
type DayKey = (i64, u32, u32);

fn is_concrete(s: &str) -> bool {
    !s.contains('X')
}

/// One calendar date with optional qualifier. Returns `Some(key)` when the
/// date is valid and concrete, `Some(None)` when valid but partly
/// unspecified, `None` when invalid.
fn parse_date(value: &str) -> Option<Option<DayKey>> {
    let caps = date_re().captures(value)?;

    if caps.get(1).is_some() {
        // Extended years stand alone.
        if caps.get(3).is_some() {
            return None;
        }
        return Some(None);
    }

    let year = caps.get(2)?.as_str();
    let month = caps.get(3).map(|m| m.as_str());
    let day = caps.get(4).map(|m| m.as_str());

    if year == "-0000" {
        return None;
    }

    if let Some(m) = month {
        if is_concrete(m) {
            let n: u32 = m.parse().ok()?;
            let season = (21..=24).contains(&n);
            if !(1..=12).contains(&n) && !season {
                return None;
            }
            if season {
                return if day.is_some() { None } else { Some(None) };
            }
        } else if m != "XX" && !m.ends_with('X') {
            // `X1` makes no sense as a month.
            return None;
        }
    }

    if !is_concrete(year) {
        return Some(None);
    }
    let y: i64 = year.parse().ok()?;

    match (month, day) {
        (None, _) => Some(Some((y, 1, 1))),
        (Some(m), None) => Some(is_concrete(m).then(|| (y, m.parse().unwrap_or(1), 1))),
        (Some(m), Some(d)) => {
            if !is_concrete(m) || !is_concrete(d) {
                if is_concrete(d) {
                    let n: u32 = d.parse().ok()?;
                    if !(1..=31).contains(&n) {
                        return None;
                    }
                }
                return Some(None);
            }
            let m: u32 = m.parse().ok()?;
            let d: u32 = d.parse().ok()?;
            let year = i32::try_from(y).ok()?;
            NaiveDate::from_ymd_opt(year, m, d)?;
            Some(Some((y, m, d)))
        }
    }
}

fn parse_datetime(value: &str) -> bool {
    let Some(caps) = datetime_re().captures(value) else {
        return false;
    };
    let Some(base) = caps.get(1) else {
        return false;
    };
    if NaiveDateTime::parse_from_str(base.as_str(), "%Y-%m-%dT%H:%M:%S").is_err() {
        return false;
    }
    match caps.get(2).map(|m| m.as_str()) {
        None | Some("Z") => true,
        Some(offset) => {
            let hours: u32 = offset[1..3].parse().unwrap_or(99);
            let minutes: u32 = offset.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(0);
            hours <= 14 && minutes < 60
        }
    }
}

/// Interval `start/end`. Either side may be open (`..`) or unknown (empty),
/// but not both.
fn parse_interval(value: &str) -> bool {
    let Some((start, end)) = value.split_once('/') else {
        return false;
    };
    if end.contains('/') {
        return false;
    }
    let side = |s: &str| -> Option<Option<DayKey>> {
        match s {
            "" | ".." => Some(None),
            _ => parse_date(s),
        }
    };
    let open = |s: &str| s.is_empty() || s == "..";
    if open(start) && open(end) {
        return false;
    }
    match (side(start), side(end)) {
        (Some(Some(a)), Some(Some(b))) => a <= b,
        (Some(_), Some(_)) => true,
        _ => false,
    }
}

/// `[..]` one-of set or `{..}` all-of list of dates and `a..b` ranges.
fn parse_set(value: &str) -> bool {
    let inner = match (value.chars().next(), value.chars().last()) {
        (Some('['), Some(']')) | (Some('{'), Some('}')) if value.len() >= 2 => {
            &value[1..value.len() - 1]
        }
        _ => return false,
    };
    if inner.trim().is_empty() {
        return false;
    }
    let elements: Vec<&str> = inner.split(',').map(str::trim).collect();
    let last = elements.len() - 1;
    elements.iter().enumerate().all(|(i, element)| {
        match element.split_once("..") {
            None => parse_date(element).is_some(),
            // Open ends only at the edges of the set.
            Some(("", end)) => i == 0 && parse_date(end).is_some(),
            Some((start, "")) => i == last && parse_date(start).is_some(),
            Some((start, end)) => match (parse_date(start), parse_date(end)) {
                (Some(Some(a)), Some(Some(b))) => a <= b,
                (Some(_), Some(_)) => true,
                _ => false,
            },
        }
    })
}

/// Whether `value` is a valid EDTF expression.
pub fn is_valid_edtf(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if value.starts_with('[') || value.starts_with('{') {
        return parse_set(value);
    }
    if value.contains('/') {
        return parse_interval(value);
    }
    if value.contains('T') {
        return parse_datetime(value);
    }
    parse_date(value).is_some()
}
