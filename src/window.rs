use anyhow::{Context, Result, bail};
use chrono::{DateTime, Datelike, Days, Duration, Local, Months, NaiveDate};
use chrono_english::{Interval, parse_duration};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use two_timer::{parse as parse_natural, Config as NaturalConfig};

// Windowing-related types live here to keep main focused.

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum WindowSpec {
  Month { ym: String },
  ForPhrase { phrase: String },
  SinceUntil { since: String, until: String },
}

/// An inclusive calendar-date range, optionally labeled (`2025-08`, `2025-W33`).
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct DateRange {
  pub label: Option<String>,
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl DateRange {
  fn new(label: Option<String>, start: NaiveDate, end: NaiveDate) -> Self {
    Self { label, start, end }
  }
}

static RE_LAST_WEEKDAY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^last\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$").unwrap());
static RE_EVERY_MONTH: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^every\s+month\s+for\s+the\s+last\s+(\d+)\s+months?$").unwrap());
static RE_EVERY_WEEK: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^every\s+week\s+for\s+the\s+last\s+(\d+)\s+weeks?$").unwrap());

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, month, 1).with_context(|| format!("invalid month {year:04}-{month:02}"))
}

fn last_of_month(first: NaiveDate) -> Result<NaiveDate> {
  first
    .checked_add_months(Months::new(1))
    .and_then(|d| d.pred_opt())
    .context("month out of range")
}

/// First and last day of a `YYYY-MM` month.
pub fn month_bounds(year_month: &str) -> Result<(NaiveDate, NaiveDate)> {
  let parts: Vec<&str> = year_month.split('-').collect();

  if parts.len() != 2 {
    bail!("invalid --month, expected YYYY-MM");
  }
  let y: i32 = parts[0].parse().context("parsing year in --month")?;
  let m: u32 = parts[1].parse().context("parsing month in --month")?;

  if !(1..=12).contains(&m) {
    bail!("invalid month in --month");
  }
  let first = first_of_month(y, m)?;
  Ok((first, last_of_month(first)?))
}

fn parse_date_flag(flag: &str, raw: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid {flag} {raw:?}, expected YYYY-MM-DD"))
}

/// Resolve a window into one or more inclusive date ranges.
///
/// Only the multi-bucket `--for` phrases produce more than one range.
pub fn resolve_ranges(window: &WindowSpec, now: DateTime<Local>) -> Result<Vec<DateRange>> {
  match window {
    WindowSpec::SinceUntil { since, until } => {
      let start = parse_date_flag("--since", since)?;
      let end = parse_date_flag("--until", until)?;
      Ok(vec![DateRange::new(None, start, end)])
    }
    WindowSpec::Month { ym } => {
      let (start, end) = month_bounds(ym)?;
      Ok(vec![DateRange::new(Some(ym.clone()), start, end)])
    }
    WindowSpec::ForPhrase { phrase } => match for_phrase_buckets(phrase, now)? {
      Some(buckets) => Ok(buckets),
      None => Ok(vec![for_phrase_bounds(phrase, now)?]),
    },
  }
}

// --- Helpers for `--for` parsing ---

fn start_of_week(d: NaiveDate) -> NaiveDate {
  d - Duration::days(d.weekday().num_days_from_monday() as i64)
}

fn weekday_index(name: &str) -> i64 {
  match name {
    "monday" => 0,
    "tuesday" => 1,
    "wednesday" => 2,
    "thursday" => 3,
    "friday" => 4,
    "saturday" => 5,
    _ => 6,
  }
}

/// Parse a `--now-override` string into a local DateTime.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive local timestamp
/// formatted as `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Local>> {
  s.and_then(|raw| {
    chrono::DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Local))
      .or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .and_then(|ndt| ndt.and_local_timezone(Local).single())
      })
  })
}

/// Range for a single natural-language phrase; ranges never extend past today.
pub fn for_phrase_bounds(input: &str, now: DateTime<Local>) -> Result<DateRange> {
  let phrase = input.trim().to_lowercase();
  let today = now.date_naive();

  match phrase.as_str() {
    "today" => return Ok(DateRange::new(None, today, today)),
    "yesterday" => {
      let d = today - Duration::days(1);
      return Ok(DateRange::new(None, d, d));
    }
    "this week" => return Ok(DateRange::new(None, start_of_week(today), today)),
    "last week" => {
      let this_monday = start_of_week(today);
      return Ok(DateRange::new(None, this_monday - Duration::days(7), this_monday - Duration::days(1)));
    }
    "this month" => return Ok(DateRange::new(None, first_of_month(today.year(), today.month())?, today)),
    "last month" => {
      let first_this = first_of_month(today.year(), today.month())?;
      let first_last = first_this.checked_sub_months(Months::new(1)).context("month out of range")?;
      return Ok(DateRange::new(None, first_last, first_this - Duration::days(1)));
    }
    _ => {}
  }

  // last <weekday>: the strictly previous occurrence, as a single day
  if let Some(caps) = RE_LAST_WEEKDAY.captures(&phrase) {
    let target_idx = weekday_index(&caps[1]);
    let cur_idx = today.weekday().num_days_from_monday() as i64;
    let mut delta_days = cur_idx - target_idx;
    if delta_days <= 0 {
      delta_days += 7;
    }
    let d = today - Duration::days(delta_days);
    return Ok(DateRange::new(None, d, d));
  }

  // Durations look back from today whichever way they are phrased.
  if let Ok(interval) = parse_duration(&phrase) {
    let start = match interval {
      Interval::Seconds(secs) => (now - Duration::seconds(i64::from(secs).abs())).date_naive(),
      Interval::Days(days) => today
        .checked_sub_days(Days::new(u64::from(days.unsigned_abs())))
        .context("--for duration out of range")?,
      Interval::Months(months) => today
        .checked_sub_months(Months::new(months.unsigned_abs()))
        .context("--for duration out of range")?,
    };
    return Ok(DateRange::new(None, start, today));
  }

  // Natural ranges via two_timer (last year, this quarter, ...); its end is exclusive.
  if let Ok((start_naive, end_naive, _lit)) = parse_natural(&phrase, Some(NaturalConfig::new().now(now.naive_local()))) {
    let start = start_naive.date();
    let end = (end_naive - Duration::seconds(1)).date().min(today);
    if start > end {
      bail!("--for {input:?} lies entirely in the future");
    }
    return Ok(DateRange::new(None, start, end));
  }

  bail!("unrecognized --for phrase {input:?}")
}

pub fn is_multi_bucket(window: &WindowSpec) -> bool {
  match window {
    WindowSpec::ForPhrase { phrase } => {
      let phrase = phrase.trim().to_lowercase();
      RE_EVERY_MONTH.is_match(&phrase) || RE_EVERY_WEEK.is_match(&phrase)
    }
    _ => false,
  }
}

/// If the phrase is a multi-bucket request (e.g., "every month for the last N months"),
/// compute labeled buckets (chronological, earliest first). Otherwise, return None.
/// The current, incomplete week or month is never a bucket.
pub fn for_phrase_buckets(input: &str, now: DateTime<Local>) -> Result<Option<Vec<DateRange>>> {
  let phrase = input.trim().to_lowercase();
  let today = now.date_naive();

  if let Some(caps) = RE_EVERY_MONTH.captures(&phrase) {
    let n: u32 = caps[1].parse().context("parsing month count in --for")?;
    let mut out: Vec<DateRange> = Vec::new();
    let mut cursor = first_of_month(today.year(), today.month())?;
    if cursor.checked_sub_months(Months::new(n)).is_none() {
      bail!("--for month count {n} reaches past the supported calendar");
    }
    for _ in 0..n {
      let start = cursor.checked_sub_months(Months::new(1)).context("month out of range")?;
      let label = format!("{:04}-{:02}", start.year(), start.month());
      out.push(DateRange::new(Some(label), start, cursor - Duration::days(1)));
      cursor = start;
    }
    out.reverse();
    return Ok(Some(out));
  }

  if let Some(caps) = RE_EVERY_WEEK.captures(&phrase) {
    let n: u32 = caps[1].parse().context("parsing week count in --for")?;
    let mut out: Vec<DateRange> = Vec::new();
    let mut cursor = start_of_week(today);
    if cursor.checked_sub_days(Days::new(7 * u64::from(n))).is_none() {
      bail!("--for week count {n} reaches past the supported calendar");
    }
    for _ in 0..n {
      let start = cursor - Duration::days(7);
      let iso = start.iso_week();
      let label = format!("{}-W{:02}", iso.year(), iso.week());
      out.push(DateRange::new(Some(label), start, cursor - Duration::days(1)));
      cursor = start;
    }
    out.reverse();
    return Ok(Some(out));
  }

  Ok(None)
}
