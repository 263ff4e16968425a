//! Relative posting dates and applicant counts as shown on detail pages.

use chrono::{Duration, NaiveDateTime};

/// Posting time from a relative label such as `"Há 2 semanas"`.
///
/// Months count as 30 days and years as 365. Labels that do not follow the
/// `<prefix> <number> <unit>` shape give `None`.
pub fn post_date(time_posted: Option<&str>, scrape_date: NaiveDateTime) -> Option<NaiveDateTime> {
  let parts: Vec<&str> = time_posted?.split_whitespace().collect();
  if parts.len() < 3 {
    return None;
  }

  let amount: i64 = parts[1].parse().ok()?;
  let unit = parts[2].to_lowercase();
  let offset = if unit.contains("minuto") {
    Duration::try_minutes(amount)?
  } else if unit.contains("hora") {
    Duration::try_hours(amount)?
  } else if unit.contains("dia") {
    Duration::try_days(amount)?
  } else if unit.contains("semana") {
    Duration::try_weeks(amount)?
  } else if unit.contains("mes") || unit.contains("mês") {
    Duration::try_days(amount.checked_mul(30)?)?
  } else if unit.contains("ano") {
    Duration::try_days(amount.checked_mul(365)?)?
  } else {
    return None;
  };

  scrape_date.checked_sub_signed(offset)
}

/// First run of digits, e.g. `"Mais de 200 candidaturas"` -> 200.
pub fn applicant_count(caption: Option<&str>) -> Option<u64> {
  let caption = caption?;
  let start = caption.find(|c: char| c.is_ascii_digit())?;
  let digits: String = caption[start..]
    .chars()
    .take_while(char::is_ascii_digit)
    .collect();
  digits.parse().ok()
}
