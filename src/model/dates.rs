use chrono::NaiveDate;

/// Try parsing a date string with several common formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Whole days from `start` to `end`, exclusive of the end day.
pub fn span_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Human date-range label: "2024-04-01 – 2024-04-10 (9 days)".
///
/// Empty when either side is missing or unparseable.
pub fn format_range(start: &str, end: &str) -> String {
    let (Some(s), Some(e)) = (parse_date(start), parse_date(end)) else {
        return String::new();
    };
    let days = span_days(s, e);
    if days > 1 {
        format!("{start} – {end} ({days} days)")
    } else {
        format!("{start} – {end} (1 day)")
    }
}
