use chrono::{NaiveDate, NaiveDateTime};

/// `n` consecutive hourly timestamps starting at 2015-06-01 00:00.
pub(crate) fn hours(n: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2015, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    (0..n)
        .map(|h| start + chrono::Duration::hours(h as i64))
        .collect()
}
