use regex::Regex;

/// Canonicalizes a free-text application period into a `YYYY-MM-DD`
/// deadline. Scans for every date-like substring, tolerant of `.`, `-`,
/// `/` and the Korean 년/월/일 separators; when several dates appear the
/// string is read as a start~end range and the last date wins. Returns
/// `""` when nothing date-like is found.
pub fn normalize_deadline(text: &str) -> String {
    let pattern = Regex::new(r"(\d{4})\s*[.\-/년]\s*(\d{1,2})\s*[.\-/월]\s*(\d{1,2})\s*일?")
        .expect("deadline regex must compile");

    let mut last = None;
    for caps in pattern.captures_iter(text) {
        let (Some(year), Some(month), Some(day)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        let (Ok(month), Ok(day)) = (month.as_str().parse::<u32>(), day.as_str().parse::<u32>())
        else {
            continue;
        };
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            continue;
        }
        last = Some(format!("{}-{month:02}-{day:02}", year.as_str()));
    }

    last.unwrap_or_default()
}
