use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};

use crate::models::{Assignment, BurnoutResult, StressLevel, Window};

/// Used when the reply carries no percentage at all.
pub const DEFAULT_BURNOUT_PERCENT: u8 = 64;

const PERCENT_PATTERN: &str = r"(\d{1,3})\s?%";

fn find_percent(reply: &str) -> Option<u8> {
    regex::Regex::new(PERCENT_PATTERN)
        .ok()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .map(|value| value.min(100) as u8)
}

/// First 1-3 digit percentage in `reply`, capped at 100, or the documented default.
pub fn extract_burnout_percent(reply: &str) -> u8 {
    find_percent(reply).unwrap_or_else(|| {
        tracing::warn!(
            default = DEFAULT_BURNOUT_PERCENT,
            "reply carried no burnout percentage, using default"
        );
        DEFAULT_BURNOUT_PERCENT
    })
}

pub fn stress_level(burnout_percent: u8) -> StressLevel {
    match burnout_percent {
        76..=u8::MAX => StressLevel::High,
        51..=75 => StressLevel::Moderate,
        _ => StressLevel::Low,
    }
}

pub fn weekday_initial(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "M",
        Weekday::Tue | Weekday::Thu => "T",
        Weekday::Wed => "W",
        Weekday::Fri => "F",
        Weekday::Sat | Weekday::Sun => "S",
    }
}

/// Colors every weekday that has a due date with the overall stress color.
/// Weekdays sharing an initial collapse into one key.
pub fn weekly_stress_map(
    assignments: &[&Assignment],
    window: &Window,
    level: StressLevel,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for due in assignments.iter().filter_map(|a| a.due_at) {
        let initial = weekday_initial(window.local_date(&due).weekday());
        map.insert(initial.to_string(), level.color_token().to_string());
    }
    map
}

pub fn interpret_reply(reply: &str, assignments: &[&Assignment], window: &Window) -> BurnoutResult {
    let burnout = extract_burnout_percent(reply);
    let level = stress_level(burnout);

    BurnoutResult {
        burnout,
        stress_level: level,
        summary: reply.trim().to_string(),
        weekly_stress_map: weekly_stress_map(assignments, window, level),
    }
}
