//! Number formatting for summaries and listener output.
//!
//! Credits, distances and progress all go through here so the CLI and any
//! other front end print the same strings.

/// Format a credit amount with K/M/B suffix for compact display.
///
/// # Examples
/// ```
/// use vigil_types::formatting::format_credits;
/// assert_eq!(format_credits(500), "500 CR");
/// assert_eq!(format_credits(2_500), "2.50K CR");
/// assert_eq!(format_credits(1_500_000), "1.50M CR");
/// assert_eq!(format_credits(3_000_000_000), "3.00B CR");
/// ```
pub fn format_credits(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B CR", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M CR", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K CR", n as f64 / 1_000.0)
    } else {
        format!("{} CR", n)
    }
}

/// Format a distance in light years with two decimals.
///
/// # Examples
/// ```
/// use vigil_types::formatting::format_distance;
/// assert_eq!(format_distance(0.0), "0.00 ly");
/// assert_eq!(format_distance(12.345), "12.35 ly");
/// ```
pub fn format_distance(ly: f64) -> String {
    format!("{:.2} ly", ly)
}

/// Format `count / total` as a percentage with 1 decimal place.
///
/// A zero total formats as `0.0%` rather than dividing by zero.
///
/// # Examples
/// ```
/// use vigil_types::formatting::format_pct_ratio;
/// assert_eq!(format_pct_ratio(1, 4), "25.0%");
/// assert_eq!(format_pct_ratio(5, 0), "0.0%");
/// ```
pub fn format_pct_ratio(count: u32, total: u32) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 / total as f64 * 100.0)
}

/// Format a progress pair as `current/target`, flagging overshoot.
///
/// # Examples
/// ```
/// use vigil_types::formatting::format_progress;
/// assert_eq!(format_progress(3, 5), "3/5");
/// assert_eq!(format_progress(7, 5), "7/5 (+2)");
/// ```
pub fn format_progress(current: u32, target: u32) -> String {
    if current > target {
        format!("{}/{} (+{})", current, target, current - target)
    } else {
        format!("{}/{}", current, target)
    }
}

/// Format seconds as `Xd Yh`, `Yh Zm` or `Zm` for mission expiry countdowns.
pub fn format_remaining(secs: i64) -> String {
    if secs <= 0 {
        return "expired".to_string();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let mins = (secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
