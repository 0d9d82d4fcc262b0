use chrono::Duration;

pub const OVERTIME: &str = "Overtime";
pub const STARTING_NOW: &str = "Starting now";

/// "1h 25m" for an hour or more, "25m" below that. Seconds are truncated.
pub fn format_duration(d: Duration) -> String {
    let total_minutes = d.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Display text for the time left in an active session.
pub fn remaining_text(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        OVERTIME.to_string()
    } else {
        format_duration(remaining)
    }
}

/// Display text for the wait before a scheduled session.
pub fn until_start_text(wait: Duration) -> String {
    if wait <= Duration::zero() {
        STARTING_NOW.to_string()
    } else {
        format_duration(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_duration(Duration::minutes(85)), "1h 25m");
        assert_eq!(format_duration(Duration::minutes(120)), "2h 0m");
        assert_eq!(format_duration(Duration::minutes(59)), "59m");
        assert_eq!(format_duration(Duration::seconds(59)), "0m");
    }

    #[test]
    fn overtime_at_and_past_zero() {
        assert_eq!(remaining_text(Duration::zero()), OVERTIME);
        assert_eq!(remaining_text(Duration::minutes(-3)), OVERTIME);
        assert_eq!(remaining_text(Duration::seconds(1)), "0m");
    }

    #[test]
    fn starting_now_at_and_past_zero() {
        assert_eq!(until_start_text(Duration::zero()), STARTING_NOW);
        assert_eq!(until_start_text(Duration::minutes(-1)), STARTING_NOW);
        assert_eq!(until_start_text(Duration::minutes(45)), "45m");
    }
}
