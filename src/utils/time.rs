/// Formats a second count as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::format_clock;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(5 * 60), "05:00");
        assert_eq!(format_clock(25 * 60 - 1), "24:59");
        assert_eq!(format_clock(120 * 60), "120:00");
    }
}
