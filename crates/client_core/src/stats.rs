//! Display formatting for preview statistics.

use shared::domain::{Stats, UnitPreference, MM_PER_INCH};

/// Thousands separator used for the stitch count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigitGrouping {
    #[default]
    Comma,
    Period,
}

impl DigitGrouping {
    /// Spanish locales leave four-digit numbers ungrouped (`1234`, `12.345`).
    fn min_grouped_digits(self) -> usize {
        match self {
            Self::Comma => 4,
            Self::Period => 5,
        }
    }

    fn separator(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Period => '.',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedStats {
    pub stitches: String,
    pub colors: String,
    pub width: String,
    pub height: String,
    pub changes: Option<String>,
}

pub fn format_stats(stats: &Stats, unit: UnitPreference, grouping: DigitGrouping) -> FormattedStats {
    let (width, height) = match unit {
        UnitPreference::Metric => (
            format!("{:.1} mm", stats.width),
            format!("{:.1} mm", stats.height),
        ),
        UnitPreference::Imperial => (
            format!("{:.2} in", stats.width / MM_PER_INCH),
            format!("{:.2} in", stats.height / MM_PER_INCH),
        ),
    };

    FormattedStats {
        stitches: group_thousands(stats.stitches, grouping),
        colors: stats.colors.to_string(),
        width,
        height,
        changes: stats.changes.map(|changes| changes.to_string()),
    }
}

pub fn format_stats_default(stats: &Stats, unit: UnitPreference) -> FormattedStats {
    format_stats(stats, unit, DigitGrouping::default())
}

fn group_thousands(value: u64, grouping: DigitGrouping) -> String {
    let digits = value.to_string();
    if digits.len() < grouping.min_grouped_digits() {
        return digits;
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(grouping.separator());
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(width: f64, height: f64) -> Stats {
        Stats {
            stitches: 12_345,
            colors: 4,
            width,
            height,
            changes: None,
        }
    }

    #[test]
    fn metric_uses_one_decimal_and_mm_suffix() {
        let out = format_stats_default(&stats(50.0, 25.44), UnitPreference::Metric);
        assert_eq!(out.width, "50.0 mm");
        assert_eq!(out.height, "25.4 mm");
        assert_eq!(out.stitches, "12,345");
        assert_eq!(out.colors, "4");
    }

    #[test]
    fn imperial_divides_by_25_4_with_two_decimals() {
        let out = format_stats_default(&stats(50.0, 25.4), UnitPreference::Imperial);
        assert_eq!(out.width, "1.97 in");
        assert_eq!(out.height, "1.00 in");
    }

    #[test]
    fn counts_are_unit_independent() {
        let metric = format_stats_default(&stats(10.0, 10.0), UnitPreference::Metric);
        let imperial = format_stats_default(&stats(10.0, 10.0), UnitPreference::Imperial);
        assert_eq!(metric.stitches, imperial.stitches);
        assert_eq!(metric.colors, imperial.colors);
    }

    #[test]
    fn groups_digits_with_locale_separator() {
        assert_eq!(group_thousands(0, DigitGrouping::Comma), "0");
        assert_eq!(group_thousands(999, DigitGrouping::Comma), "999");
        assert_eq!(group_thousands(1_000, DigitGrouping::Comma), "1,000");
        assert_eq!(group_thousands(1_234_567, DigitGrouping::Period), "1.234.567");
    }

    #[test]
    fn period_grouping_leaves_four_digit_counts_ungrouped() {
        assert_eq!(group_thousands(1_234, DigitGrouping::Period), "1234");
        assert_eq!(group_thousands(9_999, DigitGrouping::Period), "9999");
        assert_eq!(group_thousands(12_345, DigitGrouping::Period), "12.345");
        assert_eq!(group_thousands(1_234, DigitGrouping::Comma), "1,234");

        let mut small = stats(1.0, 1.0);
        small.stitches = 1_500;
        let out = format_stats(&small, UnitPreference::Metric, DigitGrouping::Period);
        assert_eq!(out.stitches, "1500");
    }

    #[test]
    fn color_changes_are_passed_through_when_present() {
        let mut with_changes = stats(1.0, 1.0);
        with_changes.changes = Some(7);
        let out = format_stats_default(&with_changes, UnitPreference::Imperial);
        assert_eq!(out.changes.as_deref(), Some("7"));
    }
}
