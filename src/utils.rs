use serde::{Deserialize, Deserializer};

/// Parses a count the way the open data feed sends it ("12", "12.0", " 3 ").
/// Anything unparseable or non-finite counts as zero.
pub fn parse_lenient_count(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(f64),
    Text(String),
}

/// Deserializes a count sent as a number, a string or null. Anything that
/// isn't a finite number reads as zero.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawCount> = Deserialize::deserialize(deserializer)?;

    let count = match raw {
        Some(RawCount::Number(n)) if n.is_finite() => n,
        Some(RawCount::Text(s)) => parse_lenient_count(&s),
        _ => 0.0,
    };

    Ok(count)
}

/// Formats `part / whole` as a percentage with one decimal, ties rounded up
/// ("0.25" -> "0.3").
pub fn percent_one_decimal(part: f64, whole: f64) -> String {
    format!("{:.1}", (part * 1000.0 / whole).round() / 10.0)
}

/// Label used for an hour-of-day bucket, e.g. `8` -> "8:00"
pub fn hour_label(hour: u32) -> String {
    format!("{hour}:00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_counts() {
        assert_eq!(parse_lenient_count("12"), 12.0);
        assert_eq!(parse_lenient_count(" 3.5 "), 3.5);
        assert_eq!(parse_lenient_count(""), 0.0);
        assert_eq!(parse_lenient_count("n/a"), 0.0);
        assert_eq!(parse_lenient_count("inf"), 0.0);
    }

    #[test]
    fn one_decimal_percentages_round_ties_up() {
        assert_eq!(percent_one_decimal(1.0, 400.0), "0.3");
        assert_eq!(percent_one_decimal(3.0, 400.0), "0.8");
        assert_eq!(percent_one_decimal(1.0, 3.0), "33.3");
        assert_eq!(percent_one_decimal(0.0, 1.0), "0.0");
        assert_eq!(percent_one_decimal(1.0, 2.0), "50.0");
    }

    #[test]
    fn hour_labels() {
        assert_eq!(hour_label(0), "0:00");
        assert_eq!(hour_label(8), "8:00");
        assert_eq!(hour_label(23), "23:00");
    }
}
