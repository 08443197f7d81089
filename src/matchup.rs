use chrono::{Datelike, NaiveDate};

use crate::error::MatchupError;

/// Parses `"LAL vs DAL"`, `"lal @ dal"` or `"LAL vs. DAL"` into upper-cased codes.
pub fn parse_matchup(raw: &str) -> Result<(String, String), MatchupError> {
    let normalized = raw.to_ascii_uppercase().replace('@', "VS").replace("VS.", "VS");
    let parts: Vec<&str> = normalized
        .split("VS")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [a, b] => Ok(((*a).to_string(), (*b).to_string())),
        _ => Err(MatchupError::Malformed(raw.trim().to_string())),
    }
}

/// NBA seasons are keyed by the year they tip off in October.
pub fn current_season_year(today: NaiveDate) -> i32 {
    if today.month() >= 10 {
        today.year()
    } else {
        today.year() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_separators() {
        let expected = ("LAL".to_string(), "DAL".to_string());
        assert_eq!(parse_matchup("LAL vs DAL").unwrap(), expected);
        assert_eq!(parse_matchup("lal @ dal").unwrap(), expected);
        assert_eq!(parse_matchup(" LAL vs. DAL ").unwrap(), expected);
    }

    #[test]
    fn rejects_single_team() {
        assert!(matches!(
            parse_matchup("LAL"),
            Err(MatchupError::Malformed(_))
        ));
        assert!(parse_matchup("LAL vs DAL vs BOS").is_err());
    }

    #[test]
    fn season_rolls_over_in_october() {
        let sept = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let oct = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(current_season_year(sept), 2025);
        assert_eq!(current_season_year(oct), 2026);
    }
}
