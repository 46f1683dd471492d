//! Parsing of the optional date argument of the rate command.

use chrono::NaiveDate;
use thiserror::Error;

const FORMATS_WITH_YEAR: [&str; 5] = ["%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%Y-%m-%d"];
const FORMATS_WITHOUT_YEAR: [&str; 2] = ["%d/%m", "%d-%m"];

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Could not parse date: {0:?}")]
pub struct DateArgError(pub String);

/// Parse a user-supplied date. Formats without a year use `current_year`.
///
/// Accepted: `día/mes/año`, `día-mes-año`, `año-mes-día`, `día/mes`,
/// `día-mes`, with two- or four-digit years.
pub fn parse_date_arg(input: &str, current_year: i32) -> Result<NaiveDate, DateArgError> {
    let input = input.trim();

    FORMATS_WITH_YEAR
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .or_else(|| {
            let with_year = format!("{input};;{current_year}");
            FORMATS_WITHOUT_YEAR
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&with_year, &format!("{fmt};;%Y")).ok())
        })
        .ok_or_else(|| DateArgError(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_documented_examples() {
        let expected = date(2025, 7, 20);
        assert_eq!(parse_date_arg("20/07/2025", 2030), Ok(expected));
        assert_eq!(parse_date_arg("20-7-25", 2030), Ok(expected));
        assert_eq!(parse_date_arg("2025-07-20", 2030), Ok(expected));
        assert_eq!(parse_date_arg("20/07", 2025), Ok(expected));
        assert_eq!(parse_date_arg("20-07", 2025), Ok(expected));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_date_arg("01/10/21", 2030), Ok(date(2021, 10, 1)));
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(parse_date_arg("  30/03/2020 ", 2030), Ok(date(2020, 3, 30)));
    }

    #[test]
    fn test_rejects_garbage_and_impossible_dates() {
        assert!(parse_date_arg("mañana", 2025).is_err());
        assert!(parse_date_arg("31/02/2024", 2025).is_err());
        assert!(parse_date_arg("", 2025).is_err());
    }
}
