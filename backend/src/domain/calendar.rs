//! Month arithmetic shared by the month, expense and seed services.

use chrono::{Datelike, Local, NaiveDate};

use crate::domain::error::{BudgetError, BudgetResult};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Today's date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Reject month numbers outside 1..=12
pub fn validate_month_number(month: u32) -> BudgetResult<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(BudgetError::validation("Month must be between 1 and 12"))
    }
}

/// Display name such as "November 2024"
pub fn month_name(year: i32, month: u32) -> BudgetResult<String> {
    validate_month_number(month)?;
    Ok(format!("{} {}", MONTH_NAMES[(month - 1) as usize], year))
}

/// First and last day of a month
pub fn month_bounds(year: i32, month: u32) -> BudgetResult<(NaiveDate, NaiveDate)> {
    validate_month_number(month)?;
    let invalid = || BudgetError::validation(format!("Invalid month {}-{:02}", year, month));

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = next_month(year, month);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(invalid)?;

    Ok((first, last))
}

/// The calendar month after (year, month); December rolls into January
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// (year, month) containing the given date
pub fn year_month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> BudgetResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| BudgetError::validation(format!("Invalid {}: '{}' (expected YYYY-MM-DD)", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(2024, 11).unwrap(), "November 2024");
        assert_eq!(month_name(2025, 1).unwrap(), "January 2025");
        assert!(month_name(2025, 13).is_err());
    }

    #[test]
    fn test_month_bounds_handles_leap_years() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(2023, 2).unwrap();
        assert_eq!(last.day(), 28);

        let (_, last) = month_bounds(2024, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_next_month_rolls_over_year() {
        assert_eq!(next_month(2024, 11), (2024, 12));
        assert_eq!(next_month(2024, 12), (2025, 1));
    }

    #[test]
    fn test_validate_month_number() {
        assert!(validate_month_number(1).is_ok());
        assert!(validate_month_number(12).is_ok());

        let err = validate_month_number(0).unwrap_err();
        assert_eq!(err.to_string(), "Month must be between 1 and 12");
        assert!(matches!(err, BudgetError::Validation(_)));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("start_date", "2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("start_date", "03/01/2024").is_err());
    }
}
