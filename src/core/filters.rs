// Small predicate helpers shared by the list and history commands.
//
// Filtering in this bot is always a linear scan with a handful of optional
// criteria, so the helpers here just normalise the comparisons.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar month such as `2024-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("`{}` is not a month, use YYYY-MM (e.g. 2024-07)", s.trim());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Case-insensitive substring match. An empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Case-insensitive equality after trimming.
pub fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// `None` criteria always match; `Some` criteria must equal the value.
pub fn matches_opt<T: PartialEq>(criterion: Option<&T>, value: &T) -> bool {
    criterion.map_or(true, |expected| expected == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month() {
        let ym: YearMonth = "2024-07".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2024, month: 7 });
        assert_eq!(ym.to_string(), "2024-07");

        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("24-07".parse::<YearMonth>().is_err());
        assert!("July".parse::<YearMonth>().is_err());
    }

    #[test]
    fn year_month_contains_only_its_dates() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert!(ym.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!ym.contains(NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()));
        assert!(!ym.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn text_helpers_ignore_case() {
        assert!(contains_ci("Summer Festival", "fest"));
        assert!(contains_ci("anything", "  "));
        assert!(!contains_ci("Summer", "winter"));
        assert!(eq_ci(" SUMMER24 ", "summer24"));
        assert!(matches_opt(None, &3));
        assert!(!matches_opt(Some(&2), &3));
    }
}
