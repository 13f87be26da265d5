// src/models/holidays.rs

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// A US federal holiday, keyed by name so every occurrence shares one effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub name: &'static str,
    pub date: NaiveDate,
}

/// Fixed-date holidays move to Friday/Monday when they fall on a weekend.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => None,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_next - Duration::days(1);
    while day.weekday() != weekday {
        day -= Duration::days(1);
    }
    Some(day)
}

/// US federal holidays for one calendar year, observed dates included.
pub fn us_holidays_for_year(year: i32) -> Vec<Holiday> {
    let mut fixed: Vec<(&'static str, Option<NaiveDate>)> = vec![
        ("New Year's Day", NaiveDate::from_ymd_opt(year, 1, 1)),
        ("Independence Day", NaiveDate::from_ymd_opt(year, 7, 4)),
        ("Veterans Day", NaiveDate::from_ymd_opt(year, 11, 11)),
        ("Christmas Day", NaiveDate::from_ymd_opt(year, 12, 25)),
    ];
    if year >= 2021 {
        fixed.push(("Juneteenth National Independence Day", NaiveDate::from_ymd_opt(year, 6, 19)));
    }

    let floating: Vec<(&'static str, Option<NaiveDate>)> = vec![
        ("Martin Luther King Jr. Day", nth_weekday(year, 1, Weekday::Mon, 3)),
        ("Washington's Birthday", nth_weekday(year, 2, Weekday::Mon, 3)),
        ("Memorial Day", last_weekday(year, 5, Weekday::Mon)),
        ("Labor Day", nth_weekday(year, 9, Weekday::Mon, 1)),
        ("Columbus Day", nth_weekday(year, 10, Weekday::Mon, 2)),
        ("Thanksgiving", nth_weekday(year, 11, Weekday::Thu, 4)),
    ];

    let mut holidays = Vec::new();
    for (name, date) in fixed {
        if let Some(date) = date {
            holidays.push(Holiday { name, date });
            if let Some(obs) = observed(date) {
                holidays.push(Holiday { name, date: obs });
            }
        }
    }
    for (name, date) in floating {
        if let Some(date) = date {
            holidays.push(Holiday { name, date });
        }
    }
    holidays.sort_by_key(|h| h.date);
    holidays
}

/// All holidays between `start` and `end` inclusive.
pub fn us_holidays_between(start: NaiveDate, end: NaiveDate) -> Vec<Holiday> {
    if end < start {
        return Vec::new();
    }
    (start.year()..=end.year())
        .flat_map(us_holidays_for_year)
        .filter(|h| h.date >= start && h.date <= end)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn floating_holidays_2023() {
        let holidays = us_holidays_for_year(2023);
        let find = |name: &str| {
            holidays
                .iter()
                .filter(|h| h.name == name)
                .map(|h| h.date)
                .collect::<Vec<_>>()
        };
        assert_eq!(find("Martin Luther King Jr. Day"), vec![ymd(2023, 1, 16)]);
        assert_eq!(find("Memorial Day"), vec![ymd(2023, 5, 29)]);
        assert_eq!(find("Labor Day"), vec![ymd(2023, 9, 4)]);
        assert_eq!(find("Thanksgiving"), vec![ymd(2023, 11, 23)]);
    }

    #[test]
    fn weekend_holiday_gets_observed_date() {
        // 2022-12-25 was a Sunday
        let christmas: Vec<_> = us_holidays_for_year(2022)
            .into_iter()
            .filter(|h| h.name == "Christmas Day")
            .map(|h| h.date)
            .collect();
        assert_eq!(christmas, vec![ymd(2022, 12, 25), ymd(2022, 12, 26)]);
    }

    #[test]
    fn juneteenth_only_from_2021() {
        assert!(!us_holidays_for_year(2020)
            .iter()
            .any(|h| h.name.starts_with("Juneteenth")));
        assert!(us_holidays_for_year(2021)
            .iter()
            .any(|h| h.name.starts_with("Juneteenth")));
    }

    #[test]
    fn between_filters_inclusive_range() {
        let holidays = us_holidays_between(ymd(2023, 7, 4), ymd(2023, 9, 4));
        let names: Vec<_> = holidays.iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Independence Day", "Labor Day"]);
        assert!(us_holidays_between(ymd(2023, 2, 1), ymd(2023, 1, 1)).is_empty());
    }
}
