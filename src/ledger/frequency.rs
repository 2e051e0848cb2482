use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Recurrence cadence of a series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the `index`-th scheduled date counted from `anchor` (index 0 is the
    /// anchor itself). Month and year steps are measured from the anchor rather
    /// than chained, so a series anchored on the 31st lands on the 31st again
    /// after a shorter month.
    pub fn nth_date(&self, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
        let index = i64::from(index);
        match self {
            Frequency::Daily => anchor.checked_add_signed(Duration::days(index)),
            Frequency::Weekly => anchor.checked_add_signed(Duration::weeks(index)),
            Frequency::Monthly => checked_shift_month(anchor, i32::try_from(index).ok()?),
            Frequency::Yearly => checked_shift_year(anchor, i32::try_from(index).ok()?),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }
}

/// Moves `date` by `months`, clamping the day to the length of the target month.
/// Saturates at the ends of the supported calendar.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    checked_shift_month(date, months).unwrap_or(if months < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Like [`shift_month`] but `None` when the target month is out of range.
pub fn checked_shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    clamped_date(year, month, date.day())
}

fn checked_shift_year(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    let year = date.year().checked_add(years)?;
    clamped_date(year, date.month(), date.day())
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
