//! Weekly delivery-day schedules for self-delivery routes.

use super::ReferenceDomainError;
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

/// Days per week, the longest gap between two scheduled days.
const DAYS_PER_WEEK: usize = 7;

/// Set of weekdays on which a route runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliverySchedule {
    mask: u8,
}

impl DeliverySchedule {
    /// Creates a schedule from the given weekdays.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::EmptySchedule`] when no weekday is
    /// given.
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Result<Self, ReferenceDomainError> {
        let mask = days
            .into_iter()
            .fold(0_u8, |mask, day| mask | Self::bit(day));
        if mask == 0 {
            return Err(ReferenceDomainError::EmptySchedule);
        }
        Ok(Self { mask })
    }

    /// Parses a schedule from weekday names such as `"tue"` or `"Friday"`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceDomainError::InvalidWeekday`] for unknown names and
    /// [`ReferenceDomainError::EmptySchedule`] for an empty list.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ReferenceDomainError> {
        let days = names
            .iter()
            .map(|name| {
                Weekday::from_str(name.as_ref().trim())
                    .map_err(|_| ReferenceDomainError::InvalidWeekday(name.as_ref().to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }

    /// Returns whether the route runs on `day`.
    #[must_use]
    pub fn runs_on(self, day: Weekday) -> bool {
        self.mask & Self::bit(day) != 0
    }

    /// Returns the first scheduled date on or after `date`.
    #[must_use]
    pub fn next_on_or_after(self, date: NaiveDate) -> NaiveDate {
        date.iter_days()
            .take(DAYS_PER_WEEK)
            .find(|candidate| self.runs_on(candidate.weekday()))
            .unwrap_or(date)
    }

    /// Returns the first scheduled date strictly after `date`.
    #[must_use]
    pub fn next_after(self, date: NaiveDate) -> NaiveDate {
        date.iter_days()
            .skip(1)
            .take(DAYS_PER_WEEK)
            .find(|candidate| self.runs_on(candidate.weekday()))
            .unwrap_or(date)
    }

    /// Returns the scheduled weekdays, Monday first.
    #[must_use]
    pub fn days(self) -> Vec<Weekday> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|day| self.runs_on(*day))
        .collect()
    }

    fn bit(day: Weekday) -> u8 {
        1_u8 << day.num_days_from_monday()
    }
}

impl fmt::Debug for DeliverySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.days()).finish()
    }
}
