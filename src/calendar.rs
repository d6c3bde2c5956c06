//! Special-occasion overlay schedule
//!
//! Maps calendar days to named overlay vocabularies and the priority they
//! merge at. Fetching the overlay document is the caller's job.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One recurring date with an overlay attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occasion {
    /// Overlay name; the CLI resolves it to `<name>.json`.
    pub name: String,
    pub month: u32,
    pub day: u32,
    pub priority: i64,
}

impl Occasion {
    pub fn new(name: impl Into<String>, month: u32, day: u32, priority: i64) -> Self {
        Self {
            name: name.into(),
            month,
            day,
            priority,
        }
    }

    /// `MM-DD`, as written in occasion tables.
    pub fn date_key(&self) -> String {
        format!("{:02}-{:02}", self.month, self.day)
    }

    pub fn falls_on(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccasionCalendar {
    occasions: Vec<Occasion>,
}

impl Default for OccasionCalendar {
    fn default() -> Self {
        Self::new(vec![
            Occasion::new("birthday", 3, 24, 1),
            Occasion::new("xmas", 12, 25, 2),
        ])
    }
}

impl OccasionCalendar {
    pub fn new(occasions: Vec<Occasion>) -> Self {
        Self { occasions }
    }

    pub fn occasions(&self) -> &[Occasion] {
        &self.occasions
    }

    /// Overlays due on `date`, lowest priority first so that higher ones
    /// merge last.
    pub fn due(&self, date: NaiveDate) -> Vec<&Occasion> {
        let mut due: Vec<&Occasion> = self.occasions.iter().filter(|o| o.falls_on(date)).collect();
        due.sort_by_key(|o| o.priority);
        due
    }
}
