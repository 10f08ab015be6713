//! Coupling of entrance and exit stampings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::Stamping;

/// Hands out pair identifiers, starting from 1.
///
/// Identifier 0 is reserved for uncoupled stampings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairIdSequence {
    next: u32,
}

impl Default for PairIdSequence {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PairIdSequence {
    /// A sequence starting from 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Two stampings of the same day, usually an entrance and an exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairStamping {
    /// The earlier stamping.
    pub first: Stamping,
    /// The later stamping.
    pub second: Stamping,
    /// Minutes between the two stampings.
    pub time_in_pair: i64,
    /// Either side is a lunch break stamping.
    pub pr_pair: bool,
}

impl PairStamping {
    /// Couples two stampings.
    ///
    /// An entrance followed by an exit that is not the virtual "exiting now"
    /// is a definitive pair: both stampings get the next identifier from
    /// `sequence`. Other couples (e.g. exit then entrance, used for lunch
    /// breaks) keep their identifiers untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use epas_engine::models::{Stamping, WayType};
    /// use epas_engine::stampings::{PairIdSequence, PairStamping};
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    /// let mut entrance = Stamping::new(day.and_hms_opt(8, 0, 0).unwrap(), WayType::In);
    /// let mut exit = Stamping::new(day.and_hms_opt(12, 30, 0).unwrap(), WayType::Out);
    /// let mut sequence = PairIdSequence::new();
    ///
    /// let pair = PairStamping::new(&mut entrance, &mut exit, &mut sequence);
    ///
    /// assert_eq!(pair.time_in_pair, 270);
    /// assert_eq!(entrance.pair_id, 1);
    /// assert_eq!(exit.pair_id, 1);
    /// ```
    pub fn new(first: &mut Stamping, second: &mut Stamping, sequence: &mut PairIdSequence) -> Self {
        let time_in_pair = second.minute_of_day() - first.minute_of_day();

        if !second.exiting_now && first.is_in() && second.is_out() {
            let pair_id = sequence.next_id();
            first.pair_id = pair_id;
            second.pair_id = pair_id;
        }

        let pr_pair = first.is_lunch_break() || second.is_lunch_break();

        Self {
            first: first.clone(),
            second: second.clone(),
            time_in_pair,
            pr_pair,
        }
    }
}

impl fmt::Display for PairStamping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}]",
            self.first.date_time.format("%H:%M:%S"),
            self.second.date_time.format("%H:%M:%S")
        )
    }
}

/// Sorts `stampings` and couples every entrance directly followed by an exit.
///
/// Pair identifiers of previous runs are cleared first, so stampings left
/// out of every pair end up with identifier 0.
///
/// # Returns
///
/// The pairs in chronological order.
pub fn valid_pairs(stampings: &mut [Stamping], sequence: &mut PairIdSequence) -> Vec<PairStamping> {
    stampings.sort_by_key(|s| s.date_time);
    for stamping in stampings.iter_mut() {
        stamping.pair_id = 0;
    }

    let mut pairs = Vec::new();
    let mut i = 0;
    while i + 1 < stampings.len() {
        if stampings[i].is_in() && stampings[i + 1].is_out() {
            let (left, right) = stampings.split_at_mut(i + 1);
            pairs.push(PairStamping::new(&mut left[i], &mut right[0], sequence));
            i += 2;
        } else {
            i += 1;
        }
    }
    pairs
}

/// Minutes covered by `pairs`.
pub fn time_in_pairs(pairs: &[PairStamping]) -> i64 {
    pairs.iter().map(|p| p.time_in_pair).sum()
}
