use std::{fmt::Display, ops::Deref};

use serde::{Deserialize, Serialize};

use super::round::round_to;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);

    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || !value.is_finite() {
            None
        } else {
            Some(Percentage(value))
        }
    }

    /// Rounds to a fixed number of decimals so serialized output stays stable between runs.
    pub fn rounded(self, decimals: u32) -> Percentage {
        Percentage(round_to(self.0, decimals))
    }

    pub fn capped(self, max: f64) -> Percentage {
        Percentage(self.0.min(max))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` covered by `value`. An empty whole yields zero instead of NaN.
pub fn distance_percentage(value_km: f64, whole_km: f64) -> Percentage {
    if whole_km <= 0. {
        return Percentage::ZERO;
    }
    Percentage::new_opt(value_km / whole_km * 100.).unwrap_or(Percentage::ZERO)
}

#[cfg(test)]
mod tests {
    use super::{distance_percentage, Percentage};

    #[test]
    fn percentage_of_empty_whole_is_zero() {
        assert_eq!(distance_percentage(10., 0.), Percentage::ZERO);
    }

    #[test]
    fn negative_percentage_is_rejected() {
        assert!(Percentage::new_opt(-1.).is_none());
        assert!(Percentage::new_opt(f64::NAN).is_none());
    }

    #[test]
    fn rounding_and_capping() {
        let p = distance_percentage(30., 25.).rounded(0).capped(100.);
        assert_eq!(*p, 100.);
        assert_eq!(*distance_percentage(1., 3.).rounded(1), 33.3);
    }
}
