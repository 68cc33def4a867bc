use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One marginal-rate band of a progressive schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Bracket {
    /// Cumulative upper bound of the band; `null` for the final, unbounded band
    #[schemars(with = "Option<f64>")]
    pub limit: Option<Decimal>,
    /// Marginal rate as a fraction (0.06 = 6%)
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl Bracket {
    pub fn bounded(limit: Decimal, rate: Decimal) -> Self {
        Bracket {
            limit: Some(limit),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Bracket { limit: None, rate }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("schedule has no brackets")]
    Empty,
    #[error("bracket {index} has a non-positive limit")]
    NonPositiveLimit { index: usize },
    #[error("bracket {index} limit is not above the previous limit")]
    Unordered { index: usize },
    #[error("bracket {index} is unbounded but is not the last bracket")]
    UnboundedBeforeEnd { index: usize },
    #[error("last bracket must be unbounded")]
    BoundedFinal,
    #[error("bracket {index} rate is outside 0..=1")]
    RateOutOfRange { index: usize },
}

/// Validated progressive schedule: limits strictly ascending from above zero,
/// every rate a fraction, and a final unbounded bracket so the bands
/// partition `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    brackets: Vec<Bracket>,
}

impl Schedule {
    pub fn new(brackets: Vec<Bracket>) -> Result<Self, ScheduleError> {
        if brackets.is_empty() {
            return Err(ScheduleError::Empty);
        }
        let last = brackets.len() - 1;
        let mut previous = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(ScheduleError::RateOutOfRange { index });
            }
            match bracket.limit {
                Some(_) if index == last => return Err(ScheduleError::BoundedFinal),
                None if index != last => return Err(ScheduleError::UnboundedBeforeEnd { index }),
                Some(limit) if limit <= Decimal::ZERO => {
                    return Err(ScheduleError::NonPositiveLimit { index })
                }
                Some(limit) if limit <= previous => {
                    return Err(ScheduleError::Unordered { index })
                }
                Some(limit) => previous = limit,
                None => {}
            }
        }
        Ok(Schedule { brackets })
    }

    /// Schedules compiled into the crate. Callers guarantee validity; tests
    /// run every built-in schedule back through [`Schedule::new`].
    pub(crate) fn builtin(brackets: Vec<Bracket>) -> Self {
        debug_assert!(Schedule::new(brackets.clone()).is_ok());
        Schedule { brackets }
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let brackets = Vec::<Bracket>::deserialize(deserializer)?;
        Schedule::new(brackets).map_err(serde::de::Error::custom)
    }
}

/// Portion of taxable income that fell in one bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BracketSlice {
    #[schemars(with = "f64")]
    pub from: Decimal,
    #[schemars(with = "f64")]
    pub to: Decimal,
    #[schemars(with = "f64")]
    pub rate: Decimal,
    #[schemars(with = "f64")]
    pub tax: Decimal,
}

impl BracketSlice {
    pub fn amount(&self) -> Decimal {
        self.to - self.from
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxComputation {
    pub total_tax: Decimal,
    pub slices: Vec<BracketSlice>,
}

/// Apply a progressive schedule to taxable income.
///
/// Walks the brackets in ascending order, taxing the part of the remaining
/// income that fits in each band, until the income is used up. Nothing is
/// rounded here; the total is the sum of the slice taxes, so the breakdown
/// always adds up to it exactly.
pub fn compute_tax(taxable_income: Decimal, schedule: &Schedule) -> TaxComputation {
    let mut remaining = taxable_income.max(Decimal::ZERO);
    let mut previous_limit = Decimal::ZERO;
    let mut slices = Vec::new();

    for bracket in schedule.brackets() {
        let in_bracket = match bracket.limit {
            Some(limit) => remaining.min(limit - previous_limit),
            None => remaining,
        };
        if in_bracket <= Decimal::ZERO {
            break;
        }

        let tax = in_bracket * bracket.rate;
        log::debug!(
            "Bracket {}..{:?} @ {}: taxable {}, tax {}",
            previous_limit,
            bracket.limit,
            bracket.rate,
            in_bracket,
            tax
        );
        slices.push(BracketSlice {
            from: previous_limit,
            to: previous_limit + in_bracket,
            rate: bracket.rate,
            tax,
        });

        remaining -= in_bracket;
        if let Some(limit) = bracket.limit {
            previous_limit = limit;
        }
    }

    let total_tax = slices.iter().map(|s| s.tax).sum();
    TaxComputation { total_tax, slices }
}
