use super::bracket::{Bracket, Schedule};
use super::error::EngineError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

/// Sri Lankan year of assessment (runs 1 April to 31 March)
/// The year value represents the end year (e.g., 2025 = 2024/2025)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Year of assessment a date falls in
    pub fn from_date(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            TaxYear(date.year() + 1)
        } else {
            TaxYear(date.year())
        }
    }

    /// 1 April of the first calendar year
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 1)
    }

    /// 31 March of the second calendar year
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 3, 31)
    }

    /// Display as "2024/2025"
    pub fn display(&self) -> String {
        format!("{}/{}", self.0 - 1, self.0)
    }
}

impl FromStr for TaxYear {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidTaxYear(s.to_string());
        let (start, end) = s.trim().split_once('/').ok_or_else(invalid)?;
        let start: i32 = start.trim().parse().map_err(|_| invalid())?;
        let end: i32 = end.trim().parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(TaxYear(end))
    }
}

impl TryFrom<String> for TaxYear {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TaxYear> for String {
    fn from(year: TaxYear) -> Self {
        year.display()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Rates and relief limits for one year of assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearRates {
    pub brackets: Schedule,
    pub personal_relief_cap: Decimal,
    pub rental_relief_rate: Decimal,
    pub rental_relief_cap: Decimal,
    /// Ceiling on approved donations (also limited to a third of assessable income)
    pub donation_cap: Decimal,
    pub solar_cap: Decimal,
}

/// One year's entry in a rate-table file
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct YearRatesInput {
    /// Ascending brackets; the last one has `"limit": null`
    pub brackets: Vec<Bracket>,
    #[schemars(with = "f64")]
    pub personal_relief_cap: Decimal,
    #[serde(default = "default_rental_relief_rate")]
    #[schemars(with = "f64")]
    pub rental_relief_rate: Decimal,
    #[serde(default = "default_rental_relief_cap")]
    #[schemars(with = "f64")]
    pub rental_relief_cap: Decimal,
    #[serde(default = "default_donation_cap")]
    #[schemars(with = "f64")]
    pub donation_cap: Decimal,
    #[serde(default = "default_solar_cap")]
    #[schemars(with = "f64")]
    pub solar_cap: Decimal,
}

fn default_rental_relief_rate() -> Decimal {
    dec!(0.25)
}

fn default_rental_relief_cap() -> Decimal {
    dec!(225000)
}

fn default_donation_cap() -> Decimal {
    dec!(75000)
}

fn default_solar_cap() -> Decimal {
    dec!(600000)
}

/// Rate-table file format
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RateTableInput {
    /// Keyed by year of assessment, e.g. "2024/2025"
    pub years: BTreeMap<String, YearRatesInput>,
}

/// All years of assessment the engine can compute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    years: BTreeMap<TaxYear, YearRates>,
}

impl RateTable {
    /// Tables shipped with the engine for 2024/2025 and 2025/2026
    pub fn builtin() -> Self {
        let schedule_2025 = Schedule::builtin(vec![
            Bracket::bounded(dec!(500000), dec!(0.06)),
            Bracket::bounded(dec!(1000000), dec!(0.12)),
            Bracket::bounded(dec!(1500000), dec!(0.18)),
            Bracket::bounded(dec!(2000000), dec!(0.24)),
            Bracket::bounded(dec!(2500000), dec!(0.30)),
            Bracket::unbounded(dec!(0.36)),
        ]);
        let schedule_2026 = Schedule::builtin(vec![
            Bracket::bounded(dec!(1000000), dec!(0.06)),
            Bracket::bounded(dec!(1500000), dec!(0.18)),
            Bracket::bounded(dec!(2000000), dec!(0.24)),
            Bracket::bounded(dec!(2500000), dec!(0.30)),
            Bracket::unbounded(dec!(0.36)),
        ]);

        let mut years = BTreeMap::new();
        years.insert(TaxYear(2025), YearRates::with_defaults(schedule_2025, dec!(1200000)));
        years.insert(TaxYear(2026), YearRates::with_defaults(schedule_2026, dec!(1800000)));
        RateTable { years }
    }

    /// Read a rate table from JSON, replacing the built-in one
    pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        let input: RateTableInput = serde_json::from_reader(reader)?;
        let table = RateTable::try_from(input)?;
        Ok(table)
    }

    pub fn rates(&self, year: TaxYear) -> Result<&YearRates, EngineError> {
        self.years
            .get(&year)
            .ok_or_else(|| EngineError::UnknownTaxYear(year.display()))
    }

    /// Look up by the caller's year key, e.g. "2024/2025"
    pub fn rates_for(&self, key: &str) -> Result<(TaxYear, &YearRates), EngineError> {
        let year: TaxYear = key.parse()?;
        Ok((year, self.rates(year)?))
    }

    pub fn years(&self) -> impl Iterator<Item = TaxYear> + '_ {
        self.years.keys().copied()
    }

    /// Latest year in the table, used when none is given
    pub fn latest(&self) -> Option<TaxYear> {
        self.years.keys().next_back().copied()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::builtin()
    }
}

impl TryFrom<RateTableInput> for RateTable {
    type Error = EngineError;

    fn try_from(input: RateTableInput) -> Result<Self, Self::Error> {
        let mut years = BTreeMap::new();
        for (key, rates) in input.years {
            let year: TaxYear = key.parse()?;
            let invalid = |reason: String| EngineError::InvalidSchedule {
                year: year.display(),
                reason,
            };
            let brackets = Schedule::new(rates.brackets).map_err(|e| invalid(e.to_string()))?;
            if rates.rental_relief_rate < Decimal::ZERO || rates.rental_relief_rate > Decimal::ONE {
                return Err(invalid("rental relief rate is outside 0..=1".to_string()));
            }
            let caps = [
                rates.personal_relief_cap,
                rates.rental_relief_cap,
                rates.donation_cap,
                rates.solar_cap,
            ];
            if caps.iter().any(|cap| *cap < Decimal::ZERO) {
                return Err(invalid("relief caps must not be negative".to_string()));
            }
            years.insert(
                year,
                YearRates {
                    brackets,
                    personal_relief_cap: rates.personal_relief_cap,
                    rental_relief_rate: rates.rental_relief_rate,
                    rental_relief_cap: rates.rental_relief_cap,
                    donation_cap: rates.donation_cap,
                    solar_cap: rates.solar_cap,
                },
            );
        }
        log::debug!("Loaded rate table for {} year(s)", years.len());
        Ok(RateTable { years })
    }
}

impl YearRates {
    fn with_defaults(brackets: Schedule, personal_relief_cap: Decimal) -> Self {
        YearRates {
            brackets,
            personal_relief_cap,
            rental_relief_rate: default_rental_relief_rate(),
            rental_relief_cap: default_rental_relief_cap(),
            donation_cap: default_donation_cap(),
            solar_cap: default_solar_cap(),
        }
    }
}
