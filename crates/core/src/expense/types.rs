//! Expense and meter-reading input types.

use chrono::NaiveDate;
use commonfee_shared::types::{ApartmentId, ExpenseId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::building::Period;

/// Who is liable for an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayerResponsibility {
    /// Charged to the owner.
    Owner,
    /// Charged to whoever occupies the apartment.
    #[default]
    Resident,
    /// Split between owner and resident.
    Shared,
}

impl PayerResponsibility {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Resident => "resident",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for PayerResponsibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How one expense is split across apartments.
///
/// Targeted expenses carry their apartment set, so a targeted expense
/// without targets cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionType {
    /// Proportional to participation mills (or the category's mills column).
    ByParticipationMills,
    /// Same amount for every apartment.
    EqualShare,
    /// Proportional to the period's meter consumption.
    ByMeters,
    /// Only the listed apartments pay, proportional to their mills.
    SpecificApartments {
        /// Apartments the expense is charged to.
        apartments: BTreeSet<ApartmentId>,
    },
}

impl DistributionType {
    /// Returns the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByParticipationMills => "by_participation_mills",
            Self::EqualShare => "equal_share",
            Self::ByMeters => "by_meters",
            Self::SpecificApartments { .. } => "specific_apartments",
        }
    }
}

/// An expense record for the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// Display title.
    pub title: String,
    /// Amount to distribute. Expected to be positive.
    pub amount: Decimal,
    /// Free-form category name, resolved through a `CategoryMap`.
    pub category: String,
    /// Distribution rule.
    pub distribution: DistributionType,
    /// Who is liable.
    pub payer: PayerResponsibility,
    /// Expense date.
    pub date: NaiveDate,
}

/// A single meter reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    /// Apartment the meter belongs to.
    pub apartment_id: ApartmentId,
    /// Consumption recorded by the reading.
    pub value: Decimal,
    /// Reading date.
    pub date: NaiveDate,
}

/// Consumption per apartment for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReadings(BTreeMap<ApartmentId, Decimal>);

impl MeterReadings {
    /// Sums the readings dated inside `period`, per apartment.
    #[must_use]
    pub fn for_period(readings: &[MeterReading], period: &Period) -> Self {
        let mut consumption = BTreeMap::new();
        for reading in readings.iter().filter(|r| period.contains_date(r.date)) {
            *consumption
                .entry(reading.apartment_id)
                .or_insert(Decimal::ZERO) += reading.value;
        }
        Self(consumption)
    }

    /// Consumption of one apartment; zero when it has no reading.
    /// Negative consumption is treated as zero.
    #[must_use]
    pub fn consumption(&self, apartment_id: ApartmentId) -> Decimal {
        self.0
            .get(&apartment_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO)
    }

    /// Returns true if no apartment has a reading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ApartmentId, Decimal)> for MeterReadings {
    fn from_iter<T: IntoIterator<Item = (ApartmentId, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
