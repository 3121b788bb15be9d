//! Building and apartment registry types.
//!
//! These are read-only inputs supplied by the registry collaborator. The
//! engine never mutates them; it only reads mills figures, heating settings,
//! reserve-fund settings and previous balances.

use chrono::NaiveDate;
use commonfee_shared::types::{ApartmentId, BuildingId, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heating installation of a building.
///
/// Determines whether the heating bill is split into a fixed and a
/// consumption-based part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatingSystem {
    /// Central boiler without per-apartment metering.
    #[default]
    Conventional,
    /// Autonomous heating measured with hour meters.
    HourMeters,
    /// Autonomous heating measured with heat (energy) meters.
    HeatMeters,
    /// No heating installation.
    None,
}

impl HeatingSystem {
    /// Returns the string representation of the heating system.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::HourMeters => "hour_meters",
            Self::HeatMeters => "heat_meters",
            Self::None => "none",
        }
    }

    /// Returns true if per-apartment consumption is metered.
    #[must_use]
    pub fn is_metered(&self) -> bool {
        matches!(self, Self::HourMeters | Self::HeatMeters)
    }
}

impl fmt::Display for HeatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reserve-fund settings of a building.
///
/// Every field is optional: a building without a goal or a duration
/// accrues nothing, and an absent date leaves that side of the window open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveFundSettings {
    /// Total amount to collect.
    pub goal: Option<Decimal>,
    /// Number of monthly instalments the goal is spread over.
    pub duration_months: Option<u32>,
    /// First day contributions are collected.
    pub start_date: Option<NaiveDate>,
    /// Last day contributions are collected.
    pub target_date: Option<NaiveDate>,
}

/// Building settings relevant to the monthly allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    /// Unique identifier.
    pub id: BuildingId,
    /// Display name.
    pub name: String,
    /// Nominal sum of participation mills (usually 1000).
    pub mills_denominator: Decimal,
    /// Heating installation.
    pub heating_system: HeatingSystem,
    /// Share of the heating bill (0-100) distributed by heating mills on
    /// metered systems. Ignored for conventional heating.
    pub heating_fixed_percentage: Decimal,
    /// Reserve-fund accrual settings.
    pub reserve_fund: ReserveFundSettings,
    /// Flat management fee charged to every apartment.
    pub management_fee_per_apartment: Decimal,
    /// Billing currency.
    #[serde(default)]
    pub currency: Currency,
}

impl Building {
    /// Returns the fixed percentage that actually applies to this building.
    ///
    /// Conventional heating (and buildings without heating) distribute the
    /// whole bill by heating mills, which is a 100% fixed part.
    #[must_use]
    pub fn effective_fixed_percentage(&self) -> Decimal {
        if self.heating_system.is_metered() {
            self.heating_fixed_percentage
                .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        } else {
            Decimal::ONE_HUNDRED
        }
    }
}

/// Which mills column an allocation is weighted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MillsBasis {
    /// General participation mills.
    Participation,
    /// Heating participation mills.
    Heating,
    /// Elevator participation mills.
    Elevator,
}

impl fmt::Display for MillsBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Participation => write!(f, "participation"),
            Self::Heating => write!(f, "heating"),
            Self::Elevator => write!(f, "elevator"),
        }
    }
}

/// An apartment as supplied by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apartment {
    /// Unique identifier.
    pub id: ApartmentId,
    /// Human-facing identifier (e.g. "A1").
    pub identifier: String,
    /// Owner name, display only.
    pub owner_name: Option<String>,
    /// Tenant name, display only.
    pub tenant_name: Option<String>,
    /// General participation mills.
    pub participation_mills: Decimal,
    /// Heating participation mills.
    pub heating_mills: Decimal,
    /// Elevator participation mills, if the registry tracks them.
    pub elevator_mills: Option<Decimal>,
    /// Signed amount carried over from earlier periods. It is added as-is to
    /// the period's new charges.
    pub previous_balance: Decimal,
}

impl Apartment {
    /// Returns the apartment's weight for the given mills column.
    #[must_use]
    pub fn mills_for(&self, basis: MillsBasis) -> Decimal {
        match basis {
            MillsBasis::Participation => self.participation_mills,
            MillsBasis::Heating => self.heating_mills,
            MillsBasis::Elevator => self.elevator_mills_or_participation(),
        }
    }

    /// Elevator mills, falling back to participation mills when the
    /// registry has no elevator figure or records it as zero.
    #[must_use]
    pub fn elevator_mills_or_participation(&self) -> Decimal {
        match self.elevator_mills {
            Some(mills) if !mills.is_zero() => mills,
            _ => self.participation_mills,
        }
    }
}
