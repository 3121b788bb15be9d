//! Shared test inputs: the two-apartment building used across scenarios.

use chrono::NaiveDate;
use commonfee_shared::types::{ApartmentId, BuildingId, Currency, ExpenseId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::types::CalculationInputs;
use crate::building::{Apartment, Building, HeatingSystem, Period, ReserveFundSettings};
use crate::expense::{DistributionType, Expense, MeterReading, PayerResponsibility};

pub fn id(n: u128) -> ApartmentId {
    ApartmentId::from_u128(n)
}

pub fn building_id() -> BuildingId {
    BuildingId::from_u128(100)
}

pub fn march() -> Period {
    Period::for_month(2026, 3).unwrap()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

pub fn building() -> Building {
    Building {
        id: building_id(),
        name: "Maple Court".to_string(),
        mills_denominator: dec!(1000),
        heating_system: HeatingSystem::Conventional,
        heating_fixed_percentage: Decimal::ZERO,
        reserve_fund: ReserveFundSettings::default(),
        management_fee_per_apartment: Decimal::ZERO,
        currency: Currency::Eur,
    }
}

pub fn apartment(n: u128, mills: Decimal) -> Apartment {
    Apartment {
        id: id(n),
        identifier: format!("A{n}"),
        owner_name: Some(format!("Owner {n}")),
        tenant_name: None,
        participation_mills: mills,
        heating_mills: mills,
        elevator_mills: None,
        previous_balance: Decimal::ZERO,
    }
}

pub fn expense(category: &str, amount: Decimal, distribution: DistributionType) -> Expense {
    Expense {
        id: ExpenseId::new(),
        title: format!("{category} invoice"),
        amount,
        category: category.to_string(),
        distribution,
        payer: PayerResponsibility::Resident,
        date: date(10),
    }
}

pub fn reading(n: u128, value: Decimal) -> MeterReading {
    MeterReading {
        apartment_id: id(n),
        value,
        date: date(28),
    }
}

/// Two apartments with 600/400 mills and a single 100.00 cleaning expense.
pub fn two_apartment_inputs() -> CalculationInputs {
    CalculationInputs {
        building: building(),
        apartments: vec![apartment(1, dec!(600)), apartment(2, dec!(400))],
        expenses: vec![expense(
            "cleaning",
            dec!(100),
            DistributionType::ByParticipationMills,
        )],
        meter_readings: Vec::new(),
        authoritative_reserve: BTreeMap::new(),
        external_summary: None,
    }
}
