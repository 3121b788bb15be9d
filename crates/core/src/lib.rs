//! Allocation and reconciliation engine for building common charges.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! It turns a building's expenses, apartments, meter readings and settings
//! into per-apartment shares, proves the totals agree, and freezes the
//! result once a period is issued.
//!
//! # Modules
//!
//! - `building` - Building, apartment and period inputs
//! - `expense` - Expense records, categories and aggregation
//! - `allocation` - Distribution rules, heating split, reserve fund, fees
//! - `billing` - Per-apartment share calculation
//! - `reconciliation` - Cross-checking of independently computed totals
//! - `session` - Draft → Validated → Issued lifecycle with supersession

pub mod allocation;
pub mod billing;
pub mod building;
pub mod expense;
pub mod reconciliation;
pub mod session;
