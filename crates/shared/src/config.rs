//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::types::MAX_DECIMAL_PLACES;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Allocation and reconciliation engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Number of decimal places every allocated share is rounded to.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Maximum accepted difference between two totals of the same period.
    #[serde(default = "default_reconciliation_tolerance")]
    pub reconciliation_tolerance: Decimal,
    /// Nominal sum of participation mills across a building.
    #[serde(default = "default_mills_denominator")]
    pub mills_denominator: Decimal,
    /// Difference at which an external reserve contribution is reported as
    /// disagreeing with the locally derived one.
    #[serde(default = "default_reserve_override_tolerance")]
    pub reserve_override_tolerance: Decimal,
}

fn default_decimal_places() -> u32 {
    2
}

fn default_reconciliation_tolerance() -> Decimal {
    Decimal::new(5, 1) // 0.50
}

fn default_mills_denominator() -> Decimal {
    Decimal::ONE_THOUSAND
}

fn default_reserve_override_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            reconciliation_tolerance: default_reconciliation_tolerance(),
            mills_denominator: default_mills_denominator(),
            reserve_override_tolerance: default_reserve_override_tolerance(),
        }
    }
}

impl EngineConfig {
    /// Checks that every setting is usable by the engine.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a precision beyond what `Decimal`
    /// can represent or a negative tolerance.
    pub fn validate(&self) -> AppResult<()> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(AppError::Validation(format!(
                "engine.decimal_places must be at most {MAX_DECIMAL_PLACES}, got {}",
                self.decimal_places
            )));
        }
        if self.reconciliation_tolerance.is_sign_negative()
            || self.reserve_override_tolerance.is_sign_negative()
        {
            return Err(AppError::Validation(
                "engine tolerances must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// A `.env` file in the working directory is honoured when present.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or holds an
    /// out-of-range engine setting.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COMMONFEE").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }
}
