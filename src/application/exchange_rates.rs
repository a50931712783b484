//! Currency exchange-rate records.

use std::sync::Arc;

use pressroom_api_types::ExchangeRateView;
use tracing::instrument;

use crate::{
    application::{
        error::AppError,
        repos::{CreateExchangeRateParams, ExchangeRatesRepo},
    },
    domain::entities::ExchangeRateRecord,
    util::timestamp::display_timestamp,
};

const MAX_CURRENCY_CHARS: usize = 16;

#[derive(Debug, Clone)]
pub struct CreateExchangeRateCommand {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
}

#[derive(Clone)]
pub struct ExchangeRateService {
    rates: Arc<dyn ExchangeRatesRepo>,
}

impl ExchangeRateService {
    pub fn new(rates: Arc<dyn ExchangeRatesRepo>) -> Self {
        Self { rates }
    }

    /// Store a rate stamped with the current time. Currency codes are upper-cased.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        command: CreateExchangeRateCommand,
    ) -> Result<ExchangeRateView, AppError> {
        let from_currency = currency_code("from_currency", &command.from_currency)?;
        let to_currency = currency_code("to_currency", &command.to_currency)?;
        if !command.rate.is_finite() || command.rate <= 0.0 {
            return Err(AppError::validation("rate must be a positive number"));
        }

        let record = self
            .rates
            .create_rate(CreateExchangeRateParams {
                from_currency,
                to_currency,
                rate: command.rate,
            })
            .await?;
        Ok(rate_view(&record))
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ExchangeRateView>, AppError> {
        let records = self.rates.list_rates().await?;
        Ok(records.iter().map(rate_view).collect())
    }
}

fn currency_code(field: &'static str, raw: &str) -> Result<String, AppError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if code.chars().count() > MAX_CURRENCY_CHARS {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_CURRENCY_CHARS} characters"
        )));
    }
    Ok(code.to_uppercase())
}

fn rate_view(record: &ExchangeRateRecord) -> ExchangeRateView {
    ExchangeRateView {
        id: record.id,
        from_currency: record.from_currency.clone(),
        to_currency: record.to_currency.clone(),
        rate: record.rate,
        date: display_timestamp(record.date),
    }
}
