use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateExchangeRateParams, ExchangeRatesRepo, RepoError};
use crate::domain::entities::ExchangeRateRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ExchangeRateRow {
    id: i64,
    from_currency: String,
    to_currency: String,
    rate: f64,
    date: OffsetDateTime,
}

impl From<ExchangeRateRow> for ExchangeRateRecord {
    fn from(row: ExchangeRateRow) -> Self {
        Self {
            id: row.id,
            from_currency: row.from_currency,
            to_currency: row.to_currency,
            rate: row.rate,
            date: row.date,
        }
    }
}

#[async_trait]
impl ExchangeRatesRepo for PostgresRepositories {
    async fn create_rate(
        &self,
        params: CreateExchangeRateParams,
    ) -> Result<ExchangeRateRecord, RepoError> {
        let row = sqlx::query_as::<_, ExchangeRateRow>(
            r#"
            INSERT INTO exchange_rates (from_currency, to_currency, rate)
            VALUES ($1, $2, $3)
            RETURNING id, from_currency, to_currency, rate, date
            "#,
        )
        .bind(params.from_currency)
        .bind(params.to_currency)
        .bind(params.rate)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ExchangeRateRecord::from(row))
    }

    async fn list_rates(&self) -> Result<Vec<ExchangeRateRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ExchangeRateRow>(
            "SELECT id, from_currency, to_currency, rate, date FROM exchange_rates ORDER BY date DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ExchangeRateRecord::from).collect())
    }
}
