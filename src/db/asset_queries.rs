use sqlx::PgPool;

use crate::models::{Asset, AssetRow};

/// Fetch the full tracked-asset list, ordered by ticker.
pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Asset>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AssetRow>(
        "SELECT ticker, name, asset_type, color
         FROM assets
         ORDER BY ticker ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Asset::from).collect())
}

pub async fn fetch_by_ticker(pool: &PgPool, ticker: &str) -> Result<Option<Asset>, sqlx::Error> {
    let row = sqlx::query_as::<_, AssetRow>(
        "SELECT ticker, name, asset_type, color
         FROM assets
         WHERE ticker = $1",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Asset::from))
}
