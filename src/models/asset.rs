use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tracked asset classes. Anything unrecognized in the database decodes as a
/// stock so a bad row never takes the dashboard down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Stock,
    Crypto,
}

impl AssetCategory {
    pub fn parse(value: &str) -> Self {
        match value {
            "crypto" => AssetCategory::Crypto,
            _ => AssetCategory::Stock,
        }
    }
}

/// Static reference entry for one tracked asset. Seeded by migration,
/// immutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub ticker: String,
    pub name: String,
    #[serde(rename = "type")]
    pub category: AssetCategory,
    pub color: String,
}

// Raw database shape; `asset_type` is stored as TEXT.
#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub ticker: String,
    pub name: String,
    pub asset_type: String,
    pub color: String,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Asset {
            ticker: row.ticker,
            name: row.name,
            category: AssetCategory::parse(&row.asset_type),
            color: row.color,
        }
    }
}
