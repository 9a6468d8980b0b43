/// Environment-driven application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub environment: String,
    /// Shared secret for the batch trigger endpoint; required in production.
    pub cron_secret: Option<String>,
    /// Alpha Vantage-compatible key for the news sentiment feed.
    pub news_api_key: String,
    /// xAI key for narrative case generation; narrative falls back to static
    /// templates when unset.
    pub case_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL is not set".to_string())?;

        Ok(Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            database_url,
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            cron_secret: std::env::var("CRON_SECRET").ok(),
            news_api_key: std::env::var("NEWS_API_KEY")
                .unwrap_or_else(|_| "demo".to_string()),
            case_api_key: std::env::var("XAI_API_KEY").ok(),
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.cron_secret.is_none() {
            return Err("CRON_SECRET must be set in production".to_string());
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
