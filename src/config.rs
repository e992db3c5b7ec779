use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub dev_mode: bool,
    /// Page size used when a list request has no `limit`
    pub default_page_size: i64,
    /// Upper bound applied to any requested `limit`
    pub max_page_size: i64,
    /// Allowed CORS origins (empty = permissive in dev mode, disabled otherwise)
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("DATAAUDIT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let default_page_size: i64 = env::var("DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(10);

        let max_page_size: i64 = env::var("MAX_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(1000)
            .max(default_page_size);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "dataaudit.db".to_string()),
            dev_mode,
            default_page_size,
            max_page_size,
            cors_origins,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn paging(&self) -> PagingConfig {
        PagingConfig {
            default_limit: self.default_page_size,
            max_limit: self.max_page_size,
        }
    }
}

/// Page size limits handed to request handlers.
#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
        }
    }
}
