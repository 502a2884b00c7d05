use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Auth
    pub api_key: String,

    // Public article links are built as ARTICLE_BASE_URL + id
    pub article_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            api_key: required_env("API_KEY"),
            article_base_url: env::var("ARTICLE_BASE_URL")
                .unwrap_or_else(|_| "https://newsbrew.example.com/article/".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
