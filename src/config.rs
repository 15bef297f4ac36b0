use std::path::PathBuf;

pub const API_URL_VAR: &str = "PLANBOARD_API_URL";
pub const LOG_FILE_VAR: &str = "PLANBOARD_LOG_FILE";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Where logs go while the TUI owns the terminal.
    pub log_file: PathBuf,
}

impl Config {
    /// Reads the environment, after loading a `.env` file if there is one.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let log_file = match lookup(LOG_FILE_VAR) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => {
                let home_dir = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home_dir).join(".planboard.log")
            }
        };

        Config { api_url, log_file }
    }
}
