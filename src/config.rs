use std::env;
use std::fmt;
use std::str::FromStr;

use crate::logging::LogConfig;

#[derive(Clone)]
pub struct Config {
    pub log: LogConfig,
    pub db_path: String,
    pub learner_id: String,
    pub judge: JudgeConfig,
}

#[derive(Clone)]
pub struct JudgeConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl JudgeConfig {
    /// Without an API key every answer goes through the local comparison.
    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("log", &self.log)
            .field("db_path", &self.db_path)
            .field("learner_id", &self.learner_id)
            .field("judge", &self.judge)
            .finish()
    }
}

impl fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        Self {
            log: LogConfig {
                log_level: vars.or("RUST_LOG", "info"),
                enable_file_logs: vars.or_bool("ENABLE_FILE_LOGS", false),
                log_dir: vars.or("LOG_DIR", "./logs"),
            },
            db_path: vars.or("REVIEW_DB_PATH", "db.sqlite3"),
            learner_id: vars.or("LEARNER_ID", "local"),
            judge: JudgeConfig {
                api_url: vars.or(
                    "GEMINI_API_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                api_key: vars.or("GEMINI_API_KEY", ""),
                model: vars.or("GEMINI_MODEL", "gemini-1.5-flash"),
                timeout_secs: vars.or_parse("JUDGE_TIMEOUT_SECS", 20_u64),
            },
        }
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn or_parse<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy,
    {
        match (self.0)(key) {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => v,
                Err(_) => {
                    tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                    default
                }
            },
            None => default,
        }
    }

    fn or_bool(&self, key: &str, default: bool) -> bool {
        match (self.0)(key) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => default,
            },
            None => default,
        }
    }
}
