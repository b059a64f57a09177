use crate::domain::{Decimal, Resolution, RetentionPolicy};
use crate::orchestration::AggregationContext;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub event_source_url: String,
    pub factory_id: String,
    pub resolutions: Vec<Resolution>,
    pub hour_retention: RetentionPolicy,
    pub minute_retention: RetentionPolicy,
    pub swap_fee_rate: Decimal,
    pub batch_size: usize,
    pub poll_interval_ms: u64,
    pub hydrate_batch: usize,
    pub hydrate_on_start: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = required(&env_map, "DATABASE_PATH")?;
        let event_source_url = required(&env_map, "EVENT_SOURCE_URL")?;
        let factory_id = required(&env_map, "FACTORY_ID")?;

        let resolutions = parse_resolutions(
            env_map
                .get("RESOLUTIONS")
                .map(|s| s.as_str())
                .unwrap_or("day,hour,minute"),
        )?;

        let hour_retention = RetentionPolicy {
            window: parse_window(
                &env_map,
                "HOUR_RETENTION_WINDOW",
                RetentionPolicy::HOUR.window,
            )?,
            cap: parse_cap(&env_map, "HOUR_ARCHIVE_CAP", RetentionPolicy::HOUR.cap)?,
        };
        let minute_retention = RetentionPolicy {
            window: parse_window(
                &env_map,
                "MINUTE_RETENTION_WINDOW",
                RetentionPolicy::MINUTE.window,
            )?,
            cap: parse_cap(&env_map, "MINUTE_ARCHIVE_CAP", RetentionPolicy::MINUTE.cap)?,
        };

        let swap_fee_rate = match env_map.get("SWAP_FEE_RATE") {
            Some(raw) => Decimal::from_str(raw).map_err(|_| {
                ConfigError::InvalidValue(
                    "SWAP_FEE_RATE".to_string(),
                    "must be a decimal".to_string(),
                )
            })?,
            None => Decimal::new(rust_decimal::Decimal::new(3, 3)),
        };

        let batch_size = parse_or(&env_map, "BATCH_SIZE", 500usize, "must be a valid usize")?;
        let poll_interval_ms =
            parse_or(&env_map, "POLL_INTERVAL_MS", 1000u64, "must be a valid u64")?;
        let hydrate_batch =
            parse_or(&env_map, "HYDRATE_BATCH", 1000usize, "must be a valid usize")?;
        let hydrate_on_start =
            parse_or(&env_map, "HYDRATE_ON_START", false, "must be true or false")?;

        Ok(Config {
            port,
            database_path,
            event_source_url,
            factory_id,
            resolutions,
            hour_retention,
            minute_retention,
            swap_fee_rate,
            batch_size,
            poll_interval_ms,
            hydrate_batch,
            hydrate_on_start,
        })
    }

    /// Settings the orchestrator runs with.
    pub fn aggregation_context(&self) -> AggregationContext {
        AggregationContext::new(self.factory_id.clone())
            .with_resolutions(self.resolutions.clone())
            .with_hour_policy(self.hour_retention)
            .with_minute_policy(self.minute_retention)
            .with_fee_rate(self.swap_fee_rate)
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
        None => Ok(default),
    }
}

fn parse_cap(
    env_map: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let cap = parse_or(env_map, key, default, "must be a valid usize")?;
    if cap == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(cap)
}

fn parse_window(
    env_map: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let window = parse_or(env_map, key, default, "must be a valid i64")?;
    if window < 1 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(window)
}

fn parse_resolutions(raw: &str) -> Result<Vec<Resolution>, ConfigError> {
    let mut resolutions = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let resolution = Resolution::from_str(part)
            .map_err(|e| ConfigError::InvalidValue("RESOLUTIONS".to_string(), e))?;
        if !resolutions.contains(&resolution) {
            resolutions.push(resolution);
        }
    }
    if resolutions.is_empty() {
        return Err(ConfigError::InvalidValue(
            "RESOLUTIONS".to_string(),
            "must name at least one of day, hour, minute".to_string(),
        ));
    }
    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "EVENT_SOURCE_URL".to_string(),
            "http://localhost:9000".to_string(),
        );
        map.insert("FACTORY_ID".to_string(), "0xfactory".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.resolutions, Resolution::ALL.to_vec());
        assert_eq!(config.hour_retention, RetentionPolicy::HOUR);
        assert_eq!(config.minute_retention, RetentionPolicy::MINUTE);
        assert_eq!(config.swap_fee_rate.to_string(), "0.003");
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.hydrate_batch, 1000);
        assert!(!config.hydrate_on_start);
    }

    #[test]
    fn test_missing_required() {
        for key in ["DATABASE_PATH", "EVENT_SOURCE_URL", "FACTORY_ID"] {
            let mut env_map = setup_required_env();
            env_map.remove(key);
            match Config::from_env_map(env_map) {
                Err(ConfigError::MissingEnv(s)) => assert_eq!(s, key),
                other => panic!("Expected MissingEnv for {}, got {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_cap_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("MINUTE_ARCHIVE_CAP".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "MINUTE_ARCHIVE_CAP"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_non_positive_window_rejected() {
        for (key, raw) in [
            ("HOUR_RETENTION_WINDOW", "0"),
            ("MINUTE_RETENTION_WINDOW", "-5"),
        ] {
            let mut env_map = setup_required_env();
            env_map.insert(key.to_string(), raw.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, key),
                other => panic!("Expected InvalidValue for {}, got {:?}", key, other),
            }
        }

        let mut env_map = setup_required_env();
        env_map.insert("MINUTE_RETENTION_WINDOW".to_string(), "1".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.minute_retention.window, 1);
    }

    #[test]
    fn test_resolutions_parsed_and_deduplicated() {
        let mut env_map = setup_required_env();
        env_map.insert("RESOLUTIONS".to_string(), "hour, day,hour".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.resolutions, vec![Resolution::Hour, Resolution::Day]);

        let mut env_map = setup_required_env();
        env_map.insert("RESOLUTIONS".to_string(), "week".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(k, _)) if k == "RESOLUTIONS"
        ));
    }

    #[test]
    fn test_aggregation_context_carries_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert("HOUR_RETENTION_WINDOW".to_string(), "48".to_string());
        env_map.insert("HOUR_ARCHIVE_CAP".to_string(), "10".to_string());
        env_map.insert("SWAP_FEE_RATE".to_string(), "0.0025".to_string());
        let ctx = Config::from_env_map(env_map).unwrap().aggregation_context();

        assert_eq!(ctx.factory_id, "0xfactory");
        assert_eq!(
            ctx.policy(Resolution::Hour),
            Some(RetentionPolicy { window: 48, cap: 10 })
        );
        assert_eq!(ctx.fee_rate.to_string(), "0.0025");
    }
}
