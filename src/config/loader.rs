/*!
 * Config Loader
 * Reads scheduler settings from `key value` text files or JSON
 */

use super::types::SchedulerConfig;
use crate::core::errors::{ConfigError, ConfigResult};
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::{debug, info};

impl SchedulerConfig {
    /// Load and validate a config file
    ///
    /// Files ending in `.json` are parsed as JSON; anything else uses the
    /// whitespace-separated `key value` format.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_str_pairs(&text)?
        };

        info!(
            path = %path.display(),
            cores = config.num_cpu,
            policy = %config.scheduler,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate JSON settings
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate `key value` pairs
    ///
    /// Tokens are whitespace-separated and read pairwise, so one pair per line
    /// is conventional but not required. Quoted values lose their quotes;
    /// unsigned integers become numbers. Unknown keys are ignored.
    pub fn from_str_pairs(text: &str) -> ConfigResult<Self> {
        let mut map = Map::new();
        let mut tokens = text.split_whitespace();

        while let Some(key) = tokens.next() {
            let raw = tokens
                .next()
                .ok_or_else(|| ConfigError::Parse(format!("key '{}' has no value", key)))?;
            debug!(key, value = raw, "config entry");
            map.insert(key.to_string(), scalar(raw));
        }

        let config: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn scalar(raw: &str) -> Value {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    match unquoted.parse::<u64>() {
        Ok(n) if unquoted == raw => Value::Number(Number::from(n)),
        _ => Value::String(unquoted.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyKind;

    const SAMPLE: &str = r#"
num-cpu 4
scheduler "rr"
quantum-cycles 5
batch-process-freq 1
min-ins 1000
max-ins 2000
delay-per-exec 0
"#;

    #[test]
    fn test_parse_pairs() {
        let config = SchedulerConfig::from_str_pairs(SAMPLE).unwrap();
        assert_eq!(config.num_cpu, 4);
        assert_eq!(config.scheduler, PolicyKind::RoundRobin);
        assert_eq!(config.quantum_cycles, 5);
        assert_eq!(config.min_ins, 1000);
        assert_eq!(config.max_ins, 2000);
        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let text = format!("{}\nmax-overall-mem 16384\n", SAMPLE);
        assert!(SchedulerConfig::from_str_pairs(&text).is_ok());
    }

    #[test]
    fn test_missing_value() {
        let err = SchedulerConfig::from_str_pairs("num-cpu").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_required_key() {
        let err = SchedulerConfig::from_str_pairs("num-cpu 2\nscheduler fcfs").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let text = SAMPLE.replace("num-cpu 4", "num-cpu 0");
        assert_eq!(
            SchedulerConfig::from_str_pairs(&text),
            Err(ConfigError::InvalidCoreCount(0))
        );
    }

    #[test]
    fn test_quoted_number_stays_a_string() {
        assert_eq!(scalar("\"12\""), Value::String("12".into()));
        assert_eq!(scalar("12"), Value::Number(12u64.into()));
    }
}
