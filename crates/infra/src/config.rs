//! Engine configuration.
//!
//! Layering: built-in defaults, then an optional JSON file, then `RAILSTOCK_*`
//! environment variables. Missing file fields keep their defaults; unparsable
//! environment values are logged and ignored.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use railstock_core::Location;
use railstock_ledger::LocationAliases;
use railstock_observability::{LogFormat, LogSettings};
use railstock_stock::{ArrivalStatusPolicy, StockSettings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Overlay manual corrections on simulated series.
    pub apply_corrections: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub partitioned_locations: BTreeSet<Location>,
    pub arrival_policy: ArrivalStatusPolicy,
    pub batch_size: usize,
    pub cache: CacheConfig,
    pub simulation: SimulationConfig,
    pub logging: LogSettings,
    pub location_aliases: LocationAliases,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let stock = StockSettings::default();
        Self {
            partitioned_locations: stock.partitioned_locations,
            arrival_policy: stock.arrival_policy,
            batch_size: stock.batch_size,
            cache: CacheConfig::default(),
            simulation: SimulationConfig::default(),
            logging: LogSettings::default(),
            location_aliases: LocationAliases::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than zero");
        }
        Ok(())
    }

    /// Apply `RAILSTOCK_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value lookup (environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("RAILSTOCK_PARTITIONED_LOCATIONS") {
            self.partitioned_locations = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Location::new)
                .collect();
        }

        if let Some(raw) = lookup("RAILSTOCK_ARRIVAL_POLICY") {
            match raw.parse() {
                Ok(policy) => self.arrival_policy = policy,
                Err(err) => tracing::warn!(%err, "ignoring RAILSTOCK_ARRIVAL_POLICY"),
            }
        }

        if let Some(raw) = lookup("RAILSTOCK_BATCH_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.batch_size = n,
                _ => tracing::warn!(value = %raw, "ignoring RAILSTOCK_BATCH_SIZE"),
            }
        }

        if let Some(raw) = lookup("RAILSTOCK_CACHE_ENABLED") {
            match parse_flag(&raw) {
                Some(enabled) => self.cache.enabled = enabled,
                None => tracing::warn!(value = %raw, "ignoring RAILSTOCK_CACHE_ENABLED"),
            }
        }

        if let Some(raw) = lookup("RAILSTOCK_CACHE_TTL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.cache.ttl_secs = secs,
                Err(_) => tracing::warn!(value = %raw, "ignoring RAILSTOCK_CACHE_TTL_SECS"),
            }
        }

        if let Some(raw) = lookup("RAILSTOCK_SIM_APPLY_CORRECTIONS") {
            match parse_flag(&raw) {
                Some(apply) => self.simulation.apply_corrections = apply,
                None => tracing::warn!(value = %raw, "ignoring RAILSTOCK_SIM_APPLY_CORRECTIONS"),
            }
        }

        if let Some(raw) = lookup("RAILSTOCK_LOG_FORMAT") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "compact" => self.logging.format = LogFormat::Compact,
                _ => tracing::warn!(value = %raw, "ignoring RAILSTOCK_LOG_FORMAT"),
            }
        }

        self
    }

    /// Install the process-wide tracing subscriber from `logging`.
    pub fn init_logging(&self) {
        railstock_observability::init(&self.logging);
    }

    pub fn settings(&self) -> StockSettings {
        StockSettings {
            partitioned_locations: self.partitioned_locations.clone(),
            arrival_policy: self.arrival_policy,
            batch_size: self.batch_size,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_split_amb_only() {
        let config = EngineConfig::default();
        assert_eq!(config.settings(), StockSettings::default());
        assert!(config.cache.enabled);
        assert!(!config.simulation.apply_corrections);
        assert_eq!(config.location_aliases.canonical("GRA"), "VO-GRA-RIO");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"arrival_policy":"evac_or_loaded","cache":{"ttl_secs":30}}"#,
        )
        .unwrap();
        assert_eq!(config.arrival_policy, ArrivalStatusPolicy::EvacOrLoaded);
        assert_eq!(config.cache.ttl(), Duration::from_secs(30));
        assert!(config.cache.enabled);
        assert!(config.partitioned_locations.contains(&Location::new("AMB")));
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = EngineConfig::default().with_overrides(lookup(&[
            ("RAILSTOCK_PARTITIONED_LOCATIONS", "AMB, DUN ,"),
            ("RAILSTOCK_BATCH_SIZE", "250"),
            ("RAILSTOCK_CACHE_ENABLED", "off"),
            ("RAILSTOCK_SIM_APPLY_CORRECTIONS", "true"),
            ("RAILSTOCK_LOG_FORMAT", "compact"),
        ]));
        let expected: BTreeSet<Location> = ["AMB", "DUN"].into_iter().map(Location::new).collect();
        assert_eq!(config.partitioned_locations, expected);
        assert_eq!(config.batch_size, 250);
        assert!(!config.cache.enabled);
        assert!(config.simulation.apply_corrections);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn bad_override_values_are_ignored() {
        let config = EngineConfig::default().with_overrides(lookup(&[
            ("RAILSTOCK_ARRIVAL_POLICY", "sometimes"),
            ("RAILSTOCK_BATCH_SIZE", "0"),
            ("RAILSTOCK_CACHE_TTL_SECS", "soon"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("railstock-config-{}.json", std::process::id()));
        std::fs::write(&good, r#"{"batch_size": 64}"#).unwrap();
        assert_eq!(EngineConfig::load(&good).unwrap().batch_size, 64);

        std::fs::write(&good, r#"{"batch_size": 0}"#).unwrap();
        assert!(EngineConfig::load(&good).is_err());
        std::fs::remove_file(&good).unwrap();

        let err = EngineConfig::load(dir.join("railstock-missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
