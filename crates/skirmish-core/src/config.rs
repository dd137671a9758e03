//! Configuration loading and typed config structures for a Skirmish match.
//!
//! The canonical configuration lives in `skirmish-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file and applies
//! environment overrides. Every field has a default, so an empty file is a
//! valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use skirmish_sandbox::SandboxLimits;
use skirmish_types::{AgentId, ArenaConfig, Rules};
use tracing::warn;

/// Environment variable overriding `observer.port`.
pub const ENV_OBSERVER_PORT: &str = "SKIRMISH_OBSERVER_PORT";

/// Environment variable overriding `match.max_ticks`.
pub const ENV_MAX_TICKS: &str = "SKIRMISH_MAX_TICKS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Top-level match configuration.
///
/// Mirrors the structure of `skirmish-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Match identity and timing.
    #[serde(default, rename = "match")]
    pub match_settings: MatchSettings,

    /// Per-agent execution context limits.
    #[serde(default)]
    pub sandbox: SandboxLimits,

    /// Gameplay tunables.
    #[serde(default)]
    pub rules: Rules,

    /// Where the arena comes from.
    #[serde(default)]
    pub arena: ArenaSettings,

    /// Which bots fight.
    #[serde(default)]
    pub bots: BotsConfig,

    /// Observer server.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SKIRMISH_OBSERVER_PORT` overrides `observer.port`
    /// - `SKIRMISH_MAX_TICKS` overrides `match.max_ticks`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse(&read(path)?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_OBSERVER_PORT) {
            match raw.trim().parse() {
                Ok(port) => self.observer.port = port,
                Err(err) => warn!(var = ENV_OBSERVER_PORT, value = %raw, error = %err, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(ENV_MAX_TICKS) {
            match raw.trim().parse() {
                Ok(ticks) => self.match_settings.max_ticks = ticks,
                Err(err) => warn!(var = ENV_MAX_TICKS, value = %raw, error = %err, "ignoring override"),
            }
        }
    }

    /// Load the arena this configuration points to, or the built-in open
    /// field when no path is set. Relative paths resolve against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the arena file cannot be read or parsed.
    pub fn load_arena(&self, base: &Path) -> Result<ArenaConfig, ConfigError> {
        match &self.arena.path {
            Some(path) => {
                let contents = read(&base.join(path))?;
                Ok(serde_yml::from_str(&contents)?)
            }
            None => Ok(ArenaConfig::open_field(
                self.arena.half_extent,
                self.arena.spawn_offset,
            )),
        }
    }
}

/// Match identity and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Human-readable match name.
    #[serde(default = "default_match_name")]
    pub name: String,

    /// Seed for the pickup placement RNG.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Tick on which the match ends on time.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            name: default_match_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Arena source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSettings {
    /// Path to a YAML or JSON [`ArenaConfig`]. When unset, an open flat
    /// field is generated from the two values below.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Half side length of the fallback open field.
    #[serde(default = "default_half_extent")]
    pub half_extent: f64,

    /// Distance of each fallback spawn point from the centre.
    #[serde(default = "default_spawn_offset")]
    pub spawn_offset: f64,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            path: None,
            half_extent: default_half_extent(),
            spawn_offset: default_spawn_offset(),
        }
    }
}

/// One bot as named in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotEntry {
    /// Bot name, looked up in the bot library.
    pub name: String,

    /// Explicit script path; overrides the library lookup when set.
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl BotEntry {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            script: None,
        }
    }
}

/// The two combatants and where their logic lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotsConfig {
    /// Directory holding `<name>.rhai` sources.
    #[serde(default = "default_library")]
    pub library: PathBuf,

    /// Bot for agent alpha.
    #[serde(default = "default_alpha_bot")]
    pub alpha: BotEntry,

    /// Bot for agent bravo.
    #[serde(default = "default_bravo_bot")]
    pub bravo: BotEntry,
}

impl BotsConfig {
    /// The entry for one agent.
    pub const fn entry(&self, agent: AgentId) -> &BotEntry {
        match agent {
            AgentId::Alpha => &self.alpha,
            AgentId::Bravo => &self.bravo,
        }
    }
}

impl Default for BotsConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            alpha: default_alpha_bot(),
            bravo: default_bravo_bot(),
        }
    }
}

/// Observer server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Whether to start the observer at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_observer_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error), used
    /// when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_match_name() -> String {
    "Skirmish".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_max_ticks() -> u64 {
    1800
}

const fn default_half_extent() -> f64 {
    20.0
}

const fn default_spawn_offset() -> f64 {
    8.0
}

fn default_library() -> PathBuf {
    PathBuf::from("bots")
}

fn default_alpha_bot() -> BotEntry {
    BotEntry::named("brawler")
}

fn default_bravo_bot() -> BotEntry {
    BotEntry::named("kiter")
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MatchConfig::default();
        assert_eq!(config.match_settings.tick_interval_ms, 50);
        assert_eq!(config.match_settings.max_ticks, 1800);
        assert_eq!(config.sandbox.decision_timeout_ms, 30);
        assert_eq!(config.bots.alpha.name, "brawler");
        assert_eq!(config.observer.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
match:
  name: "Test Duel"
  seed: 9
  tick_interval_ms: 20
  max_ticks: 600

sandbox:
  decision_timeout_ms: 15
  queue_depth: 2

rules:
  combat:
    melee_range: 3.0
  traps:
    max_per_owner: 1

arena:
  path: "arenas/pillars.yaml"

bots:
  library: "my-bots"
  alpha:
    name: "turtle"
  bravo:
    name: "sniper"
    script: "elsewhere/sniper.rhai"

observer:
  enabled: false
  port: 9090

logging:
  level: "debug"
  format: json
"#;
        let config = MatchConfig::parse(yaml).unwrap();

        assert_eq!(config.match_settings.name, "Test Duel");
        assert_eq!(config.match_settings.max_ticks, 600);
        assert_eq!(config.sandbox.decision_timeout_ms, 15);
        assert_eq!(config.sandbox.swap_timeout_ms, 250);
        assert_eq!(config.sandbox.queue_depth, 2);
        assert!((config.rules.combat.melee_range - 3.0).abs() < f64::EPSILON);
        assert!((config.rules.combat.defend_reduction - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.rules.traps.max_per_owner, 1);
        assert_eq!(config.arena.path, Some(PathBuf::from("arenas/pillars.yaml")));
        assert_eq!(config.bots.entry(AgentId::Alpha).name, "turtle");
        assert_eq!(
            config.bots.entry(AgentId::Bravo).script,
            Some(PathBuf::from("elsewhere/sniper.rhai"))
        );
        assert!(!config.observer.enabled);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = MatchConfig::parse("match:\n  seed: 7\n").unwrap();
        assert_eq!(config.match_settings.seed, 7);
        assert_eq!(config.match_settings.max_ticks, 1800);
        assert_eq!(config.bots.bravo.name, "kiter");
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(MatchConfig::parse("").unwrap(), MatchConfig::default());
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let mut config = MatchConfig::default();
        config.apply_overrides(|key| match key {
            ENV_OBSERVER_PORT => Some("7000".to_owned()),
            ENV_MAX_TICKS => Some("soon".to_owned()),
            _ => None,
        });
        assert_eq!(config.observer.port, 7000);
        assert_eq!(config.match_settings.max_ticks, 1800);
    }

    #[test]
    fn missing_arena_path_falls_back_to_open_field() {
        let arena = MatchConfig::default().load_arena(Path::new(".")).unwrap();
        assert!(arena.obstacles.is_empty());
        assert!(arena.bounds.contains(arena.spawn_points.alpha));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("skirmish-config.yaml");
        if path.exists() {
            let config = MatchConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }

    #[test]
    fn project_arena_builds_a_store() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
        let path = root.join("skirmish-config.yaml");
        if path.exists() {
            let config = MatchConfig::parse(&read(&path).unwrap()).unwrap();
            let arena = config.load_arena(&root).unwrap();
            assert!(!arena.obstacles.is_empty());
            let store = skirmish_world::EntityStore::new(arena, config.rules, config.match_settings.max_ticks, 1);
            assert!(store.is_ok(), "project arena rejected: {:?}", store.err());
        }
    }
}
