// Configuration loading and parsing (config/hoopscope.toml).

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::record::{Season, SourceKind};

/// File name of the single configuration file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "hoopscope.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub ratings: RatingsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Reasoning backend used for narrative commentary.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// When false, every narrative is rule-based and no request is made.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base address of the reasoning service, e.g. `http://localhost:11434`.
    pub endpoint: String,
    pub model: String,
    pub timeout_s: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout_s)
    }
}

// ---------------------------------------------------------------------------
// [sources]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Season collected when the caller does not name one.
    pub season: Season,
    /// Adapter priority, highest first.
    pub order: Vec<SourceKind>,
    /// Per-adapter wall-clock budget.
    pub timeout_s: f64,
    /// Forces the synthetic source alone (offline/test mode).
    #[serde(default)]
    pub use_synthetic_only: bool,
    #[serde(default)]
    pub primary_url: Option<String>,
    /// URL or local path of a per-game table exported as CSV.
    #[serde(default)]
    pub secondary_location: Option<String>,
    #[serde(default)]
    pub tertiary_url: Option<String>,
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout_s)
    }

    /// The adapter order actually used, honouring `use_synthetic_only`.
    pub fn effective_order(&self) -> Vec<SourceKind> {
        if self.use_synthetic_only {
            vec![SourceKind::Synthetic]
        } else {
            self.order.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// [scoring]
// ---------------------------------------------------------------------------

/// Formula weights for the offensive, defensive and overall scores.
///
/// The defaults are the canonical "standard" formula. A deployment may swap in
/// a different weighting, but it replaces this set wholesale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minutes per game at which the minutes factor reaches 1.0.
    pub minutes_ceiling: f64,
    pub points: f64,
    pub fg_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
    pub assists: f64,
    pub turnovers: f64,
    pub steals: f64,
    pub blocks: f64,
    pub defensive_rebounds: f64,
    pub fouls: f64,
    pub overall_offense: f64,
    pub overall_defense: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minutes_ceiling: 30.0,
            points: 0.3,
            fg_pct: 0.2,
            fg3_pct: 0.15,
            ft_pct: 0.1,
            assists: 0.15,
            turnovers: 0.1,
            steals: 2.0,
            blocks: 2.0,
            defensive_rebounds: 0.5,
            fouls: 0.5,
            overall_offense: 0.6,
            overall_defense: 0.4,
        }
    }
}

// ---------------------------------------------------------------------------
// [ratings]
// ---------------------------------------------------------------------------

/// One rating band as written in config. The lowest band may omit `min`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BandSpec {
    #[serde(default)]
    pub min: Option<f64>,
    pub label: String,
}

impl BandSpec {
    pub fn new(min: Option<f64>, label: &str) -> Self {
        Self {
            min,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatingsConfig {
    pub offensive: Vec<BandSpec>,
    pub defensive: Vec<BandSpec>,
    pub overall: Vec<BandSpec>,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            offensive: five_bands([10.0, 15.0, 20.0, 25.0]),
            defensive: five_bands([2.0, 4.0, 6.0, 8.0]),
            overall: five_bands([7.0, 10.5, 14.5, 18.0]),
        }
    }
}

fn five_bands(bounds: [f64; 4]) -> Vec<BandSpec> {
    vec![
        BandSpec::new(None, "Below Average"),
        BandSpec::new(Some(bounds[0]), "Average"),
        BandSpec::new(Some(bounds[1]), "Good"),
        BandSpec::new(Some(bounds[2]), "Excellent"),
        BandSpec::new(Some(bounds[3]), "Elite"),
    ]
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Snapshot file. Empty means the platform data directory.
    pub snapshot_path: String,
}

impl Config {
    /// Resolved snapshot location.
    pub fn snapshot_path(&self) -> PathBuf {
        if !self.storage.snapshot_path.trim().is_empty() {
            return PathBuf::from(self.storage.snapshot_path.trim());
        }
        directories::ProjectDirs::from("", "", "hoopscope")
            .map(|dirs| dirs.data_dir().join("snapshot.csv"))
            .unwrap_or_else(|| PathBuf::from("data/snapshot.csv"))
    }
}

/// Largest accepted timeout, one day.
const MAX_TIMEOUT_S: f64 = 86_400.0;

/// Validated timeouts never hit the saturating arm.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    600
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/hoopscope.toml` relative to `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&text, &path)
}

/// Parse and validate config text. `path` is only used for error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn check_timeout(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= MAX_TIMEOUT_S {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be > 0 and at most {MAX_TIMEOUT_S} seconds, got {value}"),
        ))
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let backend = &config.backend;
    if backend.enabled && backend.endpoint.trim().is_empty() {
        return Err(invalid("backend.endpoint", "must not be empty when the backend is enabled"));
    }
    check_timeout("backend.timeout_s", backend.timeout_s)?;

    let sources = &config.sources;
    check_timeout("sources.timeout_s", sources.timeout_s)?;
    if sources.order.is_empty() {
        return Err(invalid("sources.order", "must list at least one source"));
    }
    let mut seen = HashSet::new();
    for kind in &sources.order {
        if !seen.insert(*kind) {
            return Err(invalid("sources.order", format!("`{kind}` is listed more than once")));
        }
    }

    let s = &config.scoring;
    if !(s.minutes_ceiling.is_finite() && s.minutes_ceiling > 0.0) {
        return Err(invalid(
            "scoring.minutes_ceiling",
            format!("must be > 0, got {}", s.minutes_ceiling),
        ));
    }
    let weights: &[(&str, f64)] = &[
        ("scoring.points", s.points),
        ("scoring.fg_pct", s.fg_pct),
        ("scoring.fg3_pct", s.fg3_pct),
        ("scoring.ft_pct", s.ft_pct),
        ("scoring.assists", s.assists),
        ("scoring.turnovers", s.turnovers),
        ("scoring.steals", s.steals),
        ("scoring.blocks", s.blocks),
        ("scoring.defensive_rebounds", s.defensive_rebounds),
        ("scoring.fouls", s.fouls),
        ("scoring.overall_offense", s.overall_offense),
        ("scoring.overall_defense", s.overall_defense),
    ];
    for (name, val) in weights {
        if !(val.is_finite() && *val >= 0.0) {
            return Err(invalid(name, format!("must be a finite value >= 0, got {val}")));
        }
    }

    validate_bands("ratings.offensive", &config.ratings.offensive)?;
    validate_bands("ratings.defensive", &config.ratings.defensive)?;
    validate_bands("ratings.overall", &config.ratings.overall)?;

    Ok(())
}

/// Bands must be non-empty, labelled, and strictly ascending. Only the first
/// band may leave `min` unset.
pub fn validate_bands(field: &str, bands: &[BandSpec]) -> Result<(), ConfigError> {
    if bands.is_empty() {
        return Err(invalid(field, "must contain at least one band"));
    }
    let mut prev: Option<f64> = None;
    for (i, band) in bands.iter().enumerate() {
        if band.label.trim().is_empty() {
            return Err(invalid(field, format!("band {i} has an empty label")));
        }
        match band.min {
            None if i == 0 => {}
            None => {
                return Err(invalid(field, format!("band {i} (`{}`) needs a `min`", band.label)));
            }
            Some(min) if min.is_nan() => {
                return Err(invalid(field, format!("band {i} has a NaN `min`")));
            }
            Some(min) => {
                if let Some(p) = prev {
                    if min <= p {
                        return Err(invalid(
                            field,
                            format!("bands must be ascending: {min} follows {p}"),
                        ));
                    }
                }
                prev = Some(min);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"
[backend]
endpoint = "http://localhost:11434"
model = "llama2:7b"
timeout_s = 20.0

[sources]
season = "2023-24"
order = ["primary", "secondary", "tertiary", "synthetic"]
timeout_s = 15.0
"#;

    fn workspace_defaults() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../defaults")
    }

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(text, Path::new("test.toml"))
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_shipped_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            workspace_defaults().join(CONFIG_FILE),
            config_dir.join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config_from(tmp.path()).expect("defaults should load");
        assert_eq!(config.backend.model, "llama2:7b");
        assert_eq!(config.sources.season.to_string(), "2023-24");
        assert_eq!(
            config.sources.order,
            vec![
                SourceKind::Primary,
                SourceKind::Secondary,
                SourceKind::Tertiary,
                SourceKind::Synthetic
            ]
        );
        assert!(!config.sources.use_synthetic_only);
        assert_eq!(config.scoring, ScoringConfig::default());
        assert_eq!(config.ratings, RatingsConfig::default());
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert!(config.backend.enabled);
        assert_eq!(config.backend.max_tokens, 600);
        assert_eq!(config.backend.timeout(), Duration::from_secs(20));
        assert_eq!(config.sources.timeout(), Duration::from_secs(15));
        assert!((config.scoring.points - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.ratings.offensive.last().unwrap().label, "Elite");
        assert!(config.storage.snapshot_path.is_empty());
    }

    #[test]
    fn synthetic_only_overrides_order() {
        let text = MINIMAL.replace("timeout_s = 15.0", "timeout_s = 15.0\nuse_synthetic_only = true");
        let config = parse(&text).unwrap();
        assert_eq!(config.sources.effective_order(), vec![SourceKind::Synthetic]);
    }

    #[test]
    fn explicit_snapshot_path_is_used() {
        let text = format!("{MINIMAL}\n[storage]\nsnapshot_path = \"data/snap.csv\"\n");
        let config = parse(&text).unwrap();
        assert_eq!(config.snapshot_path(), PathBuf::from("data/snap.csv"));
    }

    #[test]
    fn rejects_bad_season() {
        let text = MINIMAL.replace("2023-24", "2023-25");
        assert!(matches!(parse(&text), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn rejects_unknown_source_kind() {
        let text = MINIMAL.replace("\"tertiary\"", "\"quaternary\"");
        assert!(matches!(parse(&text), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn rejects_duplicate_source() {
        let text = MINIMAL.replace("\"tertiary\"", "\"primary\"");
        expect_field(parse(&text).unwrap_err(), "sources.order");
    }

    #[test]
    fn rejects_empty_order() {
        let text = MINIMAL.replace(
            "order = [\"primary\", \"secondary\", \"tertiary\", \"synthetic\"]",
            "order = []",
        );
        expect_field(parse(&text).unwrap_err(), "sources.order");
    }

    #[test]
    fn rejects_zero_backend_timeout() {
        let text = MINIMAL.replace("timeout_s = 20.0", "timeout_s = 0.0");
        expect_field(parse(&text).unwrap_err(), "backend.timeout_s");
    }

    #[test]
    fn rejects_timeout_too_large_for_duration() {
        let text = MINIMAL.replace("timeout_s = 15.0", "timeout_s = 1e20");
        expect_field(parse(&text).unwrap_err(), "sources.timeout_s");

        let text = MINIMAL.replace("timeout_s = 20.0", "timeout_s = 86401.0");
        expect_field(parse(&text).unwrap_err(), "backend.timeout_s");

        let text = MINIMAL.replace("timeout_s = 15.0", "timeout_s = 86400.0");
        assert_eq!(parse(&text).unwrap().sources.timeout(), Duration::from_secs(86_400));
    }

    #[test]
    fn out_of_range_timeout_saturates_instead_of_panicking() {
        let mut config = parse(MINIMAL).unwrap();
        config.sources.timeout_s = 1e20;
        assert_eq!(config.sources.timeout(), Duration::MAX);
    }

    #[test]
    fn empty_endpoint_allowed_when_disabled() {
        let enabled = MINIMAL.replace("\"http://localhost:11434\"", "\"\"");
        expect_field(parse(&enabled).unwrap_err(), "backend.endpoint");

        let disabled = enabled.replace("[backend]", "[backend]\nenabled = false");
        assert!(parse(&disabled).is_ok());
    }

    #[test]
    fn rejects_negative_weight() {
        let text = format!("{MINIMAL}\n[scoring]\nfouls = -0.5\n");
        expect_field(parse(&text).unwrap_err(), "scoring.fouls");
    }

    #[test]
    fn rejects_zero_minutes_ceiling() {
        let text = format!("{MINIMAL}\n[scoring]\nminutes_ceiling = 0.0\n");
        expect_field(parse(&text).unwrap_err(), "scoring.minutes_ceiling");
    }

    #[test]
    fn rejects_descending_bands() {
        let text = format!(
            "{MINIMAL}\n[ratings]\noffensive = [{{ label = \"Low\" }}, {{ min = 20.0, label = \"Mid\" }}, {{ min = 10.0, label = \"High\" }}]\n"
        );
        expect_field(parse(&text).unwrap_err(), "ratings.offensive");
    }

    #[test]
    fn custom_bands_replace_one_table_only() {
        let text = format!(
            "{MINIMAL}\n[ratings]\ndefensive = [{{ label = \"Weak\" }}, {{ min = 5.0, label = \"Strong\" }}]\n"
        );
        let config = parse(&text).unwrap();
        assert_eq!(config.ratings.defensive.len(), 2);
        assert_eq!(config.ratings.offensive, RatingsConfig::default().offensive);
    }

    #[test]
    fn validate_bands_needs_min_after_first() {
        let bands = vec![BandSpec::new(None, "A"), BandSpec::new(None, "B")];
        assert!(validate_bands("x", &bands).is_err());
        assert!(validate_bands("x", &[]).is_err());
        assert!(validate_bands("x", &[BandSpec::new(Some(1.0), "only")]).is_ok());
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        assert!(matches!(
            parse("this is not valid [[[ toml"),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), MINIMAL).unwrap();
        fs::write(defaults_dir.join("hoopscope.toml.example"), "# sample\n").unwrap();

        let copied = ensure_config_files(tmp.path()).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.path().join("config").join(CONFIG_FILE).exists());
        assert!(!tmp.path().join("config/hoopscope.toml.example").exists());
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(defaults_dir.join(CONFIG_FILE), MINIMAL).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), "# custom\n").unwrap();

        let copied = ensure_config_files(tmp.path()).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(config_dir.join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = tempfile::tempdir().unwrap();
        match ensure_config_files(tmp.path()).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
    }
}
