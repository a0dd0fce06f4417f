//! Configuration Vault – reads/writes `~/.tofsight/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tofsight_inference::{DEFAULT_ARENA_BYTES, EngineConfig};
use tofsight_perception::{FilterBankConfig, KalmanParams};
use tofsight_runtime::{LoopConfig, PipelineConfig};
use tofsight_types::{
    BackgroundReference, DEFAULT_ENVELOPE_MAX_MM, DepthFrame, Encoding, GRID_SIDE, TofError,
};

/// How each cycle report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Persisted user configuration stored in `~/.tofsight/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Encoding of the built-in model and the one a loaded asset must use.
    #[serde(default)]
    pub encoding: Encoding,

    /// Compute arena size in bytes.
    #[serde(default = "default_arena_bytes")]
    pub arena_bytes: usize,

    /// Compiled graph asset to load instead of the built-in model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub kalman_enabled: bool,
    #[serde(default = "default_envelope_mm")]
    pub kalman_initial_mm: u16,
    #[serde(default = "default_process_noise")]
    pub kalman_process_noise: f32,
    #[serde(default = "default_measurement_noise")]
    pub kalman_measurement_noise: f32,
    #[serde(default = "default_initial_uncertainty")]
    pub kalman_initial_uncertainty: f32,

    /// Clamp raw samples to `raw_envelope_mm` before filtering.
    #[serde(default = "default_true")]
    pub raw_envelope_enabled: bool,
    #[serde(default = "default_envelope_mm")]
    pub raw_envelope_mm: u16,

    /// Foreground depth that normalizes to 1.0.
    #[serde(default = "default_envelope_mm")]
    pub envelope_max_mm: u16,

    /// Per-zone background grid (8 rows of 8). Uniform 400 mm when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_mm: Option<[[u16; GRID_SIDE]; GRID_SIDE]>,

    #[serde(default = "default_ranging_frequency_hz")]
    pub ranging_frequency_hz: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Print the smoothed 8×8 matrix every cycle (text output only).
    #[serde(default)]
    pub print_matrix: bool,
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Stop after this many frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_frames: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_arena_bytes() -> usize {
    DEFAULT_ARENA_BYTES
}
fn default_envelope_mm() -> u16 {
    DEFAULT_ENVELOPE_MAX_MM
}
fn default_process_noise() -> f32 {
    KalmanParams::default().process_noise
}
fn default_measurement_noise() -> f32 {
    KalmanParams::default().measurement_noise
}
fn default_initial_uncertainty() -> f32 {
    KalmanParams::default().initial_uncertainty
}
fn default_ranging_frequency_hz() -> u32 {
    5
}
fn default_poll_interval_ms() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            arena_bytes: default_arena_bytes(),
            model_path: None,
            kalman_enabled: true,
            kalman_initial_mm: default_envelope_mm(),
            kalman_process_noise: default_process_noise(),
            kalman_measurement_noise: default_measurement_noise(),
            kalman_initial_uncertainty: default_initial_uncertainty(),
            raw_envelope_enabled: true,
            raw_envelope_mm: default_envelope_mm(),
            envelope_max_mm: default_envelope_mm(),
            background_mm: None,
            ranging_frequency_hz: default_ranging_frequency_hz(),
            poll_interval_ms: default_poll_interval_ms(),
            print_matrix: false,
            output_format: OutputFormat::default(),
            max_frames: None,
        }
    }
}

impl Config {
    pub fn background(&self) -> BackgroundReference {
        match self.background_mm {
            Some(grid) => BackgroundReference::new(DepthFrame::new(grid)),
            None => BackgroundReference::uniform(DEFAULT_ENVELOPE_MAX_MM),
        }
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            filter: FilterBankConfig {
                enabled: self.kalman_enabled,
                params: KalmanParams {
                    initial_value: f32::from(self.kalman_initial_mm),
                    initial_uncertainty: self.kalman_initial_uncertainty,
                    process_noise: self.kalman_process_noise,
                    measurement_noise: self.kalman_measurement_noise,
                },
                raw_envelope_mm: self.raw_envelope_enabled.then_some(self.raw_envelope_mm),
            },
            envelope_max_mm: self.envelope_max_mm,
            background: self.background(),
            engine: EngineConfig {
                arena_bytes: self.arena_bytes,
                encoding: Some(self.encoding),
            },
        }
    }

    pub fn to_loop_config(&self) -> LoopConfig {
        LoopConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_frames: self.max_frames,
        }
    }
}

/// Return the path to `~/.tofsight/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tofsight").join("config.toml")
}

/// Load the config from disk, falling back to defaults when the file does
/// not exist. Environment overrides are applied either way.
pub fn load() -> Result<Config, TofError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, TofError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        TofError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| TofError::Config(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// Apply `TOFSIGHT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TOFSIGHT_ENCODING` | `encoding` |
/// | `TOFSIGHT_MODEL_PATH` | `model_path` |
/// | `TOFSIGHT_ARENA_BYTES` | `arena_bytes` |
/// | `TOFSIGHT_MAX_FRAMES` | `max_frames` |
///
/// Numeric values that do not parse are ignored; an unknown encoding is an
/// error.
pub fn apply_env_overrides(cfg: &mut Config) -> Result<(), TofError> {
    apply_overrides(cfg, |key| std::env::var(key).ok())
}

/// [`apply_env_overrides`] over an arbitrary variable lookup.
pub(crate) fn apply_overrides(
    cfg: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), TofError> {
    if let Some(v) = lookup("TOFSIGHT_ENCODING") {
        cfg.encoding = v.parse()?;
    }
    if let Some(v) = lookup("TOFSIGHT_MODEL_PATH")
        && !v.trim().is_empty()
    {
        cfg.model_path = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("TOFSIGHT_ARENA_BYTES")
        && let Ok(bytes) = v.trim().parse::<usize>()
    {
        cfg.arena_bytes = bytes;
    }
    if let Some(v) = lookup("TOFSIGHT_MAX_FRAMES")
        && let Ok(n) = v.trim().parse::<u64>()
    {
        cfg.max_frames = Some(n);
    }
    Ok(())
}

/// Save the config to disk, creating `~/.tofsight/` if necessary.
pub fn save(cfg: &Config) -> Result<(), TofError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), TofError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| TofError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                TofError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| TofError::Config(format!("failed to serialize config: {e}")))?;
    let write_err =
        |e: std::io::Error| TofError::Config(format!("failed to write config at {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
