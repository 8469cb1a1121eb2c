use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::ConfigError;
use crate::geometry::JointTriple;
use crate::tracker::ExerciseKind;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub exercises: ExercisesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// trace / debug / info / warn / error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Per-exercise settings; a missing section falls back to the preset
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExercisesConfig {
    #[serde(default = "ExerciseConfig::push_up")]
    pub push_up: ExerciseConfig,
    #[serde(default = "ExerciseConfig::squat")]
    pub squat: ExerciseConfig,
    #[serde(default = "ExerciseConfig::crunch")]
    pub crunch: ExerciseConfig,
}

impl Default for ExercisesConfig {
    fn default() -> Self {
        Self {
            push_up: ExerciseConfig::push_up(),
            squat: ExerciseConfig::squat(),
            crunch: ExerciseConfig::crunch(),
        }
    }
}

impl ExercisesConfig {
    pub fn get(&self, kind: ExerciseKind) -> &ExerciseConfig {
        match kind {
            ExerciseKind::PushUp => &self.push_up,
            ExerciseKind::Squat => &self.squat,
            ExerciseKind::Crunch => &self.crunch,
        }
    }
}

/// Strict comparison used by a form check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
}

impl Comparator {
    pub fn holds(self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::Below => value < threshold,
        }
    }
}

/// Where in the movement a form check applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckScope {
    #[default]
    Always,
    /// Only while the primary angle is above the up threshold
    Top,
    /// Only while the primary angle is below the down threshold
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCheck {
    pub name: String,
    pub joints: JointTriple,
    pub comparator: Comparator,
    /// Degrees
    pub threshold: f32,
    #[serde(default)]
    pub scope: CheckScope,
}

/// Which phase transitions add to the count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOn {
    /// Both half-cycles count (push-up: 0.5 + 0.5)
    Both,
    /// Down → Up completes a rep
    Ascent,
    /// Up → Down completes a rep
    Descent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessages {
    /// Shown on reaching the bottom of the movement
    pub bottom: String,
    /// Shown on reaching the top of the movement
    pub top: String,
    /// Replaces `top`/`bottom` on a transition that completes a rep
    #[serde(default)]
    pub counted: Option<String>,
    #[serde(default = "default_band_message")]
    pub band: String,
    #[serde(default = "default_fix_form_message")]
    pub fix_form: String,
    #[serde(default = "default_fix_form_message")]
    pub not_ready: String,
}

fn default_band_message() -> String { "Maintain control while moving up/down.".to_string() }
fn default_fix_form_message() -> String { "Fix Form".to_string() }

/// Everything that distinguishes one exercise from another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    /// Joint whose angle drives the phase
    pub primary: JointTriple,
    /// Degrees; strictly below enters Down
    pub down_threshold: f32,
    /// Degrees; strictly above enters Up
    pub up_threshold: f32,
    #[serde(default)]
    pub form_checks: Vec<FormCheck>,
    #[serde(default = "default_min_frame_interval_ms")]
    pub min_frame_interval_ms: u64,
    /// Added to the count per counted transition
    #[serde(default = "default_unit")]
    pub unit_per_half_cycle: f32,
    #[serde(default = "default_count_on")]
    pub count_on: CountOn,
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,
    #[serde(default)]
    pub smoothing: Option<SmoothingConfig>,
    pub feedback: FeedbackMessages,
}

fn default_min_frame_interval_ms() -> u64 { 200 }
fn default_unit() -> f32 { 1.0 }
fn default_count_on() -> CountOn { CountOn::Ascent }
fn default_visibility_threshold() -> f32 { 0.5 }

impl ExerciseConfig {
    pub fn min_frame_interval(&self) -> Duration {
        Duration::from_millis(self.min_frame_interval_ms)
    }

    /// Rejects configurations that could never count correctly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.primary.validate()?;
        check_degrees("down", self.down_threshold)?;
        check_degrees("up", self.up_threshold)?;
        if self.down_threshold >= self.up_threshold {
            return Err(ConfigError::InvalidThresholds {
                down: self.down_threshold,
                up: self.up_threshold,
            });
        }
        for check in &self.form_checks {
            check.joints.validate()?;
            check_degrees(&check.name, check.threshold)?;
        }
        if !(self.unit_per_half_cycle.is_finite() && self.unit_per_half_cycle > 0.0) {
            return Err(ConfigError::InvalidUnit(self.unit_per_half_cycle));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::InvalidVisibility(self.visibility_threshold));
        }
        if let Some(smoothing) = &self.smoothing {
            smoothing.validate()?;
        }
        Ok(())
    }
}

fn check_degrees(what: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=180.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange {
            what: what.to_string(),
            value,
        });
    }
    Ok(())
}

/// One Euro filter parameters for the primary joint angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Cutoff frequency at rest (Hz)
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f32,
    /// Speed coefficient; higher follows fast movement with less lag
    #[serde(default = "default_beta")]
    pub beta: f32,
    /// Cutoff for the derivative filter (Hz)
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f32,
}

fn default_min_cutoff() -> f32 { 1.0 }
fn default_beta() -> f32 { 0.05 }
fn default_d_cutoff() -> f32 { 1.0 }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidSmoothing(format!("{} must be positive, got {}", name, v)))
            }
        };
        positive("min_cutoff", self.min_cutoff)?;
        positive("d_cutoff", self.d_cutoff)?;
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(ConfigError::InvalidSmoothing(format!(
                "beta must be non-negative, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to the built-in presets when the file is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ExerciseKind::ALL {
            self.exercises.get(kind).validate()?;
        }
        Ok(())
    }
}
