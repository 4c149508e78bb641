// config.rs — tunables for the controls, loaded from JSON
//
// Resolution: --config <path>, then VR_ORBIT_CONFIG, then built-in defaults.

use crate::error::ConfigError;
use crate::fusion::DEFAULT_SPEED;
use crate::navigator::NavigatorGeometry;
use crate::orbit::OrbitSettings;
use crate::pan::{PanController, PAN_INCREMENT, PAN_PERIOD};
use crate::projection::Projection;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub projection: Projection,
    /// Overrides the half-view rule implied by `projection`.
    pub half_view: Option<bool>,
    /// Sensor delta gain is `1 + speed`; keys rotate at `-speed`.
    pub speed: f32,
    /// Orbit damping factor in (0, 1]. Off when unset.
    pub damping: Option<f32>,
    /// Radians per pan tick.
    pub pan_increment: f32,
    pub pan_period_ms: u64,
    pub navigator: NavigatorGeometry,
    pub lang: Option<String>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            half_view: None,
            speed: DEFAULT_SPEED,
            damping: None,
            pan_increment: PAN_INCREMENT,
            pan_period_ms: PAN_PERIOD.as_millis() as u64,
            navigator: NavigatorGeometry::default(),
            lang: None,
        }
    }
}

impl ControlsConfig {
    pub fn half_view(&self) -> bool {
        self.half_view.unwrap_or_else(|| self.projection.is_half_view())
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        log::info!("loaded controls config from {}", path.display());
        Ok(config)
    }

    /// Loads from `--config` or `VR_ORBIT_CONFIG`, else returns defaults.
    pub fn resolve() -> Result<Self, ConfigError> {
        match config_path_from_args() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(ConfigError::Invalid {
                field: "speed",
                reason: format!("{} is not a non-negative number", self.speed),
            });
        }
        if let Some(d) = self.damping {
            if !(d > 0.0 && d <= 1.0) {
                return Err(ConfigError::Invalid {
                    field: "damping",
                    reason: format!("{d} is outside (0, 1]"),
                });
            }
        }
        if !self.pan_increment.is_finite() || self.pan_increment <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "pan_increment",
                reason: format!("{} must be positive", self.pan_increment),
            });
        }
        if self.pan_period_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "pan_period_ms",
                reason: "must be at least 1".into(),
            });
        }
        let nav = &self.navigator;
        if nav.radius_min < 0.0 || nav.radius_max < nav.radius_min {
            return Err(ConfigError::Invalid {
                field: "navigator",
                reason: format!(
                    "ring radii {}..{} are not an increasing range",
                    nav.radius_min, nav.radius_max
                ),
            });
        }
        Ok(())
    }

    pub fn orbit_settings(&self) -> OrbitSettings {
        let mut s = OrbitSettings::panorama(self.speed, self.half_view());
        if let Some(d) = self.damping {
            s.enable_damping = true;
            s.damping_factor = d;
        }
        s
    }

    pub fn pan_controller(&self) -> PanController {
        PanController::new(self.pan_increment, Duration::from_millis(self.pan_period_ms))
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--config" {
            if let Some(v) = it.next() {
                return Some(PathBuf::from(v));
            }
        }
    }

    match std::env::var("VR_ORBIT_CONFIG") {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v)),
        _ => None,
    }
}
