// projection.rs — how the source video maps onto the sphere

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Projection {
    /// Full equirectangular sphere.
    #[default]
    #[serde(rename = "360")]
    Mono360,
    /// Stereo, left/right halves.
    #[serde(rename = "360_LR")]
    Stereo360LeftRight,
    /// Stereo, top/bottom halves.
    #[serde(rename = "360_TB")]
    Stereo360TopBottom,
    /// Front hemisphere only, stereo side by side.
    #[serde(rename = "180")]
    Half180,
    #[serde(rename = "180_LR")]
    Half180LeftRight,
    #[serde(rename = "180_MONO")]
    Half180Mono,
    /// Equi-angular cubemap.
    #[serde(rename = "EAC")]
    Eac,
    #[serde(rename = "EAC_LR")]
    EacLeftRight,
}

impl Projection {
    /// 180° sources leave the back hemisphere unrendered, so the orbit must
    /// not be allowed to turn towards it.
    pub fn is_half_view(self) -> bool {
        matches!(
            self,
            Projection::Half180 | Projection::Half180LeftRight | Projection::Half180Mono
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Projection::Mono360 => "360",
            Projection::Stereo360LeftRight => "360_LR",
            Projection::Stereo360TopBottom => "360_TB",
            Projection::Half180 => "180",
            Projection::Half180LeftRight => "180_LR",
            Projection::Half180Mono => "180_MONO",
            Projection::Eac => "EAC",
            Projection::EacLeftRight => "EAC_LR",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProjection(pub String);

impl fmt::Display for UnknownProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown projection `{}`", self.0)
    }
}

impl std::error::Error for UnknownProjection {}

impl FromStr for Projection {
    type Err = UnknownProjection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p = match s.trim().to_ascii_uppercase().as_str() {
            "360" | "SPHERICAL" | "EQUIRECTANGULAR" => Projection::Mono360,
            "360_LR" => Projection::Stereo360LeftRight,
            "360_TB" => Projection::Stereo360TopBottom,
            "180" => Projection::Half180,
            "180_LR" => Projection::Half180LeftRight,
            "180_MONO" => Projection::Half180Mono,
            "EAC" => Projection::Eac,
            "EAC_LR" => Projection::EacLeftRight,
            _ => return Err(UnknownProjection(s.to_string())),
        };
        Ok(p)
    }
}
