//! Scene plan entries: the ordered cuts of a montage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Role of a scene within the montage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneRole {
    /// Opening shot.
    Open,
    /// Body cut.
    Cut,
    /// Closing shot.
    End,
}

impl fmt::Display for SceneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Cut => write!(f, "cut"),
            Self::End => write!(f, "end"),
        }
    }
}

/// One cut of the scene plan.
///
/// In configuration a fixed length can be written as `secs = 4` instead of
/// `min_secs` / `max_secs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScenePlanEntry")]
pub struct ScenePlanEntry {
    pub role: SceneRole,
    pub min_secs: f64,
    pub max_secs: f64,
    pub caption: String,
    pub fade_in: f64,
    pub fade_out: f64,
    /// Declared asset mapping: file name inside the asset directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

#[derive(Deserialize)]
struct RawScenePlanEntry {
    role: SceneRole,
    #[serde(default)]
    secs: Option<f64>,
    #[serde(default)]
    min_secs: Option<f64>,
    #[serde(default)]
    max_secs: Option<f64>,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    fade_in: f64,
    #[serde(default)]
    fade_out: f64,
    #[serde(default)]
    asset: Option<String>,
}

impl TryFrom<RawScenePlanEntry> for ScenePlanEntry {
    type Error = String;

    fn try_from(raw: RawScenePlanEntry) -> std::result::Result<Self, Self::Error> {
        let (min_secs, max_secs) = match (raw.secs, raw.min_secs, raw.max_secs) {
            (Some(s), None, None) => (s, s),
            (None, Some(min), Some(max)) => (min, max),
            (None, Some(min), None) => (min, min),
            (None, None, Some(max)) => (max, max),
            (None, None, None) => {
                return Err(format!("{} scene needs `secs` or `min_secs`/`max_secs`", raw.role))
            }
            _ => return Err("use either `secs` or `min_secs`/`max_secs`, not both".to_string()),
        };
        Ok(Self {
            role: raw.role,
            min_secs,
            max_secs,
            caption: raw.caption,
            fade_in: raw.fade_in,
            fade_out: raw.fade_out,
            asset: raw.asset,
        })
    }
}

impl ScenePlanEntry {
    /// A scene with a fixed duration.
    pub fn fixed(role: SceneRole, secs: f64, caption: impl Into<String>) -> Self {
        Self {
            role,
            min_secs: secs,
            max_secs: secs,
            caption: caption.into(),
            fade_in: 0.0,
            fade_out: 0.0,
            asset: None,
        }
    }

    /// A scene whose length may vary within `min..=max`.
    pub fn ranged(role: SceneRole, min: f64, max: f64, caption: impl Into<String>) -> Self {
        Self {
            max_secs: max,
            ..Self::fixed(role, min, caption)
        }
    }

    pub fn with_fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    pub fn with_asset(mut self, file_name: impl Into<String>) -> Self {
        self.asset = Some(file_name.into());
        self
    }
}

/// Validate a scene plan.
///
/// The plan must be non-empty, every range must satisfy
/// `0 < min_secs <= max_secs`, fades must fit inside the shortest length,
/// `open` may only be the first scene and `end` only the last.
pub fn validate_plan(plan: &[ScenePlanEntry]) -> Result<()> {
    if plan.is_empty() {
        return Err(Error::configuration("scene plan is empty"));
    }
    let last = plan.len() - 1;
    for (i, scene) in plan.iter().enumerate() {
        let n = i + 1;
        if !(scene.min_secs > 0.0) || !scene.max_secs.is_finite() {
            return Err(Error::configuration(format!(
                "scene {n}: duration must be positive"
            )));
        }
        if scene.min_secs > scene.max_secs {
            return Err(Error::configuration(format!(
                "scene {n}: min_secs {} exceeds max_secs {}",
                scene.min_secs, scene.max_secs
            )));
        }
        if scene.fade_in < 0.0 || scene.fade_out < 0.0 {
            return Err(Error::configuration(format!(
                "scene {n}: fades cannot be negative"
            )));
        }
        if scene.fade_in + scene.fade_out > scene.min_secs {
            return Err(Error::configuration(format!(
                "scene {n}: fades ({}s + {}s) are longer than the scene",
                scene.fade_in, scene.fade_out
            )));
        }
        match scene.role {
            SceneRole::Open if i != 0 => {
                return Err(Error::configuration(format!(
                    "scene {n}: `open` is only allowed as the first scene"
                )))
            }
            SceneRole::End if i != last => {
                return Err(Error::configuration(format!(
                    "scene {n}: `end` is only allowed as the last scene"
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Shortest total length the plan allows, in seconds.
pub fn min_total_secs(plan: &[ScenePlanEntry]) -> f64 {
    plan.iter().map(|s| s.min_secs).sum()
}

/// Longest total length the plan allows, in seconds.
pub fn max_total_secs(plan: &[ScenePlanEntry]) -> f64 {
    plan.iter().map(|s| s.max_secs).sum()
}
