use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum SoundId {
    Rain,
    Forest,
    Birds,
    WhiteNoise,
    /// User-supplied track, premium only.
    Custom,
}

impl SoundId {
    pub const ALL: [SoundId; 5] = [
        SoundId::Rain,
        SoundId::Forest,
        SoundId::Birds,
        SoundId::WhiteNoise,
        SoundId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundId::Rain => "rain",
            SoundId::Forest => "forest",
            SoundId::Birds => "birds",
            SoundId::WhiteNoise => "whitenoise",
            SoundId::Custom => "custom",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SoundId::Rain => "Rainfall",
            SoundId::Forest => "Forest Stream",
            SoundId::Birds => "Birdsong",
            SoundId::WhiteNoise => "White Noise",
            SoundId::Custom => "Custom Sound (Premium)",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, SoundId::Custom)
    }
}

impl FromStr for SoundId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SoundId::ALL
            .into_iter()
            .find(|sound| sound.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown sound '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ThemeId {
    Ocean,
    Forest,
    Night,
    Minimal,
    /// Custom background, premium only.
    Custom,
}

impl Default for ThemeId {
    fn default() -> Self {
        ThemeId::Ocean
    }
}

impl ThemeId {
    pub const ALL: [ThemeId; 5] = [
        ThemeId::Ocean,
        ThemeId::Forest,
        ThemeId::Night,
        ThemeId::Minimal,
        ThemeId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Ocean => "ocean",
            ThemeId::Forest => "forest",
            ThemeId::Night => "night",
            ThemeId::Minimal => "minimal",
            ThemeId::Custom => "custom",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeId::Ocean => "Ocean Calm",
            ThemeId::Forest => "Forest Serenity",
            ThemeId::Night => "Night Sky",
            ThemeId::Minimal => "Minimal",
            ThemeId::Custom => "Custom (Premium)",
        }
    }

    /// Accent colour as a CSS hex string.
    pub fn accent_color(&self) -> &'static str {
        match self {
            ThemeId::Ocean | ThemeId::Minimal => "#58c4c4",
            ThemeId::Forest => "#8bc34a",
            ThemeId::Night => "#45b3fa",
            ThemeId::Custom => "#ffd700",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, ThemeId::Custom)
    }
}

impl FromStr for ThemeId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("default") {
            return Ok(ThemeId::Ocean);
        }
        ThemeId::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown theme '{value}'"))
    }
}
