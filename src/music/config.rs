//! Generation settings and prompts for the realtime music model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::error::GeminiError;

/// Key and mode of the generated music.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scale {
    CMajorAMinor,
    DFlatMajorBFlatMinor,
    DMajorBMinor,
    EFlatMajorCMinor,
    EMajorDFlatMinor,
    FMajorDMinor,
    GFlatMajorEFlatMinor,
    GMajorEMinor,
    AFlatMajorFMinor,
    AMajorGFlatMinor,
    BFlatMajorGMinor,
    BMajorAFlatMinor,
    /// Let the model decide.
    #[default]
    ScaleUnspecified,
}

impl Scale {
    pub const ALL: [Scale; 13] = [
        Scale::CMajorAMinor,
        Scale::DFlatMajorBFlatMinor,
        Scale::DMajorBMinor,
        Scale::EFlatMajorCMinor,
        Scale::EMajorDFlatMinor,
        Scale::FMajorDMinor,
        Scale::GFlatMajorEFlatMinor,
        Scale::GMajorEMinor,
        Scale::AFlatMajorFMinor,
        Scale::AMajorGFlatMinor,
        Scale::BFlatMajorGMinor,
        Scale::BMajorAFlatMinor,
        Scale::ScaleUnspecified,
    ];

    /// Wire value, e.g. `D_MAJOR_B_MINOR`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::CMajorAMinor => "C_MAJOR_A_MINOR",
            Scale::DFlatMajorBFlatMinor => "D_FLAT_MAJOR_B_FLAT_MINOR",
            Scale::DMajorBMinor => "D_MAJOR_B_MINOR",
            Scale::EFlatMajorCMinor => "E_FLAT_MAJOR_C_MINOR",
            Scale::EMajorDFlatMinor => "E_MAJOR_D_FLAT_MINOR",
            Scale::FMajorDMinor => "F_MAJOR_D_MINOR",
            Scale::GFlatMajorEFlatMinor => "G_FLAT_MAJOR_E_FLAT_MINOR",
            Scale::GMajorEMinor => "G_MAJOR_E_MINOR",
            Scale::AFlatMajorFMinor => "A_FLAT_MAJOR_F_MINOR",
            Scale::AMajorGFlatMinor => "A_MAJOR_G_FLAT_MINOR",
            Scale::BFlatMajorGMinor => "B_FLAT_MAJOR_G_MINOR",
            Scale::BMajorAFlatMinor => "B_MAJOR_A_FLAT_MINOR",
            Scale::ScaleUnspecified => "SCALE_UNSPECIFIED",
        }
    }

    /// Human readable key, e.g. `D major / B minor`.
    pub fn display_key(&self) -> &'static str {
        match self {
            Scale::CMajorAMinor => "C major / A minor",
            Scale::DFlatMajorBFlatMinor => "D♭ major / B♭ minor",
            Scale::DMajorBMinor => "D major / B minor",
            Scale::EFlatMajorCMinor => "E♭ major / C minor",
            Scale::EMajorDFlatMinor => "E major / C♯/D♭ minor",
            Scale::FMajorDMinor => "F major / D minor",
            Scale::GFlatMajorEFlatMinor => "G♭ major / E♭ minor",
            Scale::GMajorEMinor => "G major / E minor",
            Scale::AFlatMajorFMinor => "A♭ major / F minor",
            Scale::AMajorGFlatMinor => "A major / F♯/G♭ minor",
            Scale::BFlatMajorGMinor => "B♭ major / G minor",
            Scale::BMajorAFlatMinor => "B major / G♯/A♭ minor",
            Scale::ScaleUnspecified => "Default / The model decides",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = GeminiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scale::ALL
            .into_iter()
            .find(|scale| scale.as_str() == s)
            .ok_or_else(|| GeminiError::InvalidParameter(format!("unknown scale {s}")))
    }
}

/// A text prompt and how strongly it steers the music.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPrompt {
    pub text: String,
    pub weight: f32,
}

impl WeightedPrompt {
    pub fn new(text: impl Into<String>, weight: f32) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

// `range` lets NaN through.
fn validate_finite(config: &MusicGenerationConfig) -> Result<(), ValidationError> {
    let values = [
        Some(config.guidance),
        Some(config.temperature),
        config.density,
        config.brightness,
    ];
    if values.into_iter().flatten().all(f32::is_finite) {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite"))
    }
}

/// `musicGenerationConfig` sent to the session.
///
/// `bpm` and `scale` changes only take effect after stop/play or a context reset.
/// Unset `density` and `brightness` leave the choice to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_finite"))]
pub struct MusicGenerationConfig {
    #[validate(range(min = 0.0, max = 6.0))]
    pub guidance: f32,
    #[validate(range(min = 60, max = 200))]
    pub bpm: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub density: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub brightness: Option<f32>,
    pub scale: Scale,
    pub mute_bass: bool,
    pub mute_drums: bool,
    pub only_bass_and_drums: bool,
    #[validate(range(min = 0.0, max = 3.0))]
    pub temperature: f32,
    #[validate(range(min = 0, max = 1000))]
    pub top_k: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 2_147_483_647))]
    pub seed: Option<u32>,
}

impl Default for MusicGenerationConfig {
    fn default() -> Self {
        Self {
            guidance: 4.0,
            bpm: 90,
            density: None,
            brightness: None,
            scale: Scale::ScaleUnspecified,
            mute_bass: false,
            mute_drums: false,
            only_bass_and_drums: false,
            temperature: 1.1,
            top_k: 40,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_serialize_without_unset_fields() {
        let value = serde_json::to_value(MusicGenerationConfig::default()).unwrap();
        assert_eq!(value["guidance"], json!(4.0));
        assert_eq!(value["bpm"], json!(90));
        assert_eq!(value["scale"], json!("SCALE_UNSPECIFIED"));
        assert_eq!(value["onlyBassAndDrums"], json!(false));
        assert_eq!(value["topK"], json!(40));
        assert!(value.get("density").is_none());
        assert!(value.get("brightness").is_none());
        assert!(value.get("seed").is_none());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let config = MusicGenerationConfig {
            bpm: 201,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MusicGenerationConfig {
            brightness: Some(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MusicGenerationConfig {
            seed: Some(u32::MAX),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(MusicGenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn nan_fails_validation() {
        let configs = [
            MusicGenerationConfig {
                guidance: f32::NAN,
                ..Default::default()
            },
            MusicGenerationConfig {
                temperature: f32::NAN,
                ..Default::default()
            },
            MusicGenerationConfig {
                density: Some(f32::NAN),
                ..Default::default()
            },
            MusicGenerationConfig {
                brightness: Some(f32::NAN),
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(config.validate().is_err(), "{config:?}");
        }
        let config = MusicGenerationConfig {
            density: Some(0.3),
            brightness: Some(1.0),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scale_wire_names_match_serde() {
        for scale in Scale::ALL {
            assert_eq!(serde_json::to_value(scale).unwrap(), json!(scale.as_str()));
            assert_eq!(scale.as_str().parse::<Scale>().unwrap(), scale);
        }
        assert!("H_MAJOR".parse::<Scale>().is_err());
    }
}
