//! Output format and quality presets.

use std::fmt;

use crate::foundation::core::{Canvas, Fps};

/// Container the encoder produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gif,
    Video,
}

impl OutputFormat {
    /// File extension of the produced artifact.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Video => "mp4",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gif => "gif",
            Self::Video => "video",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Resolution and frame rate for one quality tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityPreset {
    pub canvas: Canvas,
    pub fps: Fps,
}

/// The quality-to-preset mapping used by the render pipeline.
#[derive(Clone, Copy, Debug)]
pub struct PresetTable {
    low: QualityPreset,
    medium: QualityPreset,
    high: QualityPreset,
}

impl Default for PresetTable {
    fn default() -> Self {
        Self {
            low: QualityPreset {
                canvas: Canvas {
                    width: 854,
                    height: 480,
                },
                fps: Fps { num: 15, den: 1 },
            },
            medium: QualityPreset {
                canvas: Canvas {
                    width: 1280,
                    height: 720,
                },
                fps: Fps { num: 24, den: 1 },
            },
            high: QualityPreset {
                canvas: Canvas {
                    width: 1920,
                    height: 1080,
                },
                fps: Fps { num: 30, den: 1 },
            },
        }
    }
}

impl PresetTable {
    pub fn preset(&self, quality: Quality) -> QualityPreset {
        match quality {
            Quality::Low => self.low,
            Quality::Medium => self.medium,
            Quality::High => self.high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_monotonic_in_quality() {
        let table = PresetTable::default();
        let tiers = [Quality::Low, Quality::Medium, Quality::High];
        for w in tiers.windows(2) {
            let a = table.preset(w[0]);
            let b = table.preset(w[1]);
            assert!(a.canvas.width < b.canvas.width);
            assert!(a.canvas.height < b.canvas.height);
            assert!(a.fps.as_f64() < b.fps.as_f64());
        }
    }

    #[test]
    fn high_preset_matches_the_logical_canvas() {
        let high = PresetTable::default().preset(Quality::High);
        assert_eq!(high.canvas.width, 1920);
        assert_eq!(high.canvas.height, 1080);
    }

    #[test]
    fn extensions_follow_the_format() {
        assert_eq!(OutputFormat::Gif.extension(), "gif");
        assert_eq!(OutputFormat::Video.extension(), "mp4");
    }
}
