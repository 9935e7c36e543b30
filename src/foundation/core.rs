use crate::foundation::error::{AsmvizError, AsmvizResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Width of the logical layout space every animation script works in.
///
/// Scripts position entities in a fixed 1920x1080 plane; the render backend
/// scales uniformly to the preset resolution so a single script serves all
/// quality tiers.
pub const LOGICAL_WIDTH: f64 = 1920.0;
/// Height of the logical layout space.
pub const LOGICAL_HEIGHT: f64 = 1080.0;

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> AsmvizResult<Self> {
        if width == 0 || height == 0 {
            return Err(AsmvizError::config("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> AsmvizResult<Self> {
        if den == 0 {
            return Err(AsmvizError::config("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(AsmvizError::config("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Number of frames needed to cover `secs` seconds (ceil, at least 1).
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        ((secs * self.as_f64()).ceil().max(1.0)) as u64
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color from RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` hex notation.
    pub fn from_hex(s: &str) -> AsmvizResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let bad = || AsmvizError::config(format!("malformed color value '{s}'"));

        let parse2 = |chunk: &str| u8::from_str_radix(chunk, 16).map_err(|_| bad());

        match hex.len() {
            3 => {
                let mut ch = hex.chars();
                let mut next = || -> AsmvizResult<u8> {
                    let c = ch.next().ok_or_else(bad)?;
                    let v = c.to_digit(16).ok_or_else(bad)? as u8;
                    Ok(v * 17)
                };
                Ok(Self {
                    r: next()?,
                    g: next()?,
                    b: next()?,
                    a: 255,
                })
            }
            6 => Ok(Self {
                r: parse2(&hex[0..2])?,
                g: parse2(&hex[2..4])?,
                b: parse2(&hex[4..6])?,
                a: 255,
            }),
            8 => Ok(Self {
                r: parse2(&hex[0..2])?,
                g: parse2(&hex[2..4])?,
                b: parse2(&hex[4..6])?,
                a: parse2(&hex[6..8])?,
            }),
            _ => Err(bad()),
        }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_zero_dimensions() {
        assert!(Canvas::new(0, 1080).is_err());
        assert!(Canvas::new(1920, 0).is_err());
        assert!(Canvas::new(1920, 1080).is_ok());
    }

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
    }

    #[test]
    fn secs_to_frames_rounds_up_and_is_at_least_one() {
        let fps = Fps::new(30, 1).unwrap();
        assert_eq!(fps.secs_to_frames_ceil(1.0), 30);
        assert_eq!(fps.secs_to_frames_ceil(0.01), 1);
        assert_eq!(fps.secs_to_frames_ceil(0.0), 1);
    }

    #[test]
    fn hex_color_forms_parse() {
        assert_eq!(Rgba8::from_hex("#1a1a1a").unwrap(), Rgba8::opaque(26, 26, 26));
        assert_eq!(Rgba8::from_hex("fff").unwrap(), Rgba8::opaque(255, 255, 255));
        assert_eq!(
            Rgba8::from_hex("#11223344").unwrap(),
            Rgba8 {
                r: 0x11,
                g: 0x22,
                b: 0x33,
                a: 0x44
            }
        );
    }

    #[test]
    fn hex_color_rejects_garbage() {
        assert!(Rgba8::from_hex("#12345").is_err());
        assert!(Rgba8::from_hex("zzzzzz").is_err());
        assert!(Rgba8::from_hex("").is_err());
    }
}
