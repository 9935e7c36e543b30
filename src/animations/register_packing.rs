//! Register bit-placement execution: the `rorb`/`rorl` loop that packs one
//! symbol per byte into `%ebx`.

use serde_json::Value;

use crate::{
    animation::base::{Animation, Theme},
    config::{Config, ConfigMap, config_map},
    foundation::{
        core::{LOGICAL_WIDTH, Vec2},
        error::AsmvizResult,
    },
    scene::{
        model::{Entity, EntityKind},
        step::{Action, Step},
    },
};

pub(crate) fn defaults() -> ConfigMap {
    config_map([
        (
            "symbols",
            serde_json::json!(["SKOCKO", "TREF", "PIK", "HERC"]),
        ),
        ("initial_mask", Value::from("0x80808080")),
        ("bit_animation_delay", Value::from(0.5)),
        ("register_color", Value::from("#64b5f6")),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(RegisterPacking::from_config(cfg.clone())?))
}

pub struct RegisterPacking {
    cfg: Config,
    theme: Theme,
    symbols: Vec<String>,
    initial_mask: u32,
    bit_delay: f64,
    register_color: crate::foundation::core::Rgba8,
}

impl RegisterPacking {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            symbols: cfg.get_str_list("symbols")?,
            initial_mask: cfg.get_u32_bits("initial_mask")?,
            bit_delay: cfg.get_f64("bit_animation_delay")?,
            register_color: cfg.get_color("register_color")?,
            cfg,
        })
    }

    /// `rorb %cl, %bl` with a fixed 3-bit rotate of the low byte, exactly as
    /// the narrated execution trace.
    fn rotate_low_byte(value: u32) -> u32 {
        let byte = value & 0xFF;
        let rotated = (byte >> 3) | ((byte << 5) & 0xFF);
        (value & !0xFF) | rotated
    }
}

impl Animation for RegisterPacking {
    fn name(&self) -> &'static str {
        "register_packing"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Executing Bit Placement in Register");

        steps.push(Step::new(
            Action::Spawn {
                id: "ebx".to_string(),
                entity: Entity::new(
                    Vec2::new(LOGICAL_WIDTH / 2.0, 480.0),
                    self.register_color,
                    EntityKind::Register {
                        label: "%ebx".to_string(),
                        value: self.initial_mask,
                        width: 460.0,
                        height: 100.0,
                    },
                ),
            },
            0.5,
        ));
        steps.push(Step::new(
            Action::Spawn {
                id: "code".to_string(),
                entity: Entity::new(
                    Vec2::new(90.0, 200.0),
                    theme.text,
                    EntityKind::CodeBlock {
                        lines: vec!["rorb %cl, %bl".to_string(), "rorl $8, %ebx".to_string()],
                        highlighted: None,
                        font_size: 30.0,
                        highlight_color: theme.highlight,
                    },
                ),
            },
            0.5,
        ));
        steps.push(Step::wait(theme.wait_time));
        steps
    }

    fn body(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut value = self.initial_mask;

        // One repetition per symbol in the combination, never a literal 4.
        for _ in 0..self.symbols.len() {
            steps.push(Step::new(
                Action::HighlightLine {
                    id: "code".to_string(),
                    line: Some(0),
                },
                0.8,
            ));
            value = Self::rotate_low_byte(value);
            steps.push(Step::new(
                Action::SetRegister {
                    id: "ebx".to_string(),
                    value,
                },
                self.bit_delay,
            ));
            steps.push(Step::new(
                Action::HighlightLine {
                    id: "code".to_string(),
                    line: Some(1),
                },
                0.8,
            ));
            value = value.rotate_left(8);
            steps.push(Step::new(
                Action::SetRegister {
                    id: "ebx".to_string(),
                    value,
                },
                0.5,
            ));
            steps.push(Step::instant(Action::HighlightLine {
                id: "code".to_string(),
                line: None,
            }));
        }
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        vec![
            self.theme.caption("done", "Full combination packed!", 660.0),
            Step::wait(2.0),
            self.theme.fade_out("title"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> RegisterPacking {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        RegisterPacking::from_config(cfg).unwrap()
    }

    fn register_writes(steps: &[Step]) -> usize {
        steps
            .iter()
            .filter(|s| matches!(s.action, Action::SetRegister { .. }))
            .count()
    }

    #[test]
    fn body_emits_one_rotate_pair_per_symbol() {
        let a = anim(ConfigMap::new());
        // Two register writes (rorb then rorl) per configured symbol.
        assert_eq!(register_writes(&a.body()), 2 * 4);
    }

    #[test]
    fn repetition_count_follows_symbols_override() {
        let mut overrides = ConfigMap::new();
        overrides.insert(
            "symbols".to_string(),
            serde_json::json!(["A", "B", "C", "D", "E", "F"]),
        );
        let a = anim(overrides);
        assert_eq!(register_writes(&a.body()), 2 * 6);
    }

    #[test]
    fn low_byte_rotation_matches_the_narrated_trace() {
        // 0x80 rotated right by 3 within the byte is 0x10.
        assert_eq!(RegisterPacking::rotate_low_byte(0x8080_8080), 0x8080_8010);
    }

    #[test]
    fn lifecycle_is_scene_consistent() {
        let a = anim(ConfigMap::new());
        let script = crate::animation::base::Script::assemble(&a).unwrap();
        script.into_timeline().unwrap();
    }
}
