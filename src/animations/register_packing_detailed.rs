//! Detailed register packing: the four bytes of `%ebx` drawn as slots, each
//! placed symbol rotated into the low byte with `rorb` and shifted onward
//! with `rorl $8`.

use serde_json::Value;

use crate::{
    animation::{
        base::{Animation, Theme},
        ease::Ease,
    },
    config::{Config, ConfigMap, config_map},
    foundation::{
        core::{LOGICAL_WIDTH, Rgba8, Vec2},
        error::{AsmvizError, AsmvizResult},
    },
    scene::{
        model::{Entity, EntityKind, ShapeKind},
        step::{Action, Step},
    },
};

pub(crate) fn defaults() -> ConfigMap {
    config_map([
        (
            "symbols",
            serde_json::json!(["SKOCKO (1)", "TREF (2)", "PIK (3)", "HERC (4)", "KARO (5)", "ZVEZDA (6)"]),
        ),
        (
            "patterns",
            serde_json::json!([
                "10000000", "01000000", "00100000", "00010000", "00001000", "00000100"
            ]),
        ),
        (
            "symbol_colors",
            serde_json::json!(["#ef5350", "#ff9800", "#ffd34d", "#4caf50", "#64b5f6", "#ab47bc"]),
        ),
        ("placement_order", serde_json::json!([0, 2, 4, 5])),
        ("byte_targets", serde_json::json!([3, 2, 1, 0])),
        ("byte_width", Value::from(300.0)),
        ("byte_height", Value::from(72.0)),
        ("byte_gap", Value::from(20.0)),
        ("empty_byte_color", Value::from("#37474f")),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(RegisterPackingDetailed::from_config(cfg.clone())?))
}

pub struct RegisterPackingDetailed {
    cfg: Config,
    theme: Theme,
    symbols: Vec<String>,
    patterns: Vec<String>,
    symbol_colors: Vec<Rgba8>,
    placement_order: Vec<usize>,
    byte_targets: Vec<usize>,
    byte_width: f64,
    byte_height: f64,
    byte_gap: f64,
    empty_byte_color: Rgba8,
}

const REGISTER_Y: f64 = 380.0;
const LEGEND_X: f64 = 1620.0;
const EXPL_Y: f64 = 960.0;
const LOW_BYTE: usize = 3;

impl RegisterPackingDetailed {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        let symbols = cfg.get_str_list("symbols")?;
        let patterns = cfg.get_str_list("patterns")?;
        let symbol_colors = cfg
            .get_str_list("symbol_colors")?
            .iter()
            .map(|s| {
                Rgba8::from_hex(s).map_err(|_| {
                    AsmvizError::config("option 'symbol_colors' must be a list of hex colors")
                })
            })
            .collect::<AsmvizResult<Vec<_>>>()?;
        if patterns.len() != symbols.len() || symbol_colors.len() != symbols.len() {
            return Err(AsmvizError::config(
                "options 'symbols', 'patterns' and 'symbol_colors' must have equal lengths",
            ));
        }
        let placement_order = cfg.get_usize_list("placement_order")?;
        let byte_targets = cfg.get_usize_list("byte_targets")?;
        if byte_targets.len() != placement_order.len() {
            return Err(AsmvizError::config(format!(
                "option 'byte_targets' has {} entries but 'placement_order' has {}",
                byte_targets.len(),
                placement_order.len()
            )));
        }
        if placement_order.len() > 4 {
            return Err(AsmvizError::config(
                "option 'placement_order' cannot place more than 4 symbols in a 32-bit register",
            ));
        }
        if let Some(bad) = placement_order.iter().find(|&&i| i >= symbols.len()) {
            return Err(AsmvizError::config(format!(
                "option 'placement_order' entry {bad} is not a legend row"
            )));
        }
        if let Some(bad) = byte_targets.iter().find(|&&b| b >= 4) {
            return Err(AsmvizError::config(format!(
                "option 'byte_targets' entry {bad} is not a byte of a 32-bit register"
            )));
        }
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            symbols,
            patterns,
            symbol_colors,
            placement_order,
            byte_targets,
            byte_width: cfg.get_f64("byte_width")?,
            byte_height: cfg.get_f64("byte_height")?,
            byte_gap: cfg.get_f64("byte_gap")?,
            empty_byte_color: cfg.get_color("empty_byte_color")?,
            cfg,
        })
    }

    /// Center of visual byte slot `index`, slot 0 leftmost (byte 3 of the
    /// register, since x86 diagrams draw the high byte first).
    fn byte_pos(&self, index: usize) -> Vec2 {
        let pitch = self.byte_width + self.byte_gap;
        let left = (LOGICAL_WIDTH - 260.0) / 2.0 - 1.5 * pitch;
        Vec2::new(left + index as f64 * pitch, REGISTER_Y)
    }

    fn legend_lines(&self) -> Vec<String> {
        self.symbols
            .iter()
            .zip(&self.patterns)
            .map(|(sym, pat)| format!("{sym:<12}{pat}"))
            .collect()
    }

    /// Byte slot colors after `steps_done` place-and-shift rounds. Each
    /// `rorl $8` moves every placed byte one slot toward the high end.
    fn byte_colors_after(&self, steps_done: usize) -> [Rgba8; 4] {
        let mut colors = [self.empty_byte_color; 4];
        for (age, &sym_idx) in self.placement_order[..steps_done].iter().rev().enumerate() {
            // The byte placed `age` shifts ago sits `age` slots above the low byte.
            if age < 4 {
                colors[LOW_BYTE - age] = self.symbol_colors[sym_idx];
            }
        }
        colors
    }
}

impl Animation for RegisterPackingDetailed {
    fn name(&self) -> &'static str {
        "register_packing_detailed"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps =
            theme.title_steps("title", "Packing the Combination into One 32-bit Register");

        steps.push(theme.label(
            "reg_label",
            "32-bit Register (%ebx)",
            Vec2::new(self.byte_pos(1).x + (self.byte_width + self.byte_gap) / 2.0, REGISTER_Y - 110.0),
            28.0,
        ));
        for i in 0..4 {
            steps.push(Step::instant(Action::Spawn {
                id: format!("byte_{i}"),
                entity: Entity::new(
                    self.byte_pos(i),
                    self.empty_byte_color,
                    EntityKind::Shape {
                        shape: ShapeKind::Rect,
                        size: Vec2::new(self.byte_width, self.byte_height),
                    },
                ),
            }));
            steps.push(theme.label(
                &format!("byte_label_{i}"),
                &format!("Byte {}", 3 - i),
                Vec2::new(self.byte_pos(i).x, REGISTER_Y + 74.0),
                22.0,
            ));
        }

        steps.push(Step::new(
            Action::Spawn {
                id: "legend".to_string(),
                entity: Entity::new(
                    Vec2::new(LEGEND_X, 420.0),
                    theme.text,
                    EntityKind::CodeBlock {
                        lines: self.legend_lines(),
                        highlighted: None,
                        font_size: 22.0,
                        highlight_color: theme.highlight,
                    },
                ),
            },
            1.0,
        ));
        steps.push(theme.label(
            "legend_title",
            "Symbol Encoding",
            Vec2::new(LEGEND_X, 320.0),
            26.0,
        ));
        steps.push(theme.label(
            "expl",
            "Initial mask: all positions ready",
            Vec2::new(LOGICAL_WIDTH / 2.0, EXPL_Y),
            26.0,
        ));
        steps.push(Step::wait(theme.wait_time));
        steps
    }

    fn body(&self) -> Vec<Step> {
        let mut steps = Vec::new();

        for (round, (&sym_idx, &target_byte)) in self
            .placement_order
            .iter()
            .zip(&self.byte_targets)
            .enumerate()
        {
            steps.push(Step::new(
                Action::HighlightLine {
                    id: "legend".to_string(),
                    line: Some(sym_idx),
                },
                0.5,
            ));
            steps.push(Step::instant(Action::SetText {
                id: "expl".to_string(),
                text: format!("Step {}: rorb %cl, %bl - rotate low byte to place bit", round + 1),
            }));

            // The incoming byte appears under its eventual home slot, then
            // slides into the low byte where rorb actually lands it.
            let home = self.byte_pos(target_byte);
            let low = self.byte_pos(LOW_BYTE);
            steps.push(Step::instant(Action::Spawn {
                id: "incoming".to_string(),
                entity: Entity::new(
                    Vec2::new(home.x, home.y + 220.0),
                    self.symbol_colors[sym_idx],
                    EntityKind::Shape {
                        shape: ShapeKind::Rect,
                        size: Vec2::new(self.byte_width, self.byte_height),
                    },
                ),
            }));
            steps.push(self.theme.label(
                "incoming_label",
                &self.symbols[sym_idx],
                Vec2::new(home.x, home.y + 290.0),
                22.0,
            ));
            steps.push(Step::eased(
                Action::MoveTo {
                    id: "incoming".to_string(),
                    to: low,
                },
                1.2,
                Ease::InOutCubic,
            ));
            steps.push(Step::instant(Action::Remove {
                id: "incoming".to_string(),
            }));
            steps.push(Step::instant(Action::Remove {
                id: "incoming_label".to_string(),
            }));
            steps.push(Step::new(
                Action::SetColor {
                    id: format!("byte_{LOW_BYTE}"),
                    color: self.symbol_colors[sym_idx],
                },
                0.4,
            ));

            steps.push(Step::instant(Action::SetText {
                id: "expl".to_string(),
                text: "rorl $8, %ebx - shift everything left by 8 bits".to_string(),
            }));
            // The rotate moves every placed byte one slot toward the high end.
            let after = self.byte_colors_after(round + 1);
            for (i, color) in after.into_iter().enumerate() {
                steps.push(Step::new(
                    Action::SetColor {
                        id: format!("byte_{i}"),
                        color,
                    },
                    if i == 0 { 1.0 } else { 0.0 },
                ));
            }

            steps.push(Step::instant(Action::HighlightLine {
                id: "legend".to_string(),
                line: None,
            }));
            steps.push(Step::wait(0.4));
        }
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        vec![
            Step::instant(Action::SetText {
                id: "expl".to_string(),
                text: "Full 4-symbol combination packed in one register!".to_string(),
            }),
            Step::instant(Action::SetColor {
                id: "expl".to_string(),
                color: self.theme.success,
            }),
            Step::wait(3.0),
            self.theme.fade_out("title"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> AsmvizResult<RegisterPackingDetailed> {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides)?;
        RegisterPackingDetailed::from_config(cfg)
    }

    #[test]
    fn four_rounds_place_four_bytes() {
        let a = anim(ConfigMap::new()).unwrap();
        let body = a.body();
        let placements = body
            .iter()
            .filter(|s| matches!(&s.action, Action::Spawn { id, .. } if id == "incoming"))
            .count();
        assert_eq!(placements, 4);
    }

    #[test]
    fn shift_moves_placed_bytes_toward_the_high_end() {
        let a = anim(ConfigMap::new()).unwrap();
        let first = a.symbol_colors[a.placement_order[0]];
        let empty = a.empty_byte_color;

        // After one round the first symbol sits in the low byte.
        assert_eq!(a.byte_colors_after(1), [empty, empty, empty, first]);
        // Three rounds later it has been shifted up to the high byte.
        assert_eq!(a.byte_colors_after(4)[0], first);
    }

    #[test]
    fn legend_rows_pair_symbol_and_pattern() {
        let a = anim(ConfigMap::new()).unwrap();
        let lines = a.legend_lines();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("SKOCKO (1)"));
        assert!(lines[0].ends_with("10000000"));
    }

    #[test]
    fn mismatched_legend_tables_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("patterns".to_string(), serde_json::json!(["10000000"]));
        assert!(anim(overrides).is_err());
    }

    #[test]
    fn more_than_four_placements_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert(
            "placement_order".to_string(),
            serde_json::json!([0, 1, 2, 3, 4]),
        );
        overrides.insert(
            "byte_targets".to_string(),
            serde_json::json!([3, 2, 1, 0, 0]),
        );
        assert!(anim(overrides).is_err());
    }

    #[test]
    fn lifecycle_is_scene_consistent() {
        let a = anim(ConfigMap::new()).unwrap();
        crate::animation::base::Script::assemble(&a)
            .unwrap()
            .into_timeline()
            .unwrap();
    }
}
