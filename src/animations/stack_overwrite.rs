//! Stack overwrite: pushing peg symbols onto a downward-growing stack for a
//! single `printf`, skipping the slots the format string does not touch.

use serde_json::Value;

use crate::{
    animation::{
        base::{Animation, Theme},
        ease::Ease,
    },
    config::{Config, ConfigMap, config_map},
    foundation::{
        core::{Rgba8, Vec2},
        error::{AsmvizError, AsmvizResult},
    },
    scene::{
        model::{Entity, EntityKind, ShapeKind},
        step::{Action, Step},
    },
};

pub(crate) fn defaults() -> ConfigMap {
    config_map([
        ("stack_slots", Value::from(15u64)),
        ("slot_width", Value::from(320.0)),
        ("slot_height", Value::from(44.0)),
        ("slot_gap", Value::from(8.0)),
        ("skip_slots", Value::from(3u64)),
        ("esp_color", Value::from("#ef5350")),
        (
            "symbols_to_push",
            serde_json::json!([
                {"name": "zuti", "color": "#ffd34d"},
                {"name": "crveni", "color": "#ef5350"},
                {"name": "plavi", "color": "#64b5f6"},
            ]),
        ),
        ("push_positions", serde_json::json!([5, 6, 7])),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(StackOverwrite::from_config(cfg.clone())?))
}

struct PushSymbol {
    name: String,
    color: Rgba8,
}

pub struct StackOverwrite {
    cfg: Config,
    theme: Theme,
    slots: usize,
    slot_width: f64,
    slot_height: f64,
    slot_gap: f64,
    skip_slots: usize,
    esp_color: Rgba8,
    symbols: Vec<PushSymbol>,
    push_positions: Vec<usize>,
}

const STACK_X: f64 = 680.0;
const STACK_TOP: f64 = 240.0;
const CODE_X: f64 = 1400.0;
const ESP_X_OFFSET: f64 = 260.0;

impl StackOverwrite {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        let slots = cfg.get_usize("stack_slots")?;
        if slots == 0 {
            return Err(AsmvizError::config("option 'stack_slots' must be at least 1"));
        }
        let symbols = parse_symbols(&cfg)?;
        let push_positions = cfg.get_usize_list("push_positions")?;
        if push_positions.len() != symbols.len() {
            return Err(AsmvizError::config(format!(
                "option 'push_positions' has {} entries but 'symbols_to_push' has {}",
                push_positions.len(),
                symbols.len()
            )));
        }
        if let Some(bad) = push_positions.iter().find(|&&p| p >= slots) {
            return Err(AsmvizError::config(format!(
                "option 'push_positions' entry {bad} is outside the {slots}-slot stack"
            )));
        }
        let skip_slots = cfg.get_usize("skip_slots")?;
        if skip_slots >= slots {
            return Err(AsmvizError::config(format!(
                "option 'skip_slots' ({skip_slots}) must be below 'stack_slots' ({slots})"
            )));
        }
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            slots,
            slot_width: cfg.get_f64("slot_width")?,
            slot_height: cfg.get_f64("slot_height")?,
            slot_gap: cfg.get_f64("slot_gap")?,
            skip_slots,
            esp_color: cfg.get_color("esp_color")?,
            symbols,
            push_positions,
            cfg,
        })
    }

    fn pitch(&self) -> f64 {
        self.slot_height + self.slot_gap
    }

    /// Center of stack slot `index`, slot 0 on top.
    fn slot_pos(&self, index: usize) -> Vec2 {
        Vec2::new(STACK_X, STACK_TOP + index as f64 * self.pitch())
    }

    fn esp_pos(&self, index: usize) -> Vec2 {
        let slot = self.slot_pos(index);
        Vec2::new(slot.x - ESP_X_OFFSET, slot.y)
    }

    fn code_lines(&self) -> Vec<String> {
        let mut lines = vec!["subl %eax, %esp     # skip empty slots".to_string()];
        for sym in &self.symbols {
            lines.push(format!("pushl $znak_{:<8}# push {} peg", sym.name, sym.name));
        }
        lines
    }
}

fn parse_symbols(cfg: &Config) -> AsmvizResult<Vec<PushSymbol>> {
    let bad = || AsmvizError::config(
        "option 'symbols_to_push' must be a list of {\"name\", \"color\"} objects",
    );
    let items = cfg.get("symbols_to_push")?.as_array().ok_or_else(bad)?;
    items
        .iter()
        .map(|item| {
            let obj = item.as_object().ok_or_else(bad)?;
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(bad)?
                .to_string();
            let color = obj
                .get("color")
                .and_then(Value::as_str)
                .ok_or_else(bad)
                .and_then(|s| Rgba8::from_hex(s).map_err(|_| bad()))?;
            Ok(PushSymbol { name, color })
        })
        .collect()
}

impl Animation for StackOverwrite {
    fn name(&self) -> &'static str {
        "stack_overwrite"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Stack Overwrite Execution");

        let slot_grey = Rgba8::opaque(0x9e, 0x9e, 0x9e);
        for i in 0..self.slots {
            steps.push(Step::instant(Action::Spawn {
                id: format!("slot_{i}"),
                entity: Entity::new(
                    self.slot_pos(i),
                    slot_grey,
                    EntityKind::Shape {
                        shape: ShapeKind::Rect,
                        size: Vec2::new(self.slot_width, self.slot_height),
                    },
                ),
            }));
            steps.push(Step::instant(Action::Spawn {
                id: format!("slot_label_{i}"),
                entity: Entity::new(
                    self.slot_pos(i),
                    slot_grey,
                    EntityKind::Label {
                        text: "empty".to_string(),
                        font_size: 20.0,
                    },
                ),
            }));
        }

        steps.push(Step::instant(Action::Spawn {
            id: "esp".to_string(),
            entity: Entity::new(
                self.esp_pos(0),
                self.esp_color,
                EntityKind::Shape {
                    shape: ShapeKind::Arrow,
                    size: Vec2::new(64.0, self.slot_height),
                },
            ),
        }));
        steps.push(theme.label("esp_label", "%esp", {
            let p = self.esp_pos(0);
            Vec2::new(p.x - 80.0, p.y)
        }, 26.0));

        steps.push(Step::new(
            Action::Spawn {
                id: "code".to_string(),
                entity: Entity::new(
                    Vec2::new(CODE_X, 420.0),
                    theme.text,
                    EntityKind::CodeBlock {
                        lines: self.code_lines(),
                        highlighted: None,
                        font_size: 24.0,
                        highlight_color: theme.highlight,
                    },
                ),
            },
            1.0,
        ));
        steps.push(Step::wait(theme.wait_time));
        steps
    }

    fn body(&self) -> Vec<Step> {
        let mut steps = Vec::new();

        // subl skips the untouched slots in one jump.
        steps.push(Step::new(
            Action::HighlightLine {
                id: "code".to_string(),
                line: Some(0),
            },
            0.8,
        ));
        let mut esp_at = self.skip_slots;
        steps.push(Step::eased(
            Action::MoveTo {
                id: "esp".to_string(),
                to: self.esp_pos(esp_at),
            },
            1.5,
            Ease::InOutQuad,
        ));
        steps.push(Step::instant(Action::MoveTo {
            id: "esp_label".to_string(),
            to: {
                let p = self.esp_pos(esp_at);
                Vec2::new(p.x - 80.0, p.y)
            },
        }));

        for (i, sym) in self.symbols.iter().enumerate() {
            steps.push(Step::new(
                Action::HighlightLine {
                    id: "code".to_string(),
                    line: Some(i + 1),
                },
                0.8,
            ));

            let slot = self.push_positions[i];
            steps.push(Step::instant(Action::SetText {
                id: format!("slot_label_{slot}"),
                text: format!("znak_{}", sym.name),
            }));
            steps.push(Step::instant(Action::SetColor {
                id: format!("slot_label_{slot}"),
                color: sym.color,
            }));
            steps.push(Step::new(
                Action::SetColor {
                    id: format!("slot_{slot}"),
                    color: sym.color,
                },
                0.8,
            ));

            // Each push moves %esp one slot up.
            esp_at = esp_at.saturating_sub(1);
            steps.push(Step::eased(
                Action::MoveTo {
                    id: "esp".to_string(),
                    to: self.esp_pos(esp_at),
                },
                0.5,
                Ease::OutQuad,
            ));
            steps.push(Step::instant(Action::MoveTo {
                id: "esp_label".to_string(),
                to: {
                    let p = self.esp_pos(esp_at);
                    Vec2::new(p.x - 80.0, p.y)
                },
            }));
        }
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        vec![
            self.theme
                .caption("final", "Only needed slots updated! Stack optimized.", 1000.0),
            Step::wait(2.0),
            self.theme.fade_out("title"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> AsmvizResult<StackOverwrite> {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides)?;
        StackOverwrite::from_config(cfg)
    }

    #[test]
    fn each_symbol_gets_one_slot_write_and_one_esp_move() {
        let a = anim(ConfigMap::new()).unwrap();
        let body = a.body();
        let writes = body
            .iter()
            .filter(|s| matches!(s.action, Action::SetText { .. }))
            .count();
        let esp_moves = body
            .iter()
            .filter(|s| matches!(&s.action, Action::MoveTo { id, .. } if id == "esp"))
            .count();
        assert_eq!(writes, 3);
        // One skip jump plus one per push.
        assert_eq!(esp_moves, 4);
    }

    #[test]
    fn mismatched_push_positions_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("push_positions".to_string(), serde_json::json!([5, 6]));
        let err = anim(overrides).map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("push_positions"));
    }

    #[test]
    fn out_of_range_push_position_is_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("push_positions".to_string(), serde_json::json!([5, 6, 40]));
        assert!(anim(overrides).is_err());
    }

    #[test]
    fn malformed_symbol_objects_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert(
            "symbols_to_push".to_string(),
            serde_json::json!([{"name": "zuti"}]),
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
