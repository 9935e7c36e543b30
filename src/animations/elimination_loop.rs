//! Candidate elimination loop: walk the candidate array, call the histogram
//! routine, keep or eliminate each entry.

use serde_json::Value;

use crate::{
    animation::base::{Animation, Theme},
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
        ("num_candidates", Value::from(10u64)),
        ("candidates_to_keep", serde_json::json!([0, 2, 4, 6, 8])),
        ("slot_width", Value::from(120.0)),
        ("slot_height", Value::from(64.0)),
        ("slot_gap", Value::from(24.0)),
        ("register_color", Value::from("#64b5f6")),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(EliminationLoop::from_config(cfg.clone())?))
}

const CODE_LINES: [&str; 7] = [
    "movl sve_kombinacije(,%ecx,4), %ebx",
    "call histogram",
    "cmpl crveni, %esi",
    "jne skip",
    "movl %ebx, rezultat(,%edx,4)",
    "incl %edx",
    "skip:",
];

pub struct EliminationLoop {
    cfg: Config,
    theme: Theme,
    num_candidates: usize,
    keep: Vec<usize>,
    slot_width: f64,
    slot_height: f64,
    slot_gap: f64,
    register_color: Rgba8,
}

impl EliminationLoop {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        let num_candidates = cfg.get_usize("num_candidates")?;
        if num_candidates == 0 {
            return Err(AsmvizError::config(
                "option 'num_candidates' must be at least 1",
            ));
        }
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            num_candidates,
            keep: cfg.get_usize_list("candidates_to_keep")?,
            slot_width: cfg.get_f64("slot_width")?,
            slot_height: cfg.get_f64("slot_height")?,
            slot_gap: cfg.get_f64("slot_gap")?,
            register_color: cfg.get_color("register_color")?,
            cfg,
        })
    }

    fn slot_pos(&self, index: usize) -> Vec2 {
        let pitch = self.slot_width + self.slot_gap;
        let row_width = pitch * self.num_candidates as f64 - self.slot_gap;
        let x0 = (LOGICAL_WIDTH - 560.0 - row_width) / 2.0 + self.slot_width / 2.0;
        Vec2::new(x0 + pitch * index as f64, 300.0)
    }

    fn kept_count(&self) -> usize {
        self.keep.iter().filter(|&&k| k < self.num_candidates).count()
    }
}

impl Animation for EliminationLoop {
    fn name(&self) -> &'static str {
        "elimination_loop"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Elimination Loop Execution");

        steps.push(theme.label(
            "memory_label",
            "Memory array (candidates)",
            Vec2::new((LOGICAL_WIDTH - 560.0) / 2.0, 210.0),
            theme.font_size * 0.7,
        ));
        for i in 0..self.num_candidates {
            steps.push(Step::instant(Action::Spawn {
                id: format!("mem_{i}"),
                entity: Entity::new(
                    self.slot_pos(i),
                    Rgba8::opaque(120, 120, 120),
                    EntityKind::Shape {
                        shape: ShapeKind::Rect,
                        size: Vec2::new(self.slot_width, self.slot_height),
                    },
                ),
            }));
        }

        steps.push(Step::new(
            Action::Spawn {
                id: "ebx".to_string(),
                entity: Entity::new(
                    Vec2::new(600.0, 620.0),
                    self.register_color,
                    EntityKind::Register {
                        label: "%ebx".to_string(),
                        value: 0,
                        width: 420.0,
                        height: 90.0,
                    },
                ),
            },
            0.4,
        ));
        steps.push(Step::new(
            Action::Spawn {
                id: "ecx".to_string(),
                entity: Entity::new(
                    Vec2::new(600.0, 830.0),
                    theme.text,
                    EntityKind::Counter {
                        label: "%ecx (index)".to_string(),
                        value: 0,
                        font_size: theme.font_size,
                    },
                ),
            },
            0.4,
        ));
        steps.push(Step::new(
            Action::Spawn {
                id: "code".to_string(),
                entity: Entity::new(
                    Vec2::new(LOGICAL_WIDTH - 540.0, 300.0),
                    theme.text,
                    EntityKind::CodeBlock {
                        lines: CODE_LINES.iter().map(|s| s.to_string()).collect(),
                        highlighted: None,
                        font_size: 24.0,
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
        let theme = &self.theme;
        let mut steps = Vec::new();
        let highlight = |line: usize, secs: f64| {
            Step::new(
                Action::HighlightLine {
                    id: "code".to_string(),
                    line: Some(line),
                },
                secs,
            )
        };

        for i in 0..self.num_candidates {
            // movl: load the candidate into %ebx.
            steps.push(highlight(0, 0.5));
            steps.push(Step::new(
                Action::SetRegister {
                    id: "ebx".to_string(),
                    value: (i as u32).wrapping_mul(0x1111_1111),
                },
                0.5,
            ));

            // call histogram: flash the callee name.
            steps.push(highlight(1, 0.5));
            steps.push(theme.label(
                &format!("hist_{i}"),
                "histogram()",
                Vec2::new(170.0, 480.0),
                theme.font_size * 0.7,
            ));
            steps.push(Step::new(
                Action::FadeTo {
                    id: format!("hist_{i}"),
                    opacity: 0.0,
                },
                0.3,
            ));
            steps.push(Step::instant(Action::Remove {
                id: format!("hist_{i}"),
            }));

            // cmpl: the feedback decides the branch.
            steps.push(highlight(2, 0.5));
            if self.keep.contains(&i) {
                steps.push(highlight(4, 0.3));
                steps.push(highlight(5, 0.3));
                steps.push(Step::new(
                    Action::SetColor {
                        id: format!("mem_{i}"),
                        color: theme.success,
                    },
                    0.5,
                ));
            } else {
                steps.push(highlight(3, 0.3));
                steps.push(Step::new(
                    Action::FadeTo {
                        id: format!("mem_{i}"),
                        opacity: 0.0,
                    },
                    0.8,
                ));
            }

            steps.push(Step::new(
                Action::SetCounter {
                    id: "ecx".to_string(),
                    value: (i + 1) as i64,
                },
                0.3,
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
            self.theme.caption(
                "done",
                &format!(
                    "Elimination complete! {} candidates remaining",
                    self.kept_count()
                ),
                980.0,
            ),
            Step::wait(2.0),
            self.theme.fade_out("title"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> EliminationLoop {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        EliminationLoop::from_config(cfg).unwrap()
    }

    #[test]
    fn each_candidate_gets_a_load_and_a_counter_update() {
        let a = anim(ConfigMap::new());
        let body = a.body();
        let loads = body
            .iter()
            .filter(|s| matches!(s.action, Action::SetRegister { .. }))
            .count();
        let counts = body
            .iter()
            .filter(|s| matches!(s.action, Action::SetCounter { .. }))
            .count();
        assert_eq!(loads, 10);
        assert_eq!(counts, 10);
    }

    #[test]
    fn kept_count_ignores_out_of_range_indices() {
        let mut overrides = ConfigMap::new();
        overrides.insert("num_candidates".to_string(), serde_json::json!(3));
        overrides.insert(
            "candidates_to_keep".to_string(),
            serde_json::json!([0, 2, 9]),
        );
        assert_eq!(anim(overrides).kept_count(), 2);
    }

    #[test]
    fn zero_candidates_is_a_config_error() {
        let mut overrides = ConfigMap::new();
        overrides.insert("num_candidates".to_string(), serde_json::json!(0));
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        assert!(EliminationLoop::from_config(cfg).is_err());
    }

    #[test]
    fn lifecycle_is_scene_consistent() {
        let a = anim(ConfigMap::new());
        crate::animation::base::Script::assemble(&a)
            .unwrap()
            .into_timeline()
            .unwrap();
    }
}
