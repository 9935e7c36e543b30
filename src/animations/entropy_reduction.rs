//! Entropy reduction: the possibility grid shrinking guess by guess, with an
//! information bar tracking the remaining bits.

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
        (
            "remaining_counts",
            serde_json::json!([1296, 432, 144, 48, 12, 3, 1]),
        ),
        (
            "guess_descriptions",
            serde_json::json!([
                "Initial possibilities",
                "After first guess",
                "After second guess",
                "After third guess",
                "After fourth guess",
                "After fifth guess",
                "Solution found!"
            ]),
        ),
        ("grid_rows", Value::from(36u64)),
        ("grid_cols", Value::from(36u64)),
        ("dot_radius", Value::from(6.0)),
        ("dot_gap", Value::from(5.0)),
        ("bar_max_width", Value::from(900.0)),
        ("final_color", Value::from("#ffd700")),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(EntropyReduction::from_config(cfg.clone())?))
}

pub struct EntropyReduction {
    cfg: Config,
    theme: Theme,
    counts: Vec<u64>,
    descriptions: Vec<String>,
    rows: usize,
    cols: usize,
    dot_radius: f64,
    dot_gap: f64,
    bar_max_width: f64,
    final_color: Rgba8,
}

impl EntropyReduction {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        let counts = cfg.get_u64_list("remaining_counts")?;
        if counts.is_empty() {
            return Err(AsmvizError::config(
                "option 'remaining_counts' must not be empty",
            ));
        }
        if counts.windows(2).any(|w| w[1] > w[0]) {
            return Err(AsmvizError::config(
                "option 'remaining_counts' must be non-increasing",
            ));
        }
        let rows = cfg.get_usize("grid_rows")?;
        let cols = cfg.get_usize("grid_cols")?;
        if (counts[0] as usize) > rows * cols {
            return Err(AsmvizError::config(format!(
                "option 'remaining_counts' starts at {} which exceeds the {}x{} grid",
                counts[0], rows, cols
            )));
        }
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            counts,
            descriptions: cfg.get_str_list("guess_descriptions")?,
            rows,
            cols,
            dot_radius: cfg.get_f64("dot_radius")?,
            dot_gap: cfg.get_f64("dot_gap")?,
            bar_max_width: cfg.get_f64("bar_max_width")?,
            final_color: cfg.get_color("final_color")?,
            cfg,
        })
    }

    /// Remaining information in bits; by definition log2 of the count.
    fn bits(count: u64) -> f64 {
        (count.max(1) as f64).log2()
    }

    fn status_text(&self, index: usize) -> String {
        let count = self.counts[index];
        let bits = Self::bits(count);
        let desc = self
            .descriptions
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("After guess {index}"));
        if index == 0 {
            format!("Initial: {count} possibilities ≈ {bits:.2} bits")
        } else {
            format!("{desc}: {count} left ≈ {bits:.2} bits")
        }
    }

    fn bar_width(&self, index: usize) -> f64 {
        let full = Self::bits(self.counts[0]).max(1e-9);
        (Self::bits(self.counts[index]) / full * self.bar_max_width).max(12.0)
    }
}

impl Animation for EntropyReduction {
    fn name(&self) -> &'static str {
        "entropy_reduction"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Entropy Reduction in Mastermind");

        steps.push(theme.label(
            "status",
            &self.status_text(0),
            Vec2::new(LOGICAL_WIDTH / 2.0, 180.0),
            theme.font_size * 0.8,
        ));
        steps.push(Step::new(
            Action::Spawn {
                id: "grid".to_string(),
                entity: Entity::new(
                    Vec2::new(LOGICAL_WIDTH / 2.0, 530.0),
                    Rgba8::opaque(100, 181, 246),
                    EntityKind::DotGrid {
                        rows: self.rows,
                        cols: self.cols,
                        live: self.counts[0] as usize,
                        radius: self.dot_radius,
                        gap: self.dot_gap,
                    },
                ),
            },
            2.0,
        ));
        steps.push(Step::new(
            Action::Spawn {
                id: "entropy_bar".to_string(),
                entity: Entity::new(
                    Vec2::new(LOGICAL_WIDTH / 2.0, 930.0),
                    theme.success,
                    EntityKind::Shape {
                        shape: ShapeKind::Bar,
                        size: Vec2::new(self.bar_width(0), 42.0),
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

        // One reduction per guess: always counts.len() - 1 of them.
        for i in 1..self.counts.len() {
            steps.push(Step::instant(Action::SetText {
                id: "status".to_string(),
                text: self.status_text(i),
            }));
            steps.push(Step::instant(Action::SetLive {
                id: "grid".to_string(),
                live: self.counts[i] as usize,
            }));
            steps.push(Step::new(
                Action::Resize {
                    id: "entropy_bar".to_string(),
                    size: Vec2::new(self.bar_width(i), 42.0),
                },
                1.2,
            ));
            if self.counts[i] <= 1 {
                steps.push(Step::instant(Action::SetColor {
                    id: "entropy_bar".to_string(),
                    color: self.final_color,
                }));
            }
            steps.push(Step::wait(0.8));
        }
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        let mut final_caption = self.theme.caption("final", "Solved in ≤5 guesses (Knuth 1977)", 860.0);
        if let Action::Spawn { entity, .. } = &mut final_caption.action {
            entity.color = self.final_color;
        }
        vec![
            final_caption,
            Step::wait(3.0),
            self.theme.fade_out("title"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> EntropyReduction {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        EntropyReduction::from_config(cfg).unwrap()
    }

    fn reductions(steps: &[Step]) -> usize {
        steps
            .iter()
            .filter(|s| matches!(s.action, Action::SetLive { .. }))
            .count()
    }

    #[test]
    fn body_emits_len_minus_one_reductions() {
        let a = anim(ConfigMap::new());
        assert_eq!(reductions(&a.body()), 6);

        let mut overrides = ConfigMap::new();
        overrides.insert(
            "remaining_counts".to_string(),
            serde_json::json!([1296, 432, 144, 48, 12, 3, 1]),
        );
        let a = anim(overrides);
        assert_eq!(reductions(&a.body()), a.counts.len() - 1);
    }

    #[test]
    fn entropy_is_log2_of_the_count() {
        assert!((EntropyReduction::bits(1296) - 10.34).abs() < 0.01);
        assert_eq!(EntropyReduction::bits(1), 0.0);
    }

    #[test]
    fn increasing_counts_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert(
            "remaining_counts".to_string(),
            serde_json::json!([100, 200]),
        );
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        assert!(EntropyReduction::from_config(cfg).is_err());
    }

    #[test]
    fn counts_exceeding_the_grid_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("grid_rows".to_string(), serde_json::json!(10));
        overrides.insert("grid_cols".to_string(), serde_json::json!(10));
        let cfg = resolve(&global_defaults(), &defaults(), &overrides).unwrap();
        assert!(EntropyReduction::from_config(cfg).is_err());
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
