//! Benchmark chart: the assembly solver's per-game time against the C
//! reference, drawn as two bars on a shared axis.

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
        ("assembly_time", Value::from(2.5)),
        ("c_time", Value::from(6.5)),
        ("max_time", Value::from(10.0)),
        ("bar_width", Value::from(180.0)),
        ("chart_height", Value::from(520.0)),
        ("assembly_color", Value::from("#4caf50")),
        ("c_color", Value::from("#ef5350")),
        ("axis_color", Value::from("#64b5f6")),
        (
            "optimization_note",
            Value::from("~2-2.5x faster from bit-packing and register operations"),
        ),
    ])
}

pub(crate) fn construct(cfg: &Config) -> AsmvizResult<Box<dyn Animation>> {
    Ok(Box::new(BenchmarkChart::from_config(cfg.clone())?))
}

pub struct BenchmarkChart {
    cfg: Config,
    theme: Theme,
    assembly_time: f64,
    c_time: f64,
    max_time: f64,
    bar_width: f64,
    chart_height: f64,
    assembly_color: Rgba8,
    c_color: Rgba8,
    axis_color: Rgba8,
    note: String,
}

const BASELINE_Y: f64 = 820.0;
const ASM_X: f64 = 760.0;
const C_X: f64 = 1160.0;

impl BenchmarkChart {
    pub fn from_config(cfg: Config) -> AsmvizResult<Self> {
        let assembly_time = cfg.get_f64("assembly_time")?;
        let c_time = cfg.get_f64("c_time")?;
        let max_time = cfg.get_f64("max_time")?;
        for (key, v) in [
            ("assembly_time", assembly_time),
            ("c_time", c_time),
            ("max_time", max_time),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(AsmvizError::config(format!(
                    "option '{key}' must be a positive number"
                )));
            }
        }
        if assembly_time > max_time || c_time > max_time {
            return Err(AsmvizError::config(
                "option 'max_time' must cover both measured times",
            ));
        }
        Ok(Self {
            theme: Theme::from_config(&cfg)?,
            assembly_time,
            c_time,
            max_time,
            bar_width: cfg.get_f64("bar_width")?,
            chart_height: cfg.get_f64("chart_height")?,
            assembly_color: cfg.get_color("assembly_color")?,
            c_color: cfg.get_color("c_color")?,
            axis_color: cfg.get_color("axis_color")?,
            note: cfg.get_str("optimization_note")?.to_string(),
            cfg,
        })
    }

    fn bar_height(&self, time: f64) -> f64 {
        time / self.max_time * self.chart_height
    }

    fn speedup(&self) -> f64 {
        self.c_time / self.assembly_time
    }

    /// Bars are anchored at their center; the baseline stays fixed while the
    /// bar grows upward.
    fn bar_entity(&self, x: f64, time: f64, color: Rgba8) -> Entity {
        let h = self.bar_height(time);
        Entity::new(
            Vec2::new(x, BASELINE_Y - h / 2.0),
            color,
            EntityKind::Shape {
                shape: ShapeKind::Bar,
                size: Vec2::new(self.bar_width, h),
            },
        )
        .with_opacity(0.0)
    }
}

impl Animation for BenchmarkChart {
    fn name(&self) -> &'static str {
        "benchmark_chart"
    }

    fn config(&self) -> &Config {
        &self.cfg
    }

    fn setup(&self) -> Vec<Step> {
        let theme = &self.theme;
        let mut steps = theme.title_steps("title", "Benchmark: Assembly vs C Performance");

        // Axes as two thin bars meeting at the chart origin.
        steps.push(Step::instant(Action::Spawn {
            id: "x_axis".to_string(),
            entity: Entity::new(
                Vec2::new((ASM_X + C_X) / 2.0, BASELINE_Y),
                self.axis_color,
                EntityKind::Shape {
                    shape: ShapeKind::Bar,
                    size: Vec2::new(C_X - ASM_X + 2.0 * self.bar_width, 4.0),
                },
            ),
        }));
        steps.push(Step::instant(Action::Spawn {
            id: "y_axis".to_string(),
            entity: Entity::new(
                Vec2::new(
                    ASM_X - self.bar_width,
                    BASELINE_Y - self.chart_height / 2.0,
                ),
                self.axis_color,
                EntityKind::Shape {
                    shape: ShapeKind::Bar,
                    size: Vec2::new(4.0, self.chart_height),
                },
            ),
        }));
        steps.push(theme.label(
            "x_label",
            "Implementation",
            Vec2::new((ASM_X + C_X) / 2.0, BASELINE_Y + 110.0),
            24.0,
        ));
        steps.push(theme.label(
            "y_label",
            "Time (ms)",
            Vec2::new(ASM_X - self.bar_width - 90.0, BASELINE_Y - self.chart_height),
            24.0,
        ));
        steps.push(Step::wait(theme.wait_time));
        steps
    }

    fn body(&self) -> Vec<Step> {
        let mut steps = Vec::new();

        for (tag, x, time, color) in [
            ("assembly", ASM_X, self.assembly_time, self.assembly_color),
            ("c", C_X, self.c_time, self.c_color),
        ] {
            steps.push(Step::instant(Action::Spawn {
                id: format!("{tag}_bar"),
                entity: self.bar_entity(x, time, color),
            }));
            steps.push(Step::eased(
                Action::FadeTo {
                    id: format!("{tag}_bar"),
                    opacity: 0.85,
                },
                1.0,
                Ease::OutQuad,
            ));

            let name = if tag == "assembly" { "Assembly" } else { "C" };
            let mut label = self.theme.label(
                format!("{tag}_label").as_str(),
                name,
                Vec2::new(x, BASELINE_Y + 44.0),
                24.0,
            );
            if let Action::Spawn { entity, .. } = &mut label.action {
                entity.color = color;
            }
            steps.push(label);
            steps.push(self.theme.label(
                format!("{tag}_value").as_str(),
                &format!("{time:.1} ms"),
                Vec2::new(x, BASELINE_Y - self.bar_height(time) / 2.0),
                20.0,
            ));
            steps.push(Step::wait(0.5));
        }

        let mut comparison = self.theme.caption(
            "comparison",
            &format!("Assembly is {:.1}x faster than C!", self.speedup()),
            980.0,
        );
        if let Action::Spawn { entity, .. } = &mut comparison.action {
            entity.color = Rgba8::opaque(0xff, 0xd7, 0x00);
        }
        comparison.duration_secs = 2.0;
        steps.push(comparison);
        steps.push(Step::wait(2.0));

        steps.push(Step::eased(
            Action::FadeTo {
                id: "comparison".to_string(),
                opacity: 0.0,
            },
            1.0,
            Ease::InQuad,
        ));
        steps.push(self.theme.caption("note", &self.note, 980.0));
        steps
    }

    fn teardown(&self) -> Vec<Step> {
        vec![Step::wait(2.0), self.theme.fade_out("title")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{global_defaults, resolve};

    fn anim(overrides: ConfigMap) -> AsmvizResult<BenchmarkChart> {
        let cfg = resolve(&global_defaults(), &defaults(), &overrides)?;
        BenchmarkChart::from_config(cfg)
    }

    #[test]
    fn bar_heights_scale_with_measured_times() {
        let a = anim(ConfigMap::new()).unwrap();
        assert_eq!(a.bar_height(a.max_time), a.chart_height);
        assert!(a.bar_height(a.assembly_time) < a.bar_height(a.c_time));
    }

    #[test]
    fn speedup_is_c_over_assembly() {
        let a = anim(ConfigMap::new()).unwrap();
        assert!((a.speedup() - 2.6).abs() < 1e-9);
    }

    #[test]
    fn bars_spawn_invisible_then_fade_in() {
        let a = anim(ConfigMap::new()).unwrap();
        let body = a.body();
        for tag in ["assembly_bar", "c_bar"] {
            let spawn = body
                .iter()
                .find_map(|s| match &s.action {
                    Action::Spawn { id, entity } if id == tag => Some(entity),
                    _ => None,
                })
                .unwrap();
            assert_eq!(spawn.opacity, 0.0);
            assert!(body.iter().any(
                |s| matches!(&s.action, Action::FadeTo { id, opacity } if id == tag && *opacity > 0.0)
            ));
        }
    }

    #[test]
    fn times_above_the_axis_range_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("c_time".to_string(), Value::from(12.0));
        assert!(anim(overrides).is_err());
    }

    #[test]
    fn non_positive_times_are_rejected() {
        let mut overrides = ConfigMap::new();
        overrides.insert("assembly_time".to_string(), Value::from(0.0));
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
