use crate::{
    config::Config,
    foundation::{
        core::{LOGICAL_WIDTH, Rgba8, Vec2},
        error::{AsmvizError, AsmvizResult},
    },
    scene::{
        model::{Entity, EntityKind},
        step::{Action, Step},
        timeline::Timeline,
    },
};

/// The lifecycle contract every animation variant implements.
///
/// A variant is constructed from a fully resolved [`Config`] (by the
/// registry) and then only ever asked to emit steps: `setup` establishes the
/// starting scene, `body` performs the variant-specific choreography, and
/// `teardown` closes the scene. The three phases always run in that order
/// and are concatenated by [`Script::assemble`].
pub trait Animation {
    fn name(&self) -> &'static str;
    fn config(&self) -> &Config;
    fn setup(&self) -> Vec<Step>;
    fn body(&self) -> Vec<Step>;
    fn teardown(&self) -> Vec<Step>;
}

/// Options every variant reads from the resolved configuration, parsed once
/// at construction so malformed values fail before any step is emitted.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub background: Rgba8,
    pub text: Rgba8,
    pub highlight: Rgba8,
    pub success: Rgba8,
    pub error: Rgba8,
    pub font_size: f64,
    pub wait_time: f64,
}

impl Theme {
    pub fn from_config(cfg: &Config) -> AsmvizResult<Self> {
        Ok(Self {
            background: cfg.get_color("background_color")?,
            text: cfg.get_color("text_color")?,
            highlight: cfg.get_color("highlight_color")?,
            success: cfg.get_color("success_color")?,
            error: cfg.get_color("error_color")?,
            font_size: cfg.get_f64("font_size")?,
            wait_time: cfg.get_f64("wait_time")?,
        })
    }

    /// Title banner at the top edge plus the default pacing pause.
    pub fn title_steps(&self, id: &str, text: &str) -> Vec<Step> {
        vec![
            Step::new(
                Action::Spawn {
                    id: id.to_string(),
                    entity: Entity::new(
                        Vec2::new(LOGICAL_WIDTH / 2.0, 80.0),
                        self.text,
                        EntityKind::Label {
                            text: text.to_string(),
                            font_size: self.font_size * 1.2,
                        },
                    ),
                },
                0.6,
            ),
            Step::wait(self.wait_time),
        ]
    }

    /// Closing caption in the success color near the bottom edge.
    pub fn caption(&self, id: &str, text: &str, y: f64) -> Step {
        Step::new(
            Action::Spawn {
                id: id.to_string(),
                entity: Entity::new(
                    Vec2::new(LOGICAL_WIDTH / 2.0, y),
                    self.success,
                    EntityKind::Label {
                        text: text.to_string(),
                        font_size: self.font_size * 0.85,
                    },
                ),
            },
            0.6,
        )
    }

    /// Plain label helper.
    pub fn label(&self, id: &str, text: &str, pos: Vec2, font_size: f64) -> Step {
        Step::new(
            Action::Spawn {
                id: id.to_string(),
                entity: Entity::new(
                    pos,
                    self.text,
                    EntityKind::Label {
                        text: text.to_string(),
                        font_size,
                    },
                ),
            },
            0.4,
        )
    }

    /// Fade-out used when a phase retires an element.
    pub fn fade_out(&self, id: &str) -> Step {
        Step::new(
            Action::FadeTo {
                id: id.to_string(),
                opacity: 0.0,
            },
            0.5,
        )
    }
}

/// The assembled, speed-scaled step sequence of one animation run.
pub struct Script {
    pub background: Rgba8,
    pub steps: Vec<Step>,
}

impl Script {
    /// Concatenate the lifecycle phases in order and apply the configured
    /// `animation_speed` (2.0 halves every duration).
    pub fn assemble(anim: &dyn Animation) -> AsmvizResult<Self> {
        let speed = anim.config().get_f64("animation_speed")?;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(AsmvizError::config(
                "option 'animation_speed' must be a finite number > 0",
            ));
        }
        let background = anim.config().get_color("background_color")?;

        let mut steps = anim.setup();
        steps.extend(anim.body());
        steps.extend(anim.teardown());
        for step in &mut steps {
            step.duration_secs /= speed;
        }

        Ok(Self { background, steps })
    }

    /// Validate the assembled steps into a renderable timeline.
    pub fn into_timeline(self) -> AsmvizResult<Timeline> {
        Timeline::build(self.background, self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigMap, global_defaults, resolve};

    struct TwoWaits(Config);

    impl Animation for TwoWaits {
        fn name(&self) -> &'static str {
            "two_waits"
        }
        fn config(&self) -> &Config {
            &self.0
        }
        fn setup(&self) -> Vec<Step> {
            vec![Step::wait(1.0)]
        }
        fn body(&self) -> Vec<Step> {
            vec![Step::wait(2.0)]
        }
        fn teardown(&self) -> Vec<Step> {
            Vec::new()
        }
    }

    #[test]
    fn assemble_preserves_phase_order_and_scales_speed() {
        let mut overrides = ConfigMap::new();
        overrides.insert("animation_speed".to_string(), serde_json::json!(2.0));
        let cfg = resolve(&global_defaults(), &ConfigMap::new(), &overrides).unwrap();

        let script = Script::assemble(&TwoWaits(cfg)).unwrap();
        let durations: Vec<f64> = script.steps.iter().map(|s| s.duration_secs).collect();
        assert_eq!(durations, vec![0.5, 1.0]);
    }

    #[test]
    fn assemble_rejects_non_positive_speed() {
        let mut overrides = ConfigMap::new();
        overrides.insert("animation_speed".to_string(), serde_json::json!(0.0));
        let cfg = resolve(&global_defaults(), &ConfigMap::new(), &overrides).unwrap();
        assert!(Script::assemble(&TwoWaits(cfg)).is_err());
    }
}
