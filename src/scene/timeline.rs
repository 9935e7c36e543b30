use crate::{
    foundation::{
        core::Rgba8,
        error::{AsmvizError, AsmvizResult},
    },
    scene::{model::Scene, step::Step},
};

/// One step with its absolute start time on the timeline.
#[derive(Clone, Debug)]
pub struct Cue {
    pub start_secs: f64,
    pub step: Step,
}

/// The choreographed, validated sequence of scene mutations for one run.
///
/// Built once per render from a variant's lifecycle output. Building
/// dry-runs every action against a scratch scene so a step referencing an
/// entity its setup never created fails here, before any frame is produced.
#[derive(Clone, Debug)]
pub struct Timeline {
    background: Rgba8,
    cues: Vec<Cue>,
    total_secs: f64,
}

impl Timeline {
    pub fn build(background: Rgba8, steps: Vec<Step>) -> AsmvizResult<Self> {
        let mut scratch = Scene::new(background);
        let mut cues = Vec::with_capacity(steps.len());
        let mut clock = 0.0f64;

        for (index, step) in steps.into_iter().enumerate() {
            if !step.duration_secs.is_finite() || step.duration_secs < 0.0 {
                return Err(AsmvizError::scene(format!(
                    "step #{index} has a non-finite or negative duration"
                )));
            }

            scratch.apply(&step.action, 1.0).map_err(|e| {
                AsmvizError::scene(format!("step #{index} is not consistent: {e}"))
            })?;

            cues.push(Cue {
                start_secs: clock,
                step,
            });
            clock += cues[cues.len() - 1].step.duration_secs;
        }

        Ok(Self {
            background,
            cues,
            total_secs: clock,
        })
    }

    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Scene state at `t` seconds, rebuilt from scratch.
    ///
    /// Discrete actions take effect at their cue start; continuous actions
    /// interpolate across the cue with the step's ease. Times past the end
    /// clamp to the final state.
    pub fn scene_at(&self, t: f64) -> AsmvizResult<Scene> {
        let mut scene = Scene::new(self.background);
        for cue in &self.cues {
            if cue.start_secs > t {
                break;
            }

            let progress = if !cue.step.action.is_continuous() || cue.step.duration_secs == 0.0 {
                1.0
            } else {
                let raw = ((t - cue.start_secs) / cue.step.duration_secs).min(1.0);
                cue.step.ease.apply(raw)
            };
            scene.apply(&cue.step.action, progress)?;
        }
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        animation::ease::Ease,
        foundation::core::Vec2,
        scene::{
            model::{Entity, EntityKind},
            step::{Action, Step},
        },
    };

    fn bg() -> Rgba8 {
        Rgba8::opaque(26, 26, 26)
    }

    fn label(id: &str) -> Step {
        Step::instant(Action::Spawn {
            id: id.to_string(),
            entity: Entity::new(
                Vec2::new(0.0, 0.0),
                Rgba8::opaque(255, 255, 255),
                EntityKind::Label {
                    text: "hi".to_string(),
                    font_size: 36.0,
                },
            ),
        })
    }

    #[test]
    fn build_validates_order_sensitive_references() {
        let steps = vec![Step::instant(Action::FadeTo {
            id: "ghost".to_string(),
            opacity: 0.0,
        })];
        let err = Timeline::build(bg(), steps).unwrap_err();
        assert!(err.to_string().contains("step #0"));
    }

    #[test]
    fn starts_accumulate_durations() {
        let timeline = Timeline::build(
            bg(),
            vec![label("a"), Step::wait(1.5), Step::wait(0.5), label("b")],
        )
        .unwrap();
        let starts: Vec<f64> = timeline.cues().iter().map(|c| c.start_secs).collect();
        assert_eq!(starts, vec![0.0, 0.0, 1.5, 2.0]);
        assert_eq!(timeline.total_secs(), 2.0);
    }

    #[test]
    fn continuous_action_interpolates_and_clamps() {
        let timeline = Timeline::build(
            bg(),
            vec![
                label("a"),
                Step::eased(
                    Action::MoveTo {
                        id: "a".to_string(),
                        to: Vec2::new(200.0, 0.0),
                    },
                    2.0,
                    Ease::Linear,
                ),
            ],
        )
        .unwrap();

        assert_eq!(timeline.scene_at(0.0).unwrap().get("a").unwrap().pos.x, 0.0);
        assert_eq!(timeline.scene_at(1.0).unwrap().get("a").unwrap().pos.x, 100.0);
        assert_eq!(timeline.scene_at(5.0).unwrap().get("a").unwrap().pos.x, 200.0);
    }

    #[test]
    fn discrete_action_applies_at_cue_start() {
        let timeline = Timeline::build(
            bg(),
            vec![
                label("a"),
                Step::new(
                    Action::SetText {
                        id: "a".to_string(),
                        text: "done".to_string(),
                    },
                    1.0,
                ),
            ],
        )
        .unwrap();
        let scene = timeline.scene_at(0.01).unwrap();
        let EntityKind::Label { text, .. } = &scene.get("a").unwrap().kind else {
            panic!("not a label");
        };
        assert_eq!(text, "done");
    }

    #[test]
    fn replay_from_scratch_is_identical() {
        let timeline = Timeline::build(
            bg(),
            vec![
                label("a"),
                Step::eased(
                    Action::FadeTo {
                        id: "a".to_string(),
                        opacity: 0.25,
                    },
                    1.0,
                    Ease::InOutCubic,
                ),
            ],
        )
        .unwrap();
        let first = timeline.scene_at(0.4).unwrap();
        let second = timeline.scene_at(0.4).unwrap();
        assert_eq!(
            first.get("a").unwrap().opacity,
            second.get("a").unwrap().opacity
        );
    }
}
