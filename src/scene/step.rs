use crate::{
    animation::ease::Ease,
    foundation::core::{Rgba8, Vec2},
    scene::model::Entity,
};

/// One atomic, ordered scene transformation with its own pacing.
///
/// Steps are plain data interpreted by the timeline driver; a variant's
/// construct logic produces them in program order and they are never
/// re-ordered afterwards.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Step {
    pub action: Action,
    /// Wall-clock duration of this step in seconds (before speed scaling).
    pub duration_secs: f64,
    /// Ease applied to continuous actions across the step duration.
    pub ease: Ease,
}

impl Step {
    pub fn new(action: Action, duration_secs: f64) -> Self {
        Self {
            action,
            duration_secs: duration_secs.max(0.0),
            ease: Ease::Linear,
        }
    }

    /// A step that takes effect immediately and consumes no timeline time.
    pub fn instant(action: Action) -> Self {
        Self::new(action, 0.0)
    }

    pub fn eased(action: Action, duration_secs: f64, ease: Ease) -> Self {
        Self {
            action,
            duration_secs: duration_secs.max(0.0),
            ease,
        }
    }

    /// A pure pacing pause.
    pub fn wait(duration_secs: f64) -> Self {
        Self::new(Action::Wait, duration_secs)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Action {
    /// Add a new entity under `id`. Fails if the id is already live.
    Spawn { id: String, entity: Entity },
    /// Drop an entity from the scene.
    Remove { id: String },
    /// Replace a register's displayed value.
    SetRegister { id: String, value: u32 },
    /// Replace a counter's displayed value.
    SetCounter { id: String, value: i64 },
    /// Replace the text of a label.
    SetText { id: String, text: String },
    /// Move the highlight of a code block (`None` clears it).
    HighlightLine { id: String, line: Option<usize> },
    /// Recolor an entity, lerped across the step duration.
    SetColor { id: String, color: Rgba8 },
    /// Move an entity, lerped across the step duration.
    MoveTo { id: String, to: Vec2 },
    /// Fade an entity's opacity, lerped across the step duration.
    FadeTo { id: String, opacity: f64 },
    /// Shrink or grow the live dot count of a dot grid.
    SetLive { id: String, live: usize },
    /// Resize a shape, lerped across the step duration.
    Resize { id: String, size: Vec2 },
    /// Do nothing; pacing only.
    Wait,
}

impl Action {
    /// Entity id this action mutates, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Spawn { id, .. }
            | Self::Remove { id }
            | Self::SetRegister { id, .. }
            | Self::SetCounter { id, .. }
            | Self::SetText { id, .. }
            | Self::HighlightLine { id, .. }
            | Self::SetColor { id, .. }
            | Self::MoveTo { id, .. }
            | Self::FadeTo { id, .. }
            | Self::SetLive { id, .. }
            | Self::Resize { id, .. } => Some(id),
            Self::Wait => None,
        }
    }

    /// Continuous actions interpolate across their step; discrete ones take
    /// effect at the cue start.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Self::SetColor { .. } | Self::MoveTo { .. } | Self::FadeTo { .. } | Self::Resize { .. }
        )
    }
}
