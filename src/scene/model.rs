use std::collections::BTreeMap;

use crate::{
    animation::ease::Lerp,
    foundation::{
        core::{Rgba8, Vec2},
        error::{AsmvizError, AsmvizResult},
    },
    scene::step::Action,
};

/// One on-canvas object. `pos` is the entity's anchor in the logical
/// 1920x1080 plane; what the anchor means (center, top-left, baseline) is up
/// to the kind's rasterization.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Entity {
    pub pos: Vec2,
    pub color: Rgba8,
    pub opacity: f64,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(pos: Vec2, color: Rgba8, kind: EntityKind) -> Self {
        Self {
            pos,
            color,
            opacity: 1.0,
            kind,
        }
    }

    /// Spawn at a non-default opacity, for entities that fade in.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum EntityKind {
    /// CPU register box with a name above and a hex value readout inside.
    Register {
        label: String,
        value: u32,
        width: f64,
        height: f64,
    },
    /// Monospace code listing with at most one highlighted line.
    CodeBlock {
        lines: Vec<String>,
        highlighted: Option<usize>,
        font_size: f64,
        highlight_color: Rgba8,
    },
    /// Numeric readout with a small caption underneath.
    Counter {
        label: String,
        value: i64,
        font_size: f64,
    },
    /// Free-standing text.
    Label { text: String, font_size: f64 },
    /// Filled primitive.
    Shape { shape: ShapeKind, size: Vec2 },
    /// Grid of dots of which the first `live` are drawn; used for the
    /// possibility-space visualization.
    DotGrid {
        rows: usize,
        cols: usize,
        live: usize,
        radius: f64,
        gap: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    /// Outlined box with a translucent fill.
    Rect,
    /// Solid filled box.
    Bar,
    /// Filled circle (`size.x` is the diameter).
    Dot,
    /// Solid triangle pointing along +x; used for the stack pointer.
    Arrow,
}

/// The mutable canvas owned by one timeline evaluation.
///
/// Never shared between animation instances; replay rebuilds a fresh scene
/// instead of rewinding mutated entities.
#[derive(Clone, Debug)]
pub struct Scene {
    pub background: Rgba8,
    entities: BTreeMap<String, Entity>,
}

impl Scene {
    pub fn new(background: Rgba8) -> Self {
        Self {
            background,
            entities: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&String, &Entity)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Apply one action. `progress` is the eased fraction of the owning step
    /// that has elapsed; discrete actions ignore it, continuous actions lerp
    /// from the entity's current state toward the target.
    pub fn apply(&mut self, action: &Action, progress: f64) -> AsmvizResult<()> {
        match action {
            Action::Wait => Ok(()),

            Action::Spawn { id, entity } => {
                if self.entities.contains_key(id) {
                    return Err(AsmvizError::scene(format!(
                        "spawn of '{id}' but that entity is already live"
                    )));
                }
                self.entities.insert(id.clone(), entity.clone());
                Ok(())
            }

            Action::Remove { id } => {
                self.entities
                    .remove(id)
                    .map(|_| ())
                    .ok_or_else(|| missing(id, "remove"))
            }

            Action::SetRegister { id, value } => {
                let entity = self.entity_mut(id, "set register value")?;
                let EntityKind::Register { value: current, .. } = &mut entity.kind else {
                    return Err(kind_mismatch(id, "a register"));
                };
                *current = *value;
                Ok(())
            }

            Action::SetCounter { id, value } => {
                let entity = self.entity_mut(id, "set counter value")?;
                let EntityKind::Counter { value: current, .. } = &mut entity.kind else {
                    return Err(kind_mismatch(id, "a counter"));
                };
                *current = *value;
                Ok(())
            }

            Action::SetText { id, text } => {
                let entity = self.entity_mut(id, "set text")?;
                let EntityKind::Label { text: current, .. } = &mut entity.kind else {
                    return Err(kind_mismatch(id, "a label"));
                };
                *current = text.clone();
                Ok(())
            }

            Action::HighlightLine { id, line } => {
                let entity = self.entity_mut(id, "highlight line")?;
                let EntityKind::CodeBlock {
                    lines, highlighted, ..
                } = &mut entity.kind
                else {
                    return Err(kind_mismatch(id, "a code block"));
                };
                if let Some(n) = line
                    && *n >= lines.len()
                {
                    return Err(AsmvizError::scene(format!(
                        "highlight of line {n} in '{id}' which has only {} lines",
                        lines.len()
                    )));
                }
                *highlighted = *line;
                Ok(())
            }

            Action::SetColor { id, color } => {
                let entity = self.entity_mut(id, "set color")?;
                entity.color = Lerp::lerp(&entity.color, color, progress);
                Ok(())
            }

            Action::MoveTo { id, to } => {
                let entity = self.entity_mut(id, "move")?;
                entity.pos = Lerp::lerp(&entity.pos, to, progress);
                Ok(())
            }

            Action::FadeTo { id, opacity } => {
                let entity = self.entity_mut(id, "fade")?;
                entity.opacity = Lerp::lerp(&entity.opacity, opacity, progress).clamp(0.0, 1.0);
                Ok(())
            }

            Action::SetLive { id, live } => {
                let entity = self.entity_mut(id, "set live dots")?;
                let EntityKind::DotGrid {
                    rows, cols, live: current, ..
                } = &mut entity.kind
                else {
                    return Err(kind_mismatch(id, "a dot grid"));
                };
                if *live > *rows * *cols {
                    return Err(AsmvizError::scene(format!(
                        "dot grid '{id}' cannot hold {live} live dots ({rows}x{cols})"
                    )));
                }
                *current = *live;
                Ok(())
            }

            Action::Resize { id, size } => {
                let entity = self.entity_mut(id, "resize")?;
                let EntityKind::Shape { size: current, .. } = &mut entity.kind else {
                    return Err(kind_mismatch(id, "a shape"));
                };
                *current = Lerp::lerp(current, size, progress);
                Ok(())
            }
        }
    }

    fn entity_mut(&mut self, id: &str, what: &str) -> AsmvizResult<&mut Entity> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| missing(id, what))
    }
}

fn missing(id: &str, what: &str) -> AsmvizError {
    AsmvizError::scene(format!("{what} of '{id}' but no such entity is in the scene"))
}

fn kind_mismatch(id: &str, expected: &str) -> AsmvizError {
    AsmvizError::scene(format!("entity '{id}' is not {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(value: u32) -> Entity {
        Entity::new(
            Vec2::new(0.0, 0.0),
            Rgba8::opaque(80, 140, 255),
            EntityKind::Register {
                label: "%ebx".to_string(),
                value,
                width: 400.0,
                height: 90.0,
            },
        )
    }

    #[test]
    fn spawn_then_mutate_round_trips() {
        let mut scene = Scene::new(Rgba8::opaque(26, 26, 26));
        scene
            .apply(
                &Action::Spawn {
                    id: "ebx".to_string(),
                    entity: register(0x8080_8080),
                },
                1.0,
            )
            .unwrap();
        scene
            .apply(
                &Action::SetRegister {
                    id: "ebx".to_string(),
                    value: 0x1234_5678,
                },
                1.0,
            )
            .unwrap();

        let EntityKind::Register { value, .. } = scene.get("ebx").unwrap().kind else {
            panic!("not a register");
        };
        assert_eq!(value, 0x1234_5678);
    }

    #[test]
    fn duplicate_spawn_is_a_consistency_error() {
        let mut scene = Scene::new(Rgba8::opaque(0, 0, 0));
        let spawn = Action::Spawn {
            id: "ebx".to_string(),
            entity: register(0),
        };
        scene.apply(&spawn, 1.0).unwrap();
        assert!(scene.apply(&spawn, 1.0).is_err());
    }

    #[test]
    fn mutation_of_absent_entity_is_a_consistency_error() {
        let mut scene = Scene::new(Rgba8::opaque(0, 0, 0));
        let err = scene
            .apply(
                &Action::SetRegister {
                    id: "ghost".to_string(),
                    value: 1,
                },
                1.0,
            )
            .unwrap_err();
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn highlight_past_end_is_rejected() {
        let mut scene = Scene::new(Rgba8::opaque(0, 0, 0));
        scene
            .apply(
                &Action::Spawn {
                    id: "code".to_string(),
                    entity: Entity::new(
                        Vec2::new(0.0, 0.0),
                        Rgba8::opaque(255, 255, 255),
                        EntityKind::CodeBlock {
                            lines: vec!["rorb %cl, %bl".to_string()],
                            highlighted: None,
                            font_size: 28.0,
                            highlight_color: Rgba8::opaque(255, 211, 77),
                        },
                    ),
                },
                1.0,
            )
            .unwrap();
        assert!(
            scene
                .apply(
                    &Action::HighlightLine {
                        id: "code".to_string(),
                        line: Some(3),
                    },
                    1.0,
                )
                .is_err()
        );
    }

    #[test]
    fn continuous_actions_lerp_by_progress() {
        let mut scene = Scene::new(Rgba8::opaque(0, 0, 0));
        scene
            .apply(
                &Action::Spawn {
                    id: "r".to_string(),
                    entity: register(0),
                },
                1.0,
            )
            .unwrap();
        scene
            .apply(
                &Action::MoveTo {
                    id: "r".to_string(),
                    to: Vec2::new(100.0, 0.0),
                },
                0.5,
            )
            .unwrap();
        assert_eq!(scene.get("r").unwrap().pos.x, 50.0);
    }
}
