//! Outbox of things the host should react to.
//!
//! Systems never call the host directly; they push events here and the
//! frame driver drains them once per tick.

use bevy_ecs::entity::Entity;

use crate::components::Loc;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Play a sound effect from the effect library.
    Sfx(String),
    /// Start a music pattern; `None` stops the music.
    Music(Option<String>),
    /// The player was defeated.
    GameOver,
    /// Show a dialog; the host owns presentation and any await.
    Dialog(String),
    PickedUp { by: Entity, kind: String },
    Defeated { entity: Entity, at: Option<Loc> },
    Teleported { entity: Entity, to: Loc },
}

/// Buffered events for the current tick.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<SimEvent>,
}

impl EventBuffer {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn sfx(&mut self, name: &str) {
        self.events.push(SimEvent::Sfx(name.to_owned()));
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
