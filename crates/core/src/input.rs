use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::camera::{CameraMode, MoveDirection};

/// Discrete input delivered to the frame driver. Windowing code translates its
/// own device events into these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Quit,
    Look { dx: f32, dy: f32 },
    /// `magnitude` scales the frame's delta time; 1.0 for a held key.
    Move {
        direction: MoveDirection,
        magnitude: f32,
    },
    Zoom { delta: f32 },
    SetCameraMode { mode: CameraMode },
    ToggleCameraMode,
}

pub trait InputSource {
    /// Drains every event gathered since the previous poll, oldest first.
    fn poll_events(&mut self) -> Vec<InputEvent>;
}

/// FIFO input source fed by hand; used by the headless path and tests.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    pending: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Extend<InputEvent> for EventQueue {
    fn extend<T: IntoIterator<Item = InputEvent>>(&mut self, iter: T) {
        self.pending.extend(iter);
    }
}

impl FromIterator<InputEvent> for EventQueue {
    fn from_iter<T: IntoIterator<Item = InputEvent>>(iter: T) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

impl InputSource for EventQueue {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_order() {
        let mut queue = EventQueue::new();
        queue.push(InputEvent::Zoom { delta: 1.0 });
        queue.push(InputEvent::ToggleCameraMode);
        assert_eq!(queue.len(), 2);

        let events = queue.poll_events();
        assert_eq!(
            events,
            vec![InputEvent::Zoom { delta: 1.0 }, InputEvent::ToggleCameraMode]
        );
        assert!(queue.is_empty());
        assert!(queue.poll_events().is_empty());
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = InputEvent::Move {
            direction: MoveDirection::Left,
            magnitude: 1.0,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("\"type\":\"move\""));
        assert!(json.contains("\"direction\":\"left\""));
        let back: InputEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
