use eframe::egui;
use icosphere_core::{EventQueue, InputEvent, InputSource, MoveDirection};

/// Scroll distance, in points, that counts as one wheel notch.
const SCROLL_POINTS_PER_NOTCH: f32 = 50.0;

const MOVE_KEYS: [(egui::Key, MoveDirection); 8] = [
    (egui::Key::W, MoveDirection::Forward),
    (egui::Key::ArrowUp, MoveDirection::Forward),
    (egui::Key::S, MoveDirection::Backward),
    (egui::Key::ArrowDown, MoveDirection::Backward),
    (egui::Key::A, MoveDirection::Left),
    (egui::Key::ArrowLeft, MoveDirection::Left),
    (egui::Key::D, MoveDirection::Right),
    (egui::Key::ArrowRight, MoveDirection::Right),
];

/// Directions whose bindings are held, in binding order, one entry per direction
/// even when both of its keys are down.
pub(crate) fn held_directions(is_down: impl Fn(egui::Key) -> bool) -> Vec<MoveDirection> {
    let mut held = Vec::with_capacity(4);
    for (key, direction) in MOVE_KEYS {
        if is_down(key) && !held.contains(&direction) {
            held.push(direction);
        }
    }
    held
}

pub(crate) fn scroll_to_zoom(points: f32) -> f32 {
    points / SCROLL_POINTS_PER_NOTCH
}

/// Translates egui pointer and keyboard state into frame-driver events.
#[derive(Default)]
pub(crate) struct EguiInput {
    queue: EventQueue,
}

impl EguiInput {
    /// Keyboard is global to the window but yields to focused text widgets.
    pub(crate) fn collect_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let toggle = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Tab));
        if toggle {
            self.queue.push(InputEvent::ToggleCameraMode);
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.queue.push(InputEvent::Quit);
        }

        let held = ctx.input(|i| held_directions(|key| i.key_down(key)));
        self.queue.extend(held.into_iter().map(|direction| InputEvent::Move {
            direction,
            magnitude: 1.0,
        }));
    }

    /// Pointer input only counts while it is over the viewport.
    pub(crate) fn collect_viewport(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_motion();
            if delta != egui::Vec2::ZERO {
                self.queue.push(InputEvent::Look {
                    dx: delta.x,
                    dy: delta.y,
                });
            }
        }

        if response.hovered() {
            let scroll = response.ctx.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.0 {
                self.queue.push(InputEvent::Zoom {
                    delta: scroll_to_zoom(scroll),
                });
            }
        }
    }

    pub(crate) fn push(&mut self, event: InputEvent) {
        self.queue.push(event);
    }
}

impl InputSource for EguiInput {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.queue.poll_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_share_directions() {
        let held = held_directions(|key| matches!(key, egui::Key::W | egui::Key::ArrowUp));
        assert_eq!(held, vec![MoveDirection::Forward]);

        let held = held_directions(|key| matches!(key, egui::Key::ArrowRight | egui::Key::A));
        assert_eq!(held, vec![MoveDirection::Left, MoveDirection::Right]);

        assert!(held_directions(|key| key == egui::Key::Q).is_empty());
    }

    #[test]
    fn one_notch_is_one_zoom_step() {
        assert_eq!(scroll_to_zoom(SCROLL_POINTS_PER_NOTCH), 1.0);
        assert_eq!(scroll_to_zoom(-2.0 * SCROLL_POINTS_PER_NOTCH), -2.0);
    }

    fn raw_input(events: Vec<egui::Event>) -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(400.0, 300.0),
            )),
            events,
            ..Default::default()
        }
    }

    fn key(key: egui::Key, pressed: bool) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    fn keyboard_frame(ctx: &egui::Context, input: &mut EguiInput, events: Vec<egui::Event>) {
        let _ = ctx.run(raw_input(events), |ctx| input.collect_keyboard(ctx));
    }

    fn viewport_frame(ctx: &egui::Context, input: &mut EguiInput, events: Vec<egui::Event>) {
        let _ = ctx.run(raw_input(events), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let (_, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                input.collect_viewport(&response);
            });
        });
    }

    #[test]
    fn keys_map_to_camera_events() {
        let ctx = egui::Context::default();
        let mut input = EguiInput::default();
        keyboard_frame(
            &ctx,
            &mut input,
            vec![
                key(egui::Key::Tab, true),
                key(egui::Key::Escape, true),
                key(egui::Key::W, true),
            ],
        );
        assert_eq!(
            input.poll_events(),
            vec![
                InputEvent::ToggleCameraMode,
                InputEvent::Quit,
                InputEvent::Move {
                    direction: MoveDirection::Forward,
                    magnitude: 1.0,
                },
            ]
        );
    }

    #[test]
    fn held_key_moves_every_frame_until_released() {
        let ctx = egui::Context::default();
        let mut input = EguiInput::default();
        keyboard_frame(&ctx, &mut input, vec![key(egui::Key::ArrowLeft, true)]);
        keyboard_frame(&ctx, &mut input, Vec::new());
        let left = InputEvent::Move {
            direction: MoveDirection::Left,
            magnitude: 1.0,
        };
        assert_eq!(input.poll_events(), vec![left, left]);

        keyboard_frame(&ctx, &mut input, vec![key(egui::Key::ArrowLeft, false)]);
        keyboard_frame(&ctx, &mut input, Vec::new());
        assert!(input.poll_events().is_empty());
    }

    #[test]
    fn focused_text_field_swallows_keys() {
        let ctx = egui::Context::default();
        let mut input = EguiInput::default();
        let mut text = String::new();
        let mut frame = |events: Vec<egui::Event>, input: &mut EguiInput| {
            let _ = ctx.run(raw_input(events), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.text_edit_singleline(&mut text).request_focus();
                });
                input.collect_keyboard(ctx);
            });
        };
        frame(Vec::new(), &mut input);
        frame(
            vec![key(egui::Key::W, true), key(egui::Key::ArrowUp, true)],
            &mut input,
        );
        assert!(ctx.wants_keyboard_input());
        assert!(input.poll_events().is_empty());
    }

    #[test]
    fn scroll_over_viewport_zooms() {
        let ctx = egui::Context::default();
        let mut input = EguiInput::default();
        viewport_frame(
            &ctx,
            &mut input,
            vec![egui::Event::PointerMoved(egui::pos2(200.0, 150.0))],
        );
        viewport_frame(
            &ctx,
            &mut input,
            vec![egui::Event::MouseWheel {
                unit: egui::MouseWheelUnit::Point,
                delta: egui::vec2(0.0, 2.0 * SCROLL_POINTS_PER_NOTCH),
                modifiers: egui::Modifiers::NONE,
            }],
        );
        assert_eq!(input.poll_events(), vec![InputEvent::Zoom { delta: 2.0 }]);
    }

    #[test]
    fn primary_drag_looks() {
        let ctx = egui::Context::default();
        let mut input = EguiInput::default();
        let start = egui::pos2(200.0, 150.0);
        viewport_frame(&ctx, &mut input, vec![egui::Event::PointerMoved(start)]);
        viewport_frame(
            &ctx,
            &mut input,
            vec![egui::Event::PointerButton {
                pos: start,
                button: egui::PointerButton::Primary,
                pressed: true,
                modifiers: egui::Modifiers::NONE,
            }],
        );
        assert!(input.poll_events().is_empty());

        for step in 1..=4 {
            let pos = start + egui::vec2(10.0 * step as f32, 5.0 * step as f32);
            viewport_frame(&ctx, &mut input, vec![egui::Event::PointerMoved(pos)]);
        }
        let looks: Vec<_> = input
            .poll_events()
            .into_iter()
            .filter_map(|event| match event {
                InputEvent::Look { dx, dy } => Some((dx, dy)),
                _ => None,
            })
            .collect();
        assert!(!looks.is_empty());
        assert!(looks.iter().all(|&(dx, dy)| dx > 0.0 && dy > 0.0));
    }

    #[test]
    fn pushed_events_are_drained_once() {
        let mut input = EguiInput::default();
        input.push(InputEvent::ToggleCameraMode);
        assert_eq!(input.poll_events(), vec![InputEvent::ToggleCameraMode]);
        assert!(input.poll_events().is_empty());
    }
}
