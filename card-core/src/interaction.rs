//! Direct-manipulation state machine.
//!
//! ```text
//!            pointer down on element                 pointer up
//!   ┌──────┐ ─────────────────────────► ┌──────────┐ ──────────► Idle
//!   │ Idle │                            │ Dragging │ ◄─┐ pointer move
//!   └──────┘ ◄──────────────────────┐   └──────────┘ ──┘
//!      │      blur / Enter / Escape │
//!      │ double click on text       │
//!      └──────────────────► ┌─────────────┐
//!                           │ EditingText │ ◄─┐ text input (committed live)
//!                           └─────────────┘ ──┘
//! ```
//!
//! Global listeners are owned by the state they belong to: entering
//! `Dragging` subscribes to the pointer channel and entering `EditingText`
//! subscribes to the keyboard channel. The subscription is a guard stored in
//! the state value, so any transition out of the state (or dropping the
//! controller) detaches it.

use std::fmt;
use std::rc::Rc;

use crate::config::EditorConfig;
use crate::element::{ElementId, ElementPatch};
use crate::event::{InputEvent, Key, PointerPosition, Target};
use crate::projection::InteractionView;
use crate::store::SceneStore;

/// Global event channels a host can attach while a gesture is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerChannel {
    /// Document-wide pointer move/up.
    Pointer,
    /// Keyboard and focus events of the inline text editor.
    Keyboard,
}

/// Host-side registration of global listeners.
pub trait ListenerHost {
    /// Start delivering events of `channel` to the controller.
    fn attach(&self, channel: ListenerChannel);
    /// Stop delivering events of `channel`.
    fn detach(&self, channel: ListenerChannel);
}

/// Listener host for environments that always deliver every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListenerHost;

impl ListenerHost for NoopListenerHost {
    fn attach(&self, _channel: ListenerChannel) {}
    fn detach(&self, _channel: ListenerChannel) {}
}

struct Subscription {
    host: Rc<dyn ListenerHost>,
    channel: ListenerChannel,
}

impl Subscription {
    fn acquire(host: &Rc<dyn ListenerHost>, channel: ListenerChannel) -> Self {
        host.attach(channel);
        Self {
            host: Rc::clone(host),
            channel,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.host.detach(self.channel);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Transient record of an in-progress drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Element being dragged.
    pub element_id: ElementId,
    /// Pointer position at pointer-down.
    pub start_pointer: PointerPosition,
    /// Element position at pointer-down.
    pub start_position: (f32, f32),
    /// Latest clamped target not yet committed (coalesced mode only).
    pub pending: Option<(f32, f32)>,
}

/// Public view of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    /// No gesture in progress.
    Idle,
    /// An element is being dragged.
    Dragging(DragSession),
    /// A text element is being edited inline.
    EditingText(ElementId),
}

#[derive(Debug)]
enum Mode {
    Idle,
    Dragging {
        session: DragSession,
        _listeners: Subscription,
    },
    EditingText {
        id: ElementId,
        _listeners: Subscription,
    },
}

enum Phase {
    Idle,
    Dragging,
    EditingText(ElementId),
}

/// Clamp a drag target so the element's top-left stays within
/// `[0, canvas - floor]` on both axes.
///
/// `floor` is a fixed size, not the element's own size, so large elements
/// can still hang off the right/bottom edges. When the canvas is smaller
/// than `floor` the lower bound wins and the result is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn clamp_drag_target(
    start: (f32, f32),
    delta: (f32, f32),
    canvas: (u32, u32),
    floor: f32,
) -> (f32, f32) {
    let max_x = canvas.0 as f32 - floor;
    let max_y = canvas.1 as f32 - floor;
    let x = (start.0 + delta.0).min(max_x).max(0.0);
    let y = (start.1 + delta.1).min(max_y).max(0.0);
    (x, y)
}

/// Translates input events into store mutations.
pub struct InteractionController {
    store: SceneStore,
    host: Rc<dyn ListenerHost>,
    drag_floor: f32,
    coalesce_moves: bool,
    mode: Mode,
}

impl fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionController")
            .field("mode", &self.mode)
            .field("drag_floor", &self.drag_floor)
            .field("coalesce_moves", &self.coalesce_moves)
            .finish_non_exhaustive()
    }
}

impl InteractionController {
    /// Create a controller driving `store`.
    #[must_use]
    pub fn new(store: SceneStore, config: &EditorConfig) -> Self {
        Self {
            store,
            host: Rc::new(NoopListenerHost),
            drag_floor: config.drag_floor,
            coalesce_moves: config.coalesce_pointer_moves,
            mode: Mode::Idle,
        }
    }

    /// Use `host` to attach and detach global listeners.
    #[must_use]
    pub fn with_listener_host(mut self, host: Rc<dyn ListenerHost>) -> Self {
        self.mode = Mode::Idle;
        self.host = host;
        self
    }

    /// The store this controller mutates.
    #[must_use]
    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> InteractionState {
        match &self.mode {
            Mode::Idle => InteractionState::Idle,
            Mode::Dragging { session, .. } => InteractionState::Dragging(session.clone()),
            Mode::EditingText { id, .. } => InteractionState::EditingText(id.clone()),
        }
    }

    /// Transient flags the render projection needs.
    #[must_use]
    pub fn view(&self) -> InteractionView {
        match &self.mode {
            Mode::Idle => InteractionView::default(),
            Mode::Dragging { session, .. } => InteractionView {
                dragging: Some(session.element_id.clone()),
                editing: None,
            },
            Mode::EditingText { id, .. } => InteractionView {
                dragging: None,
                editing: Some(id.clone()),
            },
        }
    }

    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }

    /// Feed one input event.
    pub fn handle(&mut self, event: &InputEvent) {
        let phase = match &self.mode {
            Mode::Idle => Phase::Idle,
            Mode::Dragging { .. } => Phase::Dragging,
            Mode::EditingText { id, .. } => Phase::EditingText(id.clone()),
        };

        match phase {
            Phase::Idle => self.handle_idle(event),
            Phase::Dragging => self.handle_dragging(event),
            Phase::EditingText(id) => self.handle_editing(&id, event),
        }
    }

    /// Commit the latest coalesced drag target, if any.
    pub fn animation_frame(&mut self) {
        if let Mode::Dragging { session, .. } = &mut self.mode {
            if let Some((x, y)) = session.pending.take() {
                self.store
                    .update_element(&session.element_id, &ElementPatch::position(x, y));
            }
        }
    }

    /// Abandon any gesture and return to idle, detaching listeners.
    ///
    /// A pending coalesced move is committed first.
    pub fn reset(&mut self) {
        self.animation_frame();
        self.enter_idle();
    }

    fn enter_idle(&mut self) {
        if !self.is_idle() {
            tracing::debug!("Interaction -> Idle");
        }
        self.mode = Mode::Idle;
    }

    fn handle_idle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown {
                position,
                target: Target::Element(id),
            } => self.begin_drag(id, *position),
            InputEvent::Click { target } => {
                self.store.select_element(target.element().cloned());
            }
            InputEvent::DoubleClick {
                target: Target::Element(id),
            } => self.begin_edit(id),
            other => tracing::trace!(event = ?other, "Ignored while idle"),
        }
    }

    fn handle_dragging(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerMove { position } => self.drag_to(*position),
            InputEvent::PointerUp { .. } => {
                self.animation_frame();
                self.enter_idle();
            }
            other => tracing::trace!(event = ?other, "Ignored while dragging"),
        }
    }

    fn handle_editing(&mut self, id: &ElementId, event: &InputEvent) {
        match event {
            InputEvent::TextInput { value } => {
                if self.store.element(id).is_none() {
                    tracing::debug!(%id, "Edited element vanished");
                    self.enter_idle();
                    return;
                }
                self.store
                    .update_element(id, &ElementPatch::content(value.clone()));
            }
            InputEvent::Key { key, modifiers } => match key {
                Key::Enter if !modifiers.shift => self.enter_idle(),
                Key::Escape => self.enter_idle(),
                _ => {}
            },
            InputEvent::Blur => self.enter_idle(),
            InputEvent::PointerDown { target, .. }
            | InputEvent::Click { target }
            | InputEvent::DoubleClick { target } => {
                if target.element() == Some(id) {
                    return;
                }
                // Pressing anywhere else takes focus away from the editor.
                self.enter_idle();
                self.handle_idle(event);
            }
            other => tracing::trace!(event = ?other, "Ignored while editing"),
        }
    }

    fn begin_drag(&mut self, id: &ElementId, pointer: PointerPosition) {
        let Some(element) = self.store.element(id) else {
            tracing::trace!(%id, "Pointer down on unknown element");
            return;
        };

        self.store.select_element(Some(id.clone()));
        tracing::debug!(%id, "Interaction -> Dragging");
        self.mode = Mode::Dragging {
            session: DragSession {
                element_id: id.clone(),
                start_pointer: pointer,
                start_position: element.position(),
                pending: None,
            },
            _listeners: Subscription::acquire(&self.host, ListenerChannel::Pointer),
        };
    }

    fn drag_to(&mut self, pointer: PointerPosition) {
        let canvas = self.store.canvas_size();
        let Mode::Dragging { session, .. } = &mut self.mode else {
            return;
        };

        let delta = (
            pointer.x - session.start_pointer.x,
            pointer.y - session.start_pointer.y,
        );
        let (x, y) = clamp_drag_target(session.start_position, delta, canvas, self.drag_floor);

        if self.coalesce_moves {
            session.pending = Some((x, y));
        } else {
            self.store
                .update_element(&session.element_id, &ElementPatch::position(x, y));
        }
    }

    fn begin_edit(&mut self, id: &ElementId) {
        let Some(element) = self.store.element(id) else {
            tracing::trace!(%id, "Double click on unknown element");
            return;
        };

        self.store.select_element(Some(id.clone()));
        if !element.is_text() {
            return;
        }

        tracing::debug!(%id, "Interaction -> EditingText");
        self.mode = Mode::EditingText {
            id: id.clone(),
            _listeners: Subscription::acquire(&self.host, ListenerChannel::Keyboard),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind, FontWeight, QrProps, TextProps};
    use crate::event::KeyModifiers;
    use crate::scene::Document;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHost {
        calls: RefCell<Vec<(bool, ListenerChannel)>>,
    }

    impl RecordingHost {
        fn active(&self) -> Vec<ListenerChannel> {
            let mut active = Vec::new();
            for (attached, channel) in self.calls.borrow().iter() {
                if *attached {
                    active.push(*channel);
                } else if let Some(pos) = active.iter().position(|c| c == channel) {
                    active.remove(pos);
                }
            }
            active
        }
    }

    impl ListenerHost for RecordingHost {
        fn attach(&self, channel: ListenerChannel) {
            self.calls.borrow_mut().push((true, channel));
        }

        fn detach(&self, channel: ListenerChannel) {
            self.calls.borrow_mut().push((false, channel));
        }
    }

    fn text(id: &str, x: f32, y: f32) -> Element {
        Element::new(
            id,
            x,
            y,
            ElementKind::Text(TextProps {
                content: "Hello".to_string(),
                font_size: 16,
                font_weight: FontWeight::Normal,
                color: "#000000".to_string(),
                font_family: "Inter, sans-serif".to_string(),
            }),
        )
    }

    fn qr(id: &str, x: f32, y: f32) -> Element {
        Element::new(
            id,
            x,
            y,
            ElementKind::Qr(QrProps {
                size: 120,
                qr_data: String::new(),
            }),
        )
    }

    fn setup(config: &EditorConfig) -> (InteractionController, Rc<RecordingHost>) {
        let store = SceneStore::new(Document::new(400, 240));
        store.add_element(text("text-1", 100.0, 70.0)).expect("add");
        store.add_element(qr("qr-1", 390.0, 230.0)).expect("add");
        let host = Rc::new(RecordingHost::default());
        let controller = InteractionController::new(store, config)
            .with_listener_host(Rc::clone(&host) as Rc<dyn ListenerHost>);
        (controller, host)
    }

    fn position_of(controller: &InteractionController, id: &str) -> (f32, f32) {
        controller
            .store()
            .element(&id.into())
            .expect("element")
            .position()
    }

    #[test]
    fn test_pointer_down_selects_before_any_move() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::pointer_down_on("text-1", 110.0, 80.0));

        assert_eq!(controller.store().selected(), Some("text-1".into()));
        assert!(matches!(controller.state(), InteractionState::Dragging(_)));
        assert_eq!(host.active(), vec![ListenerChannel::Pointer]);
    }

    #[test]
    fn test_drag_is_clamped_with_fixed_floor() {
        let (mut controller, _host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::pointer_down_on("qr-1", 0.0, 0.0));
        controller.handle(&InputEvent::pointer_move(50.0, 50.0));

        assert_eq!(position_of(&controller, "qr-1"), (350.0, 190.0));

        controller.handle(&InputEvent::pointer_move(-1000.0, -1000.0));
        assert_eq!(position_of(&controller, "qr-1"), (0.0, 0.0));
    }

    #[test]
    fn test_pointer_up_keeps_selection_and_detaches() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::pointer_down_on("text-1", 110.0, 80.0));
        controller.handle(&InputEvent::pointer_move(120.0, 90.0));
        controller.handle(&InputEvent::pointer_up(120.0, 90.0));

        assert!(controller.is_idle());
        assert_eq!(controller.store().selected(), Some("text-1".into()));
        assert_eq!(position_of(&controller, "text-1"), (110.0, 80.0));
        assert!(host.active().is_empty());
    }

    #[test]
    fn test_background_click_deselects() {
        let (mut controller, _host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::click_on("qr-1"));
        assert_eq!(controller.store().selected(), Some("qr-1".into()));

        controller.handle(&InputEvent::click_background());
        assert!(controller.store().selected().is_none());
    }

    #[test]
    fn test_double_click_text_enters_editing() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("text-1"));

        assert_eq!(
            controller.state(),
            InteractionState::EditingText("text-1".into())
        );
        assert_eq!(controller.store().selected(), Some("text-1".into()));
        assert_eq!(host.active(), vec![ListenerChannel::Keyboard]);
        assert_eq!(controller.view().editing, Some("text-1".into()));
    }

    #[test]
    fn test_double_click_on_qr_only_selects() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("qr-1"));

        assert!(controller.is_idle());
        assert_eq!(controller.store().selected(), Some("qr-1".into()));
        assert!(host.calls.borrow().is_empty());
    }

    #[test]
    fn test_text_is_committed_live_and_escape_keeps_it() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("text-1"));
        controller.handle(&InputEvent::TextInput {
            value: "Hel".to_string(),
        });

        let content = |c: &InteractionController| match c
            .store()
            .element(&"text-1".into())
            .expect("text")
            .kind
        {
            ElementKind::Text(props) => props.content,
            _ => unreachable!(),
        };
        assert_eq!(content(&controller), "Hel");

        controller.handle(&InputEvent::key(Key::Escape));
        assert!(controller.is_idle());
        assert_eq!(content(&controller), "Hel");
        assert!(host.active().is_empty());
    }

    #[test]
    fn test_shift_enter_keeps_editing() {
        let (mut controller, _host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("text-1"));
        controller.handle(&InputEvent::Key {
            key: Key::Enter,
            modifiers: KeyModifiers {
                shift: true,
                ..KeyModifiers::default()
            },
        });
        assert!(!controller.is_idle());

        controller.handle(&InputEvent::key(Key::Enter));
        assert!(controller.is_idle());
    }

    #[test]
    fn test_blur_exits_editing() {
        let (mut controller, _host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("text-1"));
        controller.handle(&InputEvent::Blur);
        assert!(controller.is_idle());
        assert_eq!(controller.store().selected(), Some("text-1".into()));
    }

    #[test]
    fn test_pointer_down_elsewhere_while_editing_starts_drag() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::double_click_on("text-1"));
        controller.handle(&InputEvent::pointer_down_on("text-1", 5.0, 5.0));
        assert!(matches!(
            controller.state(),
            InteractionState::EditingText(_)
        ));

        controller.handle(&InputEvent::pointer_down_on("qr-1", 0.0, 0.0));
        assert!(matches!(controller.state(), InteractionState::Dragging(_)));
        assert_eq!(controller.store().selected(), Some("qr-1".into()));
        assert_eq!(host.active(), vec![ListenerChannel::Pointer]);
    }

    #[test]
    fn test_pointer_down_on_unknown_element_is_ignored() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::pointer_down_on("ghost", 0.0, 0.0));
        assert!(controller.is_idle());
        assert!(controller.store().selected().is_none());
        assert!(host.calls.borrow().is_empty());
    }

    #[test]
    fn test_coalesced_moves_commit_per_frame() {
        let config = EditorConfig {
            coalesce_pointer_moves: true,
            ..EditorConfig::default()
        };
        let (mut controller, _host) = setup(&config);
        controller.handle(&InputEvent::pointer_down_on("text-1", 0.0, 0.0));
        controller.handle(&InputEvent::pointer_move(10.0, 0.0));
        controller.handle(&InputEvent::pointer_move(20.0, 5.0));
        assert_eq!(position_of(&controller, "text-1"), (100.0, 70.0));

        controller.animation_frame();
        assert_eq!(position_of(&controller, "text-1"), (120.0, 75.0));

        controller.handle(&InputEvent::pointer_move(30.0, 5.0));
        controller.handle(&InputEvent::pointer_up(30.0, 5.0));
        assert_eq!(position_of(&controller, "text-1"), (130.0, 75.0));
    }

    #[test]
    fn test_dropping_controller_detaches_listeners() {
        let (mut controller, host) = setup(&EditorConfig::default());
        controller.handle(&InputEvent::pointer_down_on("text-1", 0.0, 0.0));
        drop(controller);
        assert!(host.active().is_empty());
    }

    #[test]
    fn test_clamp_with_canvas_smaller_than_floor() {
        assert_eq!(
            clamp_drag_target((10.0, 10.0), (5.0, 5.0), (30, 30), 50.0),
            (0.0, 0.0)
        );
    }
}
