use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tether::types::{DialogKind, StatusIcon};
use tether::ui::{DialogHandle, UiEvent, UiToolkit, WidgetSignal};

/// Everything the fake toolkit has been asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    ShowDialog(DialogHandle, DialogKind, String),
    DestroyDialog(DialogHandle),
    SetStatus(StatusIcon, String),
    SetControlsEnabled(bool),
    ShowOutput(Vec<String>),
    HideOutput,
}

#[derive(Debug, Default)]
pub struct FakeUiState {
    /// Events returned by the next `process_pending_events`.
    pub queued: VecDeque<UiEvent>,
    pub journal: Vec<UiCall>,
    /// Dialogs shown and not yet destroyed.
    pub visible: Vec<(DialogHandle, DialogKind)>,
    /// Highest number of simultaneously visible non-fatal dialogs.
    pub max_visible_errors: usize,
    pub loop_active: bool,
    pub controls_enabled: bool,
    pub polls: usize,
    /// Answer every dialog in the batch after it is shown.
    pub auto_dismiss: bool,
    next_dialog: u64,
}

impl FakeUiState {
    pub fn dialogs_shown(&self) -> Vec<(DialogKind, String)> {
        self.journal
            .iter()
            .filter_map(|call| match call {
                UiCall::ShowDialog(_, kind, msg) => Some((*kind, msg.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.journal
            .iter()
            .filter_map(|call| match call {
                UiCall::SetStatus(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn visible_errors(&self) -> usize {
        self.visible
            .iter()
            .filter(|(_, kind)| *kind == DialogKind::Error)
            .count()
    }
}

/// In-memory [`UiToolkit`] for tests.
///
/// The toolkit itself is handed to the code under test; the paired
/// [`FakeUiHandle`] stays with the test to script events and inspect calls,
/// from any thread.
pub struct FakeUi {
    state: Arc<Mutex<FakeUiState>>,
}

#[derive(Clone)]
pub struct FakeUiHandle {
    state: Arc<Mutex<FakeUiState>>,
}

impl FakeUi {
    pub fn new() -> (Self, FakeUiHandle) {
        let state = Arc::new(Mutex::new(FakeUiState {
            controls_enabled: true,
            ..FakeUiState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            FakeUiHandle { state },
        )
    }

    /// A toolkit that answers every dialog as soon as it is shown.
    pub fn auto_dismissing() -> (Self, FakeUiHandle) {
        let (ui, handle) = Self::new();
        handle.state().auto_dismiss = true;
        (ui, handle)
    }

    fn state(&self) -> MutexGuard<'_, FakeUiState> {
        self.state.lock().unwrap()
    }
}

impl FakeUiHandle {
    pub fn state(&self) -> MutexGuard<'_, FakeUiState> {
        self.state.lock().unwrap()
    }

    pub fn push_event(&self, event: UiEvent) {
        self.state().queued.push_back(event);
    }

    pub fn push_signal(&self, widget: &str, signal: &str) {
        self.push_event(UiEvent::Signal(WidgetSignal::new(widget, signal)));
    }

    /// Queue a response for the oldest visible dialog. Returns its handle.
    pub fn dismiss_oldest(&self) -> Option<DialogHandle> {
        let mut state = self.state();
        let handle = state.visible.first().map(|(h, _)| *h)?;
        state.queued.push_back(UiEvent::DialogResponse(handle));
        Some(handle)
    }

    pub fn journal(&self) -> Vec<UiCall> {
        self.state().journal.clone()
    }

    pub fn dialogs_shown(&self) -> Vec<(DialogKind, String)> {
        self.state().dialogs_shown()
    }

    pub fn visible_dialogs(&self) -> usize {
        self.state().visible.len()
    }

    pub fn max_visible_errors(&self) -> usize {
        self.state().max_visible_errors
    }

    pub fn statuses(&self) -> Vec<String> {
        self.state().statuses()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses().pop()
    }

    pub fn controls_enabled(&self) -> bool {
        self.state().controls_enabled
    }

    pub fn polls(&self) -> usize {
        self.state().polls
    }
}

impl UiToolkit for FakeUi {
    fn process_pending_events(&mut self) -> Vec<UiEvent> {
        let events: Vec<UiEvent> = {
            let mut state = self.state();
            state.polls += 1;
            state.queued.drain(..).collect()
        };
        if events.is_empty() {
            // Keep loops driven by this toolkit from spinning hot.
            std::thread::sleep(Duration::from_millis(1));
        }
        events
    }

    fn show_modal_dialog(&mut self, kind: DialogKind, message: &str) -> DialogHandle {
        let mut state = self.state();
        state.next_dialog += 1;
        let handle = DialogHandle(state.next_dialog);
        state
            .journal
            .push(UiCall::ShowDialog(handle, kind, message.to_string()));
        state.visible.push((handle, kind));
        let visible_errors = state.visible_errors();
        state.max_visible_errors = state.max_visible_errors.max(visible_errors);
        if state.auto_dismiss {
            state.queued.push_back(UiEvent::DialogResponse(handle));
        }
        handle
    }

    fn destroy_dialog(&mut self, handle: DialogHandle) {
        let mut state = self.state();
        state.visible.retain(|(h, _)| *h != handle);
        state.journal.push(UiCall::DestroyDialog(handle));
    }

    fn begin_native_loop(&mut self) {
        self.state().loop_active = true;
    }

    fn quit_native_loop(&mut self) {
        self.state().loop_active = false;
    }

    fn is_native_loop_active(&self) -> bool {
        self.state.lock().unwrap().loop_active
    }

    fn set_status(&mut self, icon: StatusIcon, text: &str) {
        self.state()
            .journal
            .push(UiCall::SetStatus(icon, text.to_string()));
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        let mut state = self.state();
        state.controls_enabled = enabled;
        state.journal.push(UiCall::SetControlsEnabled(enabled));
    }

    fn show_output(&mut self, lines: &[String]) {
        self.state().journal.push(UiCall::ShowOutput(lines.to_vec()));
    }

    fn hide_output(&mut self) {
        self.state().journal.push(UiCall::HideOutput);
    }
}
