use std::sync::mpsc::{Receiver, TryRecvError};

use log::{info, warn};

use crate::domain::store::{SnapshotSink, TodoMap, TodoStore};
use crate::domain::todo::{Todo, TodoId};
use crate::ui::backdrop::Backdrop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    Editing(TodoId),
}

pub struct App<S: SnapshotSink> {
    store: TodoStore<S>,
    loading: Option<Receiver<TodoMap>>,
    pub backdrop: Backdrop,
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    pub status: Option<String>,
}

impl<S: SnapshotSink> App<S> {
    pub fn new(store: TodoStore<S>, loading: Receiver<TodoMap>, backdrop: Backdrop) -> Self {
        Self {
            store,
            loading: Some(loading),
            backdrop,
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            status: None,
        }
    }

    /// True once the saved todos have been loaded. Until then the list is not
    /// shown and list intents are ignored.
    pub fn ready(&self) -> bool {
        self.loading.is_none()
    }

    pub fn poll_load(&mut self) {
        let Some(rx) = self.loading.as_ref() else {
            return;
        };
        match rx.try_recv() {
            Ok(todos) => {
                info!("event=hydrate module=app status=ok count={}", todos.len());
                self.store.hydrate(todos);
                self.loading = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                warn!("event=hydrate module=app status=error error=loader_gone");
                self.loading = None;
            }
        }
    }

    pub fn visible_todos(&self) -> Vec<&Todo> {
        if !self.ready() {
            return Vec::new();
        }
        self.store.ordered()
    }

    pub fn has_todos(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.store.open_count()
    }

    pub fn total_count(&self) -> usize {
        self.store.len()
    }

    pub fn select_next(&mut self) {
        let len = self.store.len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn selected_id(&self) -> Option<TodoId> {
        self.visible_todos().get(self.selected).map(|t| t.id)
    }

    pub fn on_text_changed(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    pub fn begin_add(&mut self) {
        if !self.ready() {
            return;
        }
        self.mode = InputMode::Adding;
        self.input.clear();
        self.set_status("Type a new task and press Enter");
    }

    pub fn begin_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(text) = self.store.get(id).map(|t| t.text.clone()) else {
            return;
        };
        self.on_text_changed(text);
        self.mode = InputMode::Editing(id);
        self.set_status("Edit the task and press Enter");
    }

    pub fn cancel_input(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
        self.set_status("Canceled");
    }

    /// Enter in either input mode.
    pub fn submit_input(&mut self) {
        match self.mode {
            InputMode::Normal => {}
            InputMode::Adding => self.on_submit(),
            InputMode::Editing(id) => {
                let text = std::mem::take(&mut self.input);
                self.on_edit_submit(id, &text);
            }
        }
    }

    /// Create a task from the input buffer. The buffer is kept when the text
    /// is blank so the user can keep typing.
    pub fn on_submit(&mut self) {
        if !self.ready() {
            return;
        }
        match self.store.create(&self.input) {
            Some(todo) => {
                self.input.clear();
                self.mode = InputMode::Normal;
                self.select(todo.id);
                self.set_status("Added");
            }
            None => self.set_status("Cannot add an empty task"),
        }
    }

    pub fn on_toggle(&mut self, id: TodoId) {
        let Some(current) = self.store.get(id).map(|t| t.is_completed) else {
            return;
        };
        if self.store.set_completed(id, !current).is_some() {
            self.set_status(if current { "Marked open" } else { "Completed" });
        }
    }

    pub fn on_delete(&mut self, id: TodoId) {
        if self.store.delete(id).is_some() {
            self.clamp_selection();
            self.set_status("Deleted");
        }
    }

    pub fn on_edit_submit(&mut self, id: TodoId, text: &str) {
        self.mode = InputMode::Normal;
        self.input.clear();
        if self.store.update_text(id, text).is_some() {
            self.set_status("Updated");
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.on_toggle(id);
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            self.on_delete(id);
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status = Some(msg.to_string());
    }

    pub fn into_store(self) -> TodoStore<S> {
        self.store
    }

    fn select(&mut self, id: TodoId) {
        let pos = self.visible_todos().iter().position(|t| t.id == id);
        if let Some(pos) = pos {
            self.selected = pos;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.store.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
