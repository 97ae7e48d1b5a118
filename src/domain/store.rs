use std::collections::HashMap;

use uuid::Uuid;

use super::todo::{Todo, TodoId};

pub type TodoMap = HashMap<TodoId, Todo>;

/// Receives the whole mapping after every mutation of a [`TodoStore`].
pub trait SnapshotSink {
    fn publish(&self, todos: &TodoMap);
}

/// Owns the canonical todo mapping. The four mutating operations are the only
/// way to change it, and each one that touches a record publishes the full
/// mapping to the sink.
pub struct TodoStore<S: SnapshotSink> {
    todos: TodoMap,
    sink: S,
}

impl<S: SnapshotSink> TodoStore<S> {
    pub fn new(sink: S) -> Self {
        Self {
            todos: TodoMap::new(),
            sink,
        }
    }

    /// Replace the mapping with what was loaded from storage. Nothing is
    /// published since storage already holds it.
    pub fn hydrate(&mut self, todos: TodoMap) {
        self.todos = todos;
    }

    pub fn create(&mut self, text: &str) -> Option<Todo> {
        if text.trim().is_empty() {
            return None;
        }
        let todo = Todo {
            id: self.fresh_id(),
            ..Todo::new(text)
        };
        self.todos.insert(todo.id, todo.clone());
        self.persist();
        Some(todo)
    }

    pub fn delete(&mut self, id: TodoId) -> Option<Todo> {
        let removed = self.todos.remove(&id)?;
        self.persist();
        Some(removed)
    }

    pub fn set_completed(&mut self, id: TodoId, value: bool) -> Option<Todo> {
        let todo = self.todos.get_mut(&id)?;
        todo.is_completed = value;
        let updated = todo.clone();
        self.persist();
        Some(updated)
    }

    /// Empty text is accepted here, unlike [`TodoStore::create`].
    pub fn update_text(&mut self, id: TodoId, text: &str) -> Option<Todo> {
        let todo = self.todos.get_mut(&id)?;
        todo.text = text.to_owned();
        let updated = todo.clone();
        self.persist();
        Some(updated)
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.get(&id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.todos.values().filter(|t| !t.is_completed).count()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> TodoMap {
        self.todos.clone()
    }

    /// Display order: oldest first, ties broken by id.
    pub fn ordered(&self) -> Vec<&Todo> {
        let mut todos: Vec<&Todo> = self.todos.values().collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        todos
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn fresh_id(&self) -> TodoId {
        loop {
            let id = Uuid::new_v4();
            if !self.todos.contains_key(&id) {
                return id;
            }
        }
    }

    fn persist(&self) {
        self.sink.publish(&self.todos);
    }
}

/// Sink that keeps every published mapping, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct Recorder {
    pub published: std::cell::RefCell<Vec<TodoMap>>,
}

#[cfg(test)]
impl Recorder {
    pub fn count(&self) -> usize {
        self.published.borrow().len()
    }

    pub fn last(&self) -> Option<TodoMap> {
        self.published.borrow().last().cloned()
    }
}

#[cfg(test)]
impl SnapshotSink for Recorder {
    fn publish(&self, todos: &TodoMap) {
        self.published.borrow_mut().push(todos.clone());
    }
}
