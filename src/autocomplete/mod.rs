pub mod document;
pub mod render;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::index::NameIndex;

pub use document::{ClickTarget, Document};
pub use render::{render_html, suggestions, Suggestion};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Suggesting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The input's value changed to the carried string.
    Input(String),
    Key(Key),
    ClickCandidate(usize),
    ClickInput,
    ClickOutside,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub value: String,
    pub status: Status,
    pub candidates: Vec<String>,
    pub focused: Option<usize>,
}

impl State {
    pub fn is_open(&self) -> bool {
        self.status == Status::Suggesting
    }

    pub fn focused_candidate(&self) -> Option<&str> {
        self.focused
            .and_then(|i| self.candidates.get(i))
            .map(String::as_str)
    }

    fn closed(value: String) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

/// A full-page navigation requested by a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub name: String,
    pub target: String,
}

pub trait Navigator {
    fn navigate(&mut self, navigation: &Navigation);
}

/// Records navigations instead of performing them.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    pub visited: Vec<Navigation>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, navigation: &Navigation) {
        self.visited.push(navigation.clone());
    }
}

/// Names whose leading characters equal `query`, ignoring case, in index order.
///
/// Plain prefix comparison only: "1049" does not match "NGC 1049".
pub fn match_candidates(index: &NameIndex, query: &str) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }
    index
        .names()
        .filter(|name| prefix_len(name, query).is_some())
        .map(str::to_string)
        .collect()
}

/// Byte length of the prefix of `name` that matches `query` case-insensitively.
pub fn prefix_len(name: &str, query: &str) -> Option<usize> {
    let wanted = query.chars().count();
    let end = name
        .char_indices()
        .nth(wanted)
        .map(|(i, _)| i)
        .unwrap_or(name.len());
    let head = &name[..end];
    if head.chars().count() != wanted {
        return None;
    }
    if head.to_uppercase() == query.to_uppercase() {
        Some(end)
    } else {
        None
    }
}

/// Applies one event to `state`. Returns the next state and the navigation a
/// selection triggered, if any.
pub fn transition(
    state: &State,
    event: &Event,
    index: &NameIndex,
) -> (State, Option<Navigation>) {
    match event {
        Event::Input(value) => {
            if value.is_empty() {
                return (State::closed(String::new()), None);
            }
            let candidates = match_candidates(index, value);
            let status = if candidates.is_empty() {
                Status::Idle
            } else {
                Status::Suggesting
            };
            let next = State {
                value: value.clone(),
                status,
                candidates,
                focused: None,
            };
            (next, None)
        }
        Event::Key(key) if state.is_open() => match key {
            Key::ArrowDown => (move_focus(state, 1), None),
            Key::ArrowUp => (move_focus(state, -1), None),
            Key::Enter => match state.focused {
                Some(i) => select(state, i, index),
                None => (state.clone(), None),
            },
            Key::Other => (state.clone(), None),
        },
        Event::Key(_) => (state.clone(), None),
        Event::ClickCandidate(i) if state.is_open() => select(state, *i, index),
        Event::ClickCandidate(_) | Event::ClickInput => (state.clone(), None),
        Event::ClickOutside => (State::closed(state.value.clone()), None),
    }
}

fn move_focus(state: &State, delta: isize) -> State {
    let len = state.candidates.len() as isize;
    if len == 0 {
        return state.clone();
    }
    let current = state.focused.map(|i| i as isize).unwrap_or(-1);
    let mut next = current + delta;
    if next >= len {
        next = 0;
    }
    if next < 0 {
        next = len - 1;
    }
    State {
        focused: Some(next as usize),
        ..state.clone()
    }
}

fn select(state: &State, i: usize, index: &NameIndex) -> (State, Option<Navigation>) {
    let name = match state.candidates.get(i) {
        Some(name) => name.clone(),
        None => return (state.clone(), None),
    };
    let navigation = match index.get(&name) {
        Some(target) if !target.trim().is_empty() => Some(Navigation {
            name: name.clone(),
            target: target.to_string(),
        }),
        _ => {
            debug!(name = %name, "selected name has no target, not navigating");
            None
        }
    };
    (State::closed(name), navigation)
}

/// Autocomplete bound to one text input.
#[derive(Clone, Debug)]
pub struct AutocompleteController {
    input_id: String,
    index: Arc<NameIndex>,
    state: State,
}

impl AutocompleteController {
    pub fn attach(input_id: impl Into<String>, index: Arc<NameIndex>) -> Self {
        let input_id = input_id.into();
        debug!(input = %input_id, names = index.len(), "autocomplete attached");
        Self {
            input_id,
            index,
            state: State::default(),
        }
    }

    pub fn input_id(&self) -> &str {
        &self.input_id
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn handle(&mut self, event: Event) -> Option<Navigation> {
        let (next, navigation) = transition(&self.state, &event, &self.index);
        trace!(
            input = %self.input_id,
            event = ?event,
            candidates = next.candidates.len(),
            focused = ?next.focused,
            "autocomplete transition"
        );
        self.state = next;
        navigation
    }

    pub fn dispatch<N: Navigator + ?Sized>(&mut self, event: Event, navigator: &mut N) {
        if let Some(navigation) = self.handle(event) {
            navigator.navigate(&navigation);
        }
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        render::suggestions(&self.state)
    }

    pub fn render_html(&self) -> Option<String> {
        render::render_html(&self.input_id, &self.state)
    }
}
