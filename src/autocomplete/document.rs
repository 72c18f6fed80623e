use std::sync::Arc;

use super::{AutocompleteController, Event, Navigation};
use crate::index::NameIndex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    Input(String),
    Row { input: String, index: usize },
    Elsewhere,
}

impl ClickTarget {
    fn owner(&self) -> Option<&str> {
        match self {
            ClickTarget::Input(id) => Some(id),
            ClickTarget::Row { input, .. } => Some(input),
            ClickTarget::Elsewhere => None,
        }
    }
}

/// The set of autocompleting inputs on a page, with document-wide click routing.
#[derive(Clone, Debug, Default)]
pub struct Document {
    controllers: Vec<AutocompleteController>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaching an id twice replaces the earlier controller.
    pub fn attach(
        &mut self,
        input_id: impl Into<String>,
        index: Arc<NameIndex>,
    ) -> &mut AutocompleteController {
        let controller = AutocompleteController::attach(input_id, index);
        let pos = match self.position(controller.input_id()) {
            Some(pos) => {
                self.controllers[pos] = controller;
                pos
            }
            None => {
                self.controllers.push(controller);
                self.controllers.len() - 1
            }
        };
        &mut self.controllers[pos]
    }

    fn position(&self, input_id: &str) -> Option<usize> {
        self.controllers
            .iter()
            .position(|c| c.input_id() == input_id)
    }

    pub fn controller(&self, input_id: &str) -> Option<&AutocompleteController> {
        self.position(input_id).map(|pos| &self.controllers[pos])
    }

    pub fn dispatch(&mut self, input_id: &str, event: Event) -> Option<Navigation> {
        let pos = self.position(input_id)?;
        self.controllers[pos].handle(event)
    }

    /// Closes every open list except the one owning `target`, then delivers
    /// the click to the owner.
    pub fn click(&mut self, target: ClickTarget) -> Option<Navigation> {
        let owner = target.owner().map(str::to_string);
        for controller in self.controllers.iter_mut() {
            if Some(controller.input_id()) != owner.as_deref() && controller.state().is_open() {
                controller.handle(Event::ClickOutside);
            }
        }
        match target {
            ClickTarget::Input(id) => self.dispatch(&id, Event::ClickInput),
            ClickTarget::Row { input, index } => {
                self.dispatch(&input, Event::ClickCandidate(index))
            }
            ClickTarget::Elsewhere => None,
        }
    }

    pub fn open_lists(&self) -> Vec<&str> {
        self.controllers
            .iter()
            .filter(|c| c.state().is_open())
            .map(|c| c.input_id())
            .collect()
    }
}
