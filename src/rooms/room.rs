use std::collections::{HashMap, VecDeque};

use tokio::sync::mpsc;
use uuid::Uuid;

use super::msg::{Message, ServerEvent};

pub type ConnId = Uuid;
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Default)]
pub(crate) struct Room {
    history: VecDeque<Message>,
    members: HashMap<ConnId, Outbox>,
}

impl Room {
    pub(crate) fn add_member(&mut self, id: ConnId, outbox: Outbox) {
        self.members.insert(id, outbox);
    }

    pub(crate) fn remove_member(&mut self, id: ConnId) {
        self.members.remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn has_member(&self, id: ConnId) -> bool {
        self.members.contains_key(&id)
    }

    /// Appends to history, dropping the oldest entries past `cap`.
    pub(crate) fn push(&mut self, message: Message, cap: usize) {
        self.history.push_back(message);
        while self.history.len() > cap {
            self.history.pop_front();
        }
    }

    pub(crate) fn history(&self) -> Vec<Message> {
        self.history.iter().cloned().collect()
    }

    /// Delivers `event` to every member except `except`. Members whose
    /// receiving side is gone are dropped from the room.
    pub(crate) fn broadcast(&mut self, event: &ServerEvent, except: Option<ConnId>) {
        self.members.retain(|id, outbox| {
            if Some(*id) == except {
                return true;
            }
            outbox.send(event.clone()).is_ok()
        });
    }
}
