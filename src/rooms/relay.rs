use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;
use time::{OffsetDateTime, macros::format_description};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    msg::{
        ClientEvent, JoinPayload, Message, Presence, PresenceStatus, SendMessagePayload,
        ServerEvent, User, is_truthy, non_empty,
    },
    room::{ConnId, Outbox, Room},
};

pub const DEFAULT_MAX_HISTORY: usize = 50;
pub const DEFAULT_MAIL_ROOM: &str = "mail";

/// Shared handle to every room. All room state lives behind this one lock,
/// so appending to history and fanning out the appended message happen as
/// a single step with respect to other connections.
#[derive(Clone)]
pub struct Relay {
    rooms: Arc<Mutex<HashMap<String, Room>>>,
    max_history: usize,
    mail_room: Arc<str>,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY, DEFAULT_MAIL_ROOM)
    }
}

impl Relay {
    pub fn new(max_history: usize, mail_room: &str) -> Self {
        Self {
            rooms: Arc::default(),
            max_history: max_history.max(1),
            mail_room: mail_room.into(),
        }
    }

    /// Opens a session. Everything the relay emits for it arrives on the
    /// returned receiver.
    pub fn connect(&self) -> (Connection, mpsc::UnboundedReceiver<ServerEvent>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            id: Uuid::now_v7(),
            session: Session::Unjoined,
            outbox,
            relay: self.clone(),
        };
        debug!(conn = %conn.id, "connected");
        (conn, rx)
    }

    pub fn history(&self, room: &str) -> Vec<Message> {
        self.rooms
            .lock()
            .get(room)
            .map(Room::history)
            .unwrap_or_default()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Unjoined,
    Joined { room: String, user: Option<User> },
}

/// One client's view of the relay. Dropped for good by [`Connection::disconnect`].
pub struct Connection {
    id: ConnId,
    session: Session,
    outbox: Outbox,
    relay: Relay,
}

impl Connection {
    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Join(payload) => self.join(payload),
            ClientEvent::Message(payload) => self.send(payload),
            ClientEvent::Mail(payload) => self.notify_mail(payload),
        }
    }

    pub fn join(&mut self, JoinPayload { room, user }: JoinPayload) {
        let Some(room) = non_empty(room) else {
            debug!(conn = %self.id, "join without room ignored");
            return;
        };

        let mut rooms = self.relay.rooms.lock();

        if let Session::Joined { room: previous, user: previous_user } = &self.session {
            if *previous != room {
                if let Some(old) = rooms.get_mut(previous) {
                    old.remove_member(self.id);
                    if let Some(previous_user) = previous_user {
                        let presence = self.presence(Some(previous_user), PresenceStatus::Offline);
                        old.broadcast(&ServerEvent::Presence(presence), None);
                    }
                }
                debug!(conn = %self.id, from = %previous, to = %room, "left previous room");
            }
        }

        let entry = rooms.entry(room.clone()).or_default();
        entry.add_member(self.id, self.outbox.clone());
        if self.outbox.send(ServerEvent::History(entry.history())).is_err() {
            debug!(conn = %self.id, "history dropped, receiver closed");
        }

        let presence = self.presence(user.as_ref(), PresenceStatus::Online);
        entry.broadcast(&ServerEvent::Presence(presence), Some(self.id));

        info!(conn = %self.id, room = %room, "joined");
        self.session = Session::Joined { room, user };
    }

    pub fn send(&self, payload: SendMessagePayload) {
        let room = non_empty(payload.room).or_else(|| match &self.session {
            Session::Joined { room, .. } => Some(room.clone()),
            Session::Unjoined => None,
        });
        let (Some(room), Some(text)) = (room, non_empty(payload.text)) else {
            debug!(conn = %self.id, "message without room or text dropped");
            return;
        };

        let message = Message {
            id: payload
                .id
                .filter(|id| !id.is_null())
                .unwrap_or_else(|| Value::String(Uuid::now_v7().to_string())),
            room: room.clone(),
            text,
            time: payload
                .time
                .filter(|time| !time.is_null())
                .unwrap_or_else(|| Value::String(clock_time())),
            user: payload.user,
            reply_to: payload.reply_to.filter(|r| !r.is_null()),
        };

        let mut rooms = self.relay.rooms.lock();
        let entry = rooms.entry(room).or_default();
        entry.push(message.clone(), self.relay.max_history);
        entry.broadcast(&ServerEvent::Message(message), None);
    }

    pub fn notify_mail(&self, payload: Value) {
        if !payload.get("subject").is_some_and(is_truthy) {
            debug!(conn = %self.id, "mail without subject dropped");
            return;
        }

        let room = payload
            .get("room")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&*self.relay.mail_room)
            .to_owned();

        let mut rooms = self.relay.rooms.lock();
        if let Some(entry) = rooms.get_mut(&room) {
            entry.broadcast(&ServerEvent::Mail(payload), None);
        }
    }

    pub fn disconnect(self) {
        let Session::Joined { room, user } = &self.session else {
            debug!(conn = %self.id, "disconnected before joining");
            return;
        };

        let mut rooms = self.relay.rooms.lock();
        if let Some(entry) = rooms.get_mut(room) {
            entry.remove_member(self.id);
            if let Some(user) = user {
                let presence = self.presence(Some(user), PresenceStatus::Offline);
                entry.broadcast(&ServerEvent::Presence(presence), None);
            }
        }
        info!(conn = %self.id, room = %room, "disconnected");
    }

    fn presence(&self, user: Option<&User>, status: PresenceStatus) -> Presence {
        let user = user.cloned().unwrap_or_default();
        Presence {
            id: non_empty(user.id).unwrap_or_else(|| self.id.to_string()),
            name: non_empty(user.name).unwrap_or_else(|| "Guest".to_owned()),
            status,
        }
    }
}

fn clock_time() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_default()
}
