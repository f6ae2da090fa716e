mod msg;
mod relay;
mod room;
mod ws;

use axum::{Router, routing::get};

use crate::AppState;

pub use msg::{
    ClientEvent, JoinPayload, Message, Presence, PresenceStatus, SendMessagePayload, ServerEvent,
    User,
};
pub use relay::{Connection, DEFAULT_MAIL_ROOM, DEFAULT_MAX_HISTORY, Relay, Session};
pub use room::ConnId;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::relay_ws))
}
