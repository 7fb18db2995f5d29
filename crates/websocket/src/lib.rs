//! Session transport: one WebSocket connection, one session, at most one
//! research run.

pub mod handler;
pub mod messages;
pub mod session;

pub use handler::{ws_handler, WsState};
pub use messages::{ClientMessage, ControlMessage};
pub use session::{CompanyLookup, CredentialValidator, Session, SessionDeps, SessionError};
