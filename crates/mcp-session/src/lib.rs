//! Session lifecycle and server-push plumbing shared by both transports:
//! session storage, the outbound notification bus, server→client request
//! correlation, and the per-session replayable event log.

pub mod correlation;
pub mod error;
pub mod event_log;
pub mod notification_bus;
pub mod session;

pub use correlation::{CorrelationId, CorrelationTable, Waiter};
pub use error::{Error, Result};
pub use event_log::{EventLog, StoredEvent};
pub use notification_bus::{BusMessage, NotificationBus};
pub use session::{
    InMemorySessionStore, NullSessionStore, Session, SessionId, SessionState, SessionStore,
};
