// Real-time channel exports
pub mod broadcaster;
pub mod messages;
pub mod registry;
pub mod session;

pub use broadcaster::EventBroadcaster;
pub use messages::{ClientMessage, ServerEvent};
pub use registry::{ConnectionEntry, ConnectionRegistry};
pub use session::WsSession;
