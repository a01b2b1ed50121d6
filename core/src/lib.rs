pub mod context;
pub mod events;
pub mod handlers;
pub mod journal;
pub mod poller;
pub mod reader;
pub mod state;

// Re-exports for convenience
pub use context::{AppConfig, JournalSession, SessionError, TickReport};
pub use events::{DispatchOutcome, EventHandler, HandlerError, HandlerRegistry};
pub use handlers::default_registry;
pub use journal::{DecodeError, RawEvent, decode_line};
pub use poller::spawn_poller;
pub use state::{Registries, RegistriesSnapshot};
