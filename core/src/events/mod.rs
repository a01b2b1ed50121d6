pub mod dispatcher;
pub mod handler;

pub use dispatcher::{DispatchOutcome, HandlerRegistry};
pub use handler::{
    Around, EventHandler, FnHandler, HandlerError, Traced, around, handler_fn, with_tracing,
};
