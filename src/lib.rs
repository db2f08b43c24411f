//! # Renzoku
//!
//! A sequential-async event emitter: components register named listeners
//! and trigger them by name. Listener execution for a given event is
//! serialized in registration order, and the aggregate outcome of an
//! emission is a single future that resolves once every listener has run or
//! one of them has failed.
//!
//! See the [`event`] module for the architecture overview and usage
//! examples.

pub mod event;

// Re-exports
pub use event::emitter::{EmitResult, EmitterError, EventEmitter, EventNames};
pub use event::listener::{listener_fn, Listener, ListenerError, ListenerHandle, ListenerResult};
pub use event::value::Value;
