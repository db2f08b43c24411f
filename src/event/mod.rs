//! # Sequential Event Dispatch
//!
//! The event system is the core of the crate: components register named
//! listeners on an [`EventEmitter`](emitter::EventEmitter) and trigger them
//! by name. Listeners for a given event run strictly in registration order,
//! one at a time, and the whole emission is exposed as a single future.
//!
//! ## Architecture Overview
//!
//! The system consists of the following components:
//!
//! - **EventEmitter**: Public registration API (`on`/`once`/`off`) and the
//!   sequential dispatcher (`emit`)
//! - **ListenerRegistry**: Concurrent storage mapping event names to ordered
//!   listener sequences with tombstone-based removal
//! - **Listener**: Trait implemented by event handlers, plus a closure
//!   adapter for ad-hoc handlers
//!
//! ## Dispatch Flow
//!
//! ```text
//! ┌────────┐  emit(name)  ┌────────────┐  walk   ┌──────────┐
//! │ Caller │─────────────▶│ Dispatcher │────────▶│ Listener │
//! └────────┘              └────────────┘  0..n   └──────────┘
//!                               │
//!                          ┌────▼─────┐
//!                          │ Registry │
//!                          └──────────┘
//! ```
//!
//! 1. The caller emits an event with positional [`Value`](value::Value)
//!    arguments
//! 2. The dispatcher walks the listener sequence for that name left to right
//! 3. Each listener is awaited before the next one starts; the first failure
//!    aborts the walk and becomes the result of `emit`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! # use renzoku::event::emitter::EventEmitter;
//! # use renzoku::event::listener::listener_fn;
//! # use renzoku::event::value::Value;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let emitter = EventEmitter::new();
//!
//! emitter.on(
//!     "user_logged_in",
//!     listener_fn(|args| async move {
//!         if let Some(Value::String(user_id)) = args.first() {
//!             println!("User logged in: {}", user_id);
//!         }
//!         Ok(Value::Null)
//!     }),
//! )?;
//!
//! emitter
//!     .emit("user_logged_in", vec![Value::String("12345".into())])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod emitter;
pub mod listener;
pub mod registry;
pub mod value;
