use thiserror::Error;
use tracing::{debug, trace};

use super::listener::{ListenerError, ListenerHandle};
use super::registry::{ListenerRegistry, SlotView};
use super::value::Value;

/// Event name argument accepted by the registration API: a single name or an
/// ordered list of names.
///
/// Multi-name calls apply the operation per name, left to right, without
/// rollback: if a name partway through the list is invalid, the operation
/// fails there and earlier names in the same call stay registered.
pub enum EventNames {
    One(String),
    Many(Vec<String>),
}

impl EventNames {
    fn into_vec(self) -> Vec<String> {
        match self {
            EventNames::One(name) => vec![name],
            EventNames::Many(names) => names,
        }
    }
}

impl From<&str> for EventNames {
    fn from(name: &str) -> Self {
        EventNames::One(name.to_string())
    }
}

impl From<String> for EventNames {
    fn from(name: String) -> Self {
        EventNames::One(name)
    }
}

impl From<Vec<String>> for EventNames {
    fn from(names: Vec<String>) -> Self {
        EventNames::Many(names)
    }
}

impl From<Vec<&str>> for EventNames {
    fn from(names: Vec<&str>) -> Self {
        EventNames::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventNames {
    fn from(names: [&str; N]) -> Self {
        EventNames::Many(names.into_iter().map(str::to_string).collect())
    }
}

/// # EventEmitter
///
/// Registration API and sequential dispatcher over a shared listener
/// registry. Listeners registered under an event name are invoked by
/// [`emit`](Self::emit) strictly in registration order, one at a time.
///
/// Emitter instances are fully independent; the registry is the entire
/// mutable state of an instance. Registration and removal are synchronous,
/// dispatch is asynchronous.
///
/// ## Example
///
/// ```rust,no_run
/// # use renzoku::event::emitter::EventEmitter;
/// # use renzoku::event::listener::listener_fn;
/// # use renzoku::event::value::Value;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let emitter = EventEmitter::new();
/// emitter.on(
///     ["created", "updated"],
///     listener_fn(|_| async { Ok(Value::Null) }),
/// )?;
/// emitter.emit("created", vec![]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct EventEmitter {
    registry: ListenerRegistry,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` as a persistent listener for each given name.
    ///
    /// The same handle registered for several names (or several times for
    /// one name) produces independent records, removable independently.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidEventName`] for an empty name.
    pub fn on(
        &self,
        names: impl Into<EventNames>,
        handler: ListenerHandle,
    ) -> EmitResult<()> {
        self.register(names.into(), handler, false)
    }

    /// Registers `handler` for one-time execution per given name.
    ///
    /// A one-shot record is removed from an event's sequence right after it
    /// is invoked for that event, regardless of the outcome of its result,
    /// so a later emission never considers it again. Registration for other
    /// names is unaffected until those names fire.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidEventName`] for an empty name.
    pub fn once(
        &self,
        names: impl Into<EventNames>,
        handler: ListenerHandle,
    ) -> EmitResult<()> {
        self.register(names.into(), handler, true)
    }

    /// Removes the first record holding `handler` for each given name.
    ///
    /// Removal clears the record's slot in place, leaving a tombstone that
    /// walks skip; remaining records keep their positions. If no entry
    /// exists for a name, an empty one is created. A missing match is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidEventName`] for an empty name.
    pub fn off(
        &self,
        names: impl Into<EventNames>,
        handler: &ListenerHandle,
    ) -> EmitResult<()> {
        for name in names.into().into_vec() {
            self.registry.remove(&name, handler)?;
        }
        Ok(())
    }

    fn register(
        &self,
        names: EventNames,
        handler: ListenerHandle,
        one_shot: bool,
    ) -> EmitResult<()> {
        for name in names.into_vec() {
            self.registry.add(&name, handler.clone(), one_shot)?;
        }
        Ok(())
    }

    /// Triggers `name`, invoking its listeners in registration order.
    ///
    /// The returned future resolves `Ok(())` once every listener has run, or
    /// with the first failure, after which no further listener is visited.
    /// A failed emission aborts that walk only: listeners after the failing
    /// one stay registered for later emissions.
    ///
    /// Exactly one listener is in flight per `emit` call at any time; each
    /// concurrent `emit` owns an independent walk cursor over the shared
    /// sequence. The sequence is read live rather than snapshotted, so a
    /// listener removed mid-walk (by another emission's one-shot cleanup or
    /// by a listener calling [`off`](Self::off)) is observed as a tombstone
    /// if its index has not been reached yet. Re-entrant emission from
    /// inside a listener is supported.
    ///
    /// Emitting a name with no prior registration creates an empty entry
    /// and resolves immediately. The name is not validated here.
    ///
    /// # Errors
    ///
    /// Fails with [`EmitterError::Listener`] carrying the first listener
    /// failure, or [`EmitterError::InvalidListener`] should a slot ever hold
    /// an unusable handler.
    pub async fn emit(&self, name: &str, args: Vec<Value>) -> EmitResult<()> {
        debug!("Emitting event: {} ({} args)", name, args.len());
        self.registry.ensure(name);

        let mut index = 0;
        loop {
            match self.registry.slot_at(name, index) {
                SlotView::End => {
                    trace!("Walk finished for event: {} at index {}", name, index);
                    return Ok(());
                }
                SlotView::Hole => {
                    trace!("Skipping tombstone for event: {} at index {}", name, index);
                }
                SlotView::Active(record) => {
                    // One-shot records leave the sequence as soon as they are
                    // invoked, before their result is awaited, so concurrent
                    // and re-entrant emissions never run them a second time.
                    if record.one_shot {
                        trace!("Removing one-shot listener for event: {}", name);
                        self.registry.remove_first(name, &record.handler);
                    }

                    if let Err(error) = record.handler.call(&args).await {
                        debug!(
                            "Listener failed for event: {} at index {}: {}",
                            name, index, error
                        );
                        return Err(EmitterError::Listener(error));
                    }
                }
            }
            index += 1;
        }
    }

    /// Number of live listeners currently registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry.listener_count(name)
    }

    /// Names with an existing registry entry, in no particular order.
    pub fn event_names(&self) -> Vec<String> {
        self.registry.event_names()
    }
}

#[derive(Error, Debug)]
pub enum EmitterError {
    /// A registration or removal was given an empty event name.
    #[error("Invalid event name.")]
    InvalidEventName,

    /// A listener slot was found to be unusable during a walk. The typed
    /// registry cannot produce such a slot, so this is unreachable through
    /// the public API; the kind is kept for hosts that match on dispatch
    /// errors exhaustively.
    #[error("Invalid listener.")]
    InvalidListener,

    /// A listener reported failure; the walk stopped at it.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

pub type EmitResult<T> = Result<T, EmitterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::listener::listener_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_emit_without_listeners_succeeds() {
        let emitter = EventEmitter::new();
        assert!(emitter.emit("nothing-registered", vec![]).await.is_ok());
        // the emission created a persistent empty entry
        assert!(emitter
            .event_names()
            .contains(&"nothing-registered".to_string()));
    }

    #[tokio::test]
    async fn test_emit_does_not_validate_name() {
        let emitter = EventEmitter::new();
        assert!(emitter.emit("", vec![]).await.is_ok());
    }

    #[test]
    fn test_on_rejects_empty_name() {
        let emitter = EventEmitter::new();
        let result = emitter.on("", listener_fn(|_| async { Ok(Value::Null) }));
        assert!(matches!(result, Err(EmitterError::InvalidEventName)));
    }

    #[test]
    fn test_multi_name_registration_is_not_transactional() {
        let emitter = EventEmitter::new();
        let handler = listener_fn(|_| async { Ok(Value::Null) });

        let result = emitter.on(vec!["first", "", "third"], handler);
        assert!(matches!(result, Err(EmitterError::InvalidEventName)));

        // names before the invalid one stay registered
        assert_eq!(emitter.listener_count("first"), 1);
        assert_eq!(emitter.listener_count("third"), 0);
    }

    #[tokio::test]
    async fn test_listener_receives_args() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_listener = seen.clone();

        emitter
            .on(
                "sum",
                listener_fn(move |args| {
                    let seen = seen_by_listener.clone();
                    async move {
                        let total: i64 =
                            args.iter().filter_map(Value::as_integer).sum();
                        seen.store(total as usize, Ordering::SeqCst);
                        Ok(Value::Integer(total))
                    }
                }),
            )
            .unwrap();

        emitter
            .emit("sum", vec![Value::Integer(11), Value::Integer(22)])
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 33);
    }

    #[tokio::test]
    async fn test_failure_does_not_deregister() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_by_listener = calls.clone();

        emitter
            .on(
                "boom",
                listener_fn(move |_| {
                    let calls = calls_by_listener.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(ListenerError::new("always fails"))
                    }
                }),
            )
            .unwrap();

        assert!(emitter.emit("boom", vec![]).await.is_err());
        assert!(emitter.emit("boom", vec![]).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.listener_count("boom"), 1);
    }
}
