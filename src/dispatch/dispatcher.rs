// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The dispatcher: single entry point for bus events.
//!
//! # Architecture
//!
//! ```text
//! bus integration: define CCD/CONNECTION
//!                     ↓
//!           Dispatcher.deliver()
//!                     ↓
//!     EventFeed.publish() + Registry.snapshot()
//!                     ↓
//!     for each entry: Accepts.matches(event)?
//!                     ↓
//!        claim run, invoke inline / submit task
//!                     ↓
//!           Registry.prune()
//! ```

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::registry::{Registry, RegistrationId};
use super::{Handler, Registration};
use crate::diagnostics::DiagnosticsConfig;
use crate::error::ConfigurationError;
use crate::event::{Action, Event, EventFeed};
use crate::property::{Property, PropertyState};

/// Matches bus events against registered filters and runs the handlers.
///
/// The bus integration calls [`deliver`](Self::deliver) once per event, from
/// a single producer context. Application code may register and remove
/// handlers from any thread at any time, including from inside a handler.
///
/// Handler failures never leave `deliver`. An inline handler that panics is
/// logged and skipped; the rest of the pass continues.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use indigo_dispatch::dispatch::{Accepts, Dispatcher, Handler, Registration};
/// use indigo_dispatch::event::Action;
/// use indigo_dispatch::property::{Property, PropertyKind};
///
/// let dispatcher = Dispatcher::new();
/// let hits = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&hits);
///
/// dispatcher
///     .register(
///         Registration::new(Handler::inline(move |_, _| {
///             counter.fetch_add(1, Ordering::SeqCst);
///         }))
///         .accepts(Accepts::new().name("CCD_EXPOSURE")),
///     )
///     .unwrap();
///
/// dispatcher.deliver(Action::Define, Property::new(PropertyKind::Number, "CCD", "CCD_EXPOSURE"));
/// dispatcher.deliver(Action::Define, Property::new(PropertyKind::Number, "CCD", "CCD_GAIN"));
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    diagnostics: RwLock<DiagnosticsConfig>,
    feed: EventFeed,
}

impl Dispatcher {
    /// Creates a dispatcher with default diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::with_diagnostics(DiagnosticsConfig::default())
    }

    /// Creates a dispatcher with the given diagnostics.
    #[must_use]
    pub fn with_diagnostics(diagnostics: DiagnosticsConfig) -> Self {
        Self {
            registry: Registry::new(),
            diagnostics: RwLock::new(diagnostics),
            feed: EventFeed::new(),
        }
    }

    /// Replaces the event feed with one of the given capacity.
    #[must_use]
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed = EventFeed::with_capacity(capacity);
        self
    }

    /// Returns the current diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsConfig {
        *self.diagnostics.read()
    }

    /// Replaces the diagnostics. Takes effect from the next pass.
    pub fn set_diagnostics(&self, diagnostics: DiagnosticsConfig) {
        *self.diagnostics.write() = diagnostics;
    }

    /// Adds a registration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the run limit is zero, or if the
    /// scheduler does not fit the handler's execution mode.
    pub fn register(
        &self,
        registration: Registration,
    ) -> Result<RegistrationId, ConfigurationError> {
        self.registry.register(registration)
    }

    /// Removes every registration of `handler`.
    ///
    /// Returns how many were removed. Unknown handlers are a no-op.
    pub fn unregister(&self, handler: &Handler) -> usize {
        self.registry.unregister(handler)
    }

    /// Removes one registration. Returns `false` if it was already gone.
    pub fn remove(&self, id: RegistrationId) -> bool {
        self.registry.remove(id)
    }

    /// Returns `true` if the registration is still live.
    #[must_use]
    pub fn is_registered(&self, id: RegistrationId) -> bool {
        self.registry.contains(id)
    }

    /// Removes every registration.
    pub fn clear(&self) {
        tracing::debug!("Clearing all registrations");
        self.registry.clear();
    }

    /// Returns the number of live registrations.
    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registry.len()
    }

    /// Subscribes to every event delivered from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.feed.subscribe()
    }

    /// Delivers one bus event to every matching registration.
    pub fn deliver(&self, action: Action, property: Property) {
        let event = Event::new(action, property);
        let diagnostics = self.diagnostics();

        if diagnostics.log_driver_actions {
            tracing::info!(
                action = %action,
                device = %event.property().device(),
                name = %event.property().name(),
                "{}",
                event.property()
            );
        }
        let alert = event.property().state() == Some(PropertyState::Alert);
        if diagnostics.log_alert_properties && alert {
            tracing::warn!(
                action = %action,
                device = %event.property().device(),
                name = %event.property().name(),
                "Property in ALERT state"
            );
        }

        self.feed.publish(event.clone());
        self.dispatch(&event, diagnostics);
    }

    /// Delivers an event carrying a wire action tag.
    ///
    /// Unknown tags are logged and dropped.
    pub fn deliver_tagged(&self, action: &str, property: Property) {
        match action.parse::<Action>() {
            Ok(action) => self.deliver(action, property),
            Err(e) => tracing::warn!(
                device = %property.device(),
                name = %property.name(),
                error = %e,
                "Dropping event with unknown action"
            ),
        }
    }

    fn dispatch(&self, event: &Event, diagnostics: DiagnosticsConfig) {
        let property = event.property();

        for entry in self.registry.snapshot() {
            if !entry.accepts.matches(event) {
                continue;
            }
            // A nested deliver from a handler may have used the last run
            if !entry.claim_run() {
                continue;
            }

            if diagnostics.log_dispatching {
                tracing::info!(
                    registration = %entry.id,
                    handler = %entry.handler.name(),
                    action = %event.action(),
                    device = %property.device(),
                    name = %property.name(),
                    "Dispatching event"
                );
            }

            if let Err(e) = entry.invoke(event) {
                if diagnostics.log_callback_exceptions {
                    tracing::warn!(
                        registration = %entry.id,
                        handler = %entry.handler.name(),
                        action = %event.action(),
                        device = %property.device(),
                        name = %property.name(),
                        error = %e,
                        "Handler failed"
                    );
                }
            }
        }

        let pruned = self.registry.prune();
        if pruned > 0 {
            tracing::trace!(pruned, "Pruned exhausted registrations");
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::dispatch::{Accepts, BoxFuture};
    use crate::property::{PropertyKind, SwitchItem};

    fn connection(state: PropertyState) -> Property {
        Property::new(PropertyKind::Switch, "CCD Imager Simulator", "CONNECTION")
            .with_state(state)
            .with_item(SwitchItem::new("CONNECTED", true))
            .unwrap()
    }

    fn counting(counter: &Arc<AtomicU32>) -> Handler {
        let counter = Arc::clone(counter);
        Handler::inline(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn unmatched_event_is_dropped() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicU32::new(0));
        dispatcher
            .register(Registration::new(counting(&hits)).accepts(Accepts::new().name("CCD_IMAGE")))
            .unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.registration_count(), 1);
    }

    #[test]
    fn panicking_handler_is_kept() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(Registration::new(Handler::inline(|_, _| panic!("handler bug"))))
            .unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(dispatcher.registration_count(), 1);
    }

    #[test]
    fn failed_attempt_consumes_a_run() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(Registration::new(Handler::inline(|_, _| panic!("handler bug"))).once())
            .unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(dispatcher.registration_count(), 0);
    }

    #[test]
    fn failed_submission_consumes_a_run() {
        let dispatcher = Dispatcher::new();
        let (queue, receiver) = tokio::sync::mpsc::unbounded_channel::<BoxFuture>();
        drop(receiver);
        dispatcher
            .register(
                Registration::new(Handler::suspending(|_, _| async {}))
                    .scheduler(queue)
                    .run_limit(2),
            )
            .unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(dispatcher.registration_count(), 1);
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(dispatcher.registration_count(), 0);
    }

    #[test]
    fn handler_can_unregister_itself() {
        let dispatcher = Arc::new(Dispatcher::new());
        let hits = Arc::new(AtomicU32::new(0));
        let slot: Arc<Mutex<Option<Handler>>> = Arc::new(Mutex::new(None));

        let handler = {
            let dispatcher = Arc::clone(&dispatcher);
            let hits = Arc::clone(&hits);
            let slot = Arc::clone(&slot);
            Handler::inline(move |_, _| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(me) = slot.lock().take() {
                    dispatcher.unregister(&me);
                }
            })
        };
        *slot.lock() = Some(handler.clone());
        dispatcher.register(Registration::new(handler)).unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.registration_count(), 0);
    }

    #[test]
    fn removal_mid_pass_takes_effect_next_pass() {
        let dispatcher = Arc::new(Dispatcher::new());
        let hits = Arc::new(AtomicU32::new(0));
        let victim = counting(&hits);

        let remover = {
            let dispatcher = Arc::clone(&dispatcher);
            let victim = victim.clone();
            Handler::inline(move |_, _| {
                dispatcher.unregister(&victim);
            })
        };
        dispatcher.register(Registration::new(remover)).unwrap();
        dispatcher.register(Registration::new(victim)).unwrap();

        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        // The victim was already in the first pass's snapshot
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.registration_count(), 1);
    }

    #[test]
    fn remove_by_id_leaves_other_entries() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicU32::new(0));
        let handler = counting(&hits);

        let first = dispatcher.register(Registration::new(handler.clone())).unwrap();
        let second = dispatcher.register(Registration::new(handler)).unwrap();
        assert!(dispatcher.remove(first));
        assert!(!dispatcher.is_registered(first));
        assert!(dispatcher.is_registered(second));

        dispatcher.deliver(Action::Delete, connection(PropertyState::Idle));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deliver_tagged_parses_or_drops() {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher
            .register(Registration::new(Handler::inline(move |action, _| {
                sink.lock().push(action);
            })))
            .unwrap();

        dispatcher.deliver_tagged("define", connection(PropertyState::Idle));
        dispatcher.deliver_tagged("rename", connection(PropertyState::Idle));
        dispatcher.deliver_tagged("DELETE", connection(PropertyState::Idle));
        assert_eq!(*seen.lock(), vec![Action::Define, Action::Delete]);
    }

    #[test]
    fn set_diagnostics_replaces_config() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.diagnostics(), DiagnosticsConfig::default());

        dispatcher.set_diagnostics(DiagnosticsConfig::all(true));
        assert_eq!(dispatcher.diagnostics(), DiagnosticsConfig::all(true));

        // Logging everything must not change dispatch outcomes
        let hits = Arc::new(AtomicU32::new(0));
        dispatcher.register(Registration::new(counting(&hits))).unwrap();
        dispatcher
            .register(Registration::new(Handler::inline(|_, _| panic!("noisy"))))
            .unwrap();
        dispatcher.deliver(Action::Update, connection(PropertyState::Alert));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[derive(Clone, Default)]
    struct LogSink(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `deliveries` under a capturing subscriber and returns the log text.
    fn logs_with(diagnostics: DiagnosticsConfig, deliveries: impl FnOnce(&Dispatcher)) -> String {
        let sink = LogSink::default();
        let writer = {
            let sink = sink.clone();
            move || sink.clone()
        };
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let dispatcher = Dispatcher::with_diagnostics(diagnostics);
        tracing::subscriber::with_default(subscriber, || deliveries(&dispatcher));
        String::from_utf8_lossy(&sink.0.lock()).into_owned()
    }

    fn deliver_to_panicking_handler(dispatcher: &Dispatcher) {
        dispatcher
            .register(Registration::new(Handler::inline(|_, _| panic!("handler bug"))))
            .unwrap();
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
    }

    #[test]
    fn callback_exceptions_toggle_gates_failure_log() {
        let quiet = DiagnosticsConfig::all(false);
        let logs = logs_with(quiet, deliver_to_panicking_handler);
        assert!(!logs.contains("Handler failed"), "{logs}");

        let loud = quiet.with_callback_exceptions(true);
        let logs = logs_with(loud, deliver_to_panicking_handler);
        assert!(logs.contains("Handler failed"), "{logs}");
        assert!(logs.contains("handler bug"), "{logs}");
    }

    #[test]
    fn dispatching_toggle_gates_per_handler_log() {
        let deliver = |dispatcher: &Dispatcher| {
            let hits = Arc::new(AtomicU32::new(0));
            dispatcher.register(Registration::new(counting(&hits))).unwrap();
            dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        };

        let logs = logs_with(DiagnosticsConfig::all(false), deliver);
        assert!(!logs.contains("Dispatching event"), "{logs}");

        let logs = logs_with(DiagnosticsConfig::all(false).with_dispatching(true), deliver);
        assert!(logs.contains("Dispatching event"), "{logs}");
    }

    #[test]
    fn alert_toggle_gates_alert_log() {
        let deliver = |dispatcher: &Dispatcher| {
            dispatcher.deliver(Action::Update, connection(PropertyState::Alert));
            dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        };

        let logs = logs_with(DiagnosticsConfig::all(false), deliver);
        assert!(!logs.contains("Property in ALERT state"), "{logs}");

        let logs = logs_with(DiagnosticsConfig::all(false).with_alert_properties(true), deliver);
        assert_eq!(logs.matches("Property in ALERT state").count(), 1, "{logs}");
    }

    #[test]
    fn driver_actions_toggle_gates_event_log() {
        let deliver = |dispatcher: &Dispatcher| {
            dispatcher.deliver(Action::Define, connection(PropertyState::Idle));
        };

        let logs = logs_with(DiagnosticsConfig::all(false), deliver);
        assert!(!logs.contains("CONNECTION"), "{logs}");

        let logs = logs_with(DiagnosticsConfig::all(false).with_driver_actions(true), deliver);
        assert!(logs.contains("CONNECTION"), "{logs}");
    }

    #[test]
    fn submission_to_stopped_runtime_is_reported() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let diagnostics = DiagnosticsConfig::all(false).with_callback_exceptions(true);
        let logs = logs_with(diagnostics, |dispatcher| {
            dispatcher
                .register(
                    Registration::new(Handler::suspending(move |_, _| {
                        let counter = Arc::clone(&counter);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }
                    }))
                    .scheduler(handle)
                    .once(),
                )
                .unwrap();
            dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
            assert_eq!(dispatcher.registration_count(), 0);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(logs.contains("Handler failed"), "{logs}");
    }

    #[tokio::test]
    async fn feed_receives_delivered_events() {
        let dispatcher = Dispatcher::new().with_feed_capacity(4);
        let mut feed = dispatcher.subscribe();

        dispatcher.deliver(Action::Define, connection(PropertyState::Idle));

        let event = feed.recv().await.unwrap();
        assert_eq!(event.action(), Action::Define);
        assert_eq!(event.property().name(), "CONNECTION");
    }

    #[test]
    fn clear_drops_everything() {
        let dispatcher = Dispatcher::new();
        let hits = Arc::new(AtomicU32::new(0));
        dispatcher.register(Registration::new(counting(&hits))).unwrap();
        dispatcher.register(Registration::new(counting(&hits))).unwrap();

        dispatcher.clear();
        dispatcher.deliver(Action::Update, connection(PropertyState::Ok));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.registration_count(), 0);
    }
}
