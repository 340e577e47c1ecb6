// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registrations and the registry that holds them.
//!
//! - [`Registration`] - Builder describing what to run, for which events, how often
//! - [`RegistrationId`] - Handle for removing a single registration
//! - `Registry` - Internal, lock-guarded list of live entries

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::handler::{self, Body, Handler, InlineFn, SuspendingFn};
use super::{Accepts, TaskScheduler};
use crate::error::{ConfigurationError, DispatchFailure};
use crate::event::Event;

/// Unique identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reg({})", self.0)
    }
}

/// Describes a handler registration.
///
/// # Examples
///
/// ```
/// use indigo_dispatch::dispatch::{Accepts, Dispatcher, Handler, Registration};
/// use indigo_dispatch::event::Action;
///
/// let dispatcher = Dispatcher::new();
/// let id = dispatcher
///     .register(
///         Registration::new(Handler::inline(|_, prop| println!("{prop}")))
///             .accepts(Accepts::new().action(Action::Update).name("CONNECTION"))
///             .once(),
///     )
///     .unwrap();
/// assert!(dispatcher.remove(id));
/// ```
#[derive(Clone)]
pub struct Registration {
    pub(crate) handler: Handler,
    pub(crate) accepts: Accepts,
    run_limit: Option<u32>,
    scheduler: Option<Arc<dyn TaskScheduler>>,
}

impl Registration {
    /// Starts a registration that fires on every event, forever.
    #[must_use]
    pub fn new(handler: Handler) -> Self {
        Self {
            handler,
            accepts: Accepts::default(),
            run_limit: None,
            scheduler: None,
        }
    }

    /// Sets the filter.
    #[must_use]
    pub fn accepts(mut self, accepts: Accepts) -> Self {
        self.accepts = accepts;
        self
    }

    /// Limits the number of runs. Zero is rejected at registration.
    #[must_use]
    pub fn run_limit(mut self, runs: u32) -> Self {
        self.run_limit = Some(runs);
        self
    }

    /// Limits the registration to a single run.
    #[must_use]
    pub fn once(self) -> Self {
        self.run_limit(1)
    }

    /// Sets the scheduler for a suspending handler.
    #[must_use]
    pub fn scheduler(self, scheduler: impl TaskScheduler + 'static) -> Self {
        self.shared_scheduler(Arc::new(scheduler))
    }

    /// Sets a scheduler shared with other registrations.
    #[must_use]
    pub fn shared_scheduler(mut self, scheduler: Arc<dyn TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Returns the filter.
    #[must_use]
    pub fn filter(&self) -> &Accepts {
        &self.accepts
    }

    /// Checks the registration and turns it into a live entry.
    fn into_entry(self, id: RegistrationId) -> Result<CallbackEntry, ConfigurationError> {
        if self.run_limit == Some(0) {
            return Err(ConfigurationError::ZeroRunLimit);
        }
        let invocation = match (self.handler.body(), self.scheduler) {
            (Body::Inline(body), None) => Invocation::Inline(Arc::clone(body)),
            (Body::Suspending(body), Some(scheduler)) => {
                Invocation::Scheduled(Arc::clone(body), scheduler)
            }
            (Body::Inline(_), Some(_)) => {
                return Err(ConfigurationError::UnexpectedScheduler(
                    self.handler.name().to_string(),
                ));
            }
            (Body::Suspending(_), None) => {
                return Err(ConfigurationError::MissingScheduler(
                    self.handler.name().to_string(),
                ));
            }
        };

        Ok(CallbackEntry {
            id,
            handler: self.handler,
            accepts: self.accepts,
            remaining: self.run_limit.map(AtomicU32::new),
            invocation,
        })
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handler", &self.handler)
            .field("accepts", &self.accepts)
            .field("run_limit", &self.run_limit)
            .field("has_scheduler", &self.scheduler.is_some())
            .finish()
    }
}

enum Invocation {
    Inline(Arc<InlineFn>),
    Scheduled(Arc<SuspendingFn>, Arc<dyn TaskScheduler>),
}

/// One live registration.
pub(crate) struct CallbackEntry {
    pub(crate) id: RegistrationId,
    pub(crate) handler: Handler,
    pub(crate) accepts: Accepts,
    remaining: Option<AtomicU32>,
    invocation: Invocation,
}

impl CallbackEntry {
    /// Takes one run from a bounded entry.
    ///
    /// Returns `false` once the entry is exhausted.
    pub(crate) fn claim_run(&self) -> bool {
        match &self.remaining {
            None => true,
            Some(remaining) => remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok(),
        }
    }

    /// Runs left, or `None` if unbounded.
    pub(crate) fn remaining_runs(&self) -> Option<u32> {
        self.remaining
            .as_ref()
            .map(|remaining| remaining.load(Ordering::Acquire))
    }

    fn is_exhausted(&self) -> bool {
        self.remaining_runs() == Some(0)
    }

    /// Calls the handler inline or submits it to the scheduler.
    pub(crate) fn invoke(&self, event: &Event) -> Result<(), DispatchFailure> {
        match &self.invocation {
            Invocation::Inline(body) => {
                handler::call_inline(body.as_ref(), event.action(), event.property())
            }
            Invocation::Scheduled(body, scheduler) => {
                let task =
                    handler::make_task(body.as_ref(), event.action(), event.shared_property())?;
                scheduler.submit(task)?;
                Ok(())
            }
        }
    }
}

/// The live registrations, in registration order.
///
/// All access goes through one mutex. Dispatch passes iterate a snapshot
/// and never hold the lock while handlers run, so handlers may register
/// and unregister freely.
pub(crate) struct Registry {
    next_id: AtomicU64,
    entries: Mutex<Vec<Arc<CallbackEntry>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn register(
        &self,
        registration: Registration,
    ) -> Result<RegistrationId, ConfigurationError> {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = registration.into_entry(id)?;
        tracing::debug!(
            registration = %id,
            handler = %entry.handler.name(),
            accepts = ?entry.accepts,
            runs = ?entry.remaining_runs(),
            "Registering handler"
        );
        self.entries.lock().push(Arc::new(entry));
        Ok(id)
    }

    /// Removes every entry of the handler. Returns how many were removed.
    pub(crate) fn unregister(&self, handler: &Handler) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| !entry.handler.same_as(handler));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(handler = %handler.name(), removed, "Unregistered handler");
        }
        removed
    }

    pub(crate) fn remove(&self, id: RegistrationId) -> bool {
        let mut entries = self.entries.lock();
        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        entries.remove(position);
        tracing::debug!(registration = %id, "Removed registration");
        true
    }

    /// Drops exhausted entries. Returns how many were dropped.
    pub(crate) fn prune(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|entry| {
            let exhausted = entry.is_exhausted();
            if exhausted {
                tracing::trace!(
                    registration = %entry.id,
                    handler = %entry.handler.name(),
                    "Pruning exhausted registration"
                );
            }
            !exhausted
        });
        before - entries.len()
    }

    /// Point-in-time copy of the entries, for one dispatch pass.
    pub(crate) fn snapshot(&self) -> Vec<Arc<CallbackEntry>> {
        self.entries.lock().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn contains(&self, id: RegistrationId) -> bool {
        self.entries.lock().iter().any(|entry| entry.id == id)
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entry_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::BoxFuture;
    use crate::event::Action;
    use crate::property::{Property, PropertyKind};

    fn event() -> Event {
        Event::new(
            Action::Update,
            Property::new(PropertyKind::Switch, "CCD", "CONNECTION"),
        )
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let registry = Registry::new();
        let a = registry.register(Registration::new(Handler::inline(|_, _| {}))).unwrap();
        let b = registry.register(Registration::new(Handler::inline(|_, _| {}))).unwrap();
        assert!(a < b);
        assert_eq!(a.to_string(), format!("Reg({})", a.value()));
    }

    #[test]
    fn zero_run_limit_is_rejected() {
        let registry = Registry::new();
        let err = registry
            .register(Registration::new(Handler::inline(|_, _| {})).run_limit(0))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::ZeroRunLimit);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn inline_with_scheduler_is_rejected() {
        let registry = Registry::new();
        let (queue, _rx) = tokio::sync::mpsc::unbounded_channel::<BoxFuture>();
        let err = registry
            .register(
                Registration::new(Handler::inline(|_, _| {}).named("printer")).scheduler(queue),
            )
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnexpectedScheduler("printer".to_string()));
    }

    #[test]
    fn suspending_without_scheduler_is_rejected() {
        let registry = Registry::new();
        let err = registry
            .register(Registration::new(
                Handler::suspending(|_, _| async {}).named("saver"),
            ))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::MissingScheduler("saver".to_string()));
    }

    #[test]
    fn unregister_removes_every_entry_of_handler() {
        let registry = Registry::new();
        let handler = Handler::inline(|_, _| {});
        let other = Handler::inline(|_, _| {});

        registry.register(Registration::new(handler.clone())).unwrap();
        registry
            .register(Registration::new(handler.clone()).accepts(Accepts::new().name("CCD_IMAGE")))
            .unwrap();
        registry.register(Registration::new(other)).unwrap();

        assert_eq!(registry.unregister(&handler), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.unregister(&handler), 0);
    }

    #[test]
    fn remove_by_id() {
        let registry = Registry::new();
        let id = registry.register(Registration::new(Handler::inline(|_, _| {}))).unwrap();
        assert!(registry.contains(id));
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(!registry.contains(id));
    }

    #[test]
    fn claim_run_counts_down_and_prune_drops() {
        let registry = Registry::new();
        registry
            .register(Registration::new(Handler::inline(|_, _| {})).run_limit(2))
            .unwrap();
        let entry = Arc::clone(&registry.snapshot()[0]);

        assert!(entry.claim_run());
        assert_eq!(registry.prune(), 0);
        assert!(entry.claim_run());
        assert!(!entry.claim_run());
        assert_eq!(entry.remaining_runs(), Some(0));
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_changes() {
        let registry = Registry::new();
        registry.register(Registration::new(Handler::inline(|_, _| {}))).unwrap();
        let snapshot = registry.snapshot();

        registry.register(Registration::new(Handler::inline(|_, _| {}))).unwrap();
        registry.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn submission_failure_is_reported() {
        let registry = Registry::new();
        let (queue, rx) = tokio::sync::mpsc::unbounded_channel::<BoxFuture>();
        drop(rx);
        registry
            .register(Registration::new(Handler::suspending(|_, _| async {})).scheduler(queue))
            .unwrap();

        let entry = Arc::clone(&registry.snapshot()[0]);
        assert_eq!(
            entry.invoke(&event()),
            Err(DispatchFailure::Submission(crate::error::SubmitError::Closed))
        );
    }
}
