// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event handlers.
//!
//! A [`Handler`] wraps either an inline closure, run synchronously inside
//! the dispatch pass, or a suspending closure whose future is handed to a
//! [`TaskScheduler`](super::TaskScheduler).
//!
//! Handlers have identity: clones of a handler are the same handler, so
//! keeping a clone is enough to unregister every entry it was registered
//! with later.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

use crate::error::DispatchFailure;
use crate::event::Action;
use crate::property::Property;

/// A boxed future, as submitted to a scheduler.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Type alias for inline handler bodies.
pub(crate) type InlineFn = dyn Fn(Action, &Property) + Send + Sync;

/// Type alias for suspending handler bodies.
pub(crate) type SuspendingFn = dyn Fn(Action, Arc<Property>) -> BoxFuture + Send + Sync;

/// How a handler is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Called synchronously inside the dispatch pass.
    Inline,
    /// Turned into a future and submitted to a scheduler.
    Suspending,
}

pub(crate) enum Body {
    Inline(Arc<InlineFn>),
    Suspending(Arc<SuspendingFn>),
}

/// A handler for bus events.
///
/// # Examples
///
/// ```
/// use indigo_dispatch::dispatch::{ExecutionMode, Handler};
///
/// let print = Handler::inline(|action, prop| println!("{action}: {prop}"));
/// assert_eq!(print.mode(), ExecutionMode::Inline);
///
/// let same = print.clone();
/// assert_eq!(print, same);
///
/// let save = Handler::suspending(|_action, prop| async move {
///     let _bytes = prop.blob_value("IMAGE").map(<[u8]>::len);
/// })
/// .named("save_image");
/// assert_eq!(save.name(), "save_image");
/// assert_ne!(print, save);
/// ```
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    body: Arc<Body>,
}

impl Handler {
    /// Wraps a closure that runs inside the dispatch pass.
    ///
    /// A panic in the closure is caught by the dispatcher and logged; it
    /// never reaches the bus.
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(Action, &Property) + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(std::any::type_name::<F>()),
            body: Arc::new(Body::Inline(Arc::new(f))),
        }
    }

    /// Wraps a closure returning a future, to be run on a scheduler.
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(Action, Arc<Property>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let body: Arc<SuspendingFn> =
            Arc::new(move |action, property| -> BoxFuture { Box::pin(f(action, property)) });
        Self {
            name: Arc::from(std::any::type_name::<F>()),
            body: Arc::new(Body::Suspending(body)),
        }
    }

    /// Replaces the name used in diagnostics.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    /// Returns the name used in diagnostics.
    ///
    /// Defaults to the closure's type name, which includes its module path.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how the handler is run.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        match *self.body {
            Body::Inline(_) => ExecutionMode::Inline,
            Body::Suspending(_) => ExecutionMode::Suspending,
        }
    }

    /// Returns `true` if both values are the same handler.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("mode", &self.mode())
            .finish()
    }
}

/// Runs an inline body, turning a panic into a [`DispatchFailure`].
pub(crate) fn call_inline(
    body: &InlineFn,
    action: Action,
    property: &Property,
) -> Result<(), DispatchFailure> {
    catch_unwind(AssertUnwindSafe(|| body(action, property)))
        .map_err(|payload| DispatchFailure::HandlerPanicked(panic_message(payload.as_ref())))
}

/// Builds the future of a suspending body.
///
/// The closure itself runs synchronously, so it can panic before any
/// future exists.
pub(crate) fn make_task(
    body: &SuspendingFn,
    action: Action,
    property: Arc<Property>,
) -> Result<BoxFuture, DispatchFailure> {
    catch_unwind(AssertUnwindSafe(|| body(action, property)))
        .map_err(|payload| DispatchFailure::HandlerPanicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
