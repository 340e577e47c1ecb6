// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schedulers for suspending handlers.
//!
//! The dispatcher only ever submits a task and moves on: it never awaits
//! it and never sees how it ends. Failures inside a submitted task are the
//! scheduler's to surface.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::BoxFuture;
use crate::error::SubmitError;

/// Something that accepts tasks for later execution.
pub trait TaskScheduler: Send + Sync {
    /// Hands a task over without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] if the task could not be accepted.
    fn submit(&self, task: BoxFuture) -> Result<(), SubmitError>;
}

/// Spawns each task on the runtime.
///
/// A runtime that has shut down cancels the task on spawn; that is reported
/// as [`SubmitError::Closed`].
impl TaskScheduler for Handle {
    fn submit(&self, task: BoxFuture) -> Result<(), SubmitError> {
        let mut spawned = self.spawn(task);
        if !spawned.is_finished() {
            return Ok(());
        }
        // Finished this early: either it already ran, or it never will
        let mut cx = Context::from_waker(Waker::noop());
        match Pin::new(&mut spawned).poll(&mut cx) {
            Poll::Ready(Err(e)) if e.is_cancelled() => Err(SubmitError::Closed),
            _ => Ok(()),
        }
    }
}

/// Queues tasks for a runner such as [`run_tasks`].
impl TaskScheduler for mpsc::UnboundedSender<BoxFuture> {
    fn submit(&self, task: BoxFuture) -> Result<(), SubmitError> {
        self.send(task).map_err(|_| SubmitError::Closed)
    }
}

/// Queues tasks without waiting for capacity.
impl TaskScheduler for mpsc::Sender<BoxFuture> {
    fn submit(&self, task: BoxFuture) -> Result<(), SubmitError> {
        self.try_send(task).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })
    }
}

/// Runs queued tasks one after another until every sender is gone.
///
/// Pairing this with an unbounded channel gives suspending handlers an
/// ordered, single-task executor.
///
/// # Examples
///
/// ```
/// use indigo_dispatch::dispatch::{BoxFuture, run_tasks};
///
/// # #[tokio::main]
/// # async fn main() {
/// let (queue, receiver) = tokio::sync::mpsc::unbounded_channel::<BoxFuture>();
/// let runner = tokio::spawn(run_tasks(receiver));
/// drop(queue);
/// runner.await.unwrap();
/// # }
/// ```
pub async fn run_tasks(mut receiver: mpsc::UnboundedReceiver<BoxFuture>) {
    while let Some(task) = receiver.recv().await {
        task.await;
    }
}
