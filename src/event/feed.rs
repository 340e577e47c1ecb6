// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast feed of delivered events.

use tokio::sync::broadcast;

use super::Event;

/// Events kept for a slow receiver before the oldest are dropped.
const FEED_CAPACITY: usize = 256;

/// Broadcast feed of every event the dispatcher delivers.
///
/// Receivers only see events published after they subscribed. A receiver
/// that falls more than the capacity behind loses the oldest events and
/// gets `RecvError::Lagged`. Publishing never blocks.
#[derive(Debug)]
pub struct EventFeed {
    sender: broadcast::Sender<Event>,
}

impl EventFeed {
    /// Creates a feed holding up to 256 undelivered events per receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    /// Creates a feed with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::Sender::new(capacity),
        }
    }

    /// Subscribes to the feed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publishes an event. Nobody listening is not an error.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}
