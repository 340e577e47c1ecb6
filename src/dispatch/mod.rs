// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute-filtered event dispatch.
//!
//! # Overview
//!
//! The dispatch engine consists of:
//!
//! - [`Accepts`] - Declarative filter over event fields
//! - [`Handler`] - Inline or suspending closure with identity
//! - [`TaskScheduler`] - Where suspending handlers are submitted
//! - [`Registration`] - Handler, filter, run limit and scheduler, checked at registration
//! - [`Dispatcher`] - Owns the registry and runs each delivered event through it
//!
//! # Usage
//!
//! ```
//! use indigo_dispatch::dispatch::{
//!     Accepts, BoxFuture, Dispatcher, Handler, Registration, run_tasks,
//! };
//! use indigo_dispatch::event::Action;
//! use indigo_dispatch::property::{Property, PropertyKind};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let dispatcher = Dispatcher::new();
//!
//! // Runs inside the dispatch pass.
//! dispatcher
//!     .register(
//!         Registration::new(Handler::inline(|action, prop| println!("{action}: {prop}")))
//!             .accepts(Accepts::new().action(Action::Update).name("CONNECTION")),
//!     )
//!     .unwrap();
//!
//! // Runs later, on a task queue.
//! let (queue, receiver) = tokio::sync::mpsc::unbounded_channel::<BoxFuture>();
//! let runner = tokio::spawn(run_tasks(receiver));
//! dispatcher
//!     .register(
//!         Registration::new(Handler::suspending(|_, prop| async move {
//!             let _size = prop.blob_value("IMAGE").map(<[u8]>::len);
//!         }))
//!         .accepts(Accepts::new().name("CCD_IMAGE"))
//!         .scheduler(queue),
//!     )
//!     .unwrap();
//!
//! dispatcher.deliver(Action::Update, Property::new(PropertyKind::Blob, "CCD", "CCD_IMAGE"));
//!
//! dispatcher.clear();
//! runner.await.unwrap();
//! # }
//! ```

mod dispatcher;
mod filter;
mod handler;
mod registry;
mod scheduler;

pub use dispatcher::Dispatcher;
pub use filter::{Accepts, FILTER_FIELDS};
pub use handler::{BoxFuture, ExecutionMode, Handler};
pub use registry::{Registration, RegistrationId};
pub use scheduler::{TaskScheduler, run_tasks};
