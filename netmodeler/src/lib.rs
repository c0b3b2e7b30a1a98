// NetModeler: Reconciling Polled Device Observations into a Network Topology
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

#![deny(missing_docs)]

//! # NetModeler: Reconciling Polled Device Observations into a Network Topology
//!
//! This is a library for polling independently managed network devices, and reconciling their
//! observations into one consistent topology. Every device only reports what it knows itself
//! (interface addresses, routing table, protocol neighbors, multicast state), always in terms of
//! raw interface addresses. This library maps all these addresses to the administrative identity
//! of the devices, and folds all records into a single, deduplicated relation graph.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Model`](model)**: Typed observations of a single device, the static
//!   [`DeviceCatalog`](model::DeviceCatalog) and the [`Network`](model::Network) context of a
//!   single poll cycle.
//!
//! - **[`Reconcilers`](reconcile)**: The [`IdentityResolver`](reconcile::IdentityResolver), and
//!   the reconcilers for [routes](reconcile::routes), [links](reconcile::links) and
//!   [multicast trees](reconcile::multicast). Every reconciler returns a
//!   [`RelationSet`](reconcile::RelationSet), which is ordered by the key of the relations. Hence,
//!   the output is deterministic and independent of the order in which devices answered.
//!
//! - **[`Topology`](topology)**: The [`TopologyAssembler`](topology::TopologyAssembler) merges
//!   all relations and adds entities, labels and alerts, producing a
//!   [`Snapshot`](topology::Snapshot).
//!
//! - **[`Details`](details)**: System info, interfaces and routing table of every polled device,
//!   attached to the snapshot.
//!
//! - **[`Poller`](poller)**: Poll loop, querying all devices in parallel using a
//!   [`Collector`](poller::Collector), and reconciling the result on a fixed interval.
//!
//! - **[`ExampleNetworks`](example_networks)**: Collection of prepared catalogs and observations.
//!
//! ## Usage
//!
//! ```
//! use netmodeler::model::Network;
//! use netmodeler::topology::TopologyAssembler;
//! use netmodeler::reconcile::RelationKind;
//! use std::sync::Arc;
//! # use netmodeler::example_networks::*;
//!
//! fn main() -> Result<(), netmodeler::Error> {
//!     // prepare the catalog and the observations of this cycle
//!     // let catalog = ...
//!     // let observations = ...
//! # let catalog = RoutedTriangle::catalog();
//! # let observations = RoutedTriangle::observations();
//!
//!     let net = Network::new(Arc::new(catalog), observations);
//!     let snapshot = TopologyAssembler::new().assemble(&net);
//!
//!     for relation in snapshot.relations.of_kind(RelationKind::NextHop) {
//!         println!("{} -> {}: {}", relation.left(), relation.right(), relation.style);
//!     }
//!
//!     Ok(())
//! }
//! ```

// test modules
pub mod example_networks;
mod test;

pub mod details;
mod error;
pub mod model;
pub mod poller;
pub mod reconcile;
pub mod topology;

pub use error::Error;

use std::sync::{Arc, RwLock};

/// Stopper, to check when to stop, or to send the stop command
#[derive(Clone, Debug)]
pub struct Stopper {
    b: Arc<RwLock<bool>>,
}

impl Default for Stopper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopper {
    /// Create a new stopper
    pub fn new() -> Self {
        Self { b: Arc::new(RwLock::new(false)) }
    }

    /// Send the stop command. This function will block until the write lock can be acquired.
    pub fn send_stop(&self) {
        match self.b.write() {
            Ok(mut b) => *b = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
    }

    /// Checks if the stop flag is set. This funciton will block until the read lock can be
    /// acquired.
    pub fn is_stop(&self) -> bool {
        match self.b.read() {
            Ok(b) => *b,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
