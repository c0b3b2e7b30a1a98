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

//! # Model
//!
//! Typed observations of the devices, the static device catalog, and the network context of a
//! single poll cycle.
//!
//! A [`Network`] is created fresh every cycle from the shared [`DeviceCatalog`] and the
//! [`ObservationSet`] returned by the poller:
//!
//! ```rust
//! use netmodeler::model::{DeviceCatalog, DeviceKind, Network, Observation};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut catalog = DeviceCatalog::new();
//!     catalog.add_device("core", "10.0.0.2".parse()?, DeviceKind::Snmp, "cisco-router")?;
//!     catalog.add_device("gw", "10.0.0.1".parse()?, DeviceKind::External, "")?;
//!     catalog.add_link("core", "gw")?;
//!
//!     let mut observations = HashMap::new();
//!     observations.insert("core".to_string(), Observation::default());
//!
//!     let net = Network::new(Arc::new(catalog), observations);
//!     assert!(net.is_polled("core"));
//!     assert!(!net.is_polled("gw"));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod network;
pub mod printer;
pub mod types;

pub use catalog::{CatalogEntry, DeviceCatalog, DeviceKind};
pub use network::{Device, Network};
pub use types::*;
