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

//! Networks for testing

use crate::model::{DeviceCatalog, Interface, Network, ObservationSet, Route, SENTINEL};
use std::net::Ipv4Addr;
use std::sync::Arc;

mod routed_triangle;
pub use routed_triangle::{RoutedTriangle, OSPF_PREDICATE, PIM_PREDICATE};

mod multicast_tree;
pub use multicast_tree::MulticastTree;

/// Trait for easier access to example networks.
pub trait ExampleNetwork {
    /// Get the device catalog
    fn catalog() -> DeviceCatalog;
    /// Get the observations of a cycle in which every pollable device answered
    fn observations() -> ObservationSet;
    /// Get the network of a cycle in which every pollable device answered
    fn net() -> Network {
        Network::new(Arc::new(Self::catalog()), Self::observations())
    }
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn iface(index: &str, name: &str, addr: &str, mask: &str) -> Interface {
    Interface {
        index: index.to_string(),
        name: name.to_string(),
        status: "up".to_string(),
        ip: Some(ip(addr)),
        net_mask: Some(ip(mask)),
        speed: Some(1e9),
        mtu: Some(1500),
        ..Default::default()
    }
}

fn route(
    dst: &str,
    mask: &str,
    via: Option<&str>,
    protocol: &str,
    metric: i64,
    ifindex: &str,
) -> Route {
    Route {
        dst_subnet: ip(dst),
        dst_mask: ip(mask),
        via_ip: via.map(ip).unwrap_or(SENTINEL),
        protocol: protocol.to_string(),
        metric,
        ifindex: Some(ifindex.to_string()),
    }
}
