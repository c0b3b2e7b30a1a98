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

//! Module containing all type definitions of the observed records.
//!
//! Every record is scoped to exactly one device, and is expressed in terms of raw interface
//! addresses. Cross-device correlation only happens inside the [`reconcile`](crate::reconcile)
//! module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Administrative IP of a device. This is the stable identity of a device, chosen at configuration
/// time and independent of the observed interface addresses.
pub type AdminIp = Ipv4Addr;

/// Observations of a single poll cycle, mapping the device name to the collected bundle.
pub type ObservationSet = HashMap<String, Observation>;

/// Sentinel address. As the via of a route, it means "directly attached". As the source of a
/// multicast route, it means "locally originated".
pub const SENTINEL: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Mask selecting a single host
pub const HOST_MASK: Ipv4Addr = Ipv4Addr::BROADCAST;

/// Returns true if both addresses are equal after applying `mask`.
pub fn same_subnet(a: Ipv4Addr, b: Ipv4Addr, mask: Ipv4Addr) -> bool {
    let mask = u32::from(mask);
    u32::from(a) & mask == u32::from(b) & mask
}

/// Catalog Errors
#[derive(Error, Debug, PartialEq)]
pub enum CatalogError {
    /// Two devices are declared with the same administrative IP
    #[error("Administrative IP {0} is declared twice: {1} and {2}")]
    DuplicateAdminIp(AdminIp, String, String),
    /// Device name is not present in the catalog
    #[error("Device name was not found in the catalog: {0}")]
    DeviceNameNotFound(String),
}

/// # Interface
///
/// Interface of a single device. The `index` is opaque and only used to correlate records of the
/// same device (e.g., the source interface of a route).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Interface {
    /// Device-local index
    pub index: String,
    /// Name of the interface, like `eth1`
    pub name: String,
    /// Operational status, like `up`, `down` or `dormant`
    pub status: String,
    /// Address of the interface. May not be set if the interface is inactive.
    pub ip: Option<Ipv4Addr>,
    /// Network mask of the interface
    pub net_mask: Option<Ipv4Addr>,
    /// MAC address, like `00:19:BB:5F:59:8A`
    pub mac_addr: Option<String>,
    /// Link speed in bps
    pub speed: Option<f64>,
    /// MTU in bytes
    pub mtu: Option<u32>,
    /// Received octets
    pub in_octets: Option<f64>,
    /// Sent octets
    pub out_octets: Option<f64>,
    /// Time of the last status change, in seconds since the device booted
    pub last_changed: Option<f64>,
}

impl Interface {
    /// Returns true if the interface is able to communicate.
    pub fn is_active(&self) -> bool {
        self.status == "up" || self.status == "dormant"
    }
}

/// # Route
///
/// Entry of the routing table of a single device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Route {
    /// Destination subnet
    pub dst_subnet: Ipv4Addr,
    /// Mask of the destination subnet. `0.0.0.0` for the default route.
    pub dst_mask: Ipv4Addr,
    /// Next hop. `0.0.0.0` if the destination is directly attached.
    pub via_ip: Ipv4Addr,
    /// Protocol which installed the route, like `ospf` or `local`
    #[serde(default)]
    pub protocol: String,
    /// Metric of the route
    #[serde(default)]
    pub metric: i64,
    /// Index of the source interface
    #[serde(default)]
    pub ifindex: Option<String>,
}

impl Route {
    /// Returns true if the route has no next hop.
    pub fn is_direct(&self) -> bool {
        self.via_ip == SENTINEL
    }
}

/// # Link
///
/// Directly observed protocol adjacency (e.g. an OSPF or PIM neighbor). Opposed to a route, which
/// only represents reachability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    /// Address of the neighbor
    pub peer_ip: Ipv4Addr,
    /// Predicate used to tag the relation
    pub predicate: String,
    /// At most three free-text labels (age, protocol mode, cost)
    #[serde(default)]
    pub labels: Vec<String>,
}

/// # Multicast Route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MRoute {
    /// Multicast group
    pub group: Ipv4Addr,
    /// Source of the traffic. `0.0.0.0` if this device originates the group.
    pub source: Ipv4Addr,
    /// Upstream neighbor
    pub upstream: Ipv4Addr,
    /// Protocol, like `pimSparse`
    #[serde(default)]
    pub protocol: Option<String>,
    /// Uptime in seconds
    #[serde(default)]
    pub uptime: Option<f64>,
    /// Number of forwarded packets
    #[serde(default)]
    pub packets: Option<f64>,
    /// Number of forwarded octets
    #[serde(default)]
    pub octets: Option<f64>,
}

impl MRoute {
    /// Returns true if the device originates the traffic of this group.
    pub fn is_local(&self) -> bool {
        self.source == SENTINEL
    }
}

/// # IGMP Cache Entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Igmp {
    /// Multicast group
    pub group: Ipv4Addr,
    /// Last neighbor which reported membership
    pub reporter: Ipv4Addr,
    /// Status of the entry
    #[serde(default)]
    pub status: String,
    /// Age of the report in seconds
    #[serde(default)]
    pub age: Option<f64>,
}

/// # Observation
///
/// Bundle of all records collected from a single device during one poll cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Observation {
    /// Uptime of the device in seconds
    pub uptime: Option<f64>,
    /// Free-text (markdown) system information
    pub system_info: String,
    /// All interfaces
    pub interfaces: Vec<Interface>,
    /// Routing table
    pub routes: Vec<Route>,
    /// Protocol adjacencies
    pub links: Vec<Link>,
    /// Multicast routing table
    pub mroutes: Vec<MRoute>,
    /// IGMP cache
    pub igmps: Vec<Igmp>,
    /// Addresses this device thinks are PIM rendezvous points
    pub pim_rps: Vec<Ipv4Addr>,
    /// Addresses this device thinks are PIM bootstrap routers
    pub pim_bsrs: Vec<Ipv4Addr>,
}
