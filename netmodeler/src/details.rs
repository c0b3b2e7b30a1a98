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

//! # Device Details
//!
//! Tables shown next to an entity: the system description, the active interfaces and the
//! routing table. Addresses in these tables are replaced by device names wherever the name is
//! known, but they never create any relation.

use crate::model::printer::{cidr, mask_to_subnet};
use crate::model::{AdminIp, Device, Interface, Network};
use crate::reconcile::routes::{resolve_routes, ResolvedRoute};
use crate::reconcile::IdentityResolver;

use serde::Serialize;

/// Details of a single polled device
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceDetails {
    /// Administrative IP of the entity
    pub target: AdminIp,
    /// System description, if the device reported one
    pub system_info: Option<String>,
    /// Active interfaces, in the order the device reported them
    pub interfaces: Vec<InterfaceRow>,
    /// Routing table, sorted by destination
    pub routes: Vec<RouteRow>,
}

/// Row of the interfaces table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceRow {
    /// Name of the interface
    pub name: String,
    /// Address with prefix length, like `10.0.2.1/24`
    pub address: String,
    /// MAC address
    pub mac_addr: String,
    /// Link speed, like `1000.0 Mbps`
    pub speed: String,
    /// MTU, like `1500 B`
    pub mtu: String,
}

impl InterfaceRow {
    fn new(iface: &Interface) -> Self {
        let address = match (iface.ip, iface.net_mask) {
            (Some(ip), Some(mask)) => format!("{}/{}", ip, mask_to_subnet(mask)),
            (Some(ip), None) => ip.to_string(),
            (None, _) => String::new(),
        };
        Self {
            name: iface.name.clone(),
            address,
            mac_addr: iface.mac_addr.clone().unwrap_or_default(),
            speed: iface.speed.map(|s| format!("{:.1} Mbps", s / 1e6)).unwrap_or_default(),
            mtu: iface.mtu.map(|m| format!("{} B", m)).unwrap_or_default(),
        }
    }
}

/// Row of the routing table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteRow {
    /// Destination in CIDR notation, prefixed by the device name if it is a single device
    pub destination: String,
    /// Next hop, prefixed by the device name if it is known. Empty for direct routes.
    pub via: String,
    /// Name of the source interface
    pub out: String,
    /// Protocol which installed the route
    pub protocol: String,
    /// Metric of the route
    pub cost: i64,
}

impl RouteRow {
    fn new(resolver: &IdentityResolver, route: &ResolvedRoute) -> Self {
        let mut destination = cidr(route.route.dst_subnet, route.route.dst_mask);
        if let [dst] = route.dst_admin_ips.as_slice() {
            if let Some(name) = resolver.name_only(*dst) {
                destination = format!("{} {}", name, destination);
            }
        }

        let via_ip = route.route.via_ip;
        let via = if route.is_direct() {
            String::new()
        } else {
            let name = resolver.display_name(route.src(), via_ip);
            if name == via_ip.to_string() {
                name
            } else {
                format!("{} {}", name, via_ip)
            }
        };

        Self {
            destination,
            via,
            out: route.src_interface.map(|i| i.name.clone()).unwrap_or_default(),
            protocol: route.route.protocol.clone(),
            cost: route.route.metric,
        }
    }
}

/// Compute the details of every polled device, in the order of the catalog.
pub fn device_details(net: &Network) -> Vec<DeviceDetails> {
    let resolver = IdentityResolver::new(net);
    let routes = resolve_routes(&resolver);
    net.polled_devices().map(|d| details_of(&resolver, d, &routes)).collect()
}

fn details_of(
    resolver: &IdentityResolver,
    device: &Device,
    routes: &[ResolvedRoute],
) -> DeviceDetails {
    let system_info = Some(device.system_info()).filter(|s| !s.is_empty()).map(String::from);
    let interfaces = device
        .interfaces()
        .iter()
        .filter(|i| i.is_active() && !i.name.is_empty())
        .map(InterfaceRow::new)
        .collect();
    let mut routes: Vec<RouteRow> = routes
        .iter()
        .filter(|r| r.src() == device.admin_ip())
        .map(|r| RouteRow::new(resolver, r))
        .collect();
    routes.sort_by(|a, b| a.destination.cmp(&b.destination));
    DeviceDetails { target: device.admin_ip(), system_info, interfaces, routes }
}
