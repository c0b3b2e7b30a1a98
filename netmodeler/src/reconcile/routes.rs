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

//! # Route Reconciler
//!
//! Folds the routing tables of all devices into two relation sets:
//!
//! - **next-hop** relations, one per pair of devices where one forwards traffic to the other,
//!   deduplicated by their reverse key.
//! - **selection** relations, keyed by `(src, via, dst)`, telling which destinations are reached
//!   over which next hop.
//!
//! If the next hop of a route is not modeled at all (neither polled nor declared), the selection
//! relations fall back to the static links of the catalog. These relations are colored dark
//! violet.

use super::relation::*;
use super::resolver::{IdentityResolver, Owner};
use crate::model::printer::mask_to_subnet;
use crate::model::{same_subnet, AdminIp, Device, Interface, Network, Route, HOST_MASK};

use log::*;
use std::collections::BTreeMap;

/// Route together with the result of all lookups.
#[derive(Debug, Clone)]
pub struct ResolvedRoute<'a> {
    /// Device which reported the route
    pub device: &'a Device,
    /// The route itself
    pub route: &'a Route,
    /// Interface referenced by the route's ifindex
    pub src_interface: Option<&'a Interface>,
    /// Owner of the next hop
    pub via: Option<Owner<'a>>,
    /// All devices in the destination subnet
    pub dst_admin_ips: Vec<AdminIp>,
}

impl<'a> ResolvedRoute<'a> {
    /// Resolve all addresses of a single route.
    pub fn new(resolver: &IdentityResolver<'a>, device: &'a Device, route: &'a Route) -> Self {
        let src_interface = route.ifindex.as_deref().and_then(|idx| device.find_ifindex(idx));
        if src_interface.is_none() {
            warn!(
                "Couldn't find an interface for route to {}/{} on {}",
                route.dst_subnet,
                route.dst_mask,
                device.name()
            );
        }
        let via = if route.is_direct() || device.owns_ip(route.via_ip) {
            None
        } else {
            resolver.lookup(device.admin_ip(), route.via_ip, HOST_MASK)
        };
        let dst_admin_ips =
            resolver.resolve_all(device.admin_ip(), route.dst_subnet, route.dst_mask);
        Self { device, route, src_interface, via, dst_admin_ips }
    }

    /// Administrative IP of the device reporting the route
    pub fn src(&self) -> AdminIp {
        self.device.admin_ip()
    }

    /// Administrative IP of the next hop
    pub fn via_admin_ip(&self) -> Option<AdminIp> {
        self.via.map(|o| o.admin_ip())
    }

    /// Returns true if the destination is attached to the device itself. Routes pointing at one
    /// of the device's own addresses are direct as well.
    pub fn is_direct(&self) -> bool {
        self.route.is_direct() || self.device.owns_ip(self.route.via_ip)
    }

    /// Returns true if the route has a next hop which could not be resolved.
    pub fn has_unmodeled_via(&self) -> bool {
        !self.is_direct() && self.via.is_none()
    }
}

/// Resolve every route of every polled device, in the order of the catalog.
pub fn resolve_routes<'a>(resolver: &IdentityResolver<'a>) -> Vec<ResolvedRoute<'a>> {
    let net = resolver.net();
    net.polled_devices()
        .flat_map(|d| d.routes().iter().map(move |r| (d, r)))
        .map(|(d, r)| ResolvedRoute::new(resolver, d, r))
        .collect()
}

/// Compute the next-hop and the selection relations of the network.
pub fn reconcile(net: &Network) -> (RelationSet, RelationSet) {
    let resolver = IdentityResolver::new(net);
    let routes = resolve_routes(&resolver);
    let next_hops = next_hop_relations(&routes);
    let selection = selection_relations(net, &routes);
    debug!(
        "Route reconciler: {} next-hop and {} selection relations from {} routes",
        next_hops.len(),
        selection.len(),
        routes.len()
    );
    (next_hops, selection)
}

/// Next-hop relations. If both ends forward to each other, a single bidirectional relation is
/// emitted for the pair, with the smaller administrative IP on the left.
pub fn next_hop_relations(routes: &[ResolvedRoute]) -> RelationSet {
    let mut hops: BTreeMap<(AdminIp, AdminIp, ()), &ResolvedRoute> = BTreeMap::new();
    for r in routes {
        let src = r.src();
        match r.via_admin_ip() {
            Some(via) => {
                if via != src {
                    hops.insert((src, via, ()), r);
                }
            }
            None => {
                for dst in r.dst_admin_ips.iter().filter(|dst| **dst != src) {
                    hops.insert((src, *dst, ()), r);
                }
            }
        }
    }

    let mut result = RelationSet::new();
    for ((a, b, _), _, reverse) in pair_up(&hops) {
        let style = match reverse {
            Some(_) => RelationStyle::bidirectional(),
            None => RelationStyle::directed(),
        };
        let key = RelationKey::pair(RelationKind::NextHop, *a, *b, NEXT_HOP_PREDICATE);
        let middle = vec![Label::small("next hop", 1)];
        result.insert(Relation::new(key, style).with_middle_labels(middle));
    }
    result
}

/// Predicate selecting the relations towards a single destination
pub fn selection_predicate(dst: AdminIp) -> String {
    format!("options.ospf options.routes or selection.name '{}' ends_with and", dst)
}

/// Selection relations `(src, via, dst)`, with one relation per destination.
pub fn selection_relations(net: &Network, routes: &[ResolvedRoute]) -> RelationSet {
    let mut selected: BTreeMap<(AdminIp, AdminIp, AdminIp), &ResolvedRoute> = BTreeMap::new();
    for r in routes {
        let src = r.src();
        if let Some(via) = r.via_admin_ip() {
            for dst in r.dst_admin_ips.iter().filter(|dst| **dst != via) {
                selected.insert((src, via, *dst), r);
            }
        } else if r.has_unmodeled_via() {
            let links = net.catalog().linked_admin_ips(r.device.name());
            if links.len() == 1 {
                let link = links[0];
                for dst in r.dst_admin_ips.iter().filter(|dst| **dst != link) {
                    selected.insert((src, link, *dst), r);
                }
            } else {
                let mut found = false;
                for link in links
                    .iter()
                    .filter(|l| same_subnet(**l, r.route.dst_subnet, r.route.dst_mask))
                {
                    selected.insert((src, *link, *link), r);
                    found = true;
                }
                if !found {
                    error!(
                        "Couldn't find dst {} via {} from {}",
                        r.route.dst_subnet,
                        r.route.via_ip,
                        r.device.name()
                    );
                }
            }
        } else {
            for dst in r.dst_admin_ips.iter() {
                selected.insert((src, *dst, *dst), r);
            }
        }
    }

    let mut result = RelationSet::new();
    for ((src, via, dst), r) in selected {
        result.insert(selection_relation(src, via, dst, r));
    }
    result
}

fn selection_relation(src: AdminIp, via: AdminIp, dst: AdminIp, r: &ResolvedRoute) -> Relation {
    let mut left = Vec::new();
    if let Some(iface) = r.src_interface {
        left.push(Label::smaller(iface.name.as_str(), 2));
        if let Some(ip) = iface.ip {
            left.push(Label::smallest(ip.to_string(), 3));
        }
        if let Some(mac) = iface.mac_addr.as_ref() {
            left.push(Label::smallest(mac.as_str(), 4));
        }
    }

    let mut middle = vec![Label::small(format!("{} cost {}", r.route.protocol, r.route.metric), 1)];
    let color = if r.has_unmodeled_via() {
        middle.push(Label::small("via isn't modeled", 4));
        LineColor::DarkViolet
    } else {
        LineColor::Blue
    };

    let via_iface = r.via.and_then(|o| o.interface());
    let mut right = Vec::new();
    if let Some(iface) = via_iface {
        right.push(Label::smaller(iface.name.as_str(), 2));
    }
    if !r.route.is_direct() {
        right.push(Label::smallest(r.route.via_ip.to_string(), 3));
    } else {
        right.push(Label::smallest(
            format!("{}/{}", r.route.dst_subnet, mask_to_subnet(r.route.dst_mask)),
            3,
        ));
    }
    if let Some(mac) = via_iface.and_then(|i| i.mac_addr.as_ref()) {
        right.push(Label::smallest(mac.as_str(), 4));
    }

    let key = RelationKey::triple(RelationKind::Selection, src, via, dst, selection_predicate(dst));
    Relation::new(key, RelationStyle::directed().with_color(color).with_width(3))
        .with_left_labels(left)
        .with_middle_labels(middle)
        .with_right_labels(right)
}
