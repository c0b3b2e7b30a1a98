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

//! # Multicast Reconciler
//!
//! Builds one distribution tree per `(group, source)`. Every tree has its own predicate, such
//! that it can be selected on its own. Upstream and downstream relations are never merged with
//! their reverse.

use super::relation::*;
use super::resolver::IdentityResolver;
use crate::model::printer::{secs_to_str, to_si};
use crate::model::{Device, Igmp, MRoute, Network, HOST_MASK};

use log::*;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Predicate of the tree of `group`, originated at `source`.
pub fn tree_predicate(group: Ipv4Addr, source: Ipv4Addr) -> String {
    format!("options.{}_from_{}", group, source)
}

/// Compute the upstream, downstream and gateway relations of all multicast trees.
pub fn reconcile(net: &Network) -> RelationSet {
    let resolver = IdentityResolver::new(net);
    let mut result = RelationSet::new();
    let mut trees: BTreeSet<(Ipv4Addr, Ipv4Addr)> = BTreeSet::new();

    for device in net.polled_devices() {
        for mroute in device.mroutes().iter().filter(|m| !m.is_local()) {
            let predicate = tree_predicate(mroute.group, mroute.source);
            trees.insert((mroute.group, mroute.source));

            match resolver.resolve(device.admin_ip(), mroute.upstream, HOST_MASK) {
                Some(upstream) => {
                    let key = RelationKey::pair(
                        RelationKind::MulticastUpstream,
                        upstream,
                        device.admin_ip(),
                        predicate.as_str(),
                    );
                    result.insert(
                        Relation::new(key, RelationStyle::directed())
                            .with_middle_labels(positional_labels(&upstream_labels(mroute))),
                    );
                }
                None => debug!(
                    "Couldn't resolve upstream {} of {} on {}",
                    mroute.upstream,
                    mroute.group,
                    device.name()
                ),
            }

            for igmp in device.igmps().iter().filter(|i| i.group == mroute.group) {
                let reporter = resolver.resolve(device.admin_ip(), igmp.reporter, HOST_MASK);
                if let Some(reporter) = reporter {
                    let key = RelationKey::pair(
                        RelationKind::MulticastDownstream,
                        device.admin_ip(),
                        reporter,
                        predicate.as_str(),
                    );
                    let mut middle = Vec::new();
                    if let Some(age) = igmp.age {
                        middle.push(Label::small(format!("{} old", secs_to_str(age)), 1));
                    }
                    middle.push(Label::small("igmp", 2));
                    let relation = Relation::new(key, RelationStyle::directed());
                    result.insert(relation.with_middle_labels(middle));
                }
            }
        }
    }

    for (group, source) in trees {
        gateway_relations(&resolver, group, source, &mut result);
    }
    result
}

fn upstream_labels(mroute: &MRoute) -> Vec<String> {
    vec![
        mroute.uptime.map(|u| format!("{} old", secs_to_str(u))).unwrap_or_default(),
        mroute.protocol.clone().unwrap_or_default(),
        mroute.packets.map(|p| format!("{}pkt", to_si(p))).unwrap_or_default(),
    ]
}

/// The device owning the source address forwards the traffic to all its gateways.
fn gateway_relations(
    resolver: &IdentityResolver,
    group: Ipv4Addr,
    source: Ipv4Addr,
    result: &mut RelationSet,
) {
    let net = resolver.net();
    let origin: Option<&Device> = net.polled_devices().find(|d| d.owns_ip(source));
    let origin = match origin {
        Some(d) => d,
        None => return,
    };
    let predicate = tree_predicate(group, source);
    for route in origin.routes().iter().filter(|r| !r.is_direct()) {
        if let Some(via) = resolver.resolve(origin.admin_ip(), route.via_ip, HOST_MASK) {
            let key = RelationKey::pair(
                RelationKind::MulticastGateway,
                origin.admin_ip(),
                via,
                predicate.as_str(),
            );
            result.insert(
                Relation::new(key, RelationStyle::directed())
                    .with_middle_labels(vec![Label::small("gateway", 2)]),
            );
        }
    }
}

/// IGMP relations from every device towards the hosts which reported a membership.
pub fn igmp_relations(net: &Network) -> RelationSet {
    let resolver = IdentityResolver::new(net);
    let mut result = RelationSet::new();
    for device in net.polled_devices() {
        for igmp in device.igmps() {
            match resolver.resolve(device.admin_ip(), igmp.reporter, HOST_MASK) {
                Some(reporter) => {
                    result.insert(igmp_relation(device, reporter, igmp));
                }
                None => trace!("Unknown IGMP reporter {} on {}", igmp.reporter, device.name()),
            }
        }
    }
    result
}

fn igmp_relation(device: &Device, reporter: Ipv4Addr, igmp: &Igmp) -> Relation {
    let key = RelationKey::pair(RelationKind::Igmp, device.admin_ip(), reporter, IGMP_PREDICATE);
    let mut middle = Vec::new();
    if let Some(age) = igmp.age {
        middle.push(Label::small(format!("{} old", secs_to_str(age)), 1));
    }
    middle.push(Label::small(igmp.group.to_string(), 2));
    Relation::new(key, RelationStyle::directed()).with_middle_labels(middle)
}
