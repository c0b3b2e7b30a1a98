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

//! # Link Reconciler
//!
//! Protocol adjacencies (OSPF, PIM, ...) should always be observed from both ends. Pairs which
//! are reported by both devices are merged into one bidirectional relation, while one-sided
//! observations are emitted as red, directed relations.

use super::relation::*;
use super::resolver::IdentityResolver;
use crate::model::{AdminIp, Link, Network, HOST_MASK};

use log::*;
use std::collections::BTreeMap;

/// Compute the link relations of the network.
pub fn reconcile(net: &Network) -> RelationSet {
    let resolver = IdentityResolver::new(net);

    let mut links: BTreeMap<(AdminIp, AdminIp, String), &Link> = BTreeMap::new();
    for device in net.polled_devices() {
        for link in device.links() {
            match resolver.resolve(device.admin_ip(), link.peer_ip, HOST_MASK) {
                Some(peer) => {
                    links.insert((device.admin_ip(), peer, link.predicate.clone()), link);
                }
                None => warn!("Couldn't find link to {} on {}", link.peer_ip, device.name()),
            }
        }
    }

    let mut result = RelationSet::new();
    for ((a, b, predicate), link, reverse) in pair_up(&links) {
        let (style, left) = match reverse {
            Some(rev) => (
                RelationStyle::bidirectional(),
                vec![Label::smallest(rev.peer_ip.to_string(), 3)],
            ),
            None => {
                debug!("One-sided link from {} to {} ({})", a, b, predicate);
                (RelationStyle::flagged(), Vec::new())
            }
        };
        let key = RelationKey::pair(RelationKind::Link, *a, *b, predicate.as_str());
        result.insert(
            Relation::new(key, style)
                .with_left_labels(left)
                .with_middle_labels(positional_labels(&link.labels))
                .with_right_labels(vec![Label::smallest(link.peer_ip.to_string(), 3)]),
        );
    }
    result
}
