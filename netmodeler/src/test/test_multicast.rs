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

//! Test the multicast reconciler

use crate::example_networks::*;
use crate::model::{AdminIp, Network};
use crate::reconcile::multicast::{self, tree_predicate};
use crate::reconcile::relation::IGMP_PREDICATE;
use crate::reconcile::{Direction, Label, RelationKind::*};
use lazy_static::lazy_static;
use std::net::Ipv4Addr;
use std::sync::Arc;

lazy_static! {
    static ref LEAF: AdminIp = ip("10.0.0.1");
    static ref CORE: AdminIp = ip("10.0.0.2");
    static ref CAMERA: AdminIp = ip("10.0.0.9");
    static ref HOST1: AdminIp = ip("10.0.2.5");
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn predicate() {
    assert_eq!(tree_predicate(ip("226.1.1.1"), ip("10.0.0.9")), "options.226.1.1.1_from_10.0.0.9");
}

#[test]
fn multicast_tree() {
    let relations = multicast::reconcile(&MulticastTree::net());

    let upstream: Vec<_> = relations.of_kind(MulticastUpstream).collect();
    assert_eq!(upstream.len(), 1);
    assert_eq!((upstream[0].left(), upstream[0].right()), (*CORE, *LEAF));
    assert!(upstream[0].predicate().contains("226.1.1.1_from_10.0.0.9"));
    assert_eq!(upstream[0].style.direction, Direction::Directed);
    assert_eq!(
        upstream[0].middle_labels,
        vec![
            Label::small("5 minutes old", 1),
            Label::small("pimSparseMode", 2),
            Label::small("25.0 Kpkt", 3)
        ]
    );

    let downstream: Vec<_> = relations.of_kind(MulticastDownstream).collect();
    assert_eq!(downstream.len(), 1);
    assert_eq!((downstream[0].left(), downstream[0].right()), (*LEAF, *HOST1));
    assert!(downstream[0].predicate().contains("226.1.1.1_from_10.0.0.9"));
    assert_eq!(
        downstream[0].middle_labels,
        vec![Label::small("30 seconds old", 1), Label::small("igmp", 2)]
    );

    let gateway: Vec<_> = relations.of_kind(MulticastGateway).collect();
    assert_eq!(gateway.len(), 1);
    assert_eq!((gateway[0].left(), gateway[0].right()), (*CAMERA, *CORE));
    assert_eq!(gateway[0].predicate(), upstream[0].predicate());

    // locally originated groups have no tree
    assert_eq!(relations.len(), 3);
    assert!(relations.iter().all(|r| !r.predicate().contains("239.255.255.250")));
}

#[test]
fn unresolved_upstream() {
    let mut observations = MulticastTree::observations();
    observations.get_mut("leaf").unwrap().mroutes[0].upstream = ip("10.0.0.77");
    let net = Network::new(Arc::new(MulticastTree::catalog()), observations);
    let relations = multicast::reconcile(&net);

    assert_eq!(relations.of_kind(MulticastUpstream).count(), 0);
    assert_eq!(relations.of_kind(MulticastDownstream).count(), 1);
    assert_eq!(relations.of_kind(MulticastGateway).count(), 1);
}

#[test]
fn igmp_relations() {
    let relations = multicast::igmp_relations(&MulticastTree::net());
    assert_eq!(relations.len(), 1);
    let igmp = relations.between(Igmp, *LEAF, *HOST1);
    assert_eq!(igmp.len(), 1);
    assert_eq!(igmp[0].predicate(), IGMP_PREDICATE);
    assert_eq!(
        igmp[0].middle_labels,
        vec![Label::small("30 seconds old", 1), Label::small("226.1.1.1", 2)]
    );
}
