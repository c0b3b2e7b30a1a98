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

//! Test the link reconciler

use crate::example_networks::*;
use crate::model::{AdminIp, Network, ObservationSet};
use crate::reconcile::links;
use crate::reconcile::{Direction, Label, RelationKind::*};
use lazy_static::lazy_static;
use rand::prelude::*;
use std::net::Ipv4Addr;
use std::sync::Arc;

lazy_static! {
    static ref R1: AdminIp = ip("10.0.1.1");
    static ref R2: AdminIp = ip("10.0.2.2");
    static ref R3: AdminIp = ip("10.0.3.3");
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn symmetric_links_are_merged() {
    let relations = links::reconcile(&RoutedTriangle::net());

    let r12 = relations.between(Link, *R1, *R2);
    assert_eq!(r12.len(), 1);
    assert_eq!(r12[0].style.direction, Direction::Bidirectional);
    assert!(!r12[0].style.is_flagged());
    assert_eq!(r12[0].predicate(), OSPF_PREDICATE);
    assert_eq!(r12[0].left_labels, vec![Label::smallest("10.12.0.1", 3)]);
    assert_eq!(r12[0].right_labels, vec![Label::smallest("10.12.0.2", 3)]);
    assert_eq!(
        r12[0].middle_labels,
        vec![
            Label::small("2 minutes old", 1),
            Label::small("broadcast", 2),
            Label::small("cost 10", 3)
        ]
    );

    assert!(relations.between(Link, *R2, *R1).is_empty());
}

#[test]
fn one_sided_link_is_flagged() {
    let relations = links::reconcile(&RoutedTriangle::net());

    let r23 = relations.between(Link, *R2, *R3);
    assert_eq!(r23.len(), 1);
    assert_eq!(r23[0].style.direction, Direction::Directed);
    assert!(r23[0].style.is_flagged());
    assert_eq!(r23[0].style.to_string(), "line-type:directed line-color:red");
    assert!(r23[0].left_labels.is_empty());

    assert!(relations.between(Link, *R3, *R2).is_empty());
}

#[test]
fn predicates_do_not_collide() {
    let relations = links::reconcile(&RoutedTriangle::net());

    let r13 = relations.between(Link, *R1, *R3);
    assert_eq!(r13.len(), 2);
    let mut predicates: Vec<&str> = r13.iter().map(|r| r.predicate()).collect();
    predicates.sort();
    assert_eq!(predicates, vec![OSPF_PREDICATE, PIM_PREDICATE]);
    assert!(r13.iter().all(|r| r.style.direction == Direction::Bidirectional));
}

#[test]
fn unresolved_peers_are_dropped() {
    let relations = links::reconcile(&RoutedTriangle::net());
    // r3 reports a neighbor 10.99.0.1, which does not belong to any device
    assert_eq!(relations.len(), 4);
    assert!(relations.iter().all(|r| r.right_labels[0].label != "10.99.0.1"));
}

#[test]
fn down_device_breaks_symmetry() {
    let mut observations = RoutedTriangle::observations();
    observations.remove("r3");
    let net = Network::new(Arc::new(RoutedTriangle::catalog()), observations);
    let relations = links::reconcile(&net);

    // the interfaces of r3 are unknown, so links towards r3 cannot be resolved
    assert!(relations.between(Link, *R1, *R3).is_empty());
    assert!(relations.between(Link, *R2, *R3).is_empty());
    let r12 = relations.between(Link, *R1, *R2);
    assert_eq!(r12.len(), 1);
    assert_eq!(r12[0].style.direction, Direction::Bidirectional);
}

fn shuffled(seed: u64) -> ObservationSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut observations = RoutedTriangle::observations();
    for observation in observations.values_mut() {
        observation.interfaces.shuffle(&mut rng);
        observation.links.shuffle(&mut rng);
    }
    observations
}

#[test]
fn idempotence() {
    let net = RoutedTriangle::net();
    let relations = links::reconcile(&net);
    assert_eq!(links::reconcile(&net), relations);

    let expected = serde_json::to_string(&relations).unwrap();
    for seed in 0..10 {
        let net = Network::new(Arc::new(RoutedTriangle::catalog()), shuffled(seed));
        assert_eq!(serde_json::to_string(&links::reconcile(&net)).unwrap(), expected);
    }
}
