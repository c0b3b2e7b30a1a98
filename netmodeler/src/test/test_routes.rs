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

//! Test the route reconciler

use crate::example_networks::*;
use crate::model::{AdminIp, Network, ObservationSet, Route};
use crate::reconcile::relation::{Label, NEXT_HOP_PREDICATE};
use crate::reconcile::routes::{self, selection_predicate};
use crate::reconcile::{Direction, LineColor, RelationKind::*, RelationSet};
use lazy_static::lazy_static;
use rand::prelude::*;
use std::net::Ipv4Addr;
use std::sync::Arc;

lazy_static! {
    static ref R1: AdminIp = ip("10.0.1.1");
    static ref R2: AdminIp = ip("10.0.2.2");
    static ref R3: AdminIp = ip("10.0.3.3");
    static ref H3: AdminIp = ip("10.3.0.10");
    static ref GW: AdminIp = ip("192.168.0.1");
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn direction(set: &RelationSet, a: AdminIp, b: AdminIp) -> Option<Direction> {
    let relations = set.between(NextHop, a, b);
    assert!(relations.len() <= 1);
    relations.first().map(|r| r.style.direction)
}

#[test]
fn next_hop_relations() {
    let net = RoutedTriangle::net();
    let (next_hops, _) = routes::reconcile(&net);

    assert_eq!(next_hops.len(), 5);
    assert_eq!(direction(&next_hops, *R1, *R2), Some(Direction::Bidirectional));
    assert_eq!(direction(&next_hops, *R1, *R3), Some(Direction::Bidirectional));
    assert_eq!(direction(&next_hops, *R3, *H3), Some(Direction::Bidirectional));
    assert_eq!(direction(&next_hops, *R1, *GW), Some(Direction::Directed));
    assert_eq!(direction(&next_hops, *R2, *R3), Some(Direction::Directed));

    // the reverse of a bidirectional relation is never emitted
    assert_eq!(direction(&next_hops, *R2, *R1), None);
    assert_eq!(direction(&next_hops, *R3, *R1), None);
    assert_eq!(direction(&next_hops, *H3, *R3), None);

    for relation in next_hops.iter() {
        assert_eq!(relation.predicate(), NEXT_HOP_PREDICATE);
        assert_eq!(relation.middle_labels, vec![Label::small("next hop", 1)]);
    }
}

#[test]
fn default_route_fan_out() {
    let net = RoutedTriangle::net();
    let (_, selection) = routes::reconcile(&net);

    let via_r1: Vec<_> = selection
        .between(Selection, *R2, *R1)
        .into_iter()
        .filter(|r| r.key().dst() != Some(*R1))
        .collect();
    assert_eq!(via_r1.len(), 3);
    assert_eq!(
        via_r1.iter().map(|r| r.key().dst().unwrap()).collect::<Vec<_>>(),
        vec![*R3, *H3, *GW]
    );

    for r in via_r1 {
        let dst = r.key().dst().unwrap();
        assert_eq!(r.predicate(), selection_predicate(dst));
        assert_eq!(r.style.to_string(), "line-type:directed line-color:blue line-width:3");
        assert_eq!(r.middle_labels, vec![Label::small("ospf cost 110", 1)]);
        assert_eq!(
            r.left_labels,
            vec![Label::smaller("eth0", 2), Label::smallest("10.12.0.2", 3)]
        );
        assert_eq!(
            r.right_labels,
            vec![Label::smaller("eth0", 2), Label::smallest("10.12.0.1", 3)]
        );
    }
}

#[test]
fn direct_route_selection() {
    let net = RoutedTriangle::net();
    let (_, selection) = routes::reconcile(&net);

    let direct = selection.between(Selection, *R3, *H3);
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].key().dst(), Some(*H3));
    assert_eq!(direct[0].right_labels, vec![Label::smallest("10.3.0.0/24", 3)]);

    // the next hop is declared, but not polled
    let via_gw = selection.between(Selection, *R1, *GW);
    assert_eq!(via_gw.len(), 3);
    for r in via_gw {
        assert_eq!(r.style.color, Some(LineColor::Blue));
        assert_eq!(r.right_labels, vec![Label::smallest("192.168.0.1", 3)]);
    }
}

#[test]
fn unknown_source_interface() {
    for ifindex in [None, Some("9".to_string())].iter() {
        let mut observations = RoutedTriangle::observations();
        observations.get_mut("r2").unwrap().routes[0].ifindex = ifindex.clone();
        let net = Network::new(Arc::new(RoutedTriangle::catalog()), observations);
        let (next_hops, selection) = routes::reconcile(&net);

        // the route is still used, only its source interface labels are missing
        assert_eq!(direction(&next_hops, *R1, *R2), Some(Direction::Bidirectional));
        let via_r1: Vec<_> = selection
            .between(Selection, *R2, *R1)
            .into_iter()
            .filter(|r| r.key().dst() != Some(*R1))
            .collect();
        assert_eq!(via_r1.len(), 3);
        for r in via_r1 {
            assert!(r.left_labels.is_empty());
            assert_eq!(
                r.right_labels,
                vec![Label::smaller("eth0", 2), Label::smallest("10.12.0.1", 3)]
            );
        }
    }
}

#[test]
fn selection_predicate_string() {
    assert_eq!(
        selection_predicate(*H3),
        "options.ospf options.routes or selection.name '10.3.0.10' ends_with and"
    );
}

fn unmodeled_route(dst: &str, mask: &str, via: &str) -> Route {
    Route {
        dst_subnet: ip(dst),
        dst_mask: ip(mask),
        via_ip: ip(via),
        protocol: "ospf".to_string(),
        metric: 30,
        ifindex: Some("3".to_string()),
    }
}

#[test]
fn unmodeled_via_uses_single_declared_link() {
    let mut catalog = RoutedTriangle::catalog();
    catalog.add_link("r2", "r3").unwrap();
    let mut observations = RoutedTriangle::observations();
    observations
        .get_mut("r2")
        .unwrap()
        .routes
        .push(unmodeled_route("10.3.0.0", "255.255.255.0", "10.23.0.99"));
    let net = Network::new(Arc::new(catalog), observations);
    let (_, selection) = routes::reconcile(&net);

    let fallback: Vec<_> = selection
        .between(Selection, *R2, *R3)
        .into_iter()
        .filter(|r| r.style.color == Some(LineColor::DarkViolet))
        .collect();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].key().dst(), Some(*H3));
    assert!(fallback[0].middle_labels.contains(&Label::small("via isn't modeled", 4)));
    assert_eq!(fallback[0].right_labels, vec![Label::smallest("10.23.0.99", 3)]);
}

#[test]
fn unmodeled_via_uses_declared_links_in_subnet() {
    let mut catalog = RoutedTriangle::catalog();
    catalog.add_link("r1", "r2").unwrap();
    let mut observations = RoutedTriangle::observations();
    let r1 = observations.get_mut("r1").unwrap();
    r1.routes.push(unmodeled_route("192.168.0.0", "255.255.255.0", "10.12.0.77"));
    r1.routes.push(unmodeled_route("172.16.0.0", "255.255.0.0", "10.12.0.77"));
    let net = Network::new(Arc::new(catalog), observations);
    let (_, selection) = routes::reconcile(&net);

    let fallback: Vec<_> = selection
        .of_kind(Selection)
        .filter(|r| r.style.color == Some(LineColor::DarkViolet))
        .collect();
    // the route towards 172.16.0.0/16 matches no declared link, and is dropped
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].left(), *R1);
    assert_eq!(fallback[0].right(), *GW);
    assert_eq!(fallback[0].key().dst(), Some(*GW));
}

fn shuffled(seed: u64) -> ObservationSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut observations = RoutedTriangle::observations();
    for observation in observations.values_mut() {
        observation.interfaces.shuffle(&mut rng);
        observation.routes.shuffle(&mut rng);
        observation.links.shuffle(&mut rng);
    }
    observations
}

#[test]
fn idempotence() {
    let net = RoutedTriangle::net();
    let (next_hops, selection) = routes::reconcile(&net);
    assert_eq!(routes::reconcile(&net), (next_hops.clone(), selection.clone()));

    let expected = serde_json::to_string(&(&next_hops, &selection)).unwrap();
    for seed in 0..10 {
        let net = Network::new(Arc::new(RoutedTriangle::catalog()), shuffled(seed));
        let result = routes::reconcile(&net);
        assert_eq!(serde_json::to_string(&(&result.0, &result.1)).unwrap(), expected);
    }
}
