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

//! Test the identity resolver

use crate::example_networks::*;
use crate::model::{AdminIp, DeviceCatalog, DeviceKind, Network, Observation, HOST_MASK, SENTINEL};
use crate::reconcile::{IdentityResolver, Owner};
use lazy_static::lazy_static;
use maplit::hashmap;
use std::net::Ipv4Addr;
use std::sync::Arc;

lazy_static! {
    static ref R1: AdminIp = ip("10.0.1.1");
    static ref R2: AdminIp = ip("10.0.2.2");
    static ref R3: AdminIp = ip("10.0.3.3");
    static ref H3: AdminIp = ip("10.3.0.10");
    static ref GW: AdminIp = ip("192.168.0.1");
    static ref MASK_24: Ipv4Addr = ip("255.255.255.0");
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn resolve_interface_address() {
    let net = RoutedTriangle::net();
    let r = IdentityResolver::new(&net);
    assert_eq!(r.resolve(*R2, ip("10.12.0.1"), HOST_MASK), Some(*R1));
    assert_eq!(r.resolve(*R1, ip("10.3.0.10"), HOST_MASK), Some(*H3));
    assert_eq!(r.resolve(*R1, ip("10.23.0.3"), HOST_MASK), Some(*R3));
    // the observer never resolves to itself
    assert_eq!(r.resolve(*R1, ip("10.12.0.1"), HOST_MASK), None);
    assert_eq!(r.resolve(*R1, ip("10.99.0.1"), HOST_MASK), None);

    match r.lookup(*R2, ip("10.12.0.1"), HOST_MASK) {
        Some(Owner::Polled(device, iface)) => {
            assert_eq!(device.name(), "r1");
            assert_eq!(iface.name, "eth0");
        }
        o => panic!("unexpected owner: {:?}", o),
    }
}

#[test]
fn declared_device_takes_precedence() {
    let net = RoutedTriangle::net();
    let r = IdentityResolver::new(&net);
    // 192.168.0.2 is an interface of r1, but gw is declared in the same subnet and not polled
    assert_eq!(r.resolve(*R2, ip("192.168.0.2"), *MASK_24), Some(*GW));
    assert_eq!(r.resolve(*R2, ip("192.168.0.2"), HOST_MASK), Some(*R1));
    match r.lookup(*R2, ip("192.168.0.1"), HOST_MASK) {
        Some(Owner::Declared(entry)) => assert_eq!(entry.name, "gw"),
        o => panic!("unexpected owner: {:?}", o),
    }
}

#[test]
fn declared_device_takes_precedence_minimal() {
    let gw = ip("10.0.0.1");
    let router = ip("10.1.1.1");
    let other = ip("10.2.2.2");

    let mut catalog = DeviceCatalog::new();
    catalog.add_device("router", router, DeviceKind::Snmp, "cisco-router").unwrap();
    catalog.add_device("other", other, DeviceKind::Snmp, "cisco-router").unwrap();
    let observations = || {
        hashmap! {
            "router".to_string() => Observation {
                interfaces: vec![crate::model::Interface {
                    index: "1".to_string(),
                    name: "eth0".to_string(),
                    status: "up".to_string(),
                    ip: Some(ip("10.0.0.5")),
                    net_mask: Some(*MASK_24),
                    ..Default::default()
                }],
                ..Default::default()
            },
            "other".to_string() => Observation::default(),
        }
    };

    // without the gateway, the router owns the subnet
    let net = Network::new(Arc::new(catalog.clone()), observations());
    let r = IdentityResolver::new(&net);
    assert_eq!(r.resolve(other, gw, *MASK_24), Some(router));

    // with the gateway declared, it wins over the interface of the router
    catalog.add_device("gw", gw, DeviceKind::External, "").unwrap();
    let net = Network::new(Arc::new(catalog), observations());
    let r = IdentityResolver::new(&net);
    assert_eq!(r.resolve(router, gw, *MASK_24), Some(gw));
    assert_eq!(r.resolve(other, gw, *MASK_24), Some(gw));
}

#[test]
fn all_zero_mask_never_resolves() {
    let net = RoutedTriangle::net();
    let r = IdentityResolver::new(&net);
    assert_eq!(r.resolve(*R1, ip("10.12.0.2"), SENTINEL), None);
    assert_eq!(r.resolve(*R1, SENTINEL, SENTINEL), None);
}

#[test]
fn resolve_subnets() {
    let net = RoutedTriangle::net();
    let r = IdentityResolver::new(&net);
    assert_eq!(r.resolve_all(*R1, ip("10.3.0.0"), *MASK_24), vec![*R3, *H3]);
    assert_eq!(r.resolve_all(*R2, SENTINEL, SENTINEL), vec![*R1, *R3, *H3, *GW]);
    assert_eq!(r.resolve_all(*R1, ip("10.12.0.2"), HOST_MASK), vec![*R2]);
    assert_eq!(r.resolve_all(*R1, ip("192.168.0.0"), *MASK_24), vec![*GW]);
    assert_eq!(r.resolve_all(*R1, ip("172.16.0.0"), ip("255.255.0.0")), Vec::<AdminIp>::new());
}

#[test]
fn display_names() {
    let net = RoutedTriangle::net();
    let r = IdentityResolver::new(&net);
    assert_eq!(r.display_name(*R1, ip("10.0.2.2")), "r2");
    assert_eq!(r.display_name(*R1, ip("10.23.0.3")), "r3");
    assert_eq!(r.display_name(*R1, ip("192.168.0.1")), "gw");
    assert_eq!(r.display_name(*R1, ip("10.99.0.1")), "10.99.0.1");
    assert_eq!(r.name_only(ip("10.99.0.1")), None);
}

#[test]
fn down_device_is_declared() {
    let mut observations = RoutedTriangle::observations();
    observations.remove("r2");
    let net = Network::new(Arc::new(RoutedTriangle::catalog()), observations);
    let r = IdentityResolver::new(&net);
    // the administrative IP is still known from the catalog
    assert_eq!(r.resolve(*R1, ip("10.0.2.2"), HOST_MASK), Some(*R2));
    // but the interfaces are not
    assert_eq!(r.resolve(*R1, ip("10.12.0.2"), HOST_MASK), None);
}
