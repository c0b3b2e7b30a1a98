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

//! # Routed Triangle

use super::{iface, ip, route, ExampleNetwork};
use crate::model::{DeviceCatalog, DeviceKind::*, Link, Observation, ObservationSet};

/// Predicate of OSPF adjacencies
pub const OSPF_PREDICATE: &str = "options.ospf selection.name 'map' == and";
/// Predicate of PIM adjacencies
pub const PIM_PREDICATE: &str = "options.pim";

/// # Routed Triangle
///
/// Three routers connected in a triangle, with a LAN behind `r3` and an external gateway behind
/// `r1`:
///
/// ```text
///           gw (192.168.0.1, external)
///           |
///           | 192.168.0.0/24
///           |
///          r1 (10.0.1.1)
///         /  \
///  10.12/24    10.13/24
///       /      \
///  r2 (10.0.2.2) --- r3 (10.0.3.3) --- 10.3.0.0/24 --- h3 (10.3.0.10)
///          10.23/24
/// ```
///
/// - Every router reports its OSPF neighbors, except that `r3` does not report `r2`.
/// - `r1` and `r3` are PIM neighbors.
/// - `r2` reports `r1` as rendezvous point and bootstrap router.
/// - `r3` rebooted 30 seconds ago, and `eth1` of `r2` changed its status 20 seconds ago.
pub struct RoutedTriangle {}

impl ExampleNetwork for RoutedTriangle {
    fn catalog() -> DeviceCatalog {
        let mut c = DeviceCatalog::new();
        c.add_device("r1", ip("10.0.1.1"), Snmp, "cisco-router").unwrap();
        c.add_device("r2", ip("10.0.2.2"), Snmp, "cisco-router").unwrap();
        c.add_device("r3", ip("10.0.3.3"), Snmp, "cisco-router").unwrap();
        c.add_device("h3", ip("10.3.0.10"), LinuxSsh, "linux-host").unwrap();
        c.add_device("gw", ip("192.168.0.1"), External, "").unwrap();
        c.add_link("r1", "gw").unwrap();
        c
    }

    fn observations() -> ObservationSet {
        let mut obs = ObservationSet::new();

        obs.insert(
            "r1".to_string(),
            Observation {
                uptime: Some(3.0 * 86400.0),
                system_info: "Cisco IOS Software".to_string(),
                interfaces: vec![
                    iface("1", "lo", "10.0.1.1", "255.255.255.255"),
                    iface("2", "eth0", "10.12.0.1", "255.255.255.0"),
                    iface("3", "eth1", "10.13.0.1", "255.255.255.0"),
                    iface("4", "eth2", "192.168.0.2", "255.255.255.0"),
                ],
                routes: vec![
                    route("0.0.0.0", "0.0.0.0", Some("192.168.0.1"), "netmgmt", 1, "4"),
                    route("10.12.0.0", "255.255.255.0", None, "local", 0, "2"),
                    route("10.13.0.0", "255.255.255.0", None, "local", 0, "3"),
                    route("10.3.0.0", "255.255.255.0", Some("10.13.0.3"), "ospf", 20, "3"),
                ],
                links: vec![
                    link("10.12.0.2", OSPF_PREDICATE, &["2 minutes old", "broadcast", "cost 10"]),
                    link("10.13.0.3", OSPF_PREDICATE, &["2 minutes old", "broadcast", "cost 10"]),
                    link("10.13.0.3", PIM_PREDICATE, &["1 minute old", "sparse"]),
                ],
                ..Default::default()
            },
        );

        let mut r2_eth1 = iface("3", "eth1", "10.23.0.2", "255.255.255.0");
        r2_eth1.last_changed = Some(11500.0);
        obs.insert(
            "r2".to_string(),
            Observation {
                uptime: Some(11520.0),
                interfaces: vec![
                    iface("1", "lo", "10.0.2.2", "255.255.255.255"),
                    iface("2", "eth0", "10.12.0.2", "255.255.255.0"),
                    r2_eth1,
                ],
                routes: vec![
                    route("0.0.0.0", "0.0.0.0", Some("10.12.0.1"), "ospf", 110, "2"),
                    route("10.12.0.0", "255.255.255.0", None, "local", 0, "2"),
                    route("10.23.0.0", "255.255.255.0", None, "local", 0, "3"),
                ],
                links: vec![
                    link("10.12.0.1", OSPF_PREDICATE, &["2 minutes old", "broadcast", "cost 10"]),
                    link("10.23.0.3", OSPF_PREDICATE, &["20 seconds old", "broadcast", "cost 10"]),
                ],
                pim_rps: vec![ip("10.0.1.1")],
                pim_bsrs: vec![ip("10.0.1.1")],
                ..Default::default()
            },
        );

        obs.insert(
            "r3".to_string(),
            Observation {
                uptime: Some(30.0),
                interfaces: vec![
                    iface("1", "lo", "10.0.3.3", "255.255.255.255"),
                    iface("2", "eth0", "10.13.0.3", "255.255.255.0"),
                    iface("3", "eth1", "10.23.0.3", "255.255.255.0"),
                    iface("4", "eth2", "10.3.0.1", "255.255.255.0"),
                ],
                routes: vec![
                    route("0.0.0.0", "0.0.0.0", Some("10.13.0.1"), "ospf", 110, "2"),
                    route("10.13.0.0", "255.255.255.0", None, "local", 0, "2"),
                    route("10.3.0.0", "255.255.255.0", None, "local", 0, "4"),
                ],
                links: vec![
                    link("10.13.0.1", OSPF_PREDICATE, &["2 minutes old", "broadcast", "cost 10"]),
                    link("10.13.0.1", PIM_PREDICATE, &["1 minute old", "sparse"]),
                    link("10.99.0.1", OSPF_PREDICATE, &["5 seconds old"]),
                ],
                ..Default::default()
            },
        );

        obs.insert(
            "h3".to_string(),
            Observation {
                uptime: Some(4000.0),
                system_info: "Linux h3 5.10.0".to_string(),
                interfaces: vec![iface("1", "eth0", "10.3.0.10", "255.255.255.0")],
                routes: vec![
                    route("0.0.0.0", "0.0.0.0", Some("10.3.0.1"), "static", 0, "1"),
                    route("10.3.0.0", "255.255.255.0", None, "kernel", 0, "1"),
                ],
                ..Default::default()
            },
        );

        obs
    }
}

fn link(peer: &str, predicate: &str, labels: &[&str]) -> Link {
    Link {
        peer_ip: ip(peer),
        predicate: predicate.to_string(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}
