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

//! # Multicast Tree

use super::{iface, ip, route, ExampleNetwork};
use crate::model::{DeviceCatalog, DeviceKind::*, Igmp, MRoute, Observation, ObservationSet};

/// # Multicast Tree
///
/// A camera streams the group `226.1.1.1` through `core` and `leaf` towards `host1`.
///
/// ```text
/// camera (10.0.0.9)   core (10.0.0.2)   leaf (10.0.0.1)
///        |                   |                |
///        +-------------------+----------------+  10.0.0.0/24
///                                             |
///                                             |  10.0.2.0/24
///                                             |
///                                      host1 (10.0.2.5)
/// ```
///
/// - `leaf` reports the multicast route `226.1.1.1` from `10.0.0.9` with upstream `10.0.0.2`.
/// - `leaf` reports an IGMP membership of `10.0.2.5` for `226.1.1.1`.
/// - `core` reports a locally originated multicast route, which is ignored.
pub struct MulticastTree {}

impl ExampleNetwork for MulticastTree {
    fn catalog() -> DeviceCatalog {
        let mut c = DeviceCatalog::new();
        c.add_device("leaf", ip("10.0.0.1"), Snmp, "cisco-router").unwrap();
        c.add_device("core", ip("10.0.0.2"), Snmp, "cisco-router").unwrap();
        c.add_device("camera", ip("10.0.0.9"), LinuxSsh, "linux-host").unwrap();
        c.add_device("host1", ip("10.0.2.5"), LinuxSsh, "linux-host").unwrap();
        c
    }

    fn observations() -> ObservationSet {
        let mut obs = ObservationSet::new();

        obs.insert(
            "core".to_string(),
            Observation {
                uptime: Some(7200.0),
                interfaces: vec![iface("1", "eth0", "10.0.0.2", "255.255.255.0")],
                routes: vec![
                    route("10.0.0.0", "255.255.255.0", None, "local", 0, "1"),
                    route("10.0.2.0", "255.255.255.0", Some("10.0.0.1"), "ospf", 20, "1"),
                ],
                mroutes: vec![MRoute {
                    group: ip("239.255.255.250"),
                    source: ip("0.0.0.0"),
                    upstream: ip("0.0.0.0"),
                    protocol: Some("local".to_string()),
                    uptime: None,
                    packets: None,
                    octets: None,
                }],
                pim_rps: vec![ip("10.0.0.2")],
                ..Default::default()
            },
        );

        obs.insert(
            "leaf".to_string(),
            Observation {
                uptime: Some(7200.0),
                interfaces: vec![
                    iface("1", "eth0", "10.0.0.1", "255.255.255.0"),
                    iface("2", "eth1", "10.0.2.1", "255.255.255.0"),
                ],
                routes: vec![
                    route("0.0.0.0", "0.0.0.0", Some("10.0.0.2"), "ospf", 110, "1"),
                    route("10.0.2.0", "255.255.255.0", None, "local", 0, "2"),
                ],
                mroutes: vec![MRoute {
                    group: ip("226.1.1.1"),
                    source: ip("10.0.0.9"),
                    upstream: ip("10.0.0.2"),
                    protocol: Some("pimSparseMode".to_string()),
                    uptime: Some(300.0),
                    packets: Some(25_000.0),
                    octets: Some(30_000_000.0),
                }],
                igmps: vec![Igmp {
                    group: ip("226.1.1.1"),
                    reporter: ip("10.0.2.5"),
                    status: "active".to_string(),
                    age: Some(30.0),
                }],
                pim_rps: vec![ip("10.0.0.2")],
                ..Default::default()
            },
        );

        obs.insert(
            "camera".to_string(),
            Observation {
                uptime: Some(90000.0),
                interfaces: vec![iface("1", "eth0", "10.0.0.9", "255.255.255.0")],
                routes: vec![route("0.0.0.0", "0.0.0.0", Some("10.0.0.2"), "static", 0, "1")],
                ..Default::default()
            },
        );

        obs.insert(
            "host1".to_string(),
            Observation {
                uptime: Some(600.0),
                interfaces: vec![iface("1", "eth0", "10.0.2.5", "255.255.255.0")],
                routes: vec![route("0.0.0.0", "0.0.0.0", Some("10.0.2.1"), "static", 0, "1")],
                ..Default::default()
            },
        );

        obs
    }
}
