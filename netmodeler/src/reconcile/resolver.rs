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

//! # Identity Resolver
//!
//! Maps an observed address to the administrative IP of the device owning it. Devices only know
//! their own interfaces, so this is the only place where records of different devices are
//! correlated.
//!
//! The lookup is performed in two passes, and the first match wins:
//!
//! 1. **Declared devices**: catalog devices which did not yield an observation this cycle, whose
//!    administrative IP lies in the same subnet as the observed address.
//! 2. **Observed interfaces**: interfaces of every polled device except the observer, whose
//!    address lies in the same subnet as the observed address.

use crate::model::{same_subnet, AdminIp, CatalogEntry, Device, Interface, Network};
use crate::model::{HOST_MASK, SENTINEL};

use log::*;
use std::net::Ipv4Addr;

/// Owner of an observed address
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Owner<'a> {
    /// Device only known from the catalog
    Declared(&'a CatalogEntry),
    /// Polled device, together with the interface carrying the address
    Polled(&'a Device, &'a Interface),
}

impl<'a> Owner<'a> {
    /// Administrative IP of the owner
    pub fn admin_ip(&self) -> AdminIp {
        match self {
            Self::Declared(entry) => entry.ip,
            Self::Polled(device, _) => device.admin_ip(),
        }
    }

    /// Interface carrying the address, if the owner was polled
    pub fn interface(&self) -> Option<&'a Interface> {
        match self {
            Self::Declared(_) => None,
            Self::Polled(_, iface) => Some(*iface),
        }
    }
}

/// Identity resolver for a single poll cycle
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver<'a> {
    net: &'a Network,
}

impl<'a> IdentityResolver<'a> {
    /// Create a resolver over the given network
    pub fn new(net: &'a Network) -> Self {
        Self { net }
    }

    /// The network this resolver works on
    pub fn net(&self) -> &'a Network {
        self.net
    }

    /// Find the owner of `ip`, observed by the device `observer`. A mask of `0.0.0.0` would match
    /// every device, and thus never resolves.
    pub fn lookup(&self, observer: AdminIp, ip: Ipv4Addr, mask: Ipv4Addr) -> Option<Owner<'a>> {
        if mask == SENTINEL {
            debug!("Refusing to resolve {} with an all-zero mask", ip);
            return None;
        }

        // declared-device pass
        if let Some(device) = self
            .net
            .devices()
            .iter()
            .filter(|d| !d.is_polled())
            .find(|d| same_subnet(d.admin_ip(), ip, mask))
        {
            return Some(Owner::Declared(device.entry()));
        }

        // observed-interface pass
        for device in self.net.polled_devices().filter(|d| d.admin_ip() != observer) {
            for iface in device.interfaces() {
                if let Some(iface_ip) = iface.ip {
                    if same_subnet(iface_ip, ip, mask) {
                        return Some(Owner::Polled(device, iface));
                    }
                }
            }
        }

        None
    }

    /// Resolve `ip`, observed by `observer`, to the administrative IP of its owner.
    pub fn resolve(&self, observer: AdminIp, ip: Ipv4Addr, mask: Ipv4Addr) -> Option<AdminIp> {
        let result = self.lookup(observer, ip, mask).map(|o| o.admin_ip());
        if result.is_none() {
            trace!("Could not resolve {}/{} observed by {}", ip, mask, observer);
        }
        result
    }

    /// Resolve every device reachable in the subnet, seen from `observer`. The result is sorted
    /// and never contains the observer itself.
    ///
    /// - A host mask resolves to at most a single device.
    /// - An all-zero mask (default route) resolves to every other device of the catalog.
    /// - Any other mask resolves to every device owning an address in that subnet.
    pub fn resolve_all(&self, observer: AdminIp, subnet: Ipv4Addr, mask: Ipv4Addr) -> Vec<AdminIp> {
        let mut result: Vec<AdminIp> = if mask == HOST_MASK {
            self.resolve(observer, subnet, mask).into_iter().collect()
        } else if mask == SENTINEL {
            self.net
                .devices()
                .iter()
                .map(|d| d.admin_ip())
                .filter(|ip| *ip != observer)
                .collect()
        } else {
            self.net
                .devices()
                .iter()
                .filter(|d| d.admin_ip() != observer)
                .filter(|d| {
                    if d.is_polled() {
                        d.interfaces()
                            .iter()
                            .filter_map(|i| i.ip)
                            .any(|i| same_subnet(i, subnet, mask))
                    } else {
                        same_subnet(d.admin_ip(), subnet, mask)
                    }
                })
                .map(|d| d.admin_ip())
                .collect()
        };
        result.sort();
        result.dedup();
        result
    }

    /// Name of the device owning exactly `ip`, either by its administrative IP or by one of its
    /// observed interfaces.
    pub fn name_only(&self, ip: Ipv4Addr) -> Option<&'a str> {
        if let Some(entry) = self.net.catalog().by_admin_ip(ip) {
            return Some(entry.name.as_str());
        }
        self.net.polled_devices().find(|d| d.owns_ip(ip)).map(|d| d.name())
    }

    /// Human readable name for `ip`, used only for labels. Falls back to the resolved
    /// administrative IP, and finally to the address itself.
    pub fn display_name(&self, observer: AdminIp, ip: Ipv4Addr) -> String {
        if let Some(name) = self.name_only(ip) {
            return name.to_string();
        }
        match self.resolve(observer, ip, HOST_MASK) {
            Some(admin_ip) => admin_ip.to_string(),
            None => ip.to_string(),
        }
    }
}
