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

//! # Device Catalog
//!
//! Static table of all known devices, read from the network file. The catalog is immutable for
//! the duration of a poll cycle, and is shared between the poller and all reconcilers.

use crate::model::types::{AdminIp, CatalogError};
use crate::Error;

use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// Default poll rate in seconds
pub const DEFAULT_POLL_RATE: u64 = 60;

/// How the device is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Queried with SNMP bulk walks
    Snmp,
    /// Queried with commands over SSH
    LinuxSsh,
    /// Not polled at all. Only declared to complete the topology.
    External,
}

impl Default for DeviceKind {
    fn default() -> Self {
        Self::Snmp
    }
}

impl DeviceKind {
    /// Returns true if the poller is expected to collect an observation for this kind.
    pub fn is_pollable(&self) -> bool {
        !matches!(self, Self::External)
    }
}

/// Entry in the device catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Name of the device. Filled from the key of the `devices` map.
    #[serde(skip)]
    pub name: String,
    /// Administrative IP
    pub ip: AdminIp,
    /// Polling kind
    #[serde(rename = "type", default)]
    pub kind: DeviceKind,
    /// Declared capabilities, like `cisco-router` or `linux-host`
    #[serde(default)]
    pub mibs: String,
    /// Names of the devices this one is statically connected to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl CatalogEntry {
    /// Create a new entry without any links
    pub fn new(
        name: impl Into<String>,
        ip: AdminIp,
        kind: DeviceKind,
        mibs: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), ip, kind, mibs: mibs.into(), links: Vec::new() }
    }

    /// Returns true if the device is an end host (as opposed to a router)
    pub fn is_host(&self) -> bool {
        self.mibs.contains("-host")
    }
}

/// # Device Catalog
///
/// Devices are stored by name in a `BTreeMap`, such that iteration is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceCatalog {
    /// Poll interval in seconds
    #[serde(default = "default_poll_rate")]
    pub poll_rate: u64,
    devices: BTreeMap<String, CatalogEntry>,
}

fn default_poll_rate() -> u64 {
    DEFAULT_POLL_RATE
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self { poll_rate: DEFAULT_POLL_RATE, devices: BTreeMap::new() }
    }

    /// Add a device to the catalog. The administrative IP must be unique.
    pub fn add_device(
        &mut self,
        name: impl Into<String>,
        ip: AdminIp,
        kind: DeviceKind,
        mibs: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if let Some(other) = self.by_admin_ip(ip) {
            if other.name != name {
                return Err(CatalogError::DuplicateAdminIp(ip, other.name.clone(), name));
            }
        }
        let entry = CatalogEntry::new(name.clone(), ip, kind, mibs);
        self.devices.insert(name, entry);
        Ok(())
    }

    /// Declare a static link from `source` to `target`. Only `source` must be present in the
    /// catalog, unknown targets are reported while reconciling.
    pub fn add_link(
        &mut self,
        source: &str,
        target: impl Into<String>,
    ) -> Result<(), CatalogError> {
        match self.devices.get_mut(source) {
            Some(entry) => {
                entry.links.push(target.into());
                Ok(())
            }
            None => Err(CatalogError::DeviceNameNotFound(source.to_string())),
        }
    }

    /// Parse the catalog from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let mut catalog: Self = serde_json::from_str(s)?;
        catalog.fill_names();
        catalog.check()?;
        Ok(catalog)
    }

    /// Read the catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            "Loaded {} devices from {}",
            catalog.devices.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    fn fill_names(&mut self) {
        for (name, entry) in self.devices.iter_mut() {
            entry.name = name.clone();
        }
    }

    fn check(&self) -> Result<(), CatalogError> {
        let mut seen: BTreeMap<AdminIp, &str> = BTreeMap::new();
        for entry in self.devices.values() {
            if let Some(other) = seen.insert(entry.ip, &entry.name) {
                return Err(CatalogError::DuplicateAdminIp(
                    entry.ip,
                    other.to_string(),
                    entry.name.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Get the entry of a device by name
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.devices.get(name)
    }

    /// Get the entry of a device by its administrative IP
    pub fn by_admin_ip(&self, ip: Ipv4Addr) -> Option<&CatalogEntry> {
        self.devices.values().find(|e| e.ip == ip)
    }

    /// Iterate over all entries, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.devices.values()
    }

    /// Number of devices in the catalog
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if the catalog contains no device
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the administrative IPs of all devices that are statically linked to `name`, in
    /// either direction. Links to unknown devices are skipped silently, as they are already
    /// reported by [`DeviceCatalog::declared_links`].
    pub fn linked_admin_ips(&self, name: &str) -> Vec<AdminIp> {
        let outgoing = self
            .devices
            .get(name)
            .into_iter()
            .flat_map(|e| e.links.iter())
            .filter_map(|target| self.devices.get(target).map(|t| t.ip));
        let incoming = self
            .devices
            .values()
            .filter(|c| c.links.iter().any(|l| l == name))
            .map(|c| c.ip);
        outgoing.chain(incoming).sorted().dedup().collect()
    }

    /// Returns all declared links as pairs of administrative IPs `(source, target)`, in the order
    /// they are declared. Links to unknown devices are logged and skipped.
    pub fn declared_links(&self) -> Vec<(AdminIp, AdminIp)> {
        let mut result = Vec::new();
        for entry in self.devices.values() {
            for target in entry.links.iter() {
                match self.devices.get(target) {
                    Some(t) => result.push((entry.ip, t.ip)),
                    None => error!("Couldn't find link to {} from {}", target, entry.name),
                }
            }
        }
        result
    }
}
