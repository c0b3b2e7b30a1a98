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

//! Module defining the network context of a single poll cycle.

use crate::model::catalog::{CatalogEntry, DeviceCatalog};
use crate::model::types::*;

use log::*;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// # Device
///
/// A catalog entry together with the observation of the current cycle. A device without an
/// observation is considered down, and all its record collections are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    entry: CatalogEntry,
    observation: Option<Observation>,
}

impl Device {
    /// Create a new device
    pub fn new(entry: CatalogEntry, observation: Option<Observation>) -> Self {
        Self { entry, observation }
    }

    /// Name of the device
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Administrative IP of the device
    pub fn admin_ip(&self) -> AdminIp {
        self.entry.ip
    }

    /// Catalog entry of the device
    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    /// Observation of this cycle
    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    /// Returns true if an observation was collected this cycle
    pub fn is_polled(&self) -> bool {
        self.observation.is_some()
    }

    /// Uptime in seconds
    pub fn uptime(&self) -> Option<f64> {
        self.observation.as_ref().and_then(|o| o.uptime)
    }

    /// System information
    pub fn system_info(&self) -> &str {
        self.observation.as_ref().map(|o| o.system_info.as_str()).unwrap_or("")
    }

    /// Observed interfaces
    pub fn interfaces(&self) -> &[Interface] {
        self.observation.as_ref().map(|o| o.interfaces.as_slice()).unwrap_or(&[])
    }

    /// Observed routes
    pub fn routes(&self) -> &[Route] {
        self.observation.as_ref().map(|o| o.routes.as_slice()).unwrap_or(&[])
    }

    /// Observed adjacencies
    pub fn links(&self) -> &[Link] {
        self.observation.as_ref().map(|o| o.links.as_slice()).unwrap_or(&[])
    }

    /// Observed multicast routes
    pub fn mroutes(&self) -> &[MRoute] {
        self.observation.as_ref().map(|o| o.mroutes.as_slice()).unwrap_or(&[])
    }

    /// Observed IGMP cache
    pub fn igmps(&self) -> &[Igmp] {
        self.observation.as_ref().map(|o| o.igmps.as_slice()).unwrap_or(&[])
    }

    /// Reported rendezvous points
    pub fn pim_rps(&self) -> &[Ipv4Addr] {
        self.observation.as_ref().map(|o| o.pim_rps.as_slice()).unwrap_or(&[])
    }

    /// Reported bootstrap routers
    pub fn pim_bsrs(&self) -> &[Ipv4Addr] {
        self.observation.as_ref().map(|o| o.pim_bsrs.as_slice()).unwrap_or(&[])
    }

    /// Returns the interface with the given index
    pub fn find_ifindex(&self, ifindex: &str) -> Option<&Interface> {
        self.interfaces().iter().find(|i| i.index == ifindex)
    }

    /// Returns the interface carrying exactly this address
    pub fn find_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces().iter().find(|i| i.ip == Some(ip))
    }

    /// Returns true if `ip` is one of the addresses of this device.
    pub fn owns_ip(&self, ip: Ipv4Addr) -> bool {
        self.find_ip(ip).is_some()
    }
}

/// # Network
///
/// Immutable context of a single poll cycle, containing the catalog and all devices with their
/// observations. Every reconciler reads from this structure, and nothing else.
#[derive(Debug, Clone)]
pub struct Network {
    catalog: Arc<DeviceCatalog>,
    devices: Vec<Device>,
}

impl Network {
    /// Build the network from the catalog and the observations collected this cycle. Observations
    /// for devices which are not part of the catalog are ignored.
    pub fn new(catalog: Arc<DeviceCatalog>, mut observations: ObservationSet) -> Self {
        let devices: Vec<Device> = catalog
            .iter()
            .map(|e| Device::new(e.clone(), observations.remove(&e.name)))
            .collect();
        for name in observations.keys() {
            warn!("Ignoring observation of {}, which is not in the catalog", name);
        }
        debug!(
            "Built network with {} devices, {} polled",
            devices.len(),
            devices.iter().filter(|d| d.is_polled()).count()
        );
        Self { catalog, devices }
    }

    /// Get a reference to the catalog
    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// All devices of the catalog, ordered by name
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// All devices that yielded an observation this cycle
    pub fn polled_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.is_polled())
    }

    /// Get a device by name
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name() == name)
    }

    /// Get a device by its administrative IP
    pub fn device_by_admin_ip(&self, ip: AdminIp) -> Option<&Device> {
        self.devices.iter().find(|d| d.admin_ip() == ip)
    }

    /// Returns true if the device with the given name yielded an observation this cycle
    pub fn is_polled(&self, name: &str) -> bool {
        self.device(name).map(|d| d.is_polled()).unwrap_or(false)
    }
}
