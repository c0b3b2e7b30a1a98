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

//! # Topology Assembler
//!
//! Merges the relations of all reconcilers with the per-device status into a single
//! [`Snapshot`]. The assembler does not resolve any address itself.

use crate::details::{device_details, DeviceDetails};
use crate::model::printer::secs_to_str;
use crate::model::{AdminIp, Device, Network};
use crate::reconcile::{self, Relation, RelationKind, RelationSet};

use log::*;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::net::Ipv4Addr;

/// Key of the device down alert
pub const DEVICE_DOWN_KEY: &str = "device down";
/// Key of the reboot alert
pub const UPTIME_KEY: &str = "uptime";
/// Default threshold (in seconds) below which a device is considered recently rebooted
pub const DEFAULT_REBOOT_THRESHOLD: f64 = 60.0;
/// Default threshold (in seconds) below which an interface status change raises a warning
pub const DEFAULT_INTERFACE_CHANGE_THRESHOLD: f64 = 60.0;

/// Severity of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Something is broken
    Error,
    /// Something looks suspicious
    Warning,
}

/// Transition of an alert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", tag = "action")]
pub enum AlertAction {
    /// The alert is (still) active
    Open {
        /// Message
        mesg: String,
        /// Suggested resolution
        resolution: String,
        /// Severity
        kind: AlertKind,
    },
    /// The alert is no longer active
    Close,
}

/// Alert event, keyed by the entity and the alert key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    /// Administrative IP of the entity
    pub entity: AdminIp,
    /// Alert key
    pub key: String,
    /// Open or close
    #[serde(flatten)]
    pub action: AlertAction,
}

impl AlertEvent {
    /// Open an alert
    pub fn open(
        entity: AdminIp,
        key: impl Into<String>,
        mesg: impl Into<String>,
        resolution: impl Into<String>,
        kind: AlertKind,
    ) -> Self {
        Self {
            entity,
            key: key.into(),
            action: AlertAction::Open { mesg: mesg.into(), resolution: resolution.into(), kind },
        }
    }

    /// Close an alert
    pub fn close(entity: AdminIp, key: impl Into<String>) -> Self {
        Self { entity, key: key.into(), action: AlertAction::Close }
    }

    /// Returns true if the event opens the alert
    pub fn is_open(&self) -> bool {
        matches!(self.action, AlertAction::Open { .. })
    }
}

/// Node of the topology, one per catalog device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Administrative IP
    pub id: AdminIp,
    /// Name of the device
    pub label: String,
    /// Style of the node
    pub style: String,
}

/// Label attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityLabel {
    /// Administrative IP of the entity
    pub target: AdminIp,
    /// Text
    pub label: String,
    /// Zoom level
    pub level: u8,
    /// Ordering among the labels of the same entity
    pub sort_key: String,
    /// Style of the text
    pub style: String,
}

impl EntityLabel {
    fn new(target: AdminIp, label: impl Into<String>, key: &str, level: u8, style: &str) -> Self {
        Self {
            target,
            label: label.into(),
            level,
            sort_key: format!("{}-{}", level, key),
            style: style.to_string(),
        }
    }
}

/// Result of a single reconciliation cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// All entities
    pub entities: Vec<Entity>,
    /// All relations
    pub relations: RelationSet,
    /// All entity labels
    pub labels: Vec<EntityLabel>,
    /// All alert transitions
    pub alerts: Vec<AlertEvent>,
    /// Details of every polled device
    pub details: Vec<DeviceDetails>,
}

impl Snapshot {
    /// Get the alert event for the given entity and key
    pub fn alert(&self, entity: AdminIp, key: &str) -> Option<&AlertEvent> {
        self.alerts.iter().find(|a| a.entity == entity && a.key == key)
    }

    /// Iterate over all alerts which are opened
    pub fn open_alerts(&self) -> impl Iterator<Item = &AlertEvent> {
        self.alerts.iter().filter(|a| a.is_open())
    }

    /// Get the details of an entity, if it was polled
    pub fn details_of(&self, entity: AdminIp) -> Option<&DeviceDetails> {
        self.details.iter().find(|d| d.target == entity)
    }

    /// Get all labels of an entity, ordered by their sort key
    pub fn labels_of(&self, entity: AdminIp) -> Vec<&EntityLabel> {
        let mut labels: Vec<&EntityLabel> =
            self.labels.iter().filter(|l| l.target == entity).collect();
        labels.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        labels
    }

    /// Builds a graph with one node per entity and one edge per relation. Bidirectional and
    /// undirected relations yield an edge in both directions. Relations towards unknown entities
    /// are skipped.
    pub fn graph(&self) -> DiGraph<AdminIp, RelationKind> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<AdminIp, NodeIndex> = HashMap::new();
        for entity in self.entities.iter() {
            nodes.insert(entity.id, graph.add_node(entity.id));
        }
        for relation in self.relations.iter() {
            let (a, b) = match (nodes.get(&relation.left()), nodes.get(&relation.right())) {
                (Some(a), Some(b)) => (*a, *b),
                _ => continue,
            };
            graph.add_edge(a, b, relation.kind());
            if is_symmetric(relation) {
                graph.add_edge(b, a, relation.kind());
            }
        }
        graph
    }
}

fn is_symmetric(relation: &Relation) -> bool {
    use crate::reconcile::Direction;
    matches!(relation.style.direction, Direction::Bidirectional | Direction::Undirected)
}

/// # Topology Assembler
#[derive(Debug, Clone)]
pub struct TopologyAssembler {
    reboot_threshold: f64,
    interface_change_threshold: f64,
}

impl Default for TopologyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyAssembler {
    /// Create a new assembler with the default thresholds
    pub fn new() -> Self {
        Self {
            reboot_threshold: DEFAULT_REBOOT_THRESHOLD,
            interface_change_threshold: DEFAULT_INTERFACE_CHANGE_THRESHOLD,
        }
    }

    /// Change the reboot threshold (in seconds)
    pub fn with_reboot_threshold(self, reboot_threshold: f64) -> Self {
        Self { reboot_threshold, ..self }
    }

    /// Assemble the snapshot of the network
    pub fn assemble(&self, net: &Network) -> Snapshot {
        let mut snapshot = Snapshot {
            relations: reconcile::reconcile_all(net),
            details: device_details(net),
            ..Default::default()
        };

        let rps: BTreeSet<Ipv4Addr> =
            net.polled_devices().flat_map(|d| d.pim_rps().iter().copied()).collect();
        let bsrs: BTreeSet<Ipv4Addr> =
            net.polled_devices().flat_map(|d| d.pim_bsrs().iter().copied()).collect();

        for device in net.devices() {
            snapshot.entities.push(entity(device));
            self.device_labels(device, &rps, &bsrs, &mut snapshot.labels);
            self.device_alerts(device, &mut snapshot.alerts);
        }

        info!(
            "Assembled {} entities, {} relations, {} open alerts",
            snapshot.entities.len(),
            snapshot.relations.len(),
            snapshot.open_alerts().count()
        );
        snapshot
    }

    fn device_labels(
        &self,
        device: &Device,
        rps: &BTreeSet<Ipv4Addr>,
        bsrs: &BTreeSet<Ipv4Addr>,
        labels: &mut Vec<EntityLabel>,
    ) {
        let target = device.admin_ip();
        labels.push(EntityLabel::new(target, target.to_string(), "a", 1, "font-size:x-small"));

        let uptime = match device.uptime() {
            Some(uptime) => uptime,
            None => return,
        };

        let is_rp = rps.iter().any(|ip| device.owns_ip(*ip));
        let is_bsr = bsrs.iter().any(|ip| device.owns_ip(*ip));
        let pim = match (is_rp, is_bsr) {
            (true, true) => Some("RP & BSR"),
            (true, false) => Some("RP"),
            (false, true) => Some("BSR"),
            (false, false) => None,
        };
        if let Some(pim) = pim {
            let style = "font-size:x-small font-weight:bolder";
            labels.push(EntityLabel::new(target, pim, "aaa", 1, style));
        }

        labels.push(EntityLabel::new(
            target,
            format!("uptime: {}", secs_to_str(uptime)),
            "alpha",
            2,
            "font-size:x-small",
        ));
    }

    fn device_alerts(&self, device: &Device, alerts: &mut Vec<AlertEvent>) {
        let target = device.admin_ip();

        if device.entry().kind.is_pollable() {
            if device.is_polled() {
                alerts.push(AlertEvent::close(target, DEVICE_DOWN_KEY));
            } else {
                warn!("{} did not answer this cycle", device.name());
                alerts.push(AlertEvent::open(
                    target,
                    DEVICE_DOWN_KEY,
                    "Device is down.",
                    "Check the power cable, power it on if it is off, check the IP address, \
                     verify routing.",
                    AlertKind::Error,
                ));
            }
        }

        let uptime = match device.uptime() {
            Some(uptime) => uptime,
            None => return,
        };

        if uptime < self.reboot_threshold {
            let mesg = "Device rebooted.";
            alerts.push(AlertEvent::open(target, UPTIME_KEY, mesg, "", AlertKind::Error));
        } else {
            alerts.push(AlertEvent::close(target, UPTIME_KEY));
        }

        for iface in device.interfaces() {
            let last_changed = match iface.last_changed {
                Some(t) => t,
                None => continue,
            };
            let key = format!("{}-last-change", iface.name);
            let delta = uptime - last_changed;
            if delta >= 0.0 && delta < self.interface_change_threshold {
                let mesg = format!("{} status recently changed to {}.", iface.name, iface.status);
                alerts.push(AlertEvent::open(target, key, mesg, "", AlertKind::Warning));
            } else {
                alerts.push(AlertEvent::close(target, key));
            }
        }
    }
}

fn entity(device: &Device) -> Entity {
    let mut style = String::from("font-weight:bolder");
    if device.entry().is_host() {
        style.push_str(" frame-back-color:lavender");
    }
    Entity { id: device.admin_ip(), label: device.name().to_string(), style }
}
