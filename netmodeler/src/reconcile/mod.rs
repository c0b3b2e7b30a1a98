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

//! # Reconcilers
//!
//! Every reconciler reads the immutable [`Network`] of the current cycle and returns a
//! [`RelationSet`]. They never fail: addresses which cannot be resolved are logged and skipped,
//! and inconsistent observations are flagged on the relation itself.
//!
//! - **[`IdentityResolver`]**: maps observed addresses to administrative IPs.
//! - **[`routes`]**: next-hop and selection relations.
//! - **[`links`]**: protocol adjacencies.
//! - **[`multicast`]**: multicast distribution trees and IGMP reports.
//! - **[`declared_relations`]**: static links of the catalog.

pub mod links;
pub mod multicast;
pub mod relation;
pub mod resolver;
pub mod routes;

pub use relation::{
    Direction, Label, LineColor, Relation, RelationKey, RelationKind, RelationSet, RelationStyle,
};
pub use resolver::{IdentityResolver, Owner};

use crate::model::{DeviceCatalog, Network};
use relation::DECLARED_PREDICATE;

/// Undirected relations for all links declared in the catalog. Links towards unknown devices are
/// reported as errors and skipped.
pub fn declared_relations(catalog: &DeviceCatalog) -> RelationSet {
    let mut result = RelationSet::new();
    for (source, target) in catalog.declared_links() {
        let key = RelationKey::pair(RelationKind::Declared, source, target, DECLARED_PREDICATE);
        result.insert(Relation::new(key, RelationStyle::undirected()));
    }
    result
}

/// Run all reconcilers on the network, and merge their results.
pub fn reconcile_all(net: &Network) -> RelationSet {
    let mut result = declared_relations(net.catalog());
    let (next_hops, selection) = routes::reconcile(net);
    result.extend(next_hops);
    result.extend(selection);
    result.extend(links::reconcile(net));
    result.extend(multicast::reconcile(net));
    result.extend(multicast::igmp_relations(net));
    result
}
