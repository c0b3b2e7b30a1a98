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

//! # Relations
//!
//! Output edges of the reconcilers. A relation is keyed by an ordered tuple of administrative IPs
//! (the pair `left`, `right`, and optionally the selected destination), the kind of reconciler
//! that emitted it, and its predicate. Relations are stored in a [`RelationSet`], where later
//! writes for the same key replace earlier ones.

use crate::model::AdminIp;

use log::*;
use serde::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

/// Predicate of next-hop relations
pub const NEXT_HOP_PREDICATE: &str = "options.routes selection.name 'map' == and";
/// Predicate of declared (config) relations
pub const DECLARED_PREDICATE: &str = "options.none";
/// Predicate of IGMP relations
pub const IGMP_PREDICATE: &str = "options.igmp";

/// Reconciler which produced a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// Statically declared link from the catalog
    Declared,
    /// Next hop of a route
    NextHop,
    /// Selected path towards a single destination
    Selection,
    /// Observed protocol adjacency
    Link,
    /// Upstream edge of a multicast tree
    MulticastUpstream,
    /// Downstream edge of a multicast tree
    MulticastDownstream,
    /// Edge from the multicast source towards its gateways
    MulticastGateway,
    /// IGMP membership report
    Igmp,
}

/// Line type of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// No arrow at all
    Undirected,
    /// Arrow from left to right
    Directed,
    /// Arrows on both ends
    Bidirectional,
}

/// Line color of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineColor {
    /// Regular selection relation
    Blue,
    /// Selection relation whose next hop is not modeled
    DarkViolet,
    /// Flagged (inconsistent) relation
    Red,
}

impl fmt::Display for LineColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => write!(f, "blue"),
            Self::DarkViolet => write!(f, "darkviolet"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// Style of a relation, rendered as `line-type:directed line-color:red line-width:3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationStyle {
    /// Line type
    pub direction: Direction,
    /// Line color, if not the default
    pub color: Option<LineColor>,
    /// Line width, if not the default
    pub width: Option<u8>,
}

impl RelationStyle {
    /// Plain line without any arrow
    pub fn undirected() -> Self {
        Self { direction: Direction::Undirected, color: None, width: None }
    }

    /// Plain arrow from left to right
    pub fn directed() -> Self {
        Self { direction: Direction::Directed, color: None, width: None }
    }

    /// Arrow on both ends
    pub fn bidirectional() -> Self {
        Self { direction: Direction::Bidirectional, color: None, width: None }
    }

    /// Directed red line, used for one-sided observations
    pub fn flagged() -> Self {
        Self::directed().with_color(LineColor::Red)
    }

    /// Change the color of the line
    pub fn with_color(self, color: LineColor) -> Self {
        Self { color: Some(color), ..self }
    }

    /// Change the width of the line
    pub fn with_width(self, width: u8) -> Self {
        Self { width: Some(width), ..self }
    }

    /// Returns true if the relation is visually flagged as inconsistent
    pub fn is_flagged(&self) -> bool {
        self.color == Some(LineColor::Red)
    }
}

impl fmt::Display for RelationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        match self.direction {
            Direction::Undirected => {}
            Direction::Directed => parts.push("line-type:directed".to_string()),
            Direction::Bidirectional => parts.push("line-type:bidirectional".to_string()),
        }
        if let Some(color) = self.color {
            parts.push(format!("line-color:{}", color));
        }
        if let Some(width) = self.width {
            parts.push(format!("line-width:{}", width));
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl Serialize for RelationStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Text attached to one end or the middle of a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    /// Text
    pub label: String,
    /// Zoom level at which the label is shown
    pub level: u8,
    /// Style of the text
    pub style: String,
}

impl Label {
    /// Label with `font-size:x-small`
    pub fn small(label: impl Into<String>, level: u8) -> Self {
        Self { label: label.into(), level, style: "font-size:x-small".to_string() }
    }

    /// Label with `font-size:xx-small`
    pub fn smaller(label: impl Into<String>, level: u8) -> Self {
        Self { label: label.into(), level, style: "font-size:xx-small".to_string() }
    }

    /// Label with `font-size:xxx-small`
    pub fn smallest(label: impl Into<String>, level: u8) -> Self {
        Self { label: label.into(), level, style: "font-size:xxx-small".to_string() }
    }
}

/// Up to three free-text labels, placed on level 1, 2 and 3. Empty strings are skipped.
pub fn positional_labels<S: AsRef<str>>(labels: &[S]) -> Vec<Label> {
    labels
        .iter()
        .take(3)
        .zip(1..)
        .filter_map(|(l, level)| {
            let l: &str = l.as_ref();
            if l.is_empty() {
                None
            } else {
                Some(Label::small(l, level))
            }
        })
        .collect()
}

/// Key of a relation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationKey {
    kind: RelationKind,
    left: AdminIp,
    right: AdminIp,
    dst: Option<AdminIp>,
    predicate: String,
}

impl RelationKey {
    /// Key of a relation between two devices
    pub fn pair(
        kind: RelationKind,
        left: AdminIp,
        right: AdminIp,
        predicate: impl Into<String>,
    ) -> Self {
        Self { kind, left, right, dst: None, predicate: predicate.into() }
    }

    /// Key of a relation between two devices, concerning the traffic towards `dst`
    pub fn triple(
        kind: RelationKind,
        left: AdminIp,
        right: AdminIp,
        dst: AdminIp,
        predicate: impl Into<String>,
    ) -> Self {
        Self { kind, left, right, dst: Some(dst), predicate: predicate.into() }
    }

    /// Kind of the relation
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Left end
    pub fn left(&self) -> AdminIp {
        self.left
    }

    /// Right end
    pub fn right(&self) -> AdminIp {
        self.right
    }

    /// Destination, only present for selection relations
    pub fn dst(&self) -> Option<AdminIp> {
        self.dst
    }

    /// Display predicate
    pub fn predicate(&self) -> &str {
        &self.predicate
    }
}

/// # Relation
///
/// Edge of the reconciled topology.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Relation {
    #[serde(flatten)]
    key: RelationKey,
    /// Style of the line
    pub style: RelationStyle,
    /// Labels next to the left end
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub left_labels: Vec<Label>,
    /// Labels in the middle of the line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middle_labels: Vec<Label>,
    /// Labels next to the right end
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub right_labels: Vec<Label>,
}

impl Relation {
    /// Create a new relation without any labels
    pub fn new(key: RelationKey, style: RelationStyle) -> Self {
        Self {
            key,
            style,
            left_labels: Vec::new(),
            middle_labels: Vec::new(),
            right_labels: Vec::new(),
        }
    }

    /// Set the left labels
    pub fn with_left_labels(mut self, labels: Vec<Label>) -> Self {
        self.left_labels = labels;
        self
    }

    /// Set the middle labels
    pub fn with_middle_labels(mut self, labels: Vec<Label>) -> Self {
        self.middle_labels = labels;
        self
    }

    /// Set the right labels
    pub fn with_right_labels(mut self, labels: Vec<Label>) -> Self {
        self.right_labels = labels;
        self
    }

    /// Key of the relation
    pub fn key(&self) -> &RelationKey {
        &self.key
    }

    /// Kind of the relation
    pub fn kind(&self) -> RelationKind {
        self.key.kind
    }

    /// Left end
    pub fn left(&self) -> AdminIp {
        self.key.left
    }

    /// Right end
    pub fn right(&self) -> AdminIp {
        self.key.right
    }

    /// Display predicate
    pub fn predicate(&self) -> &str {
        &self.key.predicate
    }
}

/// # Relation Set
///
/// Ordered collection of relations. Inserting a relation with a key that is already present
/// replaces the old one, and iteration is always ordered by the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationSet {
    relations: BTreeMap<RelationKey, Relation>,
}

impl RelationSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a relation, returning the replaced one (if any).
    pub fn insert(&mut self, relation: Relation) -> Option<Relation> {
        let old = self.relations.insert(relation.key.clone(), relation);
        if let Some(old) = old.as_ref() {
            trace!("Replaced relation {:?}", old.key);
        }
        old
    }

    /// Move all relations of `other` into `self`.
    pub fn extend(&mut self, other: RelationSet) {
        for (_, relation) in other.relations {
            self.insert(relation);
        }
    }

    /// Get the relation with the given key
    pub fn get(&self, key: &RelationKey) -> Option<&Relation> {
        self.relations.get(key)
    }

    /// Iterate over all relations, ordered by their key
    pub fn iter(&self) -> btree_map::Values<'_, RelationKey, Relation> {
        self.relations.values()
    }

    /// Iterate over all relations of the given kind
    pub fn of_kind(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(move |r| r.kind() == kind)
    }

    /// Returns all relations of the given kind between `left` and `right` (in this direction).
    pub fn between(&self, kind: RelationKind, left: AdminIp, right: AdminIp) -> Vec<&Relation> {
        self.of_kind(kind).filter(|r| r.left() == left && r.right() == right).collect()
    }

    /// Number of relations
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Returns true if the set is empty
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl<'a> IntoIterator for &'a RelationSet {
    type Item = &'a Relation;
    type IntoIter = btree_map::Values<'a, RelationKey, Relation>;

    fn into_iter(self) -> Self::IntoIter {
        self.relations.values()
    }
}

impl Serialize for RelationSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.relations.values())
    }
}

/// Walks over a map keyed by `(a, b, p)` and pairs every key with its reverse `(b, a, p)`. Keys
/// whose reverse is present are returned once, when `a < b`, together with the value of the
/// reverse. Keys without a reverse are returned with `None`.
pub(crate) fn pair_up<P, T>(
    map: &BTreeMap<(AdminIp, AdminIp, P), T>,
) -> Vec<(&(AdminIp, AdminIp, P), &T, Option<&T>)>
where
    P: Ord + Clone,
{
    let mut result = Vec::with_capacity(map.len());
    for (key, value) in map.iter() {
        let (a, b, p) = key;
        match map.get(&(*b, *a, p.clone())) {
            Some(reverse) if a < b => result.push((key, value, Some(reverse))),
            Some(_) => {}
            None => result.push((key, value, None)),
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn style_strings() {
        assert_eq!(RelationStyle::directed().to_string(), "line-type:directed");
        assert_eq!(RelationStyle::bidirectional().to_string(), "line-type:bidirectional");
        assert_eq!(RelationStyle::flagged().to_string(), "line-type:directed line-color:red");
        assert_eq!(
            RelationStyle::directed().with_color(LineColor::DarkViolet).with_width(3).to_string(),
            "line-type:directed line-color:darkviolet line-width:3"
        );
        assert_eq!(RelationStyle::undirected().to_string(), "");
        assert!(RelationStyle::flagged().is_flagged());
        assert!(!RelationStyle::bidirectional().is_flagged());
    }

    #[test]
    fn pairing() {
        let a = Ipv4Addr::new(10, 0, 0, 1);
        let b = Ipv4Addr::new(10, 0, 0, 2);
        let c = Ipv4Addr::new(10, 0, 0, 3);
        let mut map = BTreeMap::new();
        map.insert((a, b, ()), "ab");
        map.insert((b, a, ()), "ba");
        map.insert((c, a, ()), "ca");
        let pairs = pair_up(&map);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (&(a, b, ()), &"ab", Some(&"ba")));
        assert_eq!(pairs[1], (&(c, a, ()), &"ca", None));
    }

    #[test]
    fn last_write_wins() {
        let a = Ipv4Addr::new(10, 0, 0, 1);
        let b = Ipv4Addr::new(10, 0, 0, 2);
        let key = RelationKey::pair(RelationKind::Link, a, b, "options.ospf");
        let mut set = RelationSet::new();
        assert!(set.insert(Relation::new(key.clone(), RelationStyle::directed())).is_none());
        assert!(set.insert(Relation::new(key.clone(), RelationStyle::flagged())).is_some());
        assert_eq!(set.len(), 1);
        assert!(set.get(&key).unwrap().style.is_flagged());
    }

    #[test]
    fn labels_by_position() {
        let labels = positional_labels(&["1 minute old", "", "cost 10", "ignored"]);
        assert_eq!(labels, vec![Label::small("1 minute old", 1), Label::small("cost 10", 3)]);
    }
}
