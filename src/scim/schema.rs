//! Schema trees and the depth-first attribute resolver.
//!
//! A resource's mutable-attribute schema is a nested structure of mappings,
//! sequences and leaves. Mapping keys are SCIM attribute names (or, deeper
//! down, structural keys such as `type`), sequences model multi-valued
//! attributes, and leaves name the storage attribute that backs a SCIM one:
//!
//! ```toml
//! [schema.user]
//! userName = "email"
//! name = { givenName = "first_name", familyName = "last_name" }
//! emails = [ { type = "work", value = "email" } ]
//! ```
//!
//! [`locate`] walks any [`AttributeTree`] depth-first in document order and
//! returns the [`StoragePath`] of the first match. The same walk serves the
//! schema (to compute storage paths) and inbound JSON payloads (to find the
//! searchable attribute during authorization).

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;

use super::path::PathScim;

// =============================================================================
// Storage paths
// =============================================================================

/// One step of a [`StoragePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Mapping key
    Key(String),
    /// Sequence position
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Sequence of keys and indices locating a node inside a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(Vec<PathSegment>);

impl StoragePath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl<const N: usize> From<[PathSegment; N]> for StoragePath {
    fn from(segments: [PathSegment; N]) -> Self {
        Self(segments.into())
    }
}

impl FromIterator<PathSegment> for StoragePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders as `names[0].givenName`.
impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tree abstraction
// =============================================================================

/// Read-only view over a nested mapping/sequence/leaf structure.
pub trait AttributeTree: Sized {
    /// Text of a scalar node.
    fn leaf(&self) -> Option<&str>;

    /// Entries of a mapping node, in document order.
    fn entries(&self) -> Option<Vec<(&str, &Self)>>;

    /// Elements of a sequence node.
    fn items(&self) -> Option<&[Self]>;

    fn get_key(&self, key: &str) -> Option<&Self>;

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.items()?.get(index)
    }
}

/// What a node has to look like to count as a hit during [`locate_by`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Match {
    /// A mapping entry whose key equals the target. The path ends with that key.
    #[default]
    Key,
    /// A leaf whose text equals the target. The path ends at the leaf.
    Leaf,
}

/// Find the first mapping key equal to `target`, depth-first in document order.
///
/// Returns `None` when the key does not occur anywhere in the tree.
pub fn locate<T: AttributeTree>(target: &str, tree: &T) -> Option<StoragePath> {
    locate_by(target, tree, Match::Key)
}

/// Depth-first, order-preserving search for `target`.
///
/// The first hit in document order wins; later occurrences of the same name
/// are never reported.
pub fn locate_by<T: AttributeTree>(target: &str, tree: &T, mode: Match) -> Option<StoragePath> {
    let mut path = StoragePath::default();
    let found = search(tree, target, mode, &mut path);
    found.then_some(path)
}

fn search<T: AttributeTree>(node: &T, target: &str, mode: Match, path: &mut StoragePath) -> bool {
    if mode == Match::Leaf && node.leaf() == Some(target) {
        return true;
    }

    if let Some(entries) = node.entries() {
        for (key, child) in entries {
            path.push(PathSegment::from(key));
            if (mode == Match::Key && key == target) || search(child, target, mode, path) {
                return true;
            }
            path.pop();
        }
    } else if let Some(items) = node.items() {
        for (index, child) in items.iter().enumerate() {
            path.push(PathSegment::Index(index));
            if search(child, target, mode, path) {
                return true;
            }
            path.pop();
        }
    }

    false
}

/// Follow `path` from the root of `tree`.
pub fn dig<'a, T: AttributeTree>(tree: &'a T, path: &StoragePath) -> Option<&'a T> {
    path.segments()
        .iter()
        .try_fold(tree, |node, segment| match segment {
            PathSegment::Key(key) => node.get_key(key),
            PathSegment::Index(index) => node.get_index(*index),
        })
}

/// Read the value an inbound SCIM body carries for a storage attribute.
///
/// The schema is searched for the leaf naming `storage_attribute`; the path to
/// that leaf is then followed through `body`. With a schema of
/// `{ name: { givenName: "first_name" } }`, `find_value_for("first_name", ..)`
/// returns `body.name.givenName`.
pub fn find_value_for<'a>(
    storage_attribute: &str,
    schema: &SchemaTree,
    body: &'a Value,
) -> Option<&'a Value> {
    let path = locate_by(storage_attribute, schema, Match::Leaf)?;
    dig(body, &path)
}

impl AttributeTree for Value {
    fn leaf(&self) -> Option<&str> {
        self.as_str()
    }

    fn entries(&self) -> Option<Vec<(&str, &Self)>> {
        self.as_object()
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    fn items(&self) -> Option<&[Self]> {
        self.as_array().map(Vec::as_slice)
    }

    fn get_key(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }
}

// =============================================================================
// Schema tree
// =============================================================================

/// A resource's mutable-attribute schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaTree {
    /// Storage attribute backing a SCIM attribute
    Leaf(String),
    /// Named children, in document order
    Mapping(Vec<(String, SchemaTree)>),
    /// Multi-valued attribute
    Sequence(Vec<SchemaTree>),
}

impl Default for SchemaTree {
    fn default() -> Self {
        SchemaTree::Mapping(Vec::new())
    }
}

impl SchemaTree {
    /// Top-level attribute names, in document order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        let entries = match self {
            SchemaTree::Mapping(entries) => entries.as_slice(),
            _ => &[],
        };
        entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, SchemaTree::Mapping(_))
    }

    /// See [`locate`].
    pub fn locate(&self, target: &str) -> Option<StoragePath> {
        locate(target, self)
    }

    /// Translate a parsed SCIM path into a storage path.
    ///
    /// The attribute is located first. A filter then selects the first element
    /// of the sequence found there whose `filter.attribute` leaf satisfies the
    /// filter, and each rest-path segment descends one mapping level. Returns
    /// `None` if any step has nothing to land on, including a rest path that
    /// runs into a sequence without a filter.
    pub fn resolve(&self, path: &PathScim) -> Option<StoragePath> {
        let mut storage = self.locate(&path.attribute)?;
        let mut node = dig(self, &storage)?;

        if let Some(filter) = &path.filter {
            let items = node.items()?;
            let index = items.iter().position(|item| {
                item.get_key(&filter.attribute)
                    .and_then(AttributeTree::leaf)
                    .is_some_and(|actual| filter.operator.evaluate(actual, &filter.parameter))
            })?;
            storage.push(PathSegment::Index(index));
            node = &items[index];
        }

        for segment in &path.rest_path {
            node = node.get_key(segment)?;
            storage.push(PathSegment::from(segment.as_str()));
        }

        Some(storage)
    }
}

impl AttributeTree for SchemaTree {
    fn leaf(&self) -> Option<&str> {
        match self {
            SchemaTree::Leaf(name) => Some(name),
            _ => None,
        }
    }

    fn entries(&self) -> Option<Vec<(&str, &Self)>> {
        match self {
            SchemaTree::Mapping(entries) => {
                Some(entries.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
            _ => None,
        }
    }

    fn items(&self) -> Option<&[Self]> {
        match self {
            SchemaTree::Sequence(items) => Some(items),
            _ => None,
        }
    }

    fn get_key(&self, key: &str) -> Option<&Self> {
        match self {
            SchemaTree::Mapping(entries) => entries
                .iter()
                .find_map(|(k, v)| (k == key).then_some(v)),
            _ => None,
        }
    }
}

impl Serialize for SchemaTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaTree::Leaf(name) => serializer.serialize_str(name),
            SchemaTree::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            SchemaTree::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SchemaTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SchemaTreeVisitor)
    }
}

struct SchemaTreeVisitor;

impl<'de> Visitor<'de> for SchemaTreeVisitor {
    type Value = SchemaTree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a storage attribute name, a table of attributes, or an array of tables")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(SchemaTree::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(SchemaTree::Leaf(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(SchemaTree::Leaf(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(SchemaTree::Leaf(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(SchemaTree::Leaf(v.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(SchemaTree::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, SchemaTree)> =
            Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, SchemaTree>()? {
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(de::Error::custom(format!("duplicate attribute '{key}'")));
            }
            entries.push((key, value));
        }
        Ok(SchemaTree::Mapping(entries))
    }
}

// =============================================================================
// Tests
// =============================================================================
