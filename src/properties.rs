//! Property handles.
//!
//! Shapes in a layout database carry arbitrary user properties. The kernel never
//! looks inside them: it only needs a small id per distinct property set, so that
//! "same properties" is an integer comparison. Where those ids come from is up to
//! the surrounding database, which provides a [`PropertyRepository`].

use std::collections::BTreeMap;

/// An interned handle for a set of properties.
///
/// Equal ids denote equal property sets. Id 0 is the empty property set.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PropertiesId(pub u32);

impl std::fmt::Debug for PropertiesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prop_{}", self.0)
    }
}

impl PropertiesId {
    /// The id of the empty property set.
    pub const EMPTY: PropertiesId = PropertiesId(0);
}

/// A set of name/value properties.
pub type PropertySet = BTreeMap<String, String>;

/// Maps property sets to ids and back.
///
/// Ids must stay stable for as long as any processing run uses them.
pub trait PropertyRepository {
    /// Returns the id for `props`, allocating a new one if this set hasn't been seen.
    fn properties_id(&mut self, props: &PropertySet) -> PropertiesId;

    /// Looks up the property set for an id.
    fn properties(&self, id: PropertiesId) -> Option<&PropertySet>;
}

/// A simple in-memory [`PropertyRepository`].
#[derive(Clone, Debug)]
pub struct PropertyStore {
    sets: Vec<PropertySet>,
    ids: BTreeMap<PropertySet, PropertiesId>,
}

impl Default for PropertyStore {
    fn default() -> Self {
        let empty = PropertySet::new();
        PropertyStore {
            ids: BTreeMap::from([(empty.clone(), PropertiesId::EMPTY)]),
            sets: vec![empty],
        }
    }
}

impl PropertyStore {
    /// Creates a store that only knows the empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct property sets, including the empty one.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Does this store know nothing but the empty set?
    pub fn is_empty(&self) -> bool {
        self.sets.len() == 1
    }
}

impl PropertyRepository for PropertyStore {
    fn properties_id(&mut self, props: &PropertySet) -> PropertiesId {
        if let Some(id) = self.ids.get(props) {
            return *id;
        }
        let id = PropertiesId(self.sets.len() as u32);
        self.sets.push(props.clone());
        self.ids.insert(props.clone(), id);
        id
    }

    fn properties(&self, id: PropertiesId) -> Option<&PropertySet> {
        self.sets.get(id.0 as usize)
    }
}

/// A value together with the id of its properties.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PropertyTagged<T> {
    /// The value, usually some geometry.
    pub value: T,
    /// The properties attached to it.
    pub properties_id: PropertiesId,
}

impl<T> PropertyTagged<T> {
    /// Attaches properties to a value.
    pub fn new(value: T, properties_id: PropertiesId) -> Self {
        PropertyTagged {
            value,
            properties_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning() {
        let mut store = PropertyStore::new();
        assert!(store.is_empty());
        assert_eq!(store.properties_id(&PropertySet::new()), PropertiesId::EMPTY);

        let net_a = PropertySet::from([("net".to_owned(), "A".to_owned())]);
        let net_b = PropertySet::from([("net".to_owned(), "B".to_owned())]);
        let a = store.properties_id(&net_a);
        let b = store.properties_id(&net_b);
        assert_ne!(a, b);
        assert_eq!(store.properties_id(&net_a.clone()), a);
        assert_eq!(store.properties(b), Some(&net_b));
        assert_eq!(store.len(), 3);
        assert_eq!(store.properties(PropertiesId(17)), None);
    }
}
