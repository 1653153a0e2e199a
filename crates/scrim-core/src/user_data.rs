#![forbid(unsafe_code)]

//! Heterogeneous, type-keyed payload storage.
//!
//! [`UserData`] lets a wrapper object (a request or a response) carry an
//! arbitrary payload without knowing its concrete type. Payloads are keyed by
//! their [`TypeId`]: at most one value of a given type may be attached, and
//! retrieval by type either returns that value or nothing, never an
//! ambiguous result.
//!
//! The container is append-only and single-owner. It is not synchronized;
//! confine each instance to one logical owner at a time.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Capability bound for values attachable to a [`UserData`] container.
///
/// Blanket-implemented for every `'static` sendable type, so payload structs
/// need no explicit opt-in beyond owning their data.
pub trait Payload: Any + Send {}

impl<T: Any + Send> Payload for T {}

struct Slot {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

/// Append-only store of at most one payload per concrete type.
///
/// Attaching a second payload of a type already present is a caller bug and
/// panics rather than silently overwriting (see [`UserData::insert`]).
#[derive(Default)]
pub struct UserData {
    slots: HashMap<TypeId, Slot>,
}

impl UserData {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value`, keyed by its concrete type.
    ///
    /// # Panics
    ///
    /// Panics if a payload of type `T` is already attached. Overwriting would
    /// mask a caller bug, so the duplicate is rejected before any mutation.
    pub fn insert<T: Payload>(&mut self, value: T) {
        match self.slots.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => {
                panic!("duplicate payload attach: {} is already present", type_name::<T>())
            }
            Entry::Vacant(slot) => {
                tracing::trace!(payload = type_name::<T>(), "attaching payload");
                slot.insert(Slot {
                    value: Box::new(value),
                    type_name: type_name::<T>(),
                });
            }
        }
    }

    /// Retrieve the payload of type `T`, if one was attached.
    #[must_use]
    pub fn get<T: Payload>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<T>())
    }

    /// Whether a payload of type `T` is attached.
    #[must_use]
    pub fn contains<T: Payload>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn contains_id(&self, type_id: TypeId) -> bool {
        self.slots.contains_key(&type_id)
    }

    /// Number of attached payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no payload is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.slots.values().map(|slot| slot.type_name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[derive(Debug, PartialEq)]
    struct OtherMarker(&'static str);

    #[test]
    fn new_container_is_empty() {
        let data = UserData::new();
        assert!(data.is_empty());
        assert_eq!(data.len(), 0);
    }

    #[test]
    fn insert_then_get_returns_the_value() {
        let mut data = UserData::new();
        data.insert(Marker(7));
        assert_eq!(data.get::<Marker>(), Some(&Marker(7)));
    }

    #[test]
    fn get_absent_type_returns_none() {
        let mut data = UserData::new();
        data.insert(Marker(7));
        assert_eq!(data.get::<OtherMarker>(), None);
    }

    #[test]
    fn distinct_types_coexist() {
        let mut data = UserData::new();
        data.insert(Marker(1));
        data.insert(OtherMarker("two"));
        assert_eq!(data.len(), 2);
        assert_eq!(data.get::<Marker>(), Some(&Marker(1)));
        assert_eq!(data.get::<OtherMarker>(), Some(&OtherMarker("two")));
    }

    #[test]
    #[should_panic(expected = "duplicate payload attach")]
    fn duplicate_insert_panics() {
        let mut data = UserData::new();
        data.insert(Marker(1));
        data.insert(Marker(2));
    }

    #[test]
    fn contains_reflects_attachment() {
        let mut data = UserData::new();
        assert!(!data.contains::<Marker>());
        data.insert(Marker(0));
        assert!(data.contains::<Marker>());
        assert!(!data.contains::<OtherMarker>());
    }

    #[test]
    fn debug_lists_payload_type_names() {
        let mut data = UserData::new();
        data.insert(Marker(0));
        let rendered = format!("{data:?}");
        assert!(rendered.contains("Marker"), "unexpected debug output: {rendered}");
    }
}
