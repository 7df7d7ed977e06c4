//! Optional per-structure facets.
//!
//! A structure may carry any number of extra components (energy output, a
//! crew requirement, storage, housing). Each component type gets its own
//! storage keyed by [`StructureId`]; the table maps the component's
//! [`TypeId`] to that storage behind a small object-safe trait so removal
//! can sweep every storage without knowing the concrete types.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use outpost_types::StructureId;

use crate::error::StructureError;

/// A component type that can be attached to a structure.
pub trait Component: core::fmt::Debug + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;
}

/// Type-erased view of one component storage.
trait ComponentStorage: Any + core::fmt::Debug {
    fn remove(&mut self, id: StructureId) -> bool;
    fn has(&self, id: StructureId) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug)]
struct TypedStorage<T> {
    data: BTreeMap<StructureId, T>,
}

impl<T: Component> ComponentStorage for TypedStorage<T> {
    fn remove(&mut self, id: StructureId) -> bool {
        self.data.remove(&id).is_some()
    }

    fn has(&self, id: StructureId) -> bool {
        self.data.contains_key(&id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Component storages indexed by component type.
#[derive(Debug, Default)]
pub struct ComponentTable {
    storages: BTreeMap<TypeId, Box<dyn ComponentStorage>>,
}

impl ComponentTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            storages: BTreeMap::new(),
        }
    }

    fn storage<T: Component>(&self) -> Option<&TypedStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<TypedStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut TypedStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<TypedStorage<T>>())
    }

    /// Attach `component` to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::ComponentAlreadyAttached`] if `id` already
    /// has a component of this type.
    pub fn attach<T: Component>(
        &mut self,
        id: StructureId,
        component: T,
    ) -> Result<(), StructureError> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                Box::new(TypedStorage::<T> {
                    data: BTreeMap::new(),
                })
            });
        if storage.has(id) {
            return Err(StructureError::ComponentAlreadyAttached {
                structure: id,
                component: T::NAME,
            });
        }
        if let Some(typed) = storage.as_any_mut().downcast_mut::<TypedStorage<T>>() {
            typed.data.insert(id, component);
        }
        Ok(())
    }

    /// Component of type `T` on `id`.
    pub fn get<T: Component>(&self, id: StructureId) -> Option<&T> {
        self.storage::<T>().and_then(|s| s.data.get(&id))
    }

    /// Mutable component of type `T` on `id`.
    pub fn get_mut<T: Component>(&mut self, id: StructureId) -> Option<&mut T> {
        self.storage_mut::<T>().and_then(|s| s.data.get_mut(&id))
    }

    /// Whether `id` has a component of type `T`.
    pub fn contains<T: Component>(&self, id: StructureId) -> bool {
        self.get::<T>(id).is_some()
    }

    /// Every `(id, component)` pair of type `T`, in handle order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (StructureId, &T)> {
        self.storage::<T>()
            .into_iter()
            .flat_map(|s| s.data.iter().map(|(id, c)| (*id, c)))
    }

    /// Drop every component attached to `id`. Returns how many were removed.
    pub fn remove_all(&mut self, id: StructureId) -> usize {
        self.storages
            .values_mut()
            .map(|s| s.remove(id))
            .filter(|removed| *removed)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Component types
// ---------------------------------------------------------------------------

macro_rules! component {
    ($name:ident) => {
        impl Component for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}

/// Supplies energy to the colony while operational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyProducer {
    /// Energy per turn.
    pub output: u32,
}

/// Crew a structure needs to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborRequirement {
    /// Workers needed.
    pub workers: u32,
    /// Scientists needed.
    pub scientists: u32,
    /// Whether the crew was supplied this turn.
    pub staffed: bool,
}

impl LaborRequirement {
    /// An unstaffed requirement.
    pub const fn new(workers: u32, scientists: u32) -> Self {
        Self {
            workers,
            scientists,
            staffed: false,
        }
    }
}

/// Refined storage the structure adds to the colony stockpile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCapacity {
    /// Units of refined material.
    pub capacity: u32,
}

/// Colonist housing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Housing {
    /// Residents it can hold.
    pub capacity: u32,
    /// Residents assigned this turn.
    pub occupants: u32,
}

component!(EnergyProducer);
component!(LaborRequirement);
component!(StorageCapacity);
component!(Housing);
