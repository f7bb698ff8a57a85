//! The capability table: which markers exist and where their services live.

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::{Capability, Slot, WantsContainer, WantsFactory, WantsInjector};
use crate::error::{DiError, DiResult, TableError};
use crate::key::Key;
use crate::registration::AnyArc;

type AttachFn = fn(&mut dyn Any, AnyArc) -> DiResult<()>;
type AcceptsFn = fn(&AnyArc) -> bool;

static GLOBAL: OnceCell<Arc<CapabilityTable>> = OnceCell::new();

/// One row of a [`CapabilityTable`].
///
/// Pairs a marker with the key its service is stored under and the typed
/// glue that moves a resolved service into the instance's [`Slot`].
#[derive(Clone)]
pub struct CapabilityEntry {
    marker: TypeId,
    marker_name: &'static str,
    service_type: &'static str,
    service_key: Key,
    attach: AttachFn,
    accepts: AcceptsFn,
}

impl CapabilityEntry {
    /// Builds the entry for marker `C`.
    pub fn of<C: Capability>() -> Self {
        Self {
            marker: TypeId::of::<C>(),
            marker_name: C::name(),
            service_type: type_name::<C::Service>(),
            service_key: C::service_key(),
            attach: attach_slot::<C>,
            accepts: accepts_service::<C>,
        }
    }

    #[inline]
    pub fn marker(&self) -> TypeId {
        self.marker
    }

    #[inline]
    pub fn marker_name(&self) -> &'static str {
        self.marker_name
    }

    /// Name of the service type the slot holds.
    #[inline]
    pub fn service_type(&self) -> &'static str {
        self.service_type
    }

    #[inline]
    pub fn service_key(&self) -> &Key {
        &self.service_key
    }

    /// Stores `service` into `slot`.
    ///
    /// `slot` must be the `Slot<C>` the instance returned for this marker.
    /// Fails with [`DiError::TypeMismatch`] when either the slot or the
    /// service is of the wrong type.
    pub fn attach(&self, slot: &mut dyn Any, service: AnyArc) -> DiResult<()> {
        (self.attach)(slot, service)
    }

    /// Returns true when `service` can be attached for this marker.
    pub fn accepts(&self, service: &AnyArc) -> bool {
        (self.accepts)(service)
    }
}

impl fmt::Debug for CapabilityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityEntry")
            .field("marker", &self.marker_name)
            .field("service_key", &self.service_key)
            .finish()
    }
}

fn attach_slot<C: Capability>(slot: &mut dyn Any, service: AnyArc) -> DiResult<()> {
    let slot = slot
        .downcast_mut::<Slot<C>>()
        .ok_or(DiError::TypeMismatch(type_name::<Slot<C>>()))?;
    let service = C::downcast(service).ok_or(DiError::TypeMismatch(type_name::<C::Service>()))?;
    slot.set(service);
    Ok(())
}

fn accepts_service<C: Capability>(service: &AnyArc) -> bool {
    C::downcast(service.clone()).is_some()
}

/// Ordered, immutable list of capability entries.
///
/// Markers are unique within a table. Iteration order is insertion order
/// and carries no meaning for injection.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{capability, CapabilityTable, WantsContainer};
///
/// pub trait Logger: Send + Sync {}
/// capability!(pub WithLogger: dyn Logger => "logger");
///
/// let table = CapabilityTable::builder()
///     .with::<WithLogger>()
///     .with_builtins()
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 4);
/// assert!(table.contains::<WithLogger>());
/// assert!(table.contains::<WantsContainer>());
/// ```
#[derive(Debug, Clone)]
pub struct CapabilityTable {
    entries: Vec<CapabilityEntry>,
}

impl CapabilityTable {
    pub fn builder() -> CapabilityTableBuilder {
        CapabilityTableBuilder::default()
    }

    /// Table holding only the built-in self capabilities.
    pub fn builtins() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    /// Returns this table with every missing built-in entry appended.
    pub fn with_builtins(mut self) -> Self {
        for entry in builtin_entries() {
            if self.get(entry.marker()).is_none() {
                self.entries.push(entry);
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry for a marker.
    pub fn get(&self, marker: TypeId) -> Option<&CapabilityEntry> {
        self.entries.iter().find(|e| e.marker == marker)
    }

    pub fn contains<C: Capability>(&self) -> bool {
        self.get(TypeId::of::<C>()).is_some()
    }

    /// Marker names in table order.
    pub fn markers(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.marker_name).collect()
    }

    /// Installs the process-wide table.
    ///
    /// Succeeds at most once, and only before the first call to
    /// [`global`](Self::global).
    pub fn install(table: CapabilityTable) -> Result<(), TableError> {
        let markers = table.len();
        GLOBAL
            .set(Arc::new(table))
            .map_err(|_| TableError::AlreadyInstalled)?;
        debug!(markers, "installed process-wide capability table");
        Ok(())
    }

    /// The process-wide table.
    ///
    /// Falls back to [`builtins`](Self::builtins) when nothing was installed,
    /// after which [`install`](Self::install) fails.
    pub fn global() -> Arc<CapabilityTable> {
        GLOBAL.get_or_init(|| Arc::new(Self::builtins())).clone()
    }
}

impl<'a> IntoIterator for &'a CapabilityTable {
    type Item = &'a CapabilityEntry;
    type IntoIter = std::slice::Iter<'a, CapabilityEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn builtin_entries() -> Vec<CapabilityEntry> {
    vec![
        CapabilityEntry::of::<WantsContainer>(),
        CapabilityEntry::of::<WantsInjector>(),
        CapabilityEntry::of::<WantsFactory>(),
    ]
}

/// Builder for [`CapabilityTable`].
#[derive(Debug, Default)]
pub struct CapabilityTableBuilder {
    entries: Vec<CapabilityEntry>,
    builtins: bool,
}

impl CapabilityTableBuilder {
    /// Adds marker `C`.
    pub fn with<C: Capability>(self) -> Self {
        self.entry(CapabilityEntry::of::<C>())
    }

    /// Adds a prebuilt entry.
    pub fn entry(mut self, entry: CapabilityEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Appends the built-in entries not added explicitly.
    pub fn with_builtins(mut self) -> Self {
        self.builtins = true;
        self
    }

    /// Builds the table, rejecting duplicate markers.
    pub fn build(self) -> Result<CapabilityTable, TableError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.marker) {
                return Err(TableError::DuplicateMarker {
                    marker: entry.marker_name,
                });
            }
        }

        let table = CapabilityTable {
            entries: self.entries,
        };
        Ok(if self.builtins { table.with_builtins() } else { table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability;

    capability!(WithLabel: String => "label");
    capability!(WithLimit: usize);

    #[test]
    fn entry_names_service_type() {
        let entry = CapabilityEntry::of::<WithLabel>();
        assert_eq!(entry.service_type(), type_name::<String>());

        let mut slot = Slot::<WithLabel>::new();
        let wrong: AnyArc = Arc::new(5usize);
        match entry.attach(&mut slot, wrong) {
            Err(DiError::TypeMismatch(name)) => assert_eq!(name, entry.service_type()),
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn builder_keeps_insertion_order() {
        let table = CapabilityTable::builder()
            .with::<WithLimit>()
            .with::<WithLabel>()
            .build()
            .unwrap();
        let markers = table.markers();
        assert!(markers[0].ends_with("WithLimit"));
        assert!(markers[1].ends_with("WithLabel"));
    }

    #[test]
    fn duplicate_markers_are_rejected() {
        let err = CapabilityTable::builder()
            .with::<WithLabel>()
            .with::<WithLimit>()
            .with::<WithLabel>()
            .build()
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateMarker { marker } if marker.ends_with("WithLabel")));
    }

    #[test]
    fn with_builtins_does_not_duplicate() {
        let table = CapabilityTable::builder()
            .with::<WantsInjector>()
            .with_builtins()
            .build()
            .unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.markers()[0].ends_with("WantsInjector"));
    }

    #[test]
    fn attach_rejects_foreign_slot() {
        let entry = CapabilityEntry::of::<WithLimit>();
        let mut wrong = Slot::<WithLabel>::new();
        let err = entry.attach(&mut wrong, Arc::new(3usize)).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch(_)));
    }

    #[test]
    fn attach_rejects_foreign_service() {
        let entry = CapabilityEntry::of::<WithLimit>();
        let mut slot = Slot::<WithLimit>::new();
        assert!(!entry.accepts(&(Arc::new("x") as AnyArc)));
        assert!(entry.attach(&mut slot, Arc::new("x")).is_err());
        assert!(!slot.is_set());

        entry.attach(&mut slot, Arc::new(8usize)).unwrap();
        assert_eq!(slot.get().map(|v| **v), Some(8));
    }
}
