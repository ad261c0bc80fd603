//! MappingStore - In-memory layer → control → assignment table with subscription support
//!
//! The table sits behind a shared lock so the store is a cheap `Clone` handle.
//! Every mutation completes under a single write lock, and `replace_all`
//! builds the new table before swapping it in, so readers only ever observe
//! the old state or the new one.

use super::types::{Assignment, Entry, FunctionType, Layer};
use crate::controls::ControlId;
use crate::error::AssignError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Assignments of one layer, keyed in hardware order
pub type LayerMap = BTreeMap<ControlId, Assignment>;

type Table = BTreeMap<Layer, LayerMap>;
type SubscriberFn = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Change notification published after every effective mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Assigned {
        layer: Layer,
        control: ControlId,
        assignment: Assignment,
    },
    Cleared {
        layer: Layer,
        control: ControlId,
    },
    LayerCleared {
        layer: Layer,
        removed: usize,
    },
    Replaced {
        entries: usize,
    },
}

/// Stores MIDI function assignments per layer and notifies subscribers on updates
#[derive(Clone, Default)]
pub struct MappingStore {
    /// Assignments per layer; layers without assignments have no key
    table: Arc<RwLock<Table>>,
    /// Subscribers to store updates
    subscribers: Arc<RwLock<Vec<SubscriberFn>>>,
}

impl MappingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store an assignment, overwriting any previous one.
    ///
    /// On a validation failure the store is left untouched.
    pub fn assign(
        &self,
        layer: Layer,
        control: ControlId,
        function_type: FunctionType,
        channel: u8,
        number: u8,
    ) -> Result<Assignment, AssignError> {
        let assignment = Assignment::new(function_type, channel, number)?;
        self.set(layer, control, assignment);
        Ok(assignment)
    }

    /// Store an already validated assignment
    pub fn set(&self, layer: Layer, control: ControlId, assignment: Assignment) {
        self.table
            .write()
            .entry(layer)
            .or_default()
            .insert(control, assignment);

        debug!("Layer {}: {} → {}", layer, control, assignment);
        self.notify(&StoreEvent::Assigned {
            layer,
            control,
            assignment,
        });
    }

    /// Remove one assignment. Returns whether anything was removed;
    /// clearing an unassigned control is a no-op.
    pub fn clear(&self, layer: Layer, control: ControlId) -> bool {
        let removed = {
            let mut table = self.table.write();
            let removed = table
                .get_mut(&layer)
                .and_then(|map| map.remove(&control))
                .is_some();
            if table.get(&layer).is_some_and(|map| map.is_empty()) {
                table.remove(&layer);
            }
            removed
        };

        if removed {
            debug!("Layer {}: cleared {}", layer, control);
            self.notify(&StoreEvent::Cleared { layer, control });
        }
        removed
    }

    /// Remove every assignment of a layer. Returns how many were removed.
    pub fn clear_layer(&self, layer: Layer) -> usize {
        let removed = self
            .table
            .write()
            .remove(&layer)
            .map(|map| map.len())
            .unwrap_or(0);

        if removed > 0 {
            debug!("Layer {}: cleared {} assignments", layer, removed);
            self.notify(&StoreEvent::LayerCleared { layer, removed });
        }
        removed
    }

    /// Look up one assignment
    pub fn get(&self, layer: Layer, control: ControlId) -> Option<Assignment> {
        self.table
            .read()
            .get(&layer)
            .and_then(|map| map.get(&control))
            .copied()
    }

    /// Snapshot of one layer; changing it does not affect the store
    pub fn all_for_layer(&self, layer: Layer) -> LayerMap {
        self.table.read().get(&layer).cloned().unwrap_or_default()
    }

    /// Snapshot of every assignment, by layer then hardware order
    pub fn entries(&self) -> Vec<Entry> {
        let table = self.table.read();
        table
            .iter()
            .flat_map(|(&layer, map)| {
                map.iter().map(move |(&control, &assignment)| Entry {
                    layer,
                    control,
                    assignment,
                })
            })
            .collect()
    }

    /// Layers holding at least one assignment, ascending
    pub fn populated_layers(&self) -> Vec<Layer> {
        self.table.read().keys().copied().collect()
    }

    /// Total number of assignments across all layers
    pub fn len(&self) -> usize {
        self.table.read().values().map(|map| map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Discard all assignments and install `entries` in one step.
    ///
    /// Later entries for the same (layer, control) overwrite earlier ones.
    pub fn replace_all(&self, entries: impl IntoIterator<Item = Entry>) {
        let mut next = Table::new();
        for entry in entries {
            next.entry(entry.layer)
                .or_default()
                .insert(entry.control, entry.assignment);
        }
        let count = next.values().map(|map| map.len()).sum();

        *self.table.write() = next;

        debug!("Replaced store contents with {} assignments", count);
        self.notify(&StoreEvent::Replaced { entries: count });
    }

    /// Subscribe to store update notifications
    ///
    /// Returns the subscriber index. Listeners run after the write lock is
    /// released and may read the store.
    pub fn subscribe<F>(&self, listener: F) -> usize
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::new(listener));
        subscribers.len() - 1
    }

    fn notify(&self, event: &StoreEvent) {
        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStore")
            .field("table", &*self.table.read())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}
