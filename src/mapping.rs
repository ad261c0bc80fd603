//! Mapping store module - MIDI function assignments per layer and control
//!
//! This module provides the validated assignment types and the store that
//! holds one assignment per (layer, control) pair. Nothing in here knows
//! which layer is currently selected; that belongs to the editor session.

mod store;
mod types;

pub use store::{LayerMap, MappingStore, StoreEvent};
pub use types::{
    validate_channel, validate_number, Assignment, Entry, FunctionType, Layer, CHANNEL_RANGE,
    NUMBER_RANGE,
};
