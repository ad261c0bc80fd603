//! Meaty MIDI Editor
//!
//! Mapping editor for the meaty MIDI controller: assigns MIDI functions to
//! the controller's buttons, knobs and slider across four layers, and saves
//! them to an XML configuration file.

pub mod cli;
pub mod codec;
pub mod config;
pub mod controls;
pub mod error;
pub mod mapping;
pub mod paths;
pub mod session;

pub use codec::{LoadPolicy, LoadReport, SerializeOptions};
pub use config::EditorConfig;
pub use controls::{ControlId, ControlKind};
pub use error::{AssignError, EditorError, ParseError};
pub use mapping::{Assignment, Entry, FunctionType, Layer, MappingStore, StoreEvent};
pub use session::EditorSession;
