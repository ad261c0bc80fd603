//! Configuration codec - mapping store ⇄ XML document
//!
//! Serializes the store to the nested `MIDIConfiguration/Layer/Control`
//! layout and parses it back. Each control carries explicit type, channel
//! and number attributes plus the packed `function` token; files holding
//! only the packed token are still accepted.

mod file;
mod token;
mod xml;

pub use file::LoadReport;
pub use xml::{
    deserialize, deserialize_with, serialize, serialize_with, LoadPolicy, ParsedDocument,
    SerializeOptions,
};
