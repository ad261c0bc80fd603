//! XML document layout
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <MIDIConfiguration>
//!   <Layer number="2">
//!     <Control id="knob_1" function="CC1:64" type="ControlChange" channel="1" number="64"/>
//!   </Layer>
//! </MIDIConfiguration>
//! ```
//!
//! Only `Layer` elements directly under the root and `Control` elements
//! directly under a `Layer` are read; anything else is ignored.

use crate::controls::ControlId;
use crate::error::ParseError;
use crate::mapping::{Assignment, Entry, Layer, MappingStore};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

const ROOT: &str = "MIDIConfiguration";
const LAYER: &str = "Layer";
const CONTROL: &str = "Control";

/// What to do with a `<Control>` entry that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Abort the whole load on the first bad entry
    #[default]
    Strict,
    /// Skip bad entries and report them; document-level errors still abort
    SkipInvalid,
}

/// Output formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Spaces per nesting level; 0 writes everything on one line
    pub indent: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Result of decoding a document
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub entries: Vec<Entry>,
    /// Entries dropped under [`LoadPolicy::SkipInvalid`]
    pub skipped: Vec<ParseError>,
}

/// Serialize the store with default formatting
pub fn serialize(store: &MappingStore) -> Result<String, quick_xml::Error> {
    serialize_with(store, &SerializeOptions::default())
}

/// Serialize the store. Layers without assignments are omitted.
pub fn serialize_with(
    store: &MappingStore,
    options: &SerializeOptions,
) -> Result<String, quick_xml::Error> {
    // One snapshot so the document is consistent even if the store changes meanwhile
    let mut layers: BTreeMap<Layer, Vec<Entry>> = BTreeMap::new();
    for entry in store.entries() {
        layers.entry(entry.layer).or_default().push(entry);
    }

    let mut writer = if options.indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    if layers.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(ROOT)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(ROOT)))?;
        for (layer, entries) in &layers {
            let number = layer.number().to_string();
            let mut layer_elem = BytesStart::new(LAYER);
            layer_elem.push_attribute(("number", number.as_str()));
            writer.write_event(Event::Start(layer_elem))?;

            for entry in entries {
                writer.write_event(Event::Empty(control_element(entry)))?;
            }

            writer.write_event(Event::End(BytesEnd::new(LAYER)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    }

    let mut text = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    text.push('\n');
    Ok(text)
}

fn control_element(entry: &Entry) -> BytesStart<'static> {
    let a = &entry.assignment;
    let id = entry.control.to_string();
    let token = a.token();
    let channel = a.channel().to_string();
    let number = a.number().to_string();

    let mut elem = BytesStart::new(CONTROL);
    elem.push_attribute(("id", id.as_str()));
    elem.push_attribute(("function", token.as_str()));
    elem.push_attribute(("type", a.function_type().as_str()));
    elem.push_attribute(("channel", channel.as_str()));
    elem.push_attribute(("number", number.as_str()));
    elem
}

/// Parse a document, aborting on the first malformed entry
pub fn deserialize(text: &str) -> Result<Vec<Entry>, ParseError> {
    deserialize_with(text, LoadPolicy::Strict).map(|doc| doc.entries)
}

/// Parse a document under the given policy
pub fn deserialize_with(text: &str, policy: LoadPolicy) -> Result<ParsedDocument, ParseError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut doc = ParsedDocument::default();
    let mut seen: HashSet<(Layer, ControlId)> = HashSet::new();
    // Names of the currently open elements, outermost first
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut current_layer: Option<Layer> = None;
    let mut root_found = false;

    loop {
        let event = reader.read_event().map_err(|source| ParseError::Xml {
            position: reader.buffer_position(),
            source,
        })?;
        let position = reader.buffer_position();

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let opens = matches!(event, Event::Start(_));
                let name = e.name().as_ref().to_vec();

                match open.len() {
                    0 if name == ROOT.as_bytes() => root_found = true,
                    0 => return Err(ParseError::MissingRoot),
                    1 if name == LAYER.as_bytes() => {
                        let layer = parse_layer(e, position)?;
                        if opens {
                            current_layer = Some(layer);
                        }
                    }
                    2 if name == CONTROL.as_bytes() => {
                        if let Some(layer) = current_layer {
                            match parse_control(e, position) {
                                Ok((control, assignment)) => {
                                    record(&mut doc, &mut seen, layer, control, assignment)
                                }
                                Err(err)
                                    if policy == LoadPolicy::SkipInvalid
                                        && err.is_entry_level() =>
                                {
                                    warn!("Skipping entry on layer {}: {}", layer, err);
                                    doc.skipped.push(err);
                                }
                                Err(err) => return Err(err),
                            }
                        }
                    }
                    _ => {}
                }

                if opens {
                    open.push(name);
                }
            }
            Event::End(_) => {
                open.pop();
                if open.len() < 2 {
                    current_layer = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(name) = open.pop() {
        return Err(ParseError::UnclosedElement(
            String::from_utf8_lossy(&name).into_owned(),
        ));
    }
    if !root_found {
        return Err(ParseError::MissingRoot);
    }

    debug!(
        "Parsed {} entries ({} skipped)",
        doc.entries.len(),
        doc.skipped.len()
    );
    Ok(doc)
}

fn record(
    doc: &mut ParsedDocument,
    seen: &mut HashSet<(Layer, ControlId)>,
    layer: Layer,
    control: ControlId,
    assignment: Assignment,
) {
    if !seen.insert((layer, control)) {
        warn!(
            "Duplicate mapping for {} on layer {}; the last one wins",
            control, layer
        );
        doc.entries
            .retain(|e| !(e.layer == layer && e.control == control));
    }
    doc.entries.push(Entry {
        layer,
        control,
        assignment,
    });
}

fn attribute(e: &BytesStart<'_>, name: &str, position: usize) -> Result<Option<String>, ParseError> {
    let xml_error = |source| ParseError::Xml { position, source };

    match e.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

fn parse_layer(e: &BytesStart<'_>, position: usize) -> Result<Layer, ParseError> {
    let number = attribute(e, "number", position)?.ok_or(ParseError::MissingAttribute {
        element: "Layer",
        attribute: "number",
    })?;
    number
        .parse::<Layer>()
        .map_err(|_| ParseError::InvalidLayer(number))
}

fn parse_control(e: &BytesStart<'_>, position: usize) -> Result<(ControlId, Assignment), ParseError> {
    let id = attribute(e, "id", position)?.ok_or(ParseError::MissingAttribute {
        element: "Control",
        attribute: "id",
    })?;
    let control = id
        .parse::<ControlId>()
        .map_err(|_| ParseError::UnknownControl(id.clone()))?;

    let token = attribute(e, "function", position)?;
    let explicit = explicit_fields(e, &id, position)?;

    let assignment = match (explicit, token) {
        (Some(assignment), Some(token)) => {
            if Assignment::from_token(&token).ok() != Some(assignment) {
                return Err(ParseError::ConflictingFunction { control: id, token });
            }
            assignment
        }
        (Some(assignment), None) => assignment,
        (None, Some(token)) => Assignment::from_token(&token)?,
        (None, None) => {
            return Err(ParseError::MissingAttribute {
                element: "Control",
                attribute: "function",
            })
        }
    };

    Ok((control, assignment))
}

/// Decode the `type`/`channel`/`number` attributes; `None` if all are absent
fn explicit_fields(
    e: &BytesStart<'_>,
    id: &str,
    position: usize,
) -> Result<Option<Assignment>, ParseError> {
    let function_type = attribute(e, "type", position)?;
    let channel = attribute(e, "channel", position)?;
    let number = attribute(e, "number", position)?;

    let missing = |attribute| ParseError::MissingAttribute {
        element: "Control",
        attribute,
    };

    match (function_type, channel, number) {
        (None, None, None) => Ok(None),
        (Some(function_type), Some(channel), Some(number)) => {
            Assignment::from_text(&function_type, &channel, &number)
                .map(Some)
                .map_err(|source| ParseError::InvalidAssignment {
                    control: id.to_string(),
                    source,
                })
        }
        (None, _, _) => Err(missing("type")),
        (_, None, _) => Err(missing("channel")),
        (_, _, None) => Err(missing("number")),
    }
}
