//! Editor session - state owned by the UI shell
//!
//! Holds the current layer selector, the default values proposed for new
//! assignments and the file the session was last saved to or loaded from.
//! All edits from the shell go through here and target the current layer.

use crate::codec::{LoadPolicy, LoadReport, SerializeOptions};
use crate::config::EditorConfig;
use crate::controls::ControlId;
use crate::error::{AssignError, EditorError};
use crate::mapping::{Assignment, FunctionType, Layer, MappingStore};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct EditorSession {
    store: MappingStore,
    current_layer: RwLock<Layer>,
    defaults: Assignment,
    policy: LoadPolicy,
    save_options: SerializeOptions,
    document: RwLock<Option<PathBuf>>,
    /// Held for the duration of a save or load
    io_guard: Mutex<()>,
}

impl EditorSession {
    /// Create a session on layer 1 with built-in defaults
    pub fn new(store: MappingStore) -> Self {
        Self {
            store,
            current_layer: RwLock::new(Layer::default()),
            defaults: Assignment::PROPOSED_DEFAULT,
            policy: LoadPolicy::default(),
            save_options: SerializeOptions::default(),
            document: RwLock::new(None),
            io_guard: Mutex::new(()),
        }
    }

    /// Create a session from validated editor settings
    pub fn with_config(store: MappingStore, config: &EditorConfig) -> Result<Self, AssignError> {
        let session = Self {
            current_layer: RwLock::new(config.session.initial_layer()?),
            defaults: config.defaults.assignment()?,
            policy: config.file.load_policy,
            save_options: config.file.serialize_options(),
            ..Self::new(store)
        };
        debug!(
            "Session ready on layer {} (defaults: {}, policy: {:?})",
            session.current_layer(),
            session.defaults,
            session.policy
        );
        Ok(session)
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Every mappable control in hardware order
    pub fn controls(&self) -> &'static [ControlId] {
        ControlId::all()
    }

    pub fn load_policy(&self) -> LoadPolicy {
        self.policy
    }

    // ===== Layer selection =====

    pub fn current_layer(&self) -> Layer {
        *self.current_layer.read()
    }

    /// Select the layer that subsequent edits and display text refer to
    pub fn switch_layer(&self, layer: Layer) {
        *self.current_layer.write() = layer;
        info!("Active layer: {}", layer);
    }

    /// Select a layer by its raw number (1-4)
    pub fn switch_layer_number(&self, number: u8) -> Result<Layer, AssignError> {
        let layer = Layer::new(number)?;
        self.switch_layer(layer);
        Ok(layer)
    }

    /// Navigate to the next layer (circular)
    pub fn next_layer(&self) -> Layer {
        let mut current = self.current_layer.write();
        *current = current.next();
        info!("Next layer → {}", *current);
        *current
    }

    /// Navigate to the previous layer (circular)
    pub fn prev_layer(&self) -> Layer {
        let mut current = self.current_layer.write();
        *current = current.prev();
        info!("Previous layer → {}", *current);
        *current
    }

    // ===== Editing on the current layer =====

    pub fn assign(
        &self,
        control: ControlId,
        function_type: FunctionType,
        channel: u8,
        number: u8,
    ) -> Result<Assignment, AssignError> {
        self.store
            .assign(self.current_layer(), control, function_type, channel, number)
    }

    /// Assign from raw form input. Fields are checked in the order control,
    /// type, channel, number and the first failure is reported.
    pub fn assign_text(
        &self,
        control: &str,
        function_type: &str,
        channel: &str,
        number: &str,
    ) -> Result<(ControlId, Assignment), AssignError> {
        let control: ControlId = control.trim().parse()?;
        let assignment = Assignment::from_text(function_type, channel, number)?;
        self.store.set(self.current_layer(), control, assignment);
        Ok((control, assignment))
    }

    pub fn get(&self, control: ControlId) -> Option<Assignment> {
        self.store.get(self.current_layer(), control)
    }

    /// Remove the control's assignment on the current layer
    pub fn clear(&self, control: ControlId) -> bool {
        self.store.clear(self.current_layer(), control)
    }

    pub fn clear_current_layer(&self) -> usize {
        self.store.clear_layer(self.current_layer())
    }

    /// Values to prefill the mapping form with: the existing assignment, or
    /// the configured defaults
    pub fn proposed(&self, control: ControlId) -> Assignment {
        self.get(control).unwrap_or(self.defaults)
    }

    pub fn defaults(&self) -> Assignment {
        self.defaults
    }

    // ===== Display =====

    /// Short preview shown on the control for the current layer, empty when
    /// unassigned
    pub fn display_text(&self, control: ControlId) -> String {
        self.get(control)
            .map(|assignment| assignment.preview())
            .unwrap_or_default()
    }

    /// Display text for every control on the current layer, hardware order
    pub fn layer_labels(&self) -> Vec<(ControlId, String)> {
        let layer = self.store.all_for_layer(self.current_layer());
        ControlId::all()
            .iter()
            .map(|control| {
                let text = layer
                    .get(control)
                    .map(|assignment| assignment.preview())
                    .unwrap_or_default();
                (*control, text)
            })
            .collect()
    }

    // ===== Files =====

    /// The file last saved to or loaded from
    pub fn document_path(&self) -> Option<PathBuf> {
        self.document.read().clone()
    }

    /// Save every layer to `path` and remember it for later saves
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<usize, EditorError> {
        let path = path.as_ref();
        let _guard = self.begin_io()?;
        let count = self.store.save_to_file(path, &self.save_options)?;
        *self.document.write() = Some(path.to_path_buf());
        Ok(count)
    }

    /// Save to the remembered file
    pub fn save(&self) -> Result<(PathBuf, usize), EditorError> {
        let path = self.document_path().ok_or(EditorError::NoDocument)?;
        let count = self.save_as(&path)?;
        Ok((path, count))
    }

    /// Replace the store with the contents of `path`. On failure the store
    /// and the remembered file are unchanged.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadReport, EditorError> {
        let path = path.as_ref();
        let _guard = self.begin_io()?;
        let report = self.store.load_from_file(path, self.policy)?;
        *self.document.write() = Some(path.to_path_buf());
        Ok(report)
    }

    /// Reload the remembered file
    pub fn reload(&self) -> Result<LoadReport, EditorError> {
        let path = self.document_path().ok_or(EditorError::NoDocument)?;
        self.load(path)
    }

    fn begin_io(&self) -> Result<MutexGuard<'_, ()>, EditorError> {
        self.io_guard.try_lock().ok_or(EditorError::Busy)
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("current_layer", &self.current_layer())
            .field("document", &self.document_path())
            .field("mappings", &self.store.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::fs;
    use tempfile::TempDir;

    fn control(id: &str) -> ControlId {
        id.parse().unwrap()
    }

    fn layer(n: u8) -> Layer {
        Layer::new(n).unwrap()
    }

    #[test]
    fn test_starts_on_first_layer() {
        let session = EditorSession::new(MappingStore::new());
        assert_eq!(session.current_layer(), layer(1));
        assert_eq!(session.controls().len(), 32);
        assert!(session.document_path().is_none());
    }

    #[test]
    fn test_layer_navigation_wraps() {
        let session = EditorSession::new(MappingStore::new());
        assert_eq!(session.prev_layer(), layer(4));
        assert_eq!(session.next_layer(), layer(1));
        assert_eq!(session.next_layer(), layer(2));

        session.switch_layer(layer(4));
        assert_eq!(session.next_layer(), layer(1));

        assert_eq!(session.switch_layer_number(3).unwrap(), layer(3));
        assert!(matches!(
            session.switch_layer_number(0),
            Err(AssignError::InvalidLayer(_))
        ));
        assert_eq!(session.current_layer(), layer(3));
    }

    #[test]
    fn test_edits_target_current_layer() {
        let session = EditorSession::new(MappingStore::new());
        session.switch_layer(layer(2));
        session
            .assign(control("knob_1"), FunctionType::ControlChange, 1, 64)
            .unwrap();

        assert_eq!(session.display_text(control("knob_1")), "CC1:64");
        assert!(session.store().get(layer(2), control("knob_1")).is_some());
        assert!(session.store().get(layer(1), control("knob_1")).is_none());

        session.switch_layer(layer(1));
        assert_eq!(session.display_text(control("knob_1")), "");
        assert!(!session.clear(control("knob_1")));

        session.switch_layer(layer(2));
        assert!(session.clear(control("knob_1")));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_assign_text_reports_first_bad_field() {
        let session = EditorSession::new(MappingStore::new());

        let (id, assignment) = session.assign_text("W3", "Note", "10", "38").unwrap();
        assert_eq!(id, control("white_3"));
        assert_eq!(assignment.function_type(), FunctionType::Note);

        assert!(matches!(
            session.assign_text("dial", "Sysex", "0", "999"),
            Err(AssignError::UnknownControl(_))
        ));
        assert!(matches!(
            session.assign_text("knob_1", "Sysex", "0", "999"),
            Err(AssignError::InvalidFunctionType(_))
        ));
        assert!(matches!(
            session.assign_text("knob_1", "CC", "0", "999"),
            Err(AssignError::InvalidChannel(_))
        ));
        assert!(matches!(
            session.assign_text("knob_1", "CC", "1", "abc"),
            Err(AssignError::InvalidNumber(_))
        ));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_channel_zero_is_rejected_without_mutation() {
        let session = EditorSession::new(MappingStore::new());
        session
            .assign(control("white_1"), FunctionType::Note, 1, 60)
            .unwrap();

        let err = session
            .assign(control("white_1"), FunctionType::Note, 0, 61)
            .unwrap_err();
        assert!(matches!(err, AssignError::InvalidChannel(_)));
        assert_eq!(session.get(control("white_1")).unwrap().number(), 60);
    }

    #[test]
    fn test_layer_labels_cover_every_control() {
        let session = EditorSession::new(MappingStore::new());
        session
            .assign(control("black_10"), FunctionType::ProgramChange, 4, 7)
            .unwrap();

        let labels = session.layer_labels();
        assert_eq!(labels.len(), ControlId::all().len());
        assert_eq!(labels[0], (control("slider_1"), String::new()));
        let (last, text) = labels.last().unwrap();
        assert_eq!(*last, control("black_10"));
        assert_eq!(text, "Pr4:7");
    }

    #[test]
    fn test_clear_current_layer_only() {
        let session = EditorSession::new(MappingStore::new());
        session
            .assign(control("knob_1"), FunctionType::ControlChange, 1, 1)
            .unwrap();
        session
            .assign(control("knob_2"), FunctionType::ControlChange, 1, 2)
            .unwrap();
        session.switch_layer(layer(3));
        session
            .assign(control("knob_1"), FunctionType::ControlChange, 1, 3)
            .unwrap();

        session.switch_layer(layer(1));
        assert_eq!(session.clear_current_layer(), 2);
        assert_eq!(session.clear_current_layer(), 0);
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_proposed_values() {
        let mut config = EditorConfig::default();
        config.defaults.function_type = FunctionType::Note;
        config.defaults.number = 36;
        config.session.initial_layer = 4;

        let session = EditorSession::with_config(MappingStore::new(), &config).unwrap();
        assert_eq!(session.current_layer(), layer(4));

        let proposal = session.proposed(control("white_1"));
        assert_eq!(proposal.function_type(), FunctionType::Note);
        assert_eq!((proposal.channel(), proposal.number()), (1, 36));

        session
            .assign(control("white_1"), FunctionType::ControlChange, 2, 3)
            .unwrap();
        assert_eq!(session.proposed(control("white_1")).channel(), 2);
    }

    #[test]
    fn test_with_config_rejects_bad_initial_layer() {
        let mut config = EditorConfig::default();
        config.session.initial_layer = 9;
        assert!(matches!(
            EditorSession::with_config(MappingStore::new(), &config),
            Err(AssignError::InvalidLayer(_))
        ));
    }

    #[test]
    fn test_save_requires_document() {
        let session = EditorSession::new(MappingStore::new());
        assert!(matches!(session.save(), Err(EditorError::NoDocument)));
        assert!(matches!(session.reload(), Err(EditorError::NoDocument)));
    }

    #[test]
    fn test_save_as_then_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("set.xml");

        let session = EditorSession::new(MappingStore::new());
        session
            .assign(control("slider_1"), FunctionType::PitchBend, 1, 0)
            .unwrap();
        assert_eq!(session.save_as(&path).unwrap(), 1);
        assert_eq!(session.document_path().as_deref(), Some(path.as_path()));

        session
            .assign(control("knob_6"), FunctionType::ControlChange, 2, 7)
            .unwrap();
        let (saved_to, count) = session.save().unwrap();
        assert_eq!(saved_to, path);
        assert_eq!(count, 2);

        let other = EditorSession::new(MappingStore::new());
        let report = other.load(&path).unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(other.store().entries(), session.store().entries());
        assert_eq!(other.document_path().as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.xml");
        let bad = dir.path().join("bad.xml");

        let session = EditorSession::new(MappingStore::new());
        session
            .assign(control("knob_1"), FunctionType::ControlChange, 1, 1)
            .unwrap();
        session.save_as(&good).unwrap();

        fs::write(&bad, "<MIDIConfiguration><Layer number=\"1\">").unwrap();
        let err = session.load(&bad).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Parse(ParseError::UnclosedElement(_))
        ));
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.document_path().as_deref(), Some(good.as_path()));
    }

    #[test]
    fn test_overlapping_io_is_busy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("busy.xml");
        let session = EditorSession::new(MappingStore::new());

        let held = session.io_guard.lock();
        assert!(matches!(session.save_as(&path), Err(EditorError::Busy)));
        assert!(matches!(session.load(&path), Err(EditorError::Busy)));
        assert!(!path.exists());
        drop(held);

        session.save_as(&path).unwrap();
        assert!(path.exists());
    }
}
