//! Hardware layout of the meaty controller
//!
//! The set of mappable controls is fixed by the hardware: one slider, six
//! knobs, fifteen white buttons and ten black buttons. The four layer-select
//! buttons (F1-F4) are not mappable and are handled by the session.

use crate::error::AssignError;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Kind tag distinguishing the physical control types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlKind {
    Slider,
    Knob,
    WhiteButton,
    BlackButton,
}

impl ControlKind {
    /// All kinds, in hardware order
    pub fn all() -> &'static [ControlKind] {
        &[
            ControlKind::Slider,
            ControlKind::Knob,
            ControlKind::WhiteButton,
            ControlKind::BlackButton,
        ]
    }

    /// Number of controls of this kind on the device
    pub fn count(&self) -> u8 {
        match self {
            ControlKind::Slider => 1,
            ControlKind::Knob => 6,
            ControlKind::WhiteButton => 15,
            ControlKind::BlackButton => 10,
        }
    }

    /// Prefix of the canonical identifier (`knob` in `knob_3`)
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ControlKind::Slider => "slider",
            ControlKind::Knob => "knob",
            ControlKind::WhiteButton => "white",
            ControlKind::BlackButton => "black",
        }
    }

    /// Letter printed on the device next to the control (`K` in `K3`)
    pub fn label_letter(&self) -> char {
        match self {
            ControlKind::Slider => 'S',
            ControlKind::Knob => 'K',
            ControlKind::WhiteButton => 'W',
            ControlKind::BlackButton => 'B',
        }
    }

    /// Whether the control renders its mapping preview as a text label.
    /// Knobs and the slider are drawn as dials and show no text.
    pub fn shows_label(&self) -> bool {
        matches!(self, ControlKind::WhiteButton | ControlKind::BlackButton)
    }

    fn from_label_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'S' => Some(ControlKind::Slider),
            'K' => Some(ControlKind::Knob),
            'W' => Some(ControlKind::WhiteButton),
            'B' => Some(ControlKind::BlackButton),
            _ => None,
        }
    }

    fn from_id_prefix(prefix: &str) -> Option<Self> {
        ControlKind::all()
            .iter()
            .copied()
            .find(|kind| kind.id_prefix() == prefix)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::Slider => write!(f, "slider"),
            ControlKind::Knob => write!(f, "knob"),
            ControlKind::WhiteButton => write!(f, "white button"),
            ControlKind::BlackButton => write!(f, "black button"),
        }
    }
}

/// Identifier of one physical control.
///
/// Only identifiers present on the hardware can be constructed; ordering
/// follows the hardware layout (slider, knobs, white buttons, black buttons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId {
    kind: ControlKind,
    index: u8,
}

static ALL_CONTROLS: OnceLock<Vec<ControlId>> = OnceLock::new();

impl ControlId {
    /// Build an identifier, returning `None` if the device has no such control.
    /// Indices are 1-based as printed on the hardware.
    pub fn new(kind: ControlKind, index: u8) -> Option<Self> {
        (1..=kind.count())
            .contains(&index)
            .then_some(Self { kind, index })
    }

    /// Every control on the device, in hardware order
    pub fn all() -> &'static [ControlId] {
        ALL_CONTROLS.get_or_init(|| {
            ControlKind::all()
                .iter()
                .flat_map(|&kind| (1..=kind.count()).map(move |index| ControlId { kind, index }))
                .collect()
        })
    }

    /// Every control of one kind, in hardware order
    pub fn of_kind(kind: ControlKind) -> impl Iterator<Item = ControlId> {
        Self::all().iter().copied().filter(move |id| id.kind == kind)
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Short label printed on the device (`W12`, `K5`, `S1`)
    pub fn hardware_label(&self) -> String {
        format!("{}{}", self.kind.label_letter(), self.index)
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.id_prefix(), self.index)
    }
}

/// Parse a 1-based control index; digits only
fn parse_index(s: &str) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u8>().ok()
}

impl FromStr for ControlId {
    type Err = AssignError;

    /// Accepts the canonical id (`knob_3`), the hardware label (`K3`,
    /// case-insensitive) and the legacy right-hand knob names
    /// (`knob_right_1`, `knob_right_2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || AssignError::UnknownControl(s.to_string());
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if let Some(n) = lower.strip_prefix("knob_right_") {
            let index = parse_index(n).ok_or_else(unknown)?;
            // The two right-hand knobs follow the four top knobs
            return match index {
                1 | 2 => ControlId::new(ControlKind::Knob, index + 4).ok_or_else(unknown),
                _ => Err(unknown()),
            };
        }

        if let Some((prefix, n)) = lower.split_once('_') {
            let kind = ControlKind::from_id_prefix(prefix).ok_or_else(unknown)?;
            let index = parse_index(n).ok_or_else(unknown)?;
            return ControlId::new(kind, index).ok_or_else(unknown);
        }

        let mut chars = trimmed.chars();
        let kind = chars
            .next()
            .and_then(ControlKind::from_label_letter)
            .ok_or_else(unknown)?;
        let index = parse_index(chars.as_str()).ok_or_else(unknown)?;
        ControlId::new(kind, index).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_counts() {
        assert_eq!(ControlId::all().len(), 32);
        assert_eq!(ControlId::of_kind(ControlKind::Knob).count(), 6);
        assert_eq!(ControlId::of_kind(ControlKind::WhiteButton).count(), 15);
        assert_eq!(ControlId::of_kind(ControlKind::BlackButton).count(), 10);
        assert_eq!(ControlId::of_kind(ControlKind::Slider).count(), 1);
    }

    #[test]
    fn test_hardware_order() {
        let all = ControlId::all();
        assert_eq!(all[0].to_string(), "slider_1");
        assert_eq!(all[1].to_string(), "knob_1");
        assert_eq!(all[31].to_string(), "black_10");

        let mut sorted = all.to_vec();
        sorted.sort();
        assert_eq!(sorted, all);
    }

    #[test]
    fn test_parse_canonical_ids() {
        for id in ControlId::all() {
            assert_eq!(id.to_string().parse::<ControlId>().unwrap(), *id);
        }
    }

    #[test]
    fn test_parse_hardware_labels() {
        let knob: ControlId = "K3".parse().unwrap();
        assert_eq!(knob.to_string(), "knob_3");

        let white: ControlId = "w15".parse().unwrap();
        assert_eq!(white.to_string(), "white_15");
        assert_eq!(white.hardware_label(), "W15");

        assert!("K7".parse::<ControlId>().is_err());
        assert!("F1".parse::<ControlId>().is_err());
    }

    #[test]
    fn test_parse_legacy_right_knobs() {
        assert_eq!(
            "knob_right_1".parse::<ControlId>().unwrap().to_string(),
            "knob_5"
        );
        assert_eq!(
            "knob_right_2".parse::<ControlId>().unwrap().to_string(),
            "knob_6"
        );
        assert!("knob_right_3".parse::<ControlId>().is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        for bad in ["", "knob_0", "knob_7", "white_16", "black_+1", "dial_1", "slider_2", "knob_"] {
            assert_eq!(
                bad.parse::<ControlId>(),
                Err(AssignError::UnknownControl(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_only_buttons_show_labels() {
        assert!(ControlKind::WhiteButton.shows_label());
        assert!(ControlKind::BlackButton.shows_label());
        assert!(!ControlKind::Knob.shows_label());
        assert!(!ControlKind::Slider.shows_label());
    }
}
