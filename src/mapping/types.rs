//! Mapping type definitions
//!
//! Defines layers, MIDI function types and validated assignments.

use crate::controls::ControlId;
use crate::error::AssignError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// One of the four independent mapping layers (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Layer(u8);

impl Layer {
    /// Number of layers exposed by the device
    pub const COUNT: u8 = 4;

    pub fn new(number: u8) -> Result<Self, AssignError> {
        if (1..=Self::COUNT).contains(&number) {
            Ok(Self(number))
        } else {
            Err(AssignError::InvalidLayer(number.to_string()))
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// All layers in ascending order
    pub fn all() -> impl Iterator<Item = Layer> {
        (1..=Self::COUNT).map(Layer)
    }

    /// Next layer, wrapping 4 → 1
    pub fn next(&self) -> Layer {
        Layer(self.0 % Self::COUNT + 1)
    }

    /// Previous layer, wrapping 1 → 4
    pub fn prev(&self) -> Layer {
        if self.0 == 1 {
            Layer(Self::COUNT)
        } else {
            Layer(self.0 - 1)
        }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer(1)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Layer {
    type Err = AssignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .trim()
            .parse::<u8>()
            .map_err(|_| AssignError::InvalidLayer(s.to_string()))?;
        Layer::new(number).map_err(|_| AssignError::InvalidLayer(s.to_string()))
    }
}

/// Kind of MIDI message a control emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FunctionType {
    Note,
    ControlChange,
    ProgramChange,
    PitchBend,
}

impl FunctionType {
    /// All function types, in the order the mapping form lists them
    pub fn all() -> &'static [FunctionType] {
        &[
            FunctionType::Note,
            FunctionType::ControlChange,
            FunctionType::ProgramChange,
            FunctionType::PitchBend,
        ]
    }

    /// Human-readable name, as offered by the mapping form
    pub fn display_name(&self) -> &'static str {
        match self {
            FunctionType::Note => "Note",
            FunctionType::ControlChange => "CC",
            FunctionType::ProgramChange => "Program Change",
            FunctionType::PitchBend => "Pitch Bend",
        }
    }

    /// Stable name written to the `type` attribute of mapping files
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionType::Note => "Note",
            FunctionType::ControlChange => "ControlChange",
            FunctionType::ProgramChange => "ProgramChange",
            FunctionType::PitchBend => "PitchBend",
        }
    }

    /// Two-character prefix of the packed function token
    pub fn token_prefix(&self) -> &'static str {
        match self {
            FunctionType::Note => "No",
            FunctionType::ControlChange => "CC",
            FunctionType::ProgramChange => "Pr",
            FunctionType::PitchBend => "Pi",
        }
    }

    pub fn from_token_prefix(prefix: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|ft| ft.token_prefix() == prefix)
    }

    /// What the `number` field means for this function type
    pub fn number_meaning(&self) -> &'static str {
        match self {
            FunctionType::Note => "note",
            FunctionType::ControlChange => "CC number",
            FunctionType::ProgramChange => "program",
            FunctionType::PitchBend => "unused",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for FunctionType {
    type Err = AssignError;

    /// Case-insensitive; spaces, dashes and underscores are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "note" | "no" => Ok(FunctionType::Note),
            "cc" | "controlchange" => Ok(FunctionType::ControlChange),
            "programchange" | "program" | "pc" | "pr" => Ok(FunctionType::ProgramChange),
            "pitchbend" | "pb" | "pi" => Ok(FunctionType::PitchBend),
            _ => Err(AssignError::InvalidFunctionType(s.to_string())),
        }
    }
}

impl TryFrom<String> for FunctionType {
    type Error = AssignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FunctionType> for String {
    fn from(value: FunctionType) -> Self {
        value.display_name().to_string()
    }
}

/// Valid MIDI channels (1-based)
pub const CHANNEL_RANGE: RangeInclusive<u8> = 1..=16;

/// Valid CC/note/program numbers
pub const NUMBER_RANGE: RangeInclusive<u8> = 0..=127;

/// Check a MIDI channel against [`CHANNEL_RANGE`]
pub fn validate_channel(channel: u32) -> Result<u8, AssignError> {
    u8::try_from(channel)
        .ok()
        .filter(|ch| CHANNEL_RANGE.contains(ch))
        .ok_or_else(|| AssignError::InvalidChannel(channel.to_string()))
}

/// Check a CC/note/program number against [`NUMBER_RANGE`]
pub fn validate_number(number: u32) -> Result<u8, AssignError> {
    u8::try_from(number)
        .ok()
        .filter(|n| NUMBER_RANGE.contains(n))
        .ok_or_else(|| AssignError::InvalidNumber(number.to_string()))
}

/// A validated MIDI function assignment: (type, channel, number).
///
/// Values of this type always satisfy the channel and number ranges, so a
/// store holding only `Assignment`s can never hold an invalid mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Assignment {
    function_type: FunctionType,
    channel: u8,
    number: u8,
}

impl Assignment {
    /// What the mapping form proposes for a control with no assignment
    pub const PROPOSED_DEFAULT: Assignment = Assignment {
        function_type: FunctionType::ControlChange,
        channel: 1,
        number: 1,
    };

    pub fn new(function_type: FunctionType, channel: u8, number: u8) -> Result<Self, AssignError> {
        Ok(Self {
            function_type,
            channel: validate_channel(channel.into())?,
            number: validate_number(number.into())?,
        })
    }

    /// Build an assignment from raw form input.
    ///
    /// Fields are checked in form order (type, channel, number) and the first
    /// bad field is reported, including empty or non-numeric text.
    pub fn from_text(function_type: &str, channel: &str, number: &str) -> Result<Self, AssignError> {
        let function_type: FunctionType = function_type.parse()?;
        let channel = channel
            .trim()
            .parse::<u32>()
            .map_err(|_| AssignError::InvalidChannel(channel.to_string()))
            .and_then(validate_channel)?;
        let number = number
            .trim()
            .parse::<u32>()
            .map_err(|_| AssignError::InvalidNumber(number.to_string()))
            .and_then(validate_number)?;

        Ok(Self {
            function_type,
            channel,
            number,
        })
    }

    pub fn function_type(&self) -> FunctionType {
        self.function_type
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.function_type {
            FunctionType::PitchBend => write!(f, "{} ch{}", self.function_type, self.channel),
            _ => write!(
                f,
                "{} ch{} {} {}",
                self.function_type,
                self.channel,
                self.function_type.number_meaning(),
                self.number
            ),
        }
    }
}

/// One (layer, control) → assignment row, as exchanged with the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    pub layer: Layer,
    pub control: ControlId,
    pub assignment: Assignment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_bounds() {
        assert!(Layer::new(0).is_err());
        assert!(Layer::new(5).is_err());
        assert_eq!(Layer::new(4).unwrap().number(), 4);
        assert_eq!(Layer::default().number(), 1);
        assert_eq!(Layer::all().count(), 4);
    }

    #[test]
    fn test_layer_wraparound() {
        let first = Layer::new(1).unwrap();
        let last = Layer::new(4).unwrap();
        assert_eq!(last.next(), first);
        assert_eq!(first.prev(), last);
        assert_eq!(first.next().number(), 2);
    }

    #[test]
    fn test_layer_from_str() {
        assert_eq!("3".parse::<Layer>().unwrap().number(), 3);
        assert_eq!(
            "five".parse::<Layer>(),
            Err(AssignError::InvalidLayer("five".into()))
        );
        assert_eq!("9".parse::<Layer>(), Err(AssignError::InvalidLayer("9".into())));
    }

    #[test]
    fn test_function_type_names() {
        assert_eq!("CC".parse::<FunctionType>().unwrap(), FunctionType::ControlChange);
        assert_eq!(
            "Program Change".parse::<FunctionType>().unwrap(),
            FunctionType::ProgramChange
        );
        assert_eq!("pitch-bend".parse::<FunctionType>().unwrap(), FunctionType::PitchBend);
        assert_eq!("note".parse::<FunctionType>().unwrap(), FunctionType::Note);
        assert_eq!(
            "Aftertouch".parse::<FunctionType>(),
            Err(AssignError::InvalidFunctionType("Aftertouch".into()))
        );
    }

    #[test]
    fn test_type_names_round_trip() {
        for ft in FunctionType::all() {
            assert_eq!(ft.as_str().parse::<FunctionType>().unwrap(), *ft);
            assert_eq!(ft.display_name().parse::<FunctionType>().unwrap(), *ft);
            assert_eq!(FunctionType::from_token_prefix(ft.token_prefix()), Some(*ft));
        }
    }

    #[test]
    fn test_assignment_validation() {
        assert!(Assignment::new(FunctionType::ControlChange, 1, 64).is_ok());
        assert!(Assignment::new(FunctionType::PitchBend, 16, 0).is_ok());
        assert_eq!(
            Assignment::new(FunctionType::ControlChange, 0, 64),
            Err(AssignError::InvalidChannel("0".into()))
        );
        assert_eq!(
            Assignment::new(FunctionType::ControlChange, 17, 64),
            Err(AssignError::InvalidChannel("17".into()))
        );
        assert_eq!(
            Assignment::new(FunctionType::Note, 1, 128),
            Err(AssignError::InvalidNumber("128".into()))
        );
    }

    #[test]
    fn test_assignment_from_text() {
        let a = Assignment::from_text("CC", " 2 ", "74").unwrap();
        assert_eq!(a.function_type(), FunctionType::ControlChange);
        assert_eq!(a.channel(), 2);
        assert_eq!(a.number(), 74);

        assert_eq!(
            Assignment::from_text("CC", "", "1"),
            Err(AssignError::InvalidChannel("".into()))
        );
        assert_eq!(
            Assignment::from_text("CC", "1", "abc"),
            Err(AssignError::InvalidNumber("abc".into()))
        );
        assert_eq!(
            Assignment::from_text("CC", "300", "1"),
            Err(AssignError::InvalidChannel("300".into()))
        );
        // Type is checked before the other fields
        assert_eq!(
            Assignment::from_text("Sysex", "0", "999"),
            Err(AssignError::InvalidFunctionType("Sysex".into()))
        );
    }

    #[test]
    fn test_function_type_serde() {
        let yaml = serde_yaml::to_string(&FunctionType::ProgramChange).unwrap();
        assert_eq!(yaml.trim(), "Program Change");
        let parsed: FunctionType = serde_yaml::from_str("CC").unwrap();
        assert_eq!(parsed, FunctionType::ControlChange);
        assert!(serde_yaml::from_str::<FunctionType>("Sysex").is_err());
    }
}
