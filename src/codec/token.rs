//! Packed function token (`CC1:64`)
//!
//! The token is the two-character type prefix, the channel, a colon and the
//! number. It is written to the `function` attribute for compatibility and
//! used as the short preview on control labels. Decoding is strict: the
//! colon is mandatory so `CC1:10` and `CC11:0` never collide.

use crate::error::ParseError;
use crate::mapping::{validate_channel, validate_number, Assignment, FunctionType};

impl Assignment {
    /// Packed token, e.g. `CC1:64`, `No10:60`, `Pi16:0`
    pub fn token(&self) -> String {
        format!(
            "{}{}:{}",
            self.function_type().token_prefix(),
            self.channel(),
            self.number()
        )
    }

    /// Short preview shown on a control label
    pub fn preview(&self) -> String {
        self.token()
    }

    /// Decode a packed token
    pub fn from_token(token: &str) -> Result<Self, ParseError> {
        let malformed = |reason: &str| ParseError::InvalidFunction {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let prefix = token
            .get(..2)
            .ok_or_else(|| malformed("too short for a type prefix"))?;
        let function_type = FunctionType::from_token_prefix(prefix)
            .ok_or_else(|| malformed("unknown type prefix (expected No, CC, Pr or Pi)"))?;

        let (channel, number) = token[2..]
            .split_once(':')
            .ok_or_else(|| malformed("missing ':' between channel and number"))?;
        let channel = parse_digits(channel).ok_or_else(|| malformed("channel is not a number"))?;
        let number = parse_digits(number).ok_or_else(|| malformed("number is not a number"))?;

        let channel = validate_channel(channel).map_err(|e| malformed(&e.to_string()))?;
        let number = validate_number(number).map_err(|e| malformed(&e.to_string()))?;

        Assignment::new(function_type, channel, number).map_err(|e| malformed(&e.to_string()))
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_of(ft: FunctionType, channel: u8, number: u8) -> String {
        Assignment::new(ft, channel, number).unwrap().token()
    }

    #[test]
    fn test_token_format() {
        assert_eq!(token_of(FunctionType::ControlChange, 1, 64), "CC1:64");
        assert_eq!(token_of(FunctionType::Note, 10, 60), "No10:60");
        assert_eq!(token_of(FunctionType::ProgramChange, 1, 5), "Pr1:5");
        assert_eq!(token_of(FunctionType::PitchBend, 16, 0), "Pi16:0");
    }

    #[test]
    fn test_colon_keeps_fields_apart() {
        let a = Assignment::from_token("CC1:10").unwrap();
        let b = Assignment::from_token("CC11:0").unwrap();
        assert_eq!((a.channel(), a.number()), (1, 10));
        assert_eq!((b.channel(), b.number()), (11, 0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in ["", "C", "CC", "CC110", "Xx1:1", "CC:1", "CC1:", "CC1:2:3", "cc1:1", "CC-1:5", "CC1: 5"] {
            assert!(
                matches!(Assignment::from_token(bad), Err(ParseError::InvalidFunction { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let err = Assignment::from_token("CC0:1").unwrap_err();
        assert!(err.to_string().contains("channel"), "{err}");

        let err = Assignment::from_token("No1:128").unwrap_err();
        assert!(err.to_string().contains("0 and 127"), "{err}");

        assert!(Assignment::from_token("CC99999999999:1").is_err());
    }
}
