//! Frame types carried in the header's type byte.

use std::fmt;

/// What a frame's payload holds.
///
/// The transport does not interpret payloads; the type lets the layer above
/// tell a key exchange apart from a salt or an application record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    None = 0,
    Key = 1,
    Salt = 2,
    Message = 3,
    SecureRecord = 4,
}

impl FrameType {
    pub const ALL: [FrameType; 5] = [
        FrameType::None,
        FrameType::Key,
        FrameType::Salt,
        FrameType::Message,
        FrameType::SecureRecord,
    ];

    /// Wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value; `None` for bytes outside the enum.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameType::None),
            1 => Some(FrameType::Key),
            2 => Some(FrameType::Salt),
            3 => Some(FrameType::Message),
            4 => Some(FrameType::SecureRecord),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FrameType::None => "NONE",
            FrameType::Key => "KEY",
            FrameType::Salt => "SALT",
            FrameType::Message => "MESSAGE",
            FrameType::SecureRecord => "SECURE_RECORD",
        }
    }

    /// Parse a name as printed by [`FrameType::name`], case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.name() == upper)
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(FrameType::None.as_u8(), 0);
        assert_eq!(FrameType::Key.as_u8(), 1);
        assert_eq!(FrameType::Salt.as_u8(), 2);
        assert_eq!(FrameType::Message.as_u8(), 3);
        assert_eq!(FrameType::SecureRecord.as_u8(), 4);
    }

    #[test]
    fn from_u8_rejects_unknown() {
        for t in FrameType::ALL {
            assert_eq!(FrameType::from_u8(t.as_u8()), Some(t));
        }
        assert_eq!(FrameType::from_u8(5), None);
        assert_eq!(FrameType::from_u8(0xFF), None);
    }

    #[test]
    fn names_parse_back() {
        assert_eq!(FrameType::from_name("message"), Some(FrameType::Message));
        assert_eq!(
            FrameType::from_name("secure-record"),
            Some(FrameType::SecureRecord)
        );
        assert_eq!(FrameType::from_name("bogus"), None);
    }
}
