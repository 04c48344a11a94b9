use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of an [`crate::element::ElementCombo`] row.
    ComboId
);
impl ComboId {
    /// Serial sentinel for "no element". Never a catalog row.
    pub const NONE: ComboId = ComboId(0);
}

numeric_id!(
    /// Identifier of a manufacturer/item type pairing row.
    PairingId
);
numeric_id!(
    /// Part identifier, unique within its [`crate::catalog::PartFamily`].
    PartId
);

macro_rules! slug {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Normalizes to a lowercase, underscore-separated slug.
            pub fn new(raw: impl AsRef<str>) -> Self {
                let slug = raw
                    .as_ref()
                    .trim()
                    .chars()
                    .map(|c| match c {
                        ' ' | '-' => '_',
                        other => other.to_ascii_lowercase(),
                    })
                    .collect();
                Self(slug)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Title-cased form for human-facing strings (`assault_rifle` -> `Assault Rifle`).
            pub fn title(&self) -> String {
                self.0
                    .split('_')
                    .filter(|w| !w.is_empty())
                    .map(|w| {
                        let mut chars = w.chars();
                        match chars.next() {
                            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                            None => String::new(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

slug!(
    /// Manufacturer slug, e.g. `jakobs`.
    Manufacturer
);
slug!(
    /// Item type slug, e.g. `assault_rifle` or `energy_shield`.
    ItemType
);

/// Addresses one attachment position: a slot rule code plus an index below
/// that rule's capacity. Written and serialized as `code.index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub code: u16,
    pub index: u8,
}

impl SlotKey {
    pub fn new(code: u16, index: u8) -> Self {
        Self { code, index }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.code, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSlotKeyError {
    pub input: String,
}

impl fmt::Display for ParseSlotKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid slot key '{}', expected <code>.<index>", self.input)
    }
}

impl std::error::Error for ParseSlotKeyError {}

impl FromStr for SlotKey {
    type Err = ParseSlotKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSlotKeyError {
            input: s.to_string(),
        };
        let (code, index) = s.split_once('.').ok_or_else(err)?;
        let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(code) || !all_digits(index) {
            return Err(err());
        }
        Ok(Self {
            code: code.parse().map_err(|_| err())?,
            index: index.parse().map_err(|_| err())?,
        })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Persisted identity of a build in the external store. History appends
/// are serialized per item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_normalize_case_and_separators() {
        assert_eq!(Manufacturer::new(" Jakobs ").as_str(), "jakobs");
        assert_eq!(ItemType::new("Assault Rifle").as_str(), "assault_rifle");
        assert_eq!(ItemType::new("energy-shield").as_str(), "energy_shield");
    }

    #[test]
    fn slug_title_case() {
        assert_eq!(ItemType::new("assault_rifle").title(), "Assault Rifle");
        assert_eq!(ItemType::new("smg").title(), "Smg");
    }

    #[test]
    fn slot_key_parses_and_displays() {
        let key: SlotKey = "246.1".parse().expect("parse");
        assert_eq!(key, SlotKey::new(246, 1));
        assert_eq!(key.to_string(), "246.1");
    }

    #[test]
    fn slot_key_rejects_garbage() {
        for bad in ["", "246", "246.", ".1", "a.1", "246.x", "246.1.2", "-1.0", "+1.0", "70000.0"] {
            assert!(bad.parse::<SlotKey>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn slot_keys_order_by_code_then_index() {
        let mut keys = vec![SlotKey::new(13, 1), SlotKey::new(12, 0), SlotKey::new(13, 0)];
        keys.sort();
        assert_eq!(
            keys,
            vec![SlotKey::new(12, 0), SlotKey::new(13, 0), SlotKey::new(13, 1)]
        );
    }

    #[test]
    fn slot_key_serializes_as_string() {
        let json = serde_json::to_string(&SlotKey::new(12, 0)).expect("serialize");
        assert_eq!(json, "\"12.0\"");
        let back: SlotKey = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, SlotKey::new(12, 0));
    }

    #[test]
    fn manufacturer_deserialization_normalizes() {
        let m: Manufacturer = serde_json::from_str("\"Vladof\"").expect("deserialize");
        assert_eq!(m, Manufacturer::new("vladof"));
    }
}
