use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::value::Map;

/// The entity producing telemetry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resource {
    pub attributes: Map,
    pub dropped_attributes_count: u32,
}

/// The library that produced a group of records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
    pub attributes: Map,
    pub dropped_attributes_count: u32,
}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            /// Builds an id from exactly `LEN` bytes.
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; $len]>::try_from(bytes).ok().map($name)
            }

            /// All-zero ids are treated as unset.
            pub fn is_empty(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Lower case hex, or an empty string for an unset id.
            pub fn to_hex(&self) -> String {
                if self.is_empty() {
                    String::new()
                } else {
                    hex::encode(self.0)
                }
            }

            /// Parses hex; the empty string is the unset id.
            pub fn from_hex(s: &str) -> Option<Self> {
                if s.is_empty() {
                    return Some(Self::default());
                }
                hex::decode(s).ok().and_then(|b| Self::from_slice(&b))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).ok_or_else(|| {
                    de::Error::custom(format!(
                        "expected {} hex encoded bytes, got '{}'",
                        $len, s
                    ))
                })
            }
        }
    };
}

define_id!(
    /// 16 byte trace identifier.
    TraceId,
    16
);

define_id!(
    /// 8 byte span identifier.
    SpanId,
    8
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex() {
        let id = SpanId([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(id.to_hex(), "0102030405060708");
        assert_eq!(SpanId::from_hex("0102030405060708"), Some(id));
        assert_eq!(SpanId::from_hex("01"), None);
        assert_eq!(SpanId::default().to_hex(), "");
        assert_eq!(TraceId::from_hex(""), Some(TraceId::default()));
    }
}
