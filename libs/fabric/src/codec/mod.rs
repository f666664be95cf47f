use courier_core::SerializerKind;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

pub mod bincode;
pub mod json;

pub use self::bincode::BincodeCodec;
pub use self::json::JsonCodec;

/// Codec trait for serializing and deserializing messages
pub trait Codec: Send + Sync {
    /// Encode a value into bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode bytes into a value
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// Codec chosen at runtime from configuration
///
/// The payload carries no marker naming the codec that produced it, so a
/// provider and its consumers must be built with the same kind.
#[derive(Debug, Clone, Copy)]
pub enum Serializer {
    Bincode(BincodeCodec),
    Json(JsonCodec),
}

impl Serializer {
    pub fn from_kind(kind: SerializerKind) -> Self {
        match kind {
            SerializerKind::Bincode => Self::Bincode(BincodeCodec),
            SerializerKind::Json => Self::Json(JsonCodec),
        }
    }

    pub fn kind(&self) -> SerializerKind {
        match self {
            Self::Bincode(_) => SerializerKind::Bincode,
            Self::Json(_) => SerializerKind::Json,
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::from_kind(SerializerKind::default())
    }
}

impl From<SerializerKind> for Serializer {
    fn from(kind: SerializerKind) -> Self {
        Self::from_kind(kind)
    }
}

impl Codec for Serializer {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Self::Bincode(codec) => codec.encode(value),
            Self::Json(codec) => codec.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Self::Bincode(codec) => codec.decode(bytes),
            Self::Json(codec) => codec.decode(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Circle { radius: f64 },
        Rect { width: u32, height: u32 },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Drawing {
        title: String,
        shapes: Vec<Shape>,
        tags: BTreeMap<String, Option<i64>>,
    }

    fn drawing() -> Drawing {
        Drawing {
            title: "plan".to_string(),
            shapes: vec![
                Shape::Circle { radius: 1.5 },
                Shape::Rect {
                    width: 3,
                    height: 4,
                },
            ],
            tags: [("layer".to_string(), Some(2)), ("hidden".to_string(), None)]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn both_codecs_keep_enum_variants() {
        let serializers = [
            Serializer::from_kind(SerializerKind::Bincode),
            Serializer::from_kind(SerializerKind::Json),
        ];
        for serializer in serializers {
            let bytes = serializer.encode(&drawing()).unwrap();
            let decoded: Drawing = serializer.decode(&bytes).unwrap();
            assert_eq!(decoded, drawing(), "{:?}", serializer.kind());
        }
    }

    #[test]
    fn malformed_input_is_a_codec_error() {
        let bincode = Serializer::from_kind(SerializerKind::Bincode);
        let result: Result<Drawing> = bincode.decode(&[0xff, 0x01]);
        assert!(matches!(result, Err(crate::Error::Codec(_))));

        let json = Serializer::from_kind(SerializerKind::Json);
        let result: Result<Drawing> = json.decode(b"{\"title\": 7}");
        assert!(matches!(result, Err(crate::Error::Codec(_))));
    }

    #[test]
    fn json_rejects_unrepresentable_map_keys() {
        let mut map = BTreeMap::new();
        map.insert((1u8, 2u8), "pair");

        let result = JsonCodec.encode(&map);

        assert!(matches!(result, Err(crate::Error::Codec(_))));
    }
}
