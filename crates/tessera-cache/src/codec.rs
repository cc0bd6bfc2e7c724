//! Conversion between caller values and the text stored in the backend.

use crate::error::CacheResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes caller values to stored text and decodes them back.
///
/// Implementations must round-trip: `decode(encode(v)) == v` for every
/// value whose type the codec supports structurally.
pub trait Codec: Send + Sync {
    /// Encode a value to its stored representation.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<String>;

    /// Decode stored text into the requested type.
    fn decode<T: DeserializeOwned>(&self, raw: &str) -> CacheResult<T>;

    /// Decode stored text holding a sequence into a `Vec` of the element type.
    fn decode_list<T: DeserializeOwned>(&self, raw: &str) -> CacheResult<Vec<T>> {
        self.decode(raw)
    }

    /// Returns true if the encoded text represents an absent value.
    fn is_null(&self, raw: &str) -> bool;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, raw: &str) -> CacheResult<T> {
        Ok(serde_json::from_str(raw)?)
    }

    fn is_null(&self, raw: &str) -> bool {
        raw == "null"
    }
}
