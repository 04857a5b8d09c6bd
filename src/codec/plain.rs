//! Identity codec - payloads cross the transport in clear.

use serde_json::Value;

use super::Codec;
use crate::error::Result;

/// Pass-through codec. The default for both session facets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn encode_outgoing(&self, envelope: Value) -> Value {
        envelope
    }

    fn decode_incoming(&self, envelope: Value) -> Result<Value> {
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_codec_is_identity() {
        let value = json!({ "framelink": "emit", "value": 1 });
        assert_eq!(PlainCodec.encode_outgoing(value.clone()), value);
        assert_eq!(PlainCodec.decode_incoming(value.clone()).unwrap(), value);
    }
}
