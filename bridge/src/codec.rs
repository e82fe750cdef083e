//! Caller-side payload encoding. The bridge only moves bytes; a [`Codec`]
//! turns typed requests into those bytes and bytes back into typed responses.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

pub trait Codec {
    type Request;
    type Response;

    /// Fails with [`Error::Encode`].
    fn encode(&self, request: &Self::Request) -> Result<Vec<u8>>;

    /// Fails with [`Error::Decode`].
    fn decode(&self, payload: &[u8]) -> Result<Self::Response>;
}

/// JSON text payloads through serde.
pub struct JsonCodec<Req, Resp> {
    _marker: PhantomData<fn(&Req) -> Resp>,
}

impl<Req, Resp> JsonCodec<Req, Resp> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> Default for JsonCodec<Req, Resp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Resp> Clone for JsonCodec<Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for JsonCodec<Req, Resp> {}

impl<Req, Resp> fmt::Debug for JsonCodec<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<Req, Resp> Codec for JsonCodec<Req, Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    type Request = Req;
    type Response = Resp;

    fn encode(&self, request: &Req) -> Result<Vec<u8>> {
        serde_json::to_vec(request).map_err(Error::encode)
    }

    fn decode(&self, payload: &[u8]) -> Result<Resp> {
        serde_json::from_slice(payload).map_err(Error::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Serialize)]
    struct Lookup {
        #[serde(rename = "zipCode")]
        zip_code: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        #[serde(rename = "cityName")]
        city_name: String,
    }

    #[test]
    fn encodes_camel_case_json() {
        let codec = JsonCodec::<Lookup, Answer>::new();
        let payload = codec
            .encode(&Lookup {
                zip_code: "11211".to_string(),
            })
            .unwrap();
        assert_eq!(payload, br#"{"zipCode":"11211"}"#);
    }

    #[test]
    fn non_string_map_keys_fail_to_encode() {
        let codec = JsonCodec::<BTreeMap<(u8, u8), String>, Answer>::new();
        let mut request = BTreeMap::new();
        request.insert((1, 2), "grid".to_string());
        assert!(matches!(codec.encode(&request), Err(Error::Encode(_))));
    }

    #[test]
    fn wrong_shape_fails_to_decode() {
        let codec = JsonCodec::<Lookup, Answer>::new();
        assert!(matches!(
            codec.decode(br#"{"temperature":"72"}"#),
            Err(Error::Decode(_))
        ));
    }
}
