//! Payload encoding applied around durable-store I/O.
//!
//! `Base64` obscures the payload from casual inspection. It is not
//! encryption.

use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Codec {
    #[default]
    Plain,
    Base64,
}

impl Codec {
    /// Maps the `encrypt` configuration flag to a codec.
    pub fn from_flag(encrypt: bool) -> Self {
        if encrypt {
            Codec::Base64
        } else {
            Codec::Plain
        }
    }

    pub fn encode(&self, bytes: Vec<u8>) -> Vec<u8> {
        match self {
            Codec::Plain => bytes,
            Codec::Base64 => STANDARD.encode(bytes).into_bytes(),
        }
    }

    pub fn decode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Codec::Plain => Ok(bytes),
            Codec::Base64 => STANDARD.decode(bytes),
        }
    }
}
