//! Canonical byte encoding for stored objects: pretty-printed JSON.
//!
//! Decoding tolerates unknown fields and fills missing optional ones with defaults.

use serde::{de::DeserializeOwned, Serialize};

use crate::storage::models::{Conversation, Index};

pub const CONTENT_TYPE: &str = "application/json";

pub fn encode_conversation(conversation: &Conversation) -> Result<Vec<u8>, serde_json::Error> {
    encode(conversation)
}

pub fn decode_conversation(bytes: &[u8]) -> Result<Conversation, serde_json::Error> {
    decode(bytes)
}

pub fn encode_index(index: &Index) -> Result<Vec<u8>, serde_json::Error> {
    encode(index)
}

pub fn decode_index(bytes: &[u8]) -> Result<Index, serde_json::Error> {
    decode(bytes)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(value)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}
