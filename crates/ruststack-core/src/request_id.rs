//! Request identifiers placed in every serialized response.

use std::fmt;

/// Length of the request ids AWS emits in `RequestId` elements and
/// `x-amzn-requestid` headers.
pub const REQUEST_ID_LENGTH: usize = 52;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of opaque request identifiers.
///
/// The protocol serializers never invent ids on their own; they ask the
/// generator they were built with, so tests can pin the value.
pub trait RequestIdGenerator: Send + Sync + fmt::Debug {
    /// Produce a fresh request id.
    fn generate(&self) -> String;
}

/// Generates 52-character upper-case alphanumeric ids, the shape AWS uses
/// for long-form request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmznRequestIdGenerator;

impl RequestIdGenerator for AmznRequestIdGenerator {
    fn generate(&self) -> String {
        let mut id = String::with_capacity(REQUEST_ID_LENGTH);
        while id.len() < REQUEST_ID_LENGTH {
            for byte in uuid::Uuid::new_v4().as_bytes() {
                if id.len() == REQUEST_ID_LENGTH {
                    break;
                }
                id.push(char::from(ALPHABET[usize::from(*byte) % ALPHABET.len()]));
            }
        }
        id
    }
}
