//! Payload decoding and image normalization.
//!
//! `PayloadDecoder` turns a raw `data:image/png;base64,...` request body into
//! a decoded, dimension-bounded image; `ImageNormalizer` flattens transparency
//! and stamps creation-time metadata into the encoded PNG.

pub mod decoder;
pub mod exif;
pub mod normalizer;

pub use decoder::{DecodeError, PayloadDecoder};
pub use normalizer::ImageNormalizer;
