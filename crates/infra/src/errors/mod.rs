//! Error classification and conversions into the domain error type.

pub mod classifier;
mod conversions;

pub use classifier::{
    classify_response, classify_transport_error, decode_body, failure_class, FailureClass,
};
pub(crate) use conversions::{decode_error, serialize_error, url_error};
