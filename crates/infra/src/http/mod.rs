//! HTTP transport and response decoding

pub mod client;
pub mod decode;

pub use client::{HttpRequest, HttpResponse, ReqwestTransport, ReqwestTransportBuilder, Transport};
pub use decode::decode_response;
