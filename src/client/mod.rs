//! HTTP request layer
//!
//! One parameterized POST per call, no retries and no knowledge of the tree.
//! Transport failures are absorbed here and reported to callers as `None`.

mod rest;

pub use rest::{build_http_client, Payload, RestClient, RestResponse, TransportFailure};
