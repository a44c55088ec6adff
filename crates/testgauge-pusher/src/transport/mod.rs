//! Transport layer: pushing rendered snapshots to a Pushgateway.

pub mod push;

pub use push::{push_url, HttpPushTransport, PushRequest, PushTransport, CONTENT_TYPE_TEXT};
