//! Top-level facade crate for testgauge.
//!
//! Re-exports the core model and the pusher so users can depend on a single crate.

pub mod core {
    pub use testgauge_core::*;
}

pub mod pusher {
    pub use testgauge_pusher::*;
}
