//! Flutter-facing bindings over `locminder_core`.

pub mod api;
