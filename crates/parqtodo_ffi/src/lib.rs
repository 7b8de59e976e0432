//! Host-facing bindings for the parqtodo core.

pub mod api;
