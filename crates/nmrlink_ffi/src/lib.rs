//! Flutter-facing bindings for the nmrlink core.

pub mod api;
