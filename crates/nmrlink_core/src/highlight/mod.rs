//! Cross-view highlight synchronization.
//!
//! # Responsibility
//! - Reference-count highlight keys shared by independently rendered views.
//! - Tie key lifetimes to UI fragment lifetimes through scoped guards.
//!
//! # Invariants
//! - No highlight survives the fragment that acquired it.

pub mod bus;
pub mod scope;

pub use bus::{HighlightBus, HighlightChange, HighlightListener, ListenerId, SubscriberId};
pub use scope::{HighlightScope, SharedHighlightBus};
