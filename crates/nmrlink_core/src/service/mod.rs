//! Core use-case services.
//!
//! # Responsibility
//! - Compose graph, highlight and assignment state into session-level APIs.
//! - Keep UI/FFI layers decoupled from store internals.

pub mod annotation_service;

pub use annotation_service::AnnotationSession;
