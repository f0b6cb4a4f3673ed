//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into data-source level APIs.
//! - Keep CLI/UI callers decoupled from storage details.

pub mod note_service;
