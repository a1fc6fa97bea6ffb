//! Core utilities for gqlkit.
//!
//! This crate provides foundational types used throughout gqlkit:
//! - `span`: Byte-offset spans
//! - `source`: Source text with a line index for line/column lookup
//! - `diagnostics`: Error reporting shared by validation layers

pub mod diagnostics;
pub mod source;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag, Label};
pub use source::{Source, SourceLocation};
pub use span::Span;
