//! Tool declaration, registration, and invocation utilities.
//!
//! Tools are described by a [`schema::ToolDeclaration`] that is advertised to
//! the model and executed through the [`registry::Tool`] trait. The
//! [`arithmetic`] module ships the built-in calculator tools.

#![warn(missing_docs, clippy::pedantic)]

pub mod arithmetic;
pub mod registry;
pub mod schema;
