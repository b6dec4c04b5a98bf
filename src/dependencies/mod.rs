//! This module defines traits for external dependencies (the Chef server API) to make them
//! easier to mock and substitute in tests. Commands only depend on the traits, the concrete
//! [`ChefServer`] is injected when the command is built from the CLI arguments.
pub mod chef;

pub use chef::*;
