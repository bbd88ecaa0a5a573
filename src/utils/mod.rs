//! Helpers shared across modules

pub mod links;
pub mod text;
