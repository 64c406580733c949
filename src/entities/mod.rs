//! Declarative helpers for presentable entities

#[macro_use]
pub mod macros;
