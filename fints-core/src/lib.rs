//! Core types and utilities for the FinTS/HBCI protocol
//!
//! This crate provides the error type, the character-level wire syntax
//! (delimiters, escaping, ISO-8859-1 text) and the security formals that the
//! envelope segments carry.

pub mod error;
pub mod syntax;
pub mod formals;

pub use error::{ContractViolation, FintsError, FintsResult};
pub use formals::*;
