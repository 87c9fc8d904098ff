//! gatherly_core - pure types shared by the gatherly data-access layer.
//!
//! Nothing in this crate performs I/O. It defines the result envelope, the
//! error taxonomy, request descriptions, domain records, cache keys and the
//! traits the I/O layer implements.

pub mod cache;
pub mod models;
pub mod service;
