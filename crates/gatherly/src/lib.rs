//! gatherly - cached, coalesced access to the gatherly backend.
//!
//! Each resource service reads through its own TTL cache and collapses
//! concurrent identical reads into one request. Mutations go straight to the
//! backend and invalidate the affected keys once the backend confirms them.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gatherly::executor::StaticToken;
//! use gatherly::{Config, DataLayer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let layer = DataLayer::from_config(&Config::from_env(), Arc::new(StaticToken::new("token")))?;
//! let event = layer.events().get_by_code("ABC123").await;
//! if let Some(event) = event.data() {
//!     println!("{}", event.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod layer;
pub mod services;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::SetupError;
pub use layer::DataLayer;
