//! Request executors and the credentials they attach.

mod credentials;
mod http;

pub use credentials::{NoCredentials, SessionCredentials, StaticToken};
pub use http::HttpExecutor;
