mod error;
mod request;
mod result;
mod traits;

pub use error::{ErrorCode, ServiceError};
pub use request::{ApiRequest, Method};
pub use result::{Envelope, ServiceResult};
pub use traits::{CredentialProvider, RequestExecutor};
