pub mod auth;
pub mod error;
pub mod http;
pub mod service;

pub use error::{ErrorKind, Operation, ServiceError};
pub use http::HttpProblemService;
pub use service::ProblemService;
