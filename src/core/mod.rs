// Public modules
pub mod config;
pub mod error;
pub mod http;
pub mod requests;
pub mod service;
pub mod uimodel;

// Re-export common types for convenience
pub use config::{Defaults, ServiceConfig, WebShellConfig};
pub use error::{Error, ErrorCode, Result};
pub use http::{Method, RequestOptions, Response, Transport};
pub use requests::CancelId;
pub use service::{Endpoint, ShellService};
pub use uimodel::{EventQueue, UiModelingService};
