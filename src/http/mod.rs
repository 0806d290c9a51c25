pub mod client;
pub mod refresh;
pub mod request;
pub mod retry;
pub mod transport;

pub use client::ApiClient;
pub use request::{ApiRequest, Body, UploadForm};
pub use retry::RetryPolicy;
pub use transport::{RawResponse, ReqwestTransport, Transport};
