//! HTTP request execution: transport boundary, query encoding, retry policy
//! and the executor tying them together.

pub mod executor;
pub mod query;
pub mod retry;
pub mod transport;

pub use executor::{
    HttpResponse, RequestDescriptor, RequestExecutor, RequestExecutorBuilder, REQUEST_ID_HEADER,
};
pub use query::encode_query;
pub use retry::RetryPolicy;
pub use transport::{
    HttpTransport, ReqwestTransport, ReqwestTransportBuilder, TransportError, TransportRequest,
    TransportResponse,
};
