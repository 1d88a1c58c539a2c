// ABOUTME: Provider layer for promptlab: one adapter per LLM vendor behind a shared trait.
// ABOUTME: Builds wire-level requests, normalizes responses, and orchestrates a single execution.

pub mod executor;
pub mod providers;
pub mod request;
pub mod response;
pub mod testing;
pub mod transport;

pub use executor::{
    CredentialSource, ExecutionReport, ExecutionState, Executor, PromptSource,
};
pub use providers::{ProviderAdapter, adapter_for};
pub use request::{BuiltRequest, RequestSpec, build_request, mask_api_key};
pub use response::{ParsedResponse, normalize};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
