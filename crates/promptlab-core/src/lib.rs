// ABOUTME: Core library for promptlab, containing the provider-neutral domain layer.
// ABOUTME: Template substitution, schema normalization, shared types, and the error taxonomy. No I/O.

pub mod error;
pub mod model;
pub mod schema;
pub mod template;

pub use error::{ErrorBody, PlaygroundError};
pub use model::{
    GenerationConfig, Message, NormalizedResult, PlaygroundRequest, PromptVersion, Provider,
    ProviderCredentials, RawRequest, Role, Usage,
};
pub use schema::{StructuredOutput, normalize_schema};
pub use template::{Variables, extract_variables, substitute};
