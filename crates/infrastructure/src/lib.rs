//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_credential_provider;
mod http_reference_data_source;
mod in_memory_reference_data_source;
mod payloads;
mod upstream_client;

pub use http_credential_provider::HttpCredentialProvider;
pub use http_reference_data_source::HttpReferenceDataSource;
pub use in_memory_reference_data_source::InMemoryReferenceDataSource;
pub use upstream_client::UpstreamClient;
