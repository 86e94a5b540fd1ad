//! `compliance-http` is an async HTTP client for the Security and Compliance
//! Center v3 API.
//!
//! Every operation is described by a static [`OperationDescriptor`] and runs
//! through one invocation engine:
//! - path templating and request assembly ([`OperationParams`], [`RequestBody`])
//! - per-attempt authentication ([`Authenticator`])
//! - deadline propagation ([`CallContext`])
//! - retry with linear backoff ([`RetryPolicy`])
//! - content-type aware decoding into [`Response`]
//! - page continuation ([`Pager`])
//!
//! Typed wrappers such as [`ComplianceClient::create_profile`] live in
//! [`operations`].

mod auth;
mod client;
mod config;
mod context;
mod decode;
mod descriptor;
mod error;
mod models;
pub mod operations;
mod options;
mod pagination;
mod params;
mod path;
mod request;
mod retry;
mod transport;
mod types;

pub use auth::{
    Authenticator, BasicAuthenticator, BearerTokenAuthenticator, NoAuthAuthenticator,
    AUTHTYPE_BASIC, AUTHTYPE_BEARER_TOKEN, AUTHTYPE_NOAUTH,
};
pub use client::{ComplianceClient, DEFAULT_SERVICE_URL};
pub use config::{AuthScheme, ServiceConfig, DEFAULT_ENV_PREFIX};
pub use context::CallContext;
pub use descriptor::{HttpMethod, OperationDescriptor, ResponseShape};
pub use error::{ComplianceError, Problem, Stage};
pub use models::{
    Attachment, AttachmentCollection, AttachmentParameter, AttachmentPrototype,
    AttachmentsPrototype, ControlLibrary, ControlLibraryCollection, DefaultParameter, Profile,
    ProfileCollection, ProfileControl, ProfileControlsPrototype, ProfilePrototype, Scan,
    ScanPrototype,
};
pub use options::ClientOptions;
pub use pagination::{next_page_params, PageOptions, PageRef, PagedResponse, Pager, START_PARAM};
pub use params::OperationParams;
pub use path::resolve_path;
pub use request::{RequestBody, RequestDescriptor, TRANSACTION_ID_HEADER};
pub use retry::RetryPolicy;
pub use transport::DEADLINE_EXCEEDED;
pub use types::{DetailedResponse, Response};

pub type Result<T> = std::result::Result<T, ComplianceError>;
