//! Synchronous client for the Authy two-factor authentication API.
//!
//! # Overview
//! Registers users, asks the service to deliver a token by SMS or voice call,
//! and removes users. Requests go to the service's XML endpoints; responses
//! are decoded into a `Hash` envelope that either carries the success fields
//! or the error the service reported.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`);
//!   only a `Transport` performs I/O, and `UreqTransport` is the default.
//! - Each `Users` operation also has a `build_*` twin so callers can run the
//!   HTTP exchange themselves and pass the response to `interpret`.
//! - Errors reported by the service are data (`Hash::error`). `ApiError` is
//!   kept for local failures: transport, unparseable responses, payload
//!   serialization and configuration.
//! - The status code is returned with every result; clients hold no
//!   per-call state and are immutable once built.

pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod resource;
pub mod response;
pub mod transport;
pub mod types;
pub mod users;

pub use config::ClientConfig;
pub use error::ApiError;
pub use format::Formattable;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::Resource;
pub use response::interpret;
pub use transport::{Transport, UreqTransport};
pub use types::{Hash, NewUser, RemoteError, TokenOptions, User, DEFAULT_COUNTRY_CODE};
pub use users::Users;
