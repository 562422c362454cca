//! The users service: registration, token delivery and removal.
//!
//! # Design
//! Every operation comes in two layers. `build_*` returns the `HttpRequest`
//! without doing any I/O, so callers with their own HTTP stack can execute
//! it and feed the response to `response::interpret`. The plain operation
//! (`create_user`, `request_sms`, ...) runs the request through the client's
//! `Transport` and interprets the answer. Either way the returned `Hash`
//! carries the HTTP status of that exact call.

use tracing::info;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::resource::Resource;
use crate::response::interpret;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Hash, NewUser, TokenOptions};

pub const NEW_USER_PATH: &str = "/protected/xml/users/new";
pub const DELETE_USER_PATH: &str = "/protected/xml/users/delete/";
pub const SMS_PATH: &str = "/protected/xml/sms/";
pub const CALL_PATH: &str = "/protected/xml/call/";

/// Client for the users endpoints.
#[derive(Debug)]
pub struct Users<T = UreqTransport> {
    resource: Resource<T>,
}

impl Users<UreqTransport> {
    /// Client over a blocking `ureq` transport honoring `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Users<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            resource: Resource::new(config, transport)?,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.resource.config()
    }

    pub fn build_create_user(&self, user: &NewUser) -> Result<HttpRequest, ApiError> {
        self.resource.build(HttpMethod::Post, NEW_USER_PATH, Some(user))
    }

    pub fn build_request_sms(&self, user_id: u64, options: &TokenOptions) -> Result<HttpRequest, ApiError> {
        self.resource
            .build(HttpMethod::Get, &format!("{SMS_PATH}{user_id}"), Some(options))
    }

    pub fn build_request_call(&self, user_id: u64, options: &TokenOptions) -> Result<HttpRequest, ApiError> {
        self.resource
            .build(HttpMethod::Get, &format!("{CALL_PATH}{user_id}"), Some(options))
    }

    pub fn build_delete_user(&self, user_id: u64) -> Result<HttpRequest, ApiError> {
        self.resource
            .build(HttpMethod::Post, &format!("{DELETE_USER_PATH}{user_id}"), None)
    }

    /// Register a user. On success `Hash::user` holds the created user.
    pub fn create_user(&self, user: &NewUser) -> Result<Hash, ApiError> {
        let response = self.resource.post(NEW_USER_PATH, Some(user))?;
        let hash = interpret(&response)?;
        if let Some(id) = hash.user.as_ref().and_then(|u| u.id) {
            info!(user_id = id, "user created");
        }
        Ok(hash)
    }

    /// Send a token to the user by SMS.
    pub fn request_sms(&self, user_id: u64, options: &TokenOptions) -> Result<Hash, ApiError> {
        let response = self
            .resource
            .get(&format!("{SMS_PATH}{user_id}"), Some(options))?;
        interpret(&response)
    }

    /// Have the service call the user and read out a token.
    pub fn request_call(&self, user_id: u64, options: &TokenOptions) -> Result<Hash, ApiError> {
        let response = self
            .resource
            .get(&format!("{CALL_PATH}{user_id}"), Some(options))?;
        interpret(&response)
    }

    pub fn delete_user(&self, user_id: u64) -> Result<Hash, ApiError> {
        let response = self
            .resource
            .post(&format!("{DELETE_USER_PATH}{user_id}"), None)?;
        let hash = interpret(&response)?;
        if hash.is_ok() {
            info!(user_id, "user deleted");
        }
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::http::HttpResponse;

    struct Scripted {
        response: HttpResponse,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse::new(status, body),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(self.response.clone())
        }
    }

    struct Offline;

    impl Transport for Offline {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Communication("connection refused".to_string()))
        }
    }

    fn users<T: Transport>(transport: T) -> Users<T> {
        Users::with_transport(ClientConfig::new("key"), transport).unwrap()
    }

    #[test]
    fn build_paths_embed_the_user_id() {
        let users = users(Offline);
        let opts = TokenOptions::default();
        assert!(users
            .build_request_sms(12, &opts)
            .unwrap()
            .url
            .starts_with("https://api.authy.com/protected/xml/sms/12?"));
        assert!(users
            .build_request_call(12, &opts)
            .unwrap()
            .url
            .starts_with("https://api.authy.com/protected/xml/call/12?"));
        let delete = users.build_delete_user(12).unwrap();
        assert_eq!(delete.method, HttpMethod::Post);
        assert!(delete
            .url
            .starts_with("https://api.authy.com/protected/xml/users/delete/12?"));
        assert!(delete.body.is_none());
    }

    #[test]
    fn create_user_returns_created_user() {
        let users = users(Scripted::new(
            200,
            "<hash><message>User created successfully.</message><user><id>9</id></user><success>true</success></hash>",
        ));
        let hash = users.create_user(&NewUser::new("a@b.com", "5551234")).unwrap();
        assert_eq!(hash.status, 200);
        assert_eq!(hash.user.unwrap().id, Some(9));
        assert_eq!(hash.message.as_deref(), Some("User created successfully."));
    }

    #[test]
    fn remote_error_is_data_not_err() {
        let users = users(Scripted::new(
            404,
            "<errors><message>User not found</message><error-code>60026</error-code></errors>",
        ));
        let hash = users.request_call(5, &TokenOptions::default()).unwrap();
        assert_eq!(hash.status, 404);
        assert_eq!(hash.error.unwrap().error_code, "60026");
    }

    #[test]
    fn transport_failure_propagates() {
        let err = users(Offline).delete_user(1).unwrap_err();
        assert!(matches!(err, ApiError::Communication(_)));
    }

    #[test]
    fn malformed_body_is_fatal() {
        let err = users(Scripted::new(200, "{\"json\":true}"))
            .request_sms(1, &TokenOptions::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
