//! Authenticated GET/POST against the service.
//!
//! # Design
//! `Resource` turns a path plus an optional `Formattable` payload into an
//! `HttpRequest` and hands it to its `Transport`. GET payloads become query
//! parameters, POST payloads become an XML body. The API key rides on every
//! URL as the `api_key` query parameter. The status of each call comes back
//! inside the returned `HttpResponse`; the resource itself keeps no per-call
//! state.

use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::format::Formattable;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

const XML_CONTENT_TYPE: &str = "application/xml";
const API_KEY_PARAM: &str = "api_key";

#[derive(Debug)]
pub struct Resource<T> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> Resource<T> {
    /// Fails if the configuration does not validate.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        config.validate()?;
        debug!(base_url = %config.base_url, test_mode = config.test_mode, "resource configured");
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&dyn Formattable>,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = Url::parse(&format!("{}{path}", self.config.base_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(API_KEY_PARAM, &self.config.api_key);
            if let (HttpMethod::Get, Some(payload)) = (method, payload) {
                // The configured key always wins over a payload entry.
                for (key, value) in payload.to_map() {
                    if key != API_KEY_PARAM {
                        query.append_pair(&key, &value);
                    }
                }
            }
        }

        let mut headers = vec![
            ("User-Agent".to_string(), self.config.user_agent.clone()),
            ("Accept".to_string(), XML_CONTENT_TYPE.to_string()),
        ];
        let body = match (method, payload) {
            (HttpMethod::Post, Some(payload)) => {
                headers.push(("Content-Type".to_string(), XML_CONTENT_TYPE.to_string()));
                Some(payload.to_xml()?)
            }
            _ => None,
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    pub fn get(&self, path: &str, payload: Option<&dyn Formattable>) -> Result<HttpResponse, ApiError> {
        let request = self.build(HttpMethod::Get, path, payload)?;
        self.send(path, &request)
    }

    pub fn post(&self, path: &str, payload: Option<&dyn Formattable>) -> Result<HttpResponse, ApiError> {
        let request = self.build(HttpMethod::Post, path, payload)?;
        self.send(path, &request)
    }

    pub(crate) fn send(&self, path: &str, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        // Log the path only: the full URL carries the API key.
        debug!(method = request.method.as_str(), path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(path, status = response.status, "request completed");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::{NewUser, TokenOptions};

    #[derive(Default)]
    struct Canned {
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(HttpResponse::new(201, "<hash/>"))
        }
    }

    fn resource() -> Resource<Canned> {
        Resource::new(ClientConfig::new("secret key"), Canned::default()).unwrap()
    }

    #[test]
    fn api_key_is_appended_to_every_url() {
        let req = resource().build(HttpMethod::Get, "/protected/xml/sms/7", None).unwrap();
        assert_eq!(req.url, "https://api.authy.com/protected/xml/sms/7?api_key=secret+key");
        assert!(req.body.is_none());
    }

    #[test]
    fn get_payload_becomes_query_parameters() {
        let opts = TokenOptions::forced().with_param("locale", "es");
        let req = resource()
            .build(HttpMethod::Get, "/protected/xml/sms/7", Some(&opts))
            .unwrap();
        let url = Url::parse(&req.url).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("api_key".to_string(), "secret key".to_string()),
                ("force".to_string(), "true".to_string()),
                ("locale".to_string(), "es".to_string()),
            ]
        );
        assert!(req.body.is_none());
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn payload_cannot_override_the_api_key() {
        let opts = TokenOptions::default()
            .with_param("api_key", "other")
            .with_param("via", "sms");
        let req = resource()
            .build(HttpMethod::Get, "/protected/xml/sms/7", Some(&opts))
            .unwrap();
        let url = Url::parse(&req.url).unwrap();
        let keys: Vec<(String, String)> = url
            .query_pairs()
            .into_owned()
            .filter(|(k, _)| k == "api_key")
            .collect();
        assert_eq!(keys, vec![("api_key".to_string(), "secret key".to_string())]);
        assert!(req.url.contains("via=sms"));
    }

    #[test]
    fn post_payload_becomes_xml_body() {
        let user = NewUser::new("a@b.com", "5551234");
        let req = resource()
            .build(HttpMethod::Post, "/protected/xml/users/new", Some(&user))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("Content-Type"), Some(XML_CONTENT_TYPE));
        assert!(req.body.unwrap().starts_with("<user>"));
        assert!(!req.url.contains("email="));
    }

    #[test]
    fn post_without_payload_has_no_body() {
        let req = resource()
            .build(HttpMethod::Post, "/protected/xml/users/delete/3", None)
            .unwrap();
        assert!(req.body.is_none());
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn status_is_returned_with_the_response() {
        let resource = resource();
        let response = resource.post("/protected/xml/users/delete/3", None).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(resource.transport.seen.borrow().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ClientConfig::new("key").with_base_url("http://localhost:1");
        assert!(matches!(
            Resource::new(config, Canned::default()),
            Err(ApiError::InvalidConfig(_))
        ));
    }
}
