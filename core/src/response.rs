//! Response interpretation.
//!
//! # Design
//! Each body is decoded once. The root element picks the schema: `<errors>`
//! (or `<error>`) is a service-reported failure, `<hash>` is the success
//! envelope and a bare `<user>` is a success carrying only the user. An error
//! document wins whatever the HTTP status was, since the service does not
//! reliably pair error bodies with 4xx/5xx codes. A body that fits neither
//! schema is fatal: there is no safe partial result to hand back.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::types::{Hash, RemoteError, User};

/// Body of a success response.
#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    cellphone: Option<String>,
}

/// What a response body turned out to be.
#[derive(Debug)]
enum Payload {
    Success(Envelope),
    Failure(RemoteError),
}

/// Turn a raw response into a `Hash`.
///
/// The `status` of the result is always `response.status`. Exactly one of
/// `error` or the success fields is populated.
pub fn interpret(response: &HttpResponse) -> Result<Hash, ApiError> {
    let payload = decode(&response.body).inspect_err(|e| {
        warn!(status = response.status, error = %e, "rejecting response body");
    })?;

    let hash = match payload {
        Payload::Failure(error) => {
            debug!(status = response.status, code = %error.error_code, "service reported an error");
            Hash {
                status: response.status,
                error: Some(error),
                ..Hash::default()
            }
        }
        Payload::Success(envelope) => Hash {
            status: response.status,
            message: envelope.message,
            success: envelope.success,
            user: envelope.user,
            token: envelope.token,
            cellphone: envelope.cellphone,
            error: None,
        },
    };
    Ok(hash)
}

fn decode(body: &str) -> Result<Payload, ApiError> {
    let root = root_element(body)?;
    match root.as_str() {
        "errors" | "error" => quick_xml::de::from_str::<RemoteError>(body)
            .map(Payload::Failure)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed <{root}> document: {e}"))),
        "hash" => quick_xml::de::from_str::<Envelope>(body)
            .map(Payload::Success)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed <hash> document: {e}"))),
        "user" => quick_xml::de::from_str::<User>(body)
            .map(|user| {
                Payload::Success(Envelope {
                    user: Some(user),
                    ..Envelope::default()
                })
            })
            .map_err(|e| ApiError::InvalidResponse(format!("malformed <user> document: {e}"))),
        other => Err(ApiError::InvalidResponse(format!(
            "unexpected root element <{other}>"
        ))),
    }
}

/// Local name of the root element of `body`.
///
/// The whole body is scanned: it must hold exactly one root element, with
/// only comments and processing instructions around it.
fn root_element(body: &str) -> Result<String, ApiError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);
    let mut root: Option<String> = None;
    let mut depth = 0usize;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| ApiError::InvalidResponse(format!("unreadable XML: {e}")))?;
        let (name, opens) = match &event {
            Event::Start(e) => (Some(e.local_name()), true),
            Event::Empty(e) => (Some(e.local_name()), false),
            _ => (None, false),
        };
        if let Some(name) = name {
            if depth == 0 {
                if let Some(root) = &root {
                    return Err(ApiError::InvalidResponse(format!(
                        "content after the <{root}> root element"
                    )));
                }
                root = Some(String::from_utf8_lossy(name.as_ref()).into_owned());
            }
            if opens {
                depth += 1;
            }
            continue;
        }
        match event {
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(ApiError::InvalidResponse(match &root {
                    Some(root) => format!("content after the <{root}> root element"),
                    None => "response body is not an XML document".to_string(),
                }));
            }
            Event::Eof => {
                return match root {
                    Some(_) if depth > 0 => Err(ApiError::InvalidResponse(
                        "response body ends inside the root element".to_string(),
                    )),
                    Some(root) => Ok(root),
                    None => Err(ApiError::InvalidResponse("response body is empty".to_string())),
                };
            }
            // Element text, declaration, comments, doctype and processing instructions.
            _ => {}
        }
    }
}
