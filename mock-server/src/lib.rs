//! In-memory imitation of the Authy XML API.
//!
//! Serves the four users endpoints with the same XML shapes the real service
//! uses: `<hash>` envelopes on success, `<errors>` documents on failure. Every
//! request must carry `api_key` as a query parameter.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const DEFAULT_API_KEY: &str = "test-api-key";

pub const INVALID_API_KEY: &str = "60001";
pub const USER_NOT_FOUND: &str = "60026";
pub const INVALID_USER_DATA: &str = "60027";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: u64,
    pub email: String,
    pub cellphone: String,
    pub country_code: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub cellphone: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_country_code() -> String {
    "1".to_string()
}

#[derive(Debug, Serialize)]
struct HashBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<StoredUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cellphone: Option<String>,
    success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorsBody {
    message: String,
    #[serde(rename = "error-code")]
    error_code: String,
}

#[derive(Debug, Default)]
pub struct Registry {
    users: HashMap<u64, StoredUser>,
    next_id: u64,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    registry: Arc<RwLock<Registry>>,
}

type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        registry: Arc::new(RwLock::new(Registry::default())),
    };
    Router::new()
        .route("/protected/xml/users/new", post(create_user))
        .route("/protected/xml/users/delete/{id}", post(delete_user))
        .route("/protected/xml/sms/{id}", get(request_sms))
        .route("/protected/xml/call/{id}", get(request_call))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn xml<T: Serialize>(status: StatusCode, root: &str, body: &T) -> Response {
    match quick_xml::se::to_string_with_root(root, body) {
        Ok(doc) => (status, [(header::CONTENT_TYPE, "application/xml")], doc).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn errors(status: StatusCode, message: &str, code: &str) -> Response {
    xml(
        status,
        "errors",
        &ErrorsBody {
            message: message.to_string(),
            error_code: code.to_string(),
        },
    )
}

fn check_key(state: &AppState, params: &HashMap<String, String>) -> Result<(), Response> {
    match params.get("api_key") {
        Some(key) if **key == *state.api_key => Ok(()),
        _ => Err(errors(StatusCode::UNAUTHORIZED, "Invalid API key", INVALID_API_KEY)),
    }
}

/// `+1-XXX-XXX-XX34` style rendering of a stored phone number.
pub fn masked_cellphone(user: &StoredUser) -> String {
    let digits: Vec<char> = user.cellphone.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(2)..].iter().collect();
    format!("+{}-XXX-XXX-XX{tail}", user.country_code)
}

fn valid_new_user(user: &NewUser) -> bool {
    let phone_ok = !user.cellphone.is_empty()
        && user
            .cellphone
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == ' ');
    let country_ok = !user.country_code.is_empty() && user.country_code.chars().all(|c| c.is_ascii_digit());
    user.email.contains('@') && phone_ok && country_ok
}

async fn create_user(State(state): State<AppState>, Query(params): Params, body: String) -> Response {
    if let Err(resp) = check_key(&state, &params) {
        return resp;
    }
    let input: NewUser = match quick_xml::de::from_str(&body) {
        Ok(input) => input,
        Err(e) => {
            debug!(error = %e, "unreadable user document");
            return errors(StatusCode::BAD_REQUEST, "User was not valid", INVALID_USER_DATA);
        }
    };
    if !valid_new_user(&input) {
        return errors(StatusCode::BAD_REQUEST, "User was not valid", INVALID_USER_DATA);
    }

    let mut registry = state.registry.write().await;
    registry.next_id += 1;
    let user = StoredUser {
        id: registry.next_id,
        email: input.email,
        cellphone: input.cellphone,
        country_code: input.country_code,
    };
    registry.users.insert(user.id, user.clone());
    info!(user_id = user.id, "user registered");

    xml(
        StatusCode::OK,
        "hash",
        &HashBody {
            message: "User created successfully.".to_string(),
            user: Some(user),
            cellphone: None,
            success: true,
        },
    )
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Params,
) -> Response {
    if let Err(resp) = check_key(&state, &params) {
        return resp;
    }
    if state.registry.write().await.users.remove(&id).is_none() {
        return errors(StatusCode::NOT_FOUND, "User not found.", USER_NOT_FOUND);
    }
    info!(user_id = id, "user deleted");
    xml(
        StatusCode::OK,
        "hash",
        &HashBody {
            message: "User was added to remove.".to_string(),
            user: None,
            cellphone: None,
            success: true,
        },
    )
}

async fn request_sms(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Params,
) -> Response {
    send_token(&state, id, &params, "SMS token was sent").await
}

async fn request_call(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Params,
) -> Response {
    send_token(&state, id, &params, "Call started...").await
}

async fn send_token(
    state: &AppState,
    id: u64,
    params: &HashMap<String, String>,
    message: &str,
) -> Response {
    if let Err(resp) = check_key(state, params) {
        return resp;
    }
    let registry = state.registry.read().await;
    let Some(user) = registry.users.get(&id) else {
        return errors(StatusCode::NOT_FOUND, "User not found.", USER_NOT_FOUND);
    };
    let forced = params.get("force").is_some_and(|v| v == "true");
    debug!(user_id = id, forced, "token requested");
    xml(
        StatusCode::OK,
        "hash",
        &HashBody {
            message: message.to_string(),
            user: None,
            cellphone: Some(masked_cellphone(user)),
            success: true,
        },
    )
}
