//! HTTP client for the task API.
//!
//! Holds the login state in an explicit [`Session`] instead of ambient storage:
//! it is loaded once when the client is built, saved after login or
//! registration and cleared on logout or when the server rejects the token.

pub mod filter;
pub mod session;

use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest};
use crate::error::FieldError;
use crate::models::{
    CreateTaskRequest, MessageResponse, Task, TaskEnvelope, TaskList, UpdateTaskRequest, UserProfile,
};

pub use filter::TaskFilter;
pub use session::Session;

#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or undecodable response.
    Http(reqwest::Error),
    /// The server answered with an error status.
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },
    /// A protected call was made without a session.
    NotLoggedIn,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Api { status, message, .. } => write!(f, "API error {}: {}", status, message),
            ClientError::NotLoggedIn => write!(f, "Not logged in"),
            ClientError::Io(e) => write!(f, "Session file error: {}", e),
            ClientError::Json(e) => write!(f, "Session file is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::Http(error)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(error: std::io::Error) -> Self {
        ClientError::Io(error)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Json(error)
    }
}

/// Error body as produced by `AppError`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<FieldError>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_path: Option<PathBuf>,
    session: Option<Session>,
}

impl ApiClient {
    /// A client whose session lives only as long as the value.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_path: None,
            session: None,
        }
    }

    /// A client that persists its session at `path`, resuming any saved one.
    pub fn with_session_file(base_url: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let session = Session::load(&path)?;
        Ok(Self {
            session,
            session_path: Some(path),
            ..Self::new(base_url)
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<UserProfile, ClientError> {
        let builder = self.request(Method::POST, "/auth/register").json(request);
        let auth: AuthResponse = self.send(builder, false).await?;
        self.begin_session(auth)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, "/auth/login").json(&body);
        let auth: AuthResponse = self.send(builder, false).await?;
        self.begin_session(auth)
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.end_session()
    }

    pub async fn profile(&mut self) -> Result<UserProfile, ClientError> {
        let builder = self.request(Method::GET, "/auth/profile");
        let profile: ProfileResponse = self.send(builder, true).await?;
        Ok(profile.user)
    }

    /// Renames the user and refreshes the cached session copy.
    pub async fn update_profile(&mut self, name: &str) -> Result<UserProfile, ClientError> {
        let body = UpdateProfileRequest {
            name: Some(name.to_string()),
            email: None,
        };
        let builder = self.request(Method::PUT, "/auth/profile").json(&body);
        let profile: ProfileResponse = self.send(builder, true).await?;

        if let Some(session) = self.session.as_mut() {
            session.user = profile.user.clone();
        }
        self.persist()?;
        Ok(profile.user)
    }

    pub async fn list_tasks(&mut self) -> Result<Vec<Task>, ClientError> {
        let builder = self.request(Method::GET, "/tasks");
        let list: TaskList = self.send(builder, true).await?;
        Ok(list.tasks)
    }

    pub async fn get_task(&mut self, id: Uuid) -> Result<Task, ClientError> {
        let builder = self.request(Method::GET, &format!("/tasks/{}", id));
        let envelope: TaskEnvelope = self.send(builder, true).await?;
        Ok(envelope.task)
    }

    pub async fn create_task(&mut self, request: &CreateTaskRequest) -> Result<Task, ClientError> {
        let builder = self.request(Method::POST, "/tasks").json(request);
        let envelope: TaskEnvelope = self.send(builder, true).await?;
        Ok(envelope.task)
    }

    pub async fn update_task(&mut self, id: Uuid, request: &UpdateTaskRequest) -> Result<Task, ClientError> {
        let builder = self.request(Method::PUT, &format!("/tasks/{}", id)).json(request);
        let envelope: TaskEnvelope = self.send(builder, true).await?;
        Ok(envelope.task)
    }

    /// Returns the server's confirmation message.
    pub async fn delete_task(&mut self, id: Uuid) -> Result<String, ClientError> {
        let builder = self.request(Method::DELETE, &format!("/tasks/{}", id));
        let confirmation: MessageResponse = self.send(builder, true).await?;
        Ok(confirmation.message)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&mut self, builder: RequestBuilder, authed: bool) -> Result<T, ClientError> {
        let builder = if authed {
            let session = self.session.as_ref().ok_or(ClientError::NotLoggedIn)?;
            builder.header(AUTHORIZATION, session.bearer())
        } else {
            builder
        };

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        if authed && status == StatusCode::UNAUTHORIZED {
            log::info!("token rejected by server; clearing session");
            self.end_session()?;
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message: body.message,
            errors: body.errors,
        })
    }

    fn begin_session(&mut self, auth: AuthResponse) -> Result<UserProfile, ClientError> {
        let user = auth.user.clone();
        self.session = Some(Session {
            token: auth.token,
            user: auth.user,
        });
        self.persist()?;
        Ok(user)
    }

    fn end_session(&mut self) -> Result<(), ClientError> {
        self.session = None;
        match &self.session_path {
            Some(path) => Session::clear(path),
            None => Ok(()),
        }
    }

    fn persist(&self) -> Result<(), ClientError> {
        match (&self.session, &self.session_path) {
            (Some(session), Some(path)) => session.save(path),
            _ => Ok(()),
        }
    }
}
