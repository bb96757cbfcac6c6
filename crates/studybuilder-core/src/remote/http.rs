//! HTTP adapter for the study service.
//!
//! Single records arrive wrapped as `{"data": ...}`, collections as
//! `{"items": [...]}`. Study ids travel as single escaped path segments.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::StudyApi;
use crate::error::{ConfigError, RemoteError};
use crate::schedule::{Schedule, StudySession};
use crate::storage::ApiConfig;
use crate::study::Study;

const SESSION_HEADER: &str = "Bridge-Session";

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// `reqwest`-backed [`StudyApi`].
#[derive(Debug, Clone)]
pub struct HttpStudyApi {
    client: Client,
    base_url: Url,
    session_token: Option<String>,
}

impl HttpStudyApi {
    /// Build a client from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `base_url` is not an absolute
    /// hierarchical URL or the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let invalid_base = |message: String| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message,
        };
        let base_url = Url::parse(&config.base_url).map_err(|e| invalid_base(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid_base(format!("{base_url} cannot carry a path")));
        }
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "api.timeout_secs".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url,
            session_token: config.session_token.clone(),
        })
    }

    /// `<base>/v5/studies/<study_id>/<tail...>`, every segment escaped.
    fn endpoint(&self, study_id: &str, tail: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Network(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v5", "studies", study_id])
            .extend(tail);
        Ok(url)
    }

    fn study_url(&self, id: &str) -> Result<Url, RemoteError> {
        self.endpoint(id, &[])
    }

    fn schedule_url(&self, study_id: &str) -> Result<Url, RemoteError> {
        self.endpoint(study_id, &["schedule"])
    }

    fn sessions_url(&self, study_id: &str) -> Result<Url, RemoteError> {
        self.endpoint(study_id, &["schedule", "sessions"])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_token {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        resource: &str,
        id: &str,
    ) -> Result<Response, RemoteError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), resource, id, "remote call rejected");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn data<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let bytes = response.bytes().await?;
        let envelope: DataEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    async fn items<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, RemoteError> {
        let bytes = response.bytes().await?;
        let envelope: ItemsEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.items)
    }
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn get_study(&self, id: &str) -> Result<Study, RemoteError> {
        let response = self
            .send(self.client.get(self.study_url(id)?), "study", id)
            .await?;
        Self::data(response).await
    }

    async fn save_study(&self, id: &str, study: &Study) -> Result<Study, RemoteError> {
        let request = self.client.post(self.study_url(id)?).json(study);
        let response = self.send(request, "study", id).await?;
        Self::data(response).await
    }

    async fn get_schedule(&self, study_id: &str) -> Result<Schedule, RemoteError> {
        let response = self
            .send(self.client.get(self.schedule_url(study_id)?), "schedule", study_id)
            .await?;
        Self::data(response).await
    }

    async fn save_schedule(
        &self,
        study_id: &str,
        schedule: &Schedule,
    ) -> Result<Schedule, RemoteError> {
        let request = self.client.post(self.schedule_url(study_id)?).json(schedule);
        let response = self.send(request, "schedule", study_id).await?;
        Self::data(response).await
    }

    async fn get_sessions(&self, study_id: &str) -> Result<Vec<StudySession>, RemoteError> {
        let response = self
            .send(self.client.get(self.sessions_url(study_id)?), "sessions", study_id)
            .await?;
        let mut sessions: Vec<StudySession> = Self::items(response).await?;
        for (index, session) in sessions.iter_mut().enumerate() {
            session.order = index;
        }
        Ok(sessions)
    }

    async fn save_sessions(
        &self,
        study_id: &str,
        sessions: &[StudySession],
    ) -> Result<(), RemoteError> {
        let request = self.client.post(self.sessions_url(study_id)?).json(sessions);
        self.send(request, "sessions", study_id).await?;
        Ok(())
    }
}
