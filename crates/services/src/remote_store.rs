use std::env;

use async_trait::async_trait;
use log::debug;
use quiz_core::model::QuestionId;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use storage::repository::{QuestionRecord, QuizInfoRecord, QuizRepository, StorageError};

/// Connection settings for an HTTP JSON document store.
#[derive(Clone, Debug)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl RemoteStoreConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `QUIZ_REMOTE_URL` and the optional `QUIZ_REMOTE_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_REMOTE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let token = env::var("QUIZ_REMOTE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self { base_url, token })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// `QuizRepository` backed by a remote JSON document store.
///
/// Layout: `GET quiz/info`, `GET quiz/info/questions` (array order is question
/// order), and `POST quiz/info/increment` for the attendance counter.
#[derive(Clone)]
pub struct RemoteQuizStore {
    client: Client,
    config: RemoteStoreConfig,
}

impl RemoteQuizStore {
    #[must_use]
    pub fn new(config: RemoteStoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        check_status(response.status())?;
        Ok(response)
    }
}

fn check_status(status: StatusCode) -> Result<(), StorageError> {
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound);
    }
    if !status.is_success() {
        return Err(StorageError::Connection(format!(
            "document store returned status {status}"
        )));
    }
    Ok(())
}

fn decode<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl QuizRepository for RemoteQuizStore {
    async fn get_quiz_info(&self) -> Result<QuizInfoRecord, StorageError> {
        let response = self
            .send(self.client.get(self.config.url("quiz/info")))
            .await?;
        let doc: InfoDocument = response.json().await.map_err(decode)?;
        Ok(doc.into_record())
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        let response = self
            .send(self.client.get(self.config.url("quiz/info/questions")))
            .await?;
        let docs: Vec<QuestionDocument> = response.json().await.map_err(decode)?;
        debug!("remote store returned {} question documents", docs.len());
        questions_from_documents(docs)
    }

    async fn increment_attendance(&self) -> Result<u32, StorageError> {
        let body = IncrementRequest {
            field: "peopleAttended",
            by: 1,
        };
        let response = self
            .send(
                self.client
                    .post(self.config.url("quiz/info/increment"))
                    .json(&body),
            )
            .await?;
        let doc: IncrementResponse = response.json().await.map_err(decode)?;
        Ok(doc.people_attended)
    }
}

fn questions_from_documents(
    docs: Vec<QuestionDocument>,
) -> Result<Vec<QuestionRecord>, StorageError> {
    docs.into_iter()
        .enumerate()
        .map(|(index, doc)| {
            let position = u32::try_from(index).map_err(decode)?;
            Ok(doc.into_record(position))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoDocument {
    title: String,
    #[serde(default)]
    people_attended: u32,
    #[serde(default)]
    rules: Vec<String>,
}

impl InfoDocument {
    fn into_record(self) -> QuizInfoRecord {
        QuizInfoRecord {
            title: self.title,
            people_attended: self.people_attended,
            rules: self.rules,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionDocument {
    #[serde(default)]
    id: Option<QuestionId>,
    question: String,
    options: Vec<String>,
    answer: String,
}

impl QuestionDocument {
    fn into_record(self, position: u32) -> QuestionRecord {
        QuestionRecord {
            id: self.id.unwrap_or_else(QuestionId::random),
            position,
            prompt: self.question,
            options: self.options,
            answer: self.answer,
        }
    }
}

#[derive(Debug, Serialize)]
struct IncrementRequest {
    field: &'static str,
    by: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncrementResponse {
    people_attended: u32,
}
