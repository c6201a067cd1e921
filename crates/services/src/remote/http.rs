use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use study_core::model::{
    AttemptId, AttemptSubmission, Credentials, DoubtHistoryPage, DoubtId, DoubtRecord, FileUpload,
    PageRequest, ProfileSummary, QuizHistoryPage, QuizId, RegistrationProfile,
};

use super::normalize;
use super::{
    BackendApi, DownloadedFile, GeneratedQuiz, QuizRecord, RegisterAck, RemoteConfig,
    SolveDoubtRequest, SolveOutcome, SubmitAck,
};
use crate::auth::AuthToken;
use crate::error::{ConfigError, RemoteError};

/// `BackendApi` over the study backend's REST surface.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `ConfigError::Client` if the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|err| RemoteError::Network(format!("bad endpoint `{path}`: {err}")))
    }

    fn get(&self, token: &AuthToken, path: &str) -> Result<RequestBuilder, RemoteError> {
        Ok(self
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(token.as_str()))
    }

    fn post(&self, token: &AuthToken, path: &str) -> Result<RequestBuilder, RemoteError> {
        Ok(self
            .client
            .post(self.endpoint(path)?)
            .bearer_auth(token.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: u64,
    email: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedBody {
    #[serde(default)]
    quiz_id: Option<QuizId>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuizBody {
    id: QuizId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct SolveBody {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    #[serde(default)]
    attempt_id: Option<AttemptId>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, RemoteError> {
        tracing::debug!(username = %credentials.username, "POST login");
        let response = self
            .client
            .post(self.endpoint("login")?)
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;
        let body: TokenBody = read_json(response).await?;
        Ok(AuthToken::new(body.access_token))
    }

    async fn register(&self, profile: &RegistrationProfile) -> Result<RegisterAck, RemoteError> {
        tracing::debug!(username = %profile.username, "POST users");
        let response = self
            .client
            .post(self.endpoint("users/")?)
            .json(profile)
            .send()
            .await?;
        let body: UserBody = read_json(response).await?;
        Ok(RegisterAck {
            user_id: body.id,
            email: body.email,
        })
    }

    async fn generate_quiz(
        &self,
        token: &AuthToken,
        file: &FileUpload,
        questions_per_section: u8,
    ) -> Result<GeneratedQuiz, RemoteError> {
        tracing::debug!(file = %file.file_name, size = file.size(), "POST generate-quiz");
        let form = Form::new()
            .part("file", file_part(file)?);
        let response = self
            .post(token, "api/generate-quiz")?
            .query(&[("questions_per_section", questions_per_section)])
            .multipart(form)
            .send()
            .await?;
        let body: GeneratedBody = read_json(response).await?;
        Ok(GeneratedQuiz {
            quiz_id: body.quiz_id,
            title: title_from_file_name(&file.file_name),
            sections: normalize::sections(&body.data)?,
            warning: body.warning,
        })
    }

    async fn solve_doubt(
        &self,
        token: &AuthToken,
        request: &SolveDoubtRequest,
    ) -> Result<SolveOutcome, RemoteError> {
        tracing::debug!(
            turns = request.conversation.len(),
            has_pdf = request.pdf.is_some(),
            has_image = request.image.is_some(),
            "POST solve-doubt"
        );
        let conversation = serde_json::to_string(&request.conversation)
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        let mut form = Form::new()
            .text("question", request.question.clone())
            .text("conversation", conversation);
        if !request.subjects.is_empty() {
            form = form.text("subjects", request.subjects.join(","));
        }
        if let Some(pdf) = &request.pdf {
            form = form.part("context_pdf", file_part(pdf.file())?);
        }
        if let Some(image) = &request.image {
            form = form.part("context_image", file_part(image.file())?);
        }

        let response = self
            .post(token, "api/solve-doubt")?
            .multipart(form)
            .send()
            .await?;
        let body: SolveBody = read_json(response).await?;
        Ok(match body.answer {
            Some(answer) if !answer.trim().is_empty() => SolveOutcome::Answer(answer),
            _ => SolveOutcome::Error(body.error.unwrap_or_else(|| "No answer received".into())),
        })
    }

    async fn submit_quiz_attempt(
        &self,
        token: &AuthToken,
        submission: &AttemptSubmission,
    ) -> Result<SubmitAck, RemoteError> {
        tracing::debug!(quiz_id = %submission.quiz_id, "POST submit-quiz-attempt");
        let response = self
            .post(token, "api/submit-quiz-attempt")?
            .json(submission)
            .send()
            .await?;
        let body: SubmitBody = read_json(response).await?;
        Ok(SubmitAck {
            attempt_id: body.attempt_id,
            message: body.message,
        })
    }

    async fn get_profile(&self, token: &AuthToken) -> Result<ProfileSummary, RemoteError> {
        let response = self.get(token, "api/profile")?.send().await?;
        read_json(response).await
    }

    async fn get_quiz_history(
        &self,
        token: &AuthToken,
        page: PageRequest,
    ) -> Result<QuizHistoryPage, RemoteError> {
        let response = self
            .get(token, "api/quiz-history")?
            .query(&[("skip", page.skip()), ("limit", page.limit())])
            .send()
            .await?;
        read_json(response).await
    }

    async fn get_doubt_history(
        &self,
        token: &AuthToken,
        page: PageRequest,
        subject: Option<&str>,
    ) -> Result<DoubtHistoryPage, RemoteError> {
        let mut request = self
            .get(token, "api/doubt-history")?
            .query(&[("skip", page.skip()), ("limit", page.limit())]);
        if let Some(subject) = subject {
            request = request.query(&[("subject", subject)]);
        }
        read_json(request.send().await?).await
    }

    async fn get_quiz_by_id(
        &self,
        token: &AuthToken,
        id: QuizId,
    ) -> Result<QuizRecord, RemoteError> {
        let response = self.get(token, &format!("api/quiz/{id}"))?.send().await?;
        let body: QuizBody = read_json(response).await?;
        Ok(QuizRecord {
            id: body.id,
            title: body.title,
            filename: body.filename,
            sections: normalize::sections(&body.content)?,
        })
    }

    async fn get_doubt_by_id(
        &self,
        token: &AuthToken,
        id: DoubtId,
    ) -> Result<DoubtRecord, RemoteError> {
        let response = self.get(token, &format!("api/doubt/{id}"))?.send().await?;
        read_json(response).await
    }

    async fn download_file(
        &self,
        token: &AuthToken,
        id: QuizId,
    ) -> Result<DownloadedFile, RemoteError> {
        let response = self
            .get(token, &format!("api/download-file/{id}"))?
            .send()
            .await?;
        let response = check_status(response).await?;
        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(file_name_from_disposition);
        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedFile { file_name, bytes })
    }
}

fn file_part(file: &FileUpload) -> Result<Part, RemoteError> {
    Ok(Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime_type)?)
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

fn status_error(status: u16, body: &str) -> RemoteError {
    match status {
        401 => RemoteError::Unauthorized,
        404 => RemoteError::NotFound,
        408 => RemoteError::Timeout,
        413 => RemoteError::PayloadTooLarge,
        _ => RemoteError::Status {
            status,
            detail: detail_from_body(body),
        },
    }
}

/// Pull the human-readable part out of a `{"detail": ...}` error body.
fn detail_from_body(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());
    match detail {
        Some(Value::String(text)) => text,
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        _ if body.trim().is_empty() => "request failed".into(),
        _ => body.trim().to_string(),
    }
}

fn file_name_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
    })
}

fn title_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.split('.').next().unwrap_or_default().trim();
    (!stem.is_empty()).then(|| stem.to_string())
}
