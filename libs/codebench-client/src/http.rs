// HTTP implementation of the problem service

use crate::auth::{credentials_from_config, CredentialProvider};
use crate::error::ServiceError;
use crate::service::ProblemService;
use async_trait::async_trait;
use codebench_common::config::ClientConfig;
use codebench_common::endpoints;
use codebench_common::types::{
    Problem, ProblemDraft, RankingEntry, RunRequest, RunResult, Submission, SubmitRequest,
    SubmitResponse,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpProblemService {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpProblemService {
    /// Build a client from configuration, picking credentials from it
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build HTTP client: {}", e)))?;
        let credentials = credentials_from_config(http.clone(), &config.auth);
        Ok(Self::with_credentials(http, &config.api_url, credentials))
    }

    pub fn with_credentials(
        http: reqwest::Client,
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Issue a request and return the raw body of a successful response
    async fn execute(&self, method: Method, route: &str, body: Option<Value>) -> Result<Vec<u8>, ServiceError> {
        let request_id = Uuid::new_v4();

        // A failed refresh means the user must log in again; never fall back
        // to an unauthenticated request.
        let token = self.credentials.bearer_token().await.map_err(|e| {
            warn!(request_id = %request_id, route = route, error = %e, "Credential unavailable");
            ServiceError::Auth(e.to_string())
        })?;

        let mut builder = self
            .http
            .request(method.clone(), endpoints::url(&self.base_url, route))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        debug!(request_id = %request_id, method = %method, route = route, "Sending request");

        let response = builder.send().await.map_err(|e| {
            warn!(request_id = %request_id, route = route, error = %e, "Request did not reach the service");
            ServiceError::from_transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ServiceError::from_transport)?;

        if !status.is_success() {
            let err = ServiceError::from_status(status.as_u16(), &bytes);
            warn!(
                request_id = %request_id,
                route = route,
                status = status.as_u16(),
                error = %err,
                "Service returned an error"
            );
            return Err(err);
        }

        debug!(request_id = %request_id, status = status.as_u16(), bytes = bytes.len(), "Response received");
        Ok(bytes.to_vec())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        body: Option<Value>,
    ) -> Result<T, ServiceError> {
        let bytes = self.execute(method, route, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(route = route, error = %e, "Failed to decode response body");
            ServiceError::Decode(e.to_string())
        })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Decode(format!("failed to encode request: {}", e)))
}

#[async_trait]
impl ProblemService for HttpProblemService {
    #[instrument(skip(self))]
    async fn fetch_problems(&self) -> Result<Vec<Problem>, ServiceError> {
        self.call(Method::GET, &endpoints::problem_list(), None).await
    }

    #[instrument(skip(self))]
    async fn fetch_problem(&self, id: u64) -> Result<Problem, ServiceError> {
        self.call(Method::GET, &endpoints::problem(id), None).await
    }

    #[instrument(skip(self))]
    async fn fetch_my_problems(&self) -> Result<Vec<Problem>, ServiceError> {
        self.call(Method::GET, &endpoints::my_problems(), None).await
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_problem(&self, draft: &ProblemDraft) -> Result<Problem, ServiceError> {
        self.call(Method::POST, &endpoints::problem_list(), Some(to_body(draft)?)).await
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn update_problem(&self, id: u64, draft: &ProblemDraft) -> Result<Problem, ServiceError> {
        self.call(Method::PUT, &endpoints::problem(id), Some(to_body(draft)?)).await
    }

    #[instrument(skip(self))]
    async fn delete_problem(&self, id: u64) -> Result<(), ServiceError> {
        self.execute(Method::DELETE, &endpoints::problem(id), None).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_submissions(&self, problem_id: u64) -> Result<Vec<Submission>, ServiceError> {
        self.call(Method::GET, &endpoints::problem_submissions(problem_id), None).await
    }

    #[instrument(skip(self))]
    async fn fetch_all_submissions(&self) -> Result<Vec<Submission>, ServiceError> {
        self.call(Method::GET, &endpoints::all_submissions(), None).await
    }

    #[instrument(skip(self))]
    async fn fetch_ranking(&self) -> Result<Vec<RankingEntry>, ServiceError> {
        self.call(Method::GET, &endpoints::ranking(), None).await
    }

    #[instrument(skip(self, request), fields(problem_id = request.problem_id, language = %request.language))]
    async fn run_solution(&self, request: &RunRequest) -> Result<RunResult, ServiceError> {
        self.call(Method::POST, &endpoints::run(request.problem_id), Some(to_body(request)?)).await
    }

    #[instrument(skip(self, request), fields(problem_id = request.problem_id, language = %request.language))]
    async fn submit_solution(&self, request: &SubmitRequest) -> Result<SubmitResponse, ServiceError> {
        self.call(Method::POST, &endpoints::submit(request.problem_id), Some(to_body(request)?)).await
    }
}
