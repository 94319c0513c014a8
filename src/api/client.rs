//! HTTP implementation of the simulation API
//!
//! Thin reqwest wrapper: one request per call, no retries. A non-2xx response
//! becomes `Error::Api` carrying the response body, or the status text when
//! the body is empty.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ServerSettings;
use crate::error::{Error, Result};
use crate::version::build_info;

use super::traits::SimulationApi;
use super::types::{
    AdvanceRequest, DailyReport, GenerateRequest, GenerateResponse, Persona, PersonaId,
    PersonaProfile, PlannerMetric, SimEvent, SimulationState, StartRequest, TokenUsage,
    WorkerPlan,
};

// ─────────────────────────────────────────────────────────────────
// HTTP Simulation API
// ─────────────────────────────────────────────────────────────────

/// Simulation manager client over HTTP
pub struct HttpSimulationApi {
    client: Client,
    api_root: String,
    timeout_secs: u64,
}

impl HttpSimulationApi {
    /// Create a client for the configured server
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(build_info().user_agent())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let api_root = settings.api_root();
        info!(api_root = %api_root, "Simulation API client created");

        Ok(Self {
            client,
            api_root,
            timeout_secs: settings.request_timeout_secs,
        })
    }

    /// Root URL every endpoint path is appended to
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::transport(url, e.to_string())
        }
    }

    /// Send a request and return the raw body of a successful response
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            debug!(url, "Empty response");
            return Ok(String::new());
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if !status.is_success() {
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body
            };
            warn!(url, status = status.as_u16(), "Simulation API error: {}", message);
            return Err(Error::api(status.as_u16(), message));
        }

        Ok(body)
    }

    /// GET a view; an empty body yields the type's empty value
    async fn get_view<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.url(path);
        let body = self.send(self.client.get(&url), &url).await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        decode(path, &body)
    }

    /// POST a lifecycle command; any response body is ignored
    async fn post_command<B>(&self, path: &str, body: Option<&B>) -> Result<()>
    where
        B: serde::Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, &url).await?;
        info!(endpoint = path, "Simulation command accepted");
        Ok(())
    }

    /// POST a body and decode a required response
    async fn post_for<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let body = self.send(self.client.post(&url).json(body), &url).await?;
        if body.trim().is_empty() {
            return Err(Error::ApiMalformed {
                endpoint: path.to_string(),
                message: "empty response body".to_string(),
            });
        }
        decode(path, &body)
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::ApiMalformed {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl SimulationApi for HttpSimulationApi {
    async fn simulation_state(&self) -> Result<SimulationState> {
        self.get_view("/simulation").await
    }

    async fn list_personas(&self) -> Result<Vec<Persona>> {
        self.get_view("/people").await
    }

    async fn latest_hourly_plans(&self, persona_id: PersonaId) -> Result<Vec<WorkerPlan>> {
        self.get_view(&format!(
            "/people/{}/plans?plan_type=hourly&limit=1",
            persona_id
        ))
        .await
    }

    async fn latest_daily_reports(&self, persona_id: PersonaId) -> Result<Vec<DailyReport>> {
        self.get_view(&format!("/people/{}/daily-reports?limit=1", persona_id))
            .await
    }

    async fn planner_metrics(&self, limit: u32) -> Result<Vec<PlannerMetric>> {
        self.get_view(&format!("/metrics/planner?limit={}", limit))
            .await
    }

    async fn token_usage(&self) -> Result<TokenUsage> {
        self.get_view("/simulation/token-usage").await
    }

    async fn list_events(&self) -> Result<Vec<SimEvent>> {
        self.get_view("/events").await
    }

    async fn start(&self, request: &StartRequest) -> Result<()> {
        self.post_command("/simulation/start", Some(request)).await
    }

    async fn stop(&self) -> Result<()> {
        self.post_command::<()>("/simulation/stop", None).await
    }

    async fn reset(&self) -> Result<()> {
        self.post_command::<()>("/simulation/reset", None).await
    }

    async fn full_reset(&self) -> Result<()> {
        self.post_command::<()>("/simulation/full-reset", None).await
    }

    async fn advance(&self, request: &AdvanceRequest) -> Result<()> {
        self.post_command("/simulation/advance", Some(request)).await
    }

    async fn start_auto_ticks(&self) -> Result<()> {
        self.post_command::<()>("/simulation/ticks/start", None).await
    }

    async fn stop_auto_ticks(&self) -> Result<()> {
        self.post_command::<()>("/simulation/ticks/stop", None).await
    }

    async fn create_persona(&self, profile: &PersonaProfile) -> Result<Persona> {
        self.post_for("/people", profile).await
    }

    async fn generate_persona(&self, request: &GenerateRequest) -> Result<PersonaProfile> {
        let response: GenerateResponse = self.post_for("/personas/generate", request).await?;
        response.persona.ok_or_else(|| Error::ApiMalformed {
            endpoint: "/personas/generate".to_string(),
            message: "response has no persona".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_api_root() {
        let api = HttpSimulationApi::new(&ServerSettings::default()).unwrap();
        assert_eq!(api.api_root(), "http://127.0.0.1:8015/api/v1");
        assert_eq!(
            api.url("/people/4/daily-reports?limit=1"),
            "http://127.0.0.1:8015/api/v1/people/4/daily-reports?limit=1"
        );
    }

    #[test]
    fn test_decode_reports_endpoint() {
        let err = decode::<SimulationState>("/simulation", "not json").unwrap_err();
        match err {
            Error::ApiMalformed { endpoint, .. } => assert_eq!(endpoint, "/simulation"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let settings = ServerSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let api = HttpSimulationApi::new(&settings).unwrap();

        let err = api.simulation_state().await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. } | Error::Timeout { .. }));
    }
}
