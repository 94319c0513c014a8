//! Simulation API trait definition
//!
//! The dashboard talks to the simulation manager only through this trait, so
//! the synchronization core can run against the HTTP client or a mock.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{
    AdvanceRequest, DailyReport, GenerateRequest, Persona, PersonaId, PersonaProfile,
    PlannerMetric, SimEvent, SimulationState, StartRequest, TokenUsage, WorkerPlan,
};

/// Remote facade over the simulation manager REST API
///
/// Every method fails with a single error type; lifecycle calls succeed on any
/// 2xx response, including an empty 204.
#[async_trait]
pub trait SimulationApi: Send + Sync {
    // ─────────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────────

    /// Current run-state of the simulation
    async fn simulation_state(&self) -> Result<SimulationState>;

    /// Full persona roster
    async fn list_personas(&self) -> Result<Vec<Persona>>;

    /// Most recent hourly plan of one persona (at most one entry)
    async fn latest_hourly_plans(&self, persona_id: PersonaId) -> Result<Vec<WorkerPlan>>;

    /// Most recent daily report of one persona (at most one entry)
    async fn latest_daily_reports(&self, persona_id: PersonaId) -> Result<Vec<DailyReport>>;

    /// Most recent planner invocations, oldest first
    async fn planner_metrics(&self, limit: u32) -> Result<Vec<PlannerMetric>>;

    /// Aggregate token usage per model
    async fn token_usage(&self) -> Result<TokenUsage>;

    /// All recorded events, oldest first
    async fn list_events(&self) -> Result<Vec<SimEvent>>;

    // ─────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────

    async fn start(&self, request: &StartRequest) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn reset(&self) -> Result<()>;

    /// Reset and delete every persona
    async fn full_reset(&self) -> Result<()>;

    async fn advance(&self, request: &AdvanceRequest) -> Result<()>;

    async fn start_auto_ticks(&self) -> Result<()>;

    async fn stop_auto_ticks(&self) -> Result<()>;

    // ─────────────────────────────────────────────────────────────
    // Personas
    // ─────────────────────────────────────────────────────────────

    /// Create a persona and return it with its server-assigned id
    async fn create_persona(&self, profile: &PersonaProfile) -> Result<Persona>;

    /// Draft a persona from a free-text prompt; nothing is stored server-side
    async fn generate_persona(&self, request: &GenerateRequest) -> Result<PersonaProfile>;
}
