//! Mock simulation API for testing
//!
//! Keeps a small in-memory simulation so dashboard flows can be exercised
//! without a server. Failures can be injected per view, per persona, or for
//! every lifecycle command.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};

use super::traits::SimulationApi;
use super::types::{
    AdvanceRequest, DailyReport, GenerateRequest, Persona, PersonaId, PersonaProfile,
    PlannerMetric, SimEvent, SimulationState, StartRequest, TokenUsage, WorkerPlan,
};

// ─────────────────────────────────────────────────────────────────
// Mock Configuration
// ─────────────────────────────────────────────────────────────────

/// Views that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockView {
    State,
    Roster,
    Metrics,
    TokenUsage,
    Events,
}

/// In-memory server state
#[derive(Debug, Default)]
struct MockWorld {
    state: SimulationState,
    personas: Vec<Persona>,
    plans: HashMap<PersonaId, WorkerPlan>,
    reports: HashMap<PersonaId, DailyReport>,
    metrics: Vec<PlannerMetric>,
    token_usage: TokenUsage,
    events: Vec<SimEvent>,
    next_id: PersonaId,
    last_start: Option<StartRequest>,
}

/// Injected failures
#[derive(Debug, Default)]
struct Failures {
    views: HashSet<MockView>,
    plans_for: HashSet<PersonaId>,
    commands: Option<(u16, String)>,
}

/// Track method call counts for verification
#[derive(Debug, Default)]
struct CallCounts {
    simulation_state: u32,
    list_personas: u32,
    latest_hourly_plans: u32,
    latest_daily_reports: u32,
    planner_metrics: u32,
    token_usage: u32,
    list_events: u32,
    start: u32,
    stop: u32,
    reset: u32,
    full_reset: u32,
    advance: u32,
    start_auto_ticks: u32,
    stop_auto_ticks: u32,
    create_persona: u32,
    generate_persona: u32,
}

// ─────────────────────────────────────────────────────────────────
// Mock Simulation API
// ─────────────────────────────────────────────────────────────────

/// Mock implementation of `SimulationApi` for testing
pub struct MockSimulationApi {
    world: RwLock<MockWorld>,
    failures: RwLock<Failures>,
    call_counts: RwLock<CallCounts>,
}

impl MockSimulationApi {
    /// Create an empty, stopped simulation
    pub fn new() -> Self {
        Self {
            world: RwLock::new(MockWorld {
                state: SimulationState {
                    sim_time: "Day 0 00:00".to_string(),
                    ..Default::default()
                },
                next_id: 1,
                ..Default::default()
            }),
            failures: RwLock::new(Failures::default()),
            call_counts: RwLock::new(CallCounts::default()),
        }
    }

    /// Create a simulation that already has these personas
    pub fn with_personas(personas: Vec<Persona>) -> Self {
        let api = Self::new();
        {
            let mut world = api.world.write();
            world.next_id = personas.iter().map(|p| p.id).max().unwrap_or(0) + 1;
            world.personas = personas;
        }
        api
    }

    // ─────────────────────────────────────────────────────────────
    // Scripting
    // ─────────────────────────────────────────────────────────────

    pub fn set_run_state(&self, is_running: bool, auto_tick: bool) {
        let mut world = self.world.write();
        world.state.is_running = is_running;
        world.state.auto_tick = auto_tick;
    }

    pub fn set_personas(&self, personas: Vec<Persona>) {
        self.world.write().personas = personas;
    }

    pub fn set_plan(&self, persona_id: PersonaId, content: &str) {
        self.world.write().plans.insert(
            persona_id,
            WorkerPlan {
                tick: 1,
                plan_type: "hourly".to_string(),
                content: content.to_string(),
            },
        );
    }

    pub fn set_report(&self, persona_id: PersonaId, report: &str) {
        self.world.write().reports.insert(
            persona_id,
            DailyReport {
                day_index: 0,
                report: report.to_string(),
            },
        );
    }

    pub fn push_metric(&self, metric: PlannerMetric) {
        self.world.write().metrics.push(metric);
    }

    pub fn push_event(&self, event: SimEvent) {
        self.world.write().events.push(event);
    }

    pub fn record_tokens(&self, model: &str, tokens: u64) {
        let mut world = self.world.write();
        *world.token_usage.per_model.entry(model.to_string()).or_default() += tokens;
        world.token_usage.total_tokens += tokens;
    }

    /// Make a view fail until cleared
    pub fn fail_view(&self, view: MockView) {
        self.failures.write().views.insert(view);
    }

    pub fn clear_view_failure(&self, view: MockView) {
        self.failures.write().views.remove(&view);
    }

    /// Make the plan pull of one persona fail
    pub fn fail_plans_for(&self, persona_id: PersonaId) {
        self.failures.write().plans_for.insert(persona_id);
    }

    /// Make every lifecycle and persona command fail with this response
    pub fn fail_commands(&self, status: u16, message: &str) {
        self.failures.write().commands = Some((status, message.to_string()));
    }

    pub fn clear_failures(&self) {
        *self.failures.write() = Failures::default();
    }

    // ─────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> SimulationState {
        self.world.read().state.clone()
    }

    pub fn personas(&self) -> Vec<Persona> {
        self.world.read().personas.clone()
    }

    /// Body of the most recent accepted start request
    pub fn last_start(&self) -> Option<StartRequest> {
        self.world.read().last_start.clone()
    }

    /// Get the number of times a method was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "simulation_state" => counts.simulation_state,
            "list_personas" => counts.list_personas,
            "latest_hourly_plans" => counts.latest_hourly_plans,
            "latest_daily_reports" => counts.latest_daily_reports,
            "planner_metrics" => counts.planner_metrics,
            "token_usage" => counts.token_usage,
            "list_events" => counts.list_events,
            "start" => counts.start,
            "stop" => counts.stop,
            "reset" => counts.reset,
            "full_reset" => counts.full_reset,
            "advance" => counts.advance,
            "start_auto_ticks" => counts.start_auto_ticks,
            "stop_auto_ticks" => counts.stop_auto_ticks,
            "create_persona" => counts.create_persona,
            "generate_persona" => counts.generate_persona,
            _ => 0,
        }
    }

    /// Reset all call counts
    pub fn reset_counts(&self) {
        *self.call_counts.write() = CallCounts::default();
    }

    fn check_view(&self, view: MockView) -> Result<()> {
        if self.failures.read().views.contains(&view) {
            return Err(Error::api(500, format!("mock {:?} failure", view)));
        }
        Ok(())
    }

    fn check_command(&self) -> Result<()> {
        match self.failures.read().commands {
            Some((status, ref message)) => Err(Error::api(status, message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockSimulationApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationApi for MockSimulationApi {
    async fn simulation_state(&self) -> Result<SimulationState> {
        self.call_counts.write().simulation_state += 1;
        self.check_view(MockView::State)?;
        Ok(self.world.read().state.clone())
    }

    async fn list_personas(&self) -> Result<Vec<Persona>> {
        self.call_counts.write().list_personas += 1;
        self.check_view(MockView::Roster)?;
        Ok(self.world.read().personas.clone())
    }

    async fn latest_hourly_plans(&self, persona_id: PersonaId) -> Result<Vec<WorkerPlan>> {
        self.call_counts.write().latest_hourly_plans += 1;
        if self.failures.read().plans_for.contains(&persona_id) {
            return Err(Error::api(404, format!("No plans for person {}", persona_id)));
        }
        Ok(self
            .world
            .read()
            .plans
            .get(&persona_id)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn latest_daily_reports(&self, persona_id: PersonaId) -> Result<Vec<DailyReport>> {
        self.call_counts.write().latest_daily_reports += 1;
        Ok(self
            .world
            .read()
            .reports
            .get(&persona_id)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn planner_metrics(&self, limit: u32) -> Result<Vec<PlannerMetric>> {
        self.call_counts.write().planner_metrics += 1;
        self.check_view(MockView::Metrics)?;
        let world = self.world.read();
        let skip = world.metrics.len().saturating_sub(limit as usize);
        Ok(world.metrics[skip..].to_vec())
    }

    async fn token_usage(&self) -> Result<TokenUsage> {
        self.call_counts.write().token_usage += 1;
        self.check_view(MockView::TokenUsage)?;
        Ok(self.world.read().token_usage.clone())
    }

    async fn list_events(&self) -> Result<Vec<SimEvent>> {
        self.call_counts.write().list_events += 1;
        self.check_view(MockView::Events)?;
        Ok(self.world.read().events.clone())
    }

    async fn start(&self, request: &StartRequest) -> Result<()> {
        self.call_counts.write().start += 1;
        self.check_command()?;
        let mut world = self.world.write();
        if world.state.is_running {
            return Err(Error::api(400, "Simulation already running"));
        }
        world.state.is_running = true;
        world.last_start = Some(request.clone());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.call_counts.write().stop += 1;
        self.check_command()?;
        let mut world = self.world.write();
        world.state.is_running = false;
        world.state.auto_tick = false;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.call_counts.write().reset += 1;
        self.check_command()?;
        let mut world = self.world.write();
        world.state = SimulationState {
            sim_time: "Day 0 00:00".to_string(),
            ..Default::default()
        };
        world.plans.clear();
        world.reports.clear();
        world.events.clear();
        Ok(())
    }

    async fn full_reset(&self) -> Result<()> {
        self.call_counts.write().full_reset += 1;
        self.check_command()?;
        let mut world = self.world.write();
        world.state = SimulationState {
            sim_time: "Day 0 00:00".to_string(),
            ..Default::default()
        };
        world.personas.clear();
        world.plans.clear();
        world.reports.clear();
        world.events.clear();
        Ok(())
    }

    async fn advance(&self, request: &AdvanceRequest) -> Result<()> {
        self.call_counts.write().advance += 1;
        self.check_command()?;
        let mut world = self.world.write();
        if !world.state.is_running {
            return Err(Error::api(400, "Simulation is not running"));
        }
        world.state.current_tick += u64::from(request.ticks);
        Ok(())
    }

    async fn start_auto_ticks(&self) -> Result<()> {
        self.call_counts.write().start_auto_ticks += 1;
        self.check_command()?;
        let mut world = self.world.write();
        if !world.state.is_running {
            return Err(Error::api(400, "Simulation is not running"));
        }
        world.state.auto_tick = true;
        Ok(())
    }

    async fn stop_auto_ticks(&self) -> Result<()> {
        self.call_counts.write().stop_auto_ticks += 1;
        self.check_command()?;
        self.world.write().state.auto_tick = false;
        Ok(())
    }

    async fn create_persona(&self, profile: &PersonaProfile) -> Result<Persona> {
        self.call_counts.write().create_persona += 1;
        self.check_command()?;
        let mut world = self.world.write();
        let persona = Persona {
            id: world.next_id,
            profile: profile.clone(),
        };
        world.next_id += 1;
        world.personas.push(persona.clone());
        Ok(persona)
    }

    async fn generate_persona(&self, request: &GenerateRequest) -> Result<PersonaProfile> {
        self.call_counts.write().generate_persona += 1;
        self.check_command()?;
        Ok(PersonaProfile {
            name: "Generated Persona".to_string(),
            role: request.prompt.clone(),
            timezone: "UTC".to_string(),
            work_hours: "09:00-17:00".to_string(),
            email_address: "generated@vdos.local".to_string(),
            chat_handle: "generated".to_string(),
            skills: vec!["Planning".to_string()],
            personality: vec!["Diligent".to_string()],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_lifecycle() {
        let api = MockSimulationApi::new();

        api.start(&StartRequest::default()).await.unwrap();
        assert!(api.state().is_running);

        api.advance(&AdvanceRequest {
            ticks: 3,
            reason: "manual".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(api.state().current_tick, 3);

        api.stop().await.unwrap();
        assert!(!api.state().is_running);
        assert_eq!(api.call_count("advance"), 1);
    }

    #[tokio::test]
    async fn test_mock_view_failure() {
        let api = MockSimulationApi::new();
        api.fail_view(MockView::Events);
        assert!(api.list_events().await.is_err());

        api.clear_view_failure(MockView::Events);
        assert!(api.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_create_assigns_ids() {
        let api = MockSimulationApi::with_personas(vec![Persona::new(4, "Ada", "Lead", None)]);
        let created = api.create_persona(&PersonaProfile::default()).await.unwrap();
        assert_eq!(created.id, 5);
        assert_eq!(api.personas().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_metrics_limit_keeps_newest() {
        let api = MockSimulationApi::new();
        for i in 0..5 {
            api.push_metric(PlannerMetric {
                method: format!("m{}", i),
                ..Default::default()
            });
        }
        let metrics = api.planner_metrics(2).await.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1].method, "m4");
    }
}
