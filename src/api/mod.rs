//! Remote facade over the simulation manager
//!
//! - `SimulationApi`: the trait the dashboard depends on
//! - `HttpSimulationApi`: reqwest client for a live server
//! - `MockSimulationApi`: in-memory stand-in for tests

mod client;
mod mock;
mod traits;
pub mod types;

pub use client::HttpSimulationApi;
pub use mock::{MockSimulationApi, MockView};
pub use traits::SimulationApi;
pub use types::{
    AdvanceRequest, DailyReport, GenerateRequest, Persona, PersonaId, PersonaProfile,
    PlannerMetric, ProjectSpec, ScheduleBlock, SimEvent, SimulationState, StartRequest,
    TokenUsage, WorkerPlan,
};
