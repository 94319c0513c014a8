//! Adaptive poll controller
//!
//! Owns the single recurring refresh timer. The period follows the observed
//! run-state: 5 s while the simulation runs or auto-ticks, 60 s otherwise.
//! Only edges change the timer; repeated observations of the same mode leave
//! the live handle untouched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::PollingSettings;

// ─────────────────────────────────────────────────────────────────
// Timer Seam
// ─────────────────────────────────────────────────────────────────

/// Identity of one installed recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One firing of a recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub handle: TimerHandle,
}

/// Installs and cancels recurring timers
pub trait TickScheduler: Send + Sync {
    /// Start a timer that fires every `period`, first after one period
    fn schedule(&self, period: Duration) -> TimerHandle;

    /// Stop a timer; unknown handles are ignored
    fn cancel(&self, handle: TimerHandle);
}

/// Tokio-backed scheduler delivering ticks over a channel
///
/// Must be used from within a tokio runtime.
pub struct TokioTickScheduler {
    sender: mpsc::UnboundedSender<Tick>,
    tasks: Mutex<HashMap<TimerHandle, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl TokioTickScheduler {
    /// Create a scheduler and the receiver its ticks arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            sender,
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        };
        (scheduler, receiver)
    }

    /// Number of timers currently installed
    pub fn live_timers(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&self, period: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        let sender = self.sender.clone();

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // Late ticks fire once and do not burst
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(Tick { handle }).is_err() {
                    break;
                }
            }
        });

        self.tasks.lock().insert(handle, task);
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(task) = self.tasks.lock().remove(&handle) {
            task.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Poll Controller
// ─────────────────────────────────────────────────────────────────

/// Poll cadence derived from the simulation run-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    Idle,
    Active,
}

impl PollMode {
    pub fn from_run_state(is_running: bool, auto_tick: bool) -> Self {
        if is_running || auto_tick {
            PollMode::Active
        } else {
            PollMode::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollMode::Idle => "idle",
            PollMode::Active => "active",
        }
    }
}

/// Owner of the one recurring refresh timer
pub struct PollController {
    scheduler: Arc<dyn TickScheduler>,
    active_period: Duration,
    idle_period: Duration,
    mode: PollMode,
    period: Duration,
    handle: Option<TimerHandle>,
}

impl PollController {
    /// Controller in idle mode with no timer installed yet
    pub fn new(scheduler: Arc<dyn TickScheduler>, settings: &PollingSettings) -> Self {
        let idle_period = settings.idle_interval();
        Self {
            scheduler,
            active_period: settings.active_interval(),
            idle_period,
            mode: PollMode::Idle,
            period: idle_period,
            handle: None,
        }
    }

    /// Install the timer for the current mode if none is live
    pub fn start(&mut self) -> TimerHandle {
        match self.handle {
            Some(handle) => handle,
            None => {
                let handle = self.scheduler.schedule(self.period);
                info!(
                    period_ms = self.period.as_millis() as u64,
                    mode = self.mode.as_str(),
                    "Refresh timer started"
                );
                self.handle = Some(handle);
                handle
            }
        }
    }

    /// Feed one observed run-state; returns true when the timer was replaced
    pub fn on_state_observed(&mut self, is_running: bool, auto_tick: bool) -> bool {
        let mode = PollMode::from_run_state(is_running, auto_tick);
        if mode == self.mode {
            return false;
        }

        info!(from = self.mode.as_str(), to = mode.as_str(), "Poll mode changed");
        self.mode = mode;
        let period = self.period_for(mode);
        self.set_interval(period)
    }

    /// Replace the live timer with one at `period`
    ///
    /// No-op when a timer at that period is already live.
    pub fn set_interval(&mut self, period: Duration) -> bool {
        if self.handle.is_some() && period == self.period {
            debug!(period_ms = period.as_millis() as u64, "Refresh period unchanged");
            return false;
        }

        if let Some(old) = self.handle.take() {
            self.scheduler.cancel(old);
        }
        let handle = self.scheduler.schedule(period);
        self.period = period;
        self.handle = Some(handle);

        info!(
            period_ms = period.as_millis() as u64,
            timer = handle.id(),
            "Refresh timer rescheduled"
        );
        true
    }

    /// Cancel the live timer
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
            debug!(timer = handle.id(), "Refresh timer stopped");
        }
    }

    pub fn mode(&self) -> PollMode {
        self.mode
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.handle
    }

    /// Whether a tick came from the live timer rather than a cancelled one
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.handle == Some(tick.handle)
    }

    fn period_for(&self, mode: PollMode) -> Duration {
        match mode {
            PollMode::Active => self.active_period,
            PollMode::Idle => self.idle_period,
        }
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Scheduler that records calls instead of spawning tasks
    #[derive(Default)]
    pub(crate) struct RecordingScheduler {
        next_id: AtomicU64,
        pub live: Mutex<Vec<(TimerHandle, Duration)>>,
        pub scheduled: AtomicU64,
        pub cancelled: AtomicU64,
    }

    impl TickScheduler for RecordingScheduler {
        fn schedule(&self, period: Duration) -> TimerHandle {
            let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
            self.live.lock().push((handle, period));
            self.scheduled.fetch_add(1, Ordering::Relaxed);
            handle
        }

        fn cancel(&self, handle: TimerHandle) {
            self.live.lock().retain(|(h, _)| *h != handle);
            self.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn controller() -> (PollController, Arc<RecordingScheduler>) {
        let scheduler = Arc::new(RecordingScheduler::default());
        let poll = PollController::new(scheduler.clone(), &PollingSettings::default());
        (poll, scheduler)
    }

    #[test]
    fn test_starts_idle_with_one_timer() {
        let (mut poll, scheduler) = controller();
        assert_eq!(poll.mode(), PollMode::Idle);
        assert!(poll.handle().is_none());

        let handle = poll.start();
        assert_eq!(poll.period(), Duration::from_millis(60_000));
        assert_eq!(scheduler.live.lock().as_slice(), &[(handle, Duration::from_millis(60_000))]);

        // Starting twice keeps the same timer
        assert_eq!(poll.start(), handle);
        assert_eq!(scheduler.scheduled.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_same_mode_never_restarts_timer() {
        let (mut poll, scheduler) = controller();
        poll.start();
        assert!(poll.on_state_observed(true, false));
        let handle = poll.handle();

        assert!(!poll.on_state_observed(true, false));
        assert!(!poll.on_state_observed(false, true));
        assert!(!poll.on_state_observed(true, true));

        assert_eq!(poll.handle(), handle);
        assert_eq!(scheduler.scheduled.load(Ordering::Relaxed), 2);
        assert_eq!(scheduler.live.lock().len(), 1);
    }

    #[test]
    fn test_running_then_stopped_returns_to_idle_period() {
        let (mut poll, scheduler) = controller();
        poll.start();

        poll.on_state_observed(true, false);
        assert_eq!(poll.period(), Duration::from_millis(5_000));

        poll.on_state_observed(false, false);
        assert_eq!(poll.period(), Duration::from_millis(60_000));
        assert_eq!(poll.mode(), PollMode::Idle);
        assert_eq!(scheduler.live.lock().len(), 1);
        assert_eq!(scheduler.cancelled.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_auto_tick_alone_is_active() {
        let (mut poll, _scheduler) = controller();
        poll.start();
        poll.on_state_observed(false, true);
        assert_eq!(poll.period(), Duration::from_millis(5_000));
        assert_eq!(poll.mode(), PollMode::Active);
    }

    #[test]
    fn test_first_observation_can_go_active_before_start() {
        let (mut poll, scheduler) = controller();
        assert!(poll.on_state_observed(true, false));
        assert_eq!(poll.period(), Duration::from_millis(5_000));
        assert_eq!(scheduler.live.lock().len(), 1);
    }

    #[test]
    fn test_set_interval_same_period_is_noop() {
        let (mut poll, scheduler) = controller();
        let handle = poll.start();
        assert!(!poll.set_interval(Duration::from_millis(60_000)));
        assert_eq!(poll.handle(), Some(handle));

        assert!(poll.set_interval(Duration::from_millis(1_000)));
        assert_ne!(poll.handle(), Some(handle));
        assert_eq!(scheduler.live.lock().len(), 1);
    }

    #[test]
    fn test_stale_tick_is_not_current() {
        let (mut poll, _scheduler) = controller();
        let old = poll.start();
        poll.on_state_observed(true, false);

        assert!(!poll.is_current(&Tick { handle: old }));
        let live = poll.handle().unwrap();
        assert!(poll.is_current(&Tick { handle: live }));
    }

    #[test]
    fn test_drop_cancels_timer() {
        let (mut poll, scheduler) = controller();
        poll.start();
        drop(poll);
        assert!(scheduler.live.lock().is_empty());
    }

    #[tokio::test]
    async fn test_tokio_scheduler_delivers_ticks() {
        let (scheduler, mut ticks) = TokioTickScheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(10));

        let tick = ticks.recv().await.unwrap();
        assert_eq!(tick.handle, handle);
        assert_eq!(scheduler.live_timers(), 1);

        scheduler.cancel(handle);
        assert_eq!(scheduler.live_timers(), 0);
    }
}
