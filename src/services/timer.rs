// Rest-timer driver
//
// Schedules the one-second countdown for a workout session. The driver owns at
// most one tokio task at a time; the task only sends TimerTick messages and
// never touches session state itself. The session owner applies each tick as a
// TickTimer action and calls `reconcile` afterwards.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Period between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Bounded so a stalled consumer cannot queue ticks without limit
const TICK_CHANNEL_CAPACITY: usize = 16;

/// One countdown step, tagged with the schedule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

/// What `reconcile` did to the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTransition {
    Started,
    Stopped,
    Unchanged,
}

/// Cancellable recurring tick schedule owned by one session
///
/// Every schedule gets a new generation number. Ticks queued by a cancelled
/// schedule can still sit in the channel, so the owner must check
/// [`accepts()`](Self::accepts) before applying a tick.
///
/// Dropping the driver aborts the running schedule.
#[derive(Debug)]
pub struct RestTimer {
    tick_tx: mpsc::Sender<TimerTick>,
    task: Option<JoinHandle<()>>,
    generation: u64,
    period: Duration,
}

impl RestTimer {
    /// Create a driver and the receiver its ticks arrive on
    pub fn channel() -> (Self, mpsc::Receiver<TimerTick>) {
        Self::with_period(TICK_PERIOD)
    }

    pub fn with_period(period: Duration) -> (Self, mpsc::Receiver<TimerTick>) {
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        let timer = Self {
            tick_tx,
            task: None,
            generation: 0,
            period,
        };
        (timer, tick_rx)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Generation of the current (or most recent) schedule
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick comes from the live schedule
    pub fn accepts(&self, tick: TimerTick) -> bool {
        self.is_running() && tick.generation == self.generation
    }

    /// Bring the schedule in line with the session's running condition
    ///
    /// Starts a schedule (first tick one full period from now) when `should_run`
    /// is true and none is active, cancels the active one when it is false.
    /// Must be called from within a tokio runtime.
    pub fn reconcile(&mut self, should_run: bool) -> TimerTransition {
        match (should_run, self.is_running()) {
            (true, false) => {
                self.start();
                TimerTransition::Started
            }
            (false, true) => {
                self.cancel();
                TimerTransition::Stopped
            }
            _ => TimerTransition::Unchanged,
        }
    }

    fn start(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let tick_tx = self.tick_tx.clone();

        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tick_tx.send(TimerTick { generation }).await.is_err() {
                    tracing::debug!("Rest timer receiver closed, stopping schedule {}", generation);
                    break;
                }
            }
        }));

        tracing::debug!("Rest timer schedule {} started", generation);
    }

    /// Abort the active schedule. Returns false if nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                tracing::debug!("Rest timer schedule {} cancelled", self.generation);
                true
            }
            None => false,
        }
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
