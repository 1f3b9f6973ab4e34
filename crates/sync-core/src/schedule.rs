//! Recurring background work
//!
//! [`RecurringTask`] is what the sync service needs from a platform
//! scheduler: arm at an interval, re-arm under a policy, cancel. The tokio
//! implementation runs the injected action on a ticker task.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Async action run on every tick
pub type TickAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// What to do when the task is already armed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Leave the running schedule untouched
    KeepExisting,
    /// Cancel the running schedule and arm with the new interval
    Replace,
}

pub trait RecurringTask: Send + Sync {
    /// Arm the task. Returns false when nothing new was armed: `KeepExisting`
    /// left a schedule in place, or the interval is zero or unrepresentable.
    fn schedule(&self, interval: Duration, policy: SchedulePolicy) -> bool;

    fn cancel(&self);

    /// Interval of the armed schedule, if any
    fn interval(&self) -> Option<Duration>;
}

/// Raise `minutes` to the platform floor
pub fn clamp_interval(minutes: u64, floor_minutes: u64) -> u64 {
    minutes.max(floor_minutes)
}

struct Armed {
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Tokio ticker driving a [`TickAction`]
pub struct TokioRecurringTask {
    name: String,
    action: TickAction,
    armed: Mutex<Option<Armed>>,
}

impl TokioRecurringTask {
    pub fn new(name: impl Into<String>, action: TickAction) -> Self {
        Self {
            name: name.into(),
            action,
            armed: Mutex::new(None),
        }
    }

    fn spawn_ticker(&self, first_tick: Instant, interval: Duration) -> JoinHandle<()> {
        let action = self.action.clone();
        let name = self.name.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!(task = %name, "Recurring task tick");
                (action)().await;
            }
        })
    }
}

impl RecurringTask for TokioRecurringTask {
    fn schedule(&self, interval: Duration, policy: SchedulePolicy) -> bool {
        // First run is one full interval away; callers trigger immediate runs themselves.
        let first_tick = match Instant::now().checked_add(interval) {
            Some(at) if !interval.is_zero() => at,
            _ => {
                warn!(task = %self.name, ?interval, "Refusing to arm recurring task");
                return false;
            }
        };

        let mut armed = self.armed.lock();

        if let Some(current) = armed.as_ref() {
            if policy == SchedulePolicy::KeepExisting && !current.handle.is_finished() {
                debug!(task = %self.name, "Recurring task already armed, keeping it");
                return false;
            }
        }

        if let Some(previous) = armed.take() {
            previous.handle.abort();
        }

        let handle = self.spawn_ticker(first_tick, interval);
        *armed = Some(Armed { interval, handle });
        info!(task = %self.name, interval_secs = interval.as_secs(), "Recurring task armed");
        true
    }

    fn cancel(&self) {
        if let Some(previous) = self.armed.lock().take() {
            previous.handle.abort();
            info!(task = %self.name, "Recurring task cancelled");
        }
    }

    fn interval(&self) -> Option<Duration> {
        self.armed.lock().as_ref().map(|armed| armed.interval)
    }
}

impl Drop for TokioRecurringTask {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.get_mut().take() {
            armed.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task() -> (TokioRecurringTask, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let action: TickAction = Arc::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        (TokioRecurringTask::new("test", action), ticks)
    }

    #[test]
    fn test_clamp_interval() {
        assert_eq!(clamp_interval(10, 15), 15);
        assert_eq!(clamp_interval(15, 15), 15);
        assert_eq!(clamp_interval(60, 15), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval() {
        let (task, ticks) = counting_task();
        assert!(task.schedule(Duration::from_secs(60), SchedulePolicy::Replace));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_existing_and_replace() {
        let (task, _) = counting_task();

        assert!(task.schedule(Duration::from_secs(900), SchedulePolicy::KeepExisting));
        assert!(!task.schedule(Duration::from_secs(60), SchedulePolicy::KeepExisting));
        assert_eq!(task.interval(), Some(Duration::from_secs(900)));

        assert!(task.schedule(Duration::from_secs(1200), SchedulePolicy::Replace));
        assert_eq!(task.interval(), Some(Duration::from_secs(1200)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (task, ticks) = counting_task();
        task.schedule(Duration::from_secs(60), SchedulePolicy::Replace);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        task.cancel();
        assert_eq!(task.interval(), None);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_interval_leaves_schedule_alone() {
        let (task, _) = counting_task();

        assert!(!task.schedule(Duration::ZERO, SchedulePolicy::Replace));
        assert!(!task.schedule(Duration::MAX, SchedulePolicy::Replace));
        assert_eq!(task.interval(), None);

        assert!(task.schedule(Duration::from_secs(900), SchedulePolicy::Replace));
        assert!(!task.schedule(Duration::from_secs(u64::MAX), SchedulePolicy::Replace));
        assert_eq!(task.interval(), Some(Duration::from_secs(900)));
        assert!(!task.schedule(Duration::from_secs(60), SchedulePolicy::KeepExisting));
    }
}
