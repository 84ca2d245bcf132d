//! Virtual clock.
//!
//! While installed, timers wait for [`VirtualClock::tick`] instead of real
//! time. Otherwise every timer runs on its own background thread.
//!
//! # Firing Order
//!
//! ```text
//! tick(ms)  ->  due <= now + ms, ascending due time, ties by registration
//!               intervals are rescheduled before their callback runs
//!               timers added by a callback fire in the same tick when due
//! ```
//!
//! Deadlines ([`VirtualClock::set_deadline`]) outlive `uninstall`: the time
//! they still had left is handed to the real clock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use vouch_value::{install_conflict, EngineResult, Thrown};

/// Timer body. An `Err` stops the current tick and is returned from it.
pub type TimerCallback = Arc<dyn Fn() -> Result<(), Thrown> + Send + Sync>;

/// Handle returned by `set_timeout` / `set_interval`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

struct Timer {
    id: TimerId,
    callback: TimerCallback,
    /// Period in ms for intervals.
    every: Option<u64>,
    /// Moves to the real clock on uninstall instead of being discarded.
    carried: bool,
}

/// Scheduled timers keyed by (due time, registration sequence).
#[derive(Default)]
struct ClockState {
    installed: bool,
    elapsed: u64,
    /// Mocked epoch and the elapsed time when it was set.
    mocked: Option<(u64, u64)>,
    next_id: u64,
    next_seq: u64,
    scheduled: BTreeMap<(u64, u64), Timer>,
}

impl ClockState {
    fn insert(&mut self, due: u64, timer: Timer) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.scheduled.insert((due, seq), timer);
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Installable fake clock. Clones share state.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Arc<Mutex<ClockState>>,
    /// Real-clock timers that have not been cleared or fired.
    live: Arc<Mutex<FxHashSet<TimerId>>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        VirtualClock::default()
    }

    /// Start virtual time at zero.
    pub fn install(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        if state.installed {
            return Err(install_conflict());
        }
        state.installed = true;
        state.elapsed = 0;
        tracing::debug!("virtual clock installed");
        Ok(())
    }

    /// Return to real time. Pending virtual timers are discarded unfired,
    /// except deadlines, which continue on the real clock.
    pub fn uninstall(&self) {
        let carried: Vec<(u64, Timer)> = {
            let mut state = self.state.lock();
            let elapsed = state.elapsed;
            let scheduled = std::mem::take(&mut state.scheduled);
            let carried: Vec<_> = scheduled
                .into_iter()
                .filter(|(_, timer)| timer.carried)
                .map(|((due, _), timer)| (due.saturating_sub(elapsed), timer))
                .collect();
            if state.installed {
                tracing::debug!(carried = carried.len(), "virtual clock uninstalled");
            }
            state.installed = false;
            state.mocked = None;
            carried
        };
        for (remaining, timer) in carried {
            self.spawn_real(timer.id, Duration::from_millis(remaining), timer.callback, false);
        }
    }

    pub fn is_installed(&self) -> bool {
        self.state.lock().installed
    }

    /// Virtual time since install.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.state.lock().elapsed)
    }

    /// Virtual timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.state.lock().scheduled.len()
    }

    pub fn set_timeout(
        &self,
        delay: Duration,
        callback: impl Fn() -> Result<(), Thrown> + Send + Sync + 'static,
    ) -> TimerId {
        self.schedule(delay, Arc::new(callback), false, false)
    }

    /// One-shot timer that still fires if the clock is uninstalled before it
    /// is due, after the remaining delay in real time.
    pub fn set_deadline(
        &self,
        delay: Duration,
        callback: impl Fn() -> Result<(), Thrown> + Send + Sync + 'static,
    ) -> TimerId {
        self.schedule(delay, Arc::new(callback), false, true)
    }

    /// Repeat every `period`; a zero period is treated as 1 ms.
    pub fn set_interval(
        &self,
        period: Duration,
        callback: impl Fn() -> Result<(), Thrown> + Send + Sync + 'static,
    ) -> TimerId {
        self.schedule(period, Arc::new(callback), true, false)
    }

    pub fn clear_timeout(&self, id: TimerId) {
        self.state.lock().scheduled.retain(|_, timer| timer.id != id);
        self.live.lock().remove(&id);
    }

    pub fn clear_interval(&self, id: TimerId) {
        self.clear_timeout(id);
    }

    fn schedule(
        &self,
        delay: Duration,
        callback: TimerCallback,
        repeat: bool,
        carried: bool,
    ) -> TimerId {
        let mut state = self.state.lock();
        let id = TimerId(state.next_id);
        state.next_id += 1;

        if state.installed {
            let delay_ms = millis(delay);
            let due = state.elapsed.saturating_add(delay_ms);
            let every = repeat.then_some(delay_ms.max(1));
            state.insert(
                due,
                Timer {
                    id,
                    callback,
                    every,
                    carried,
                },
            );
            tracing::trace!(?id, due, "virtual timer scheduled");
        } else {
            drop(state);
            self.spawn_real(id, delay, callback, repeat);
        }
        id
    }

    fn spawn_real(&self, id: TimerId, delay: Duration, callback: TimerCallback, repeat: bool) {
        self.live.lock().insert(id);
        let live = Arc::clone(&self.live);
        let spawned = thread::Builder::new()
            .name("vouch-timer".to_string())
            .spawn(move || loop {
                thread::sleep(delay);
                let still_live = if repeat {
                    live.lock().contains(&id)
                } else {
                    live.lock().remove(&id)
                };
                if !still_live {
                    break;
                }
                if let Err(thrown) = callback() {
                    tracing::warn!(?id, error = %thrown, "real-clock timer callback threw");
                }
                if !repeat {
                    break;
                }
            });
        if let Err(e) = spawned {
            self.live.lock().remove(&id);
            tracing::warn!(?id, error = %e, "could not start a real-clock timer");
        }
    }

    /// Advance virtual time by `duration`, firing every timer that falls due.
    ///
    /// A callback error stops the tick at that timer's due time and is
    /// returned. Ticking an uninstalled clock does nothing.
    pub fn tick(&self, duration: Duration) -> Result<(), Thrown> {
        let target = {
            let state = self.state.lock();
            if !state.installed {
                tracing::warn!("tick on a clock that is not installed");
                return Ok(());
            }
            state.elapsed.saturating_add(millis(duration))
        };
        tracing::debug!(ms = millis(duration), "virtual clock tick");

        loop {
            let callback = {
                let mut state = self.state.lock();
                if !state.installed {
                    return Ok(());
                }
                let next = state.scheduled.keys().next().copied();
                let Some(key) = next.filter(|(due, _)| *due <= target) else {
                    break;
                };
                let Some(timer) = state.scheduled.remove(&key) else {
                    break;
                };
                let due = key.0;
                state.elapsed = due;
                let callback = Arc::clone(&timer.callback);
                if let Some(every) = timer.every {
                    state.insert(due.saturating_add(every), timer);
                }
                callback
            };
            callback()?;
        }

        let mut state = self.state.lock();
        state.elapsed = state.elapsed.max(target);
        Ok(())
    }

    /// Freeze wall-clock time at `epoch_ms`; it then advances with ticks.
    pub fn mock_date(&self, epoch_ms: u64) {
        let mut state = self.state.lock();
        state.mocked = Some((epoch_ms, state.elapsed));
    }

    /// Wall-clock time in ms since the Unix epoch, mocked or real.
    pub fn now(&self) -> u64 {
        let state = self.state.lock();
        match state.mocked {
            Some((epoch, at)) => epoch.saturating_add(state.elapsed.saturating_sub(at)),
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, millis),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
