//! Cosmetic progress simulation.
//!
//! The backend reports no progress, so while a call is outstanding a timer
//! nudges a display counter upwards by a fixed step, never past
//! [`PROGRESS_CAP`]. Settlement snaps it to 100; the owner resets it to 0 once
//! the whole operation is over. The counter says nothing about real completion.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::events::{EventSink, ProgressTag, WorkspaceEvent};

/// Highest value a counter reaches while its operation is outstanding.
pub const PROGRESS_CAP: u8 = 90;

/// Step size and tick period for one kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressProfile {
    pub increment: u8,
    pub period: Duration,
}

impl ProgressProfile {
    pub const ANALYSIS: Self = Self {
        increment: 3,
        period: Duration::from_millis(200),
    };
    pub const FLOW: Self = Self {
        increment: 4,
        period: Duration::from_millis(200),
    };
    pub const CHAT: Self = Self {
        increment: 5,
        period: Duration::from_millis(150),
    };
}

/// Display counter in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSimulator {
    value: u8,
    increment: u8,
}

impl ProgressSimulator {
    pub fn new(profile: ProgressProfile) -> Self {
        Self {
            value: 0,
            increment: profile.increment,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Advances by one step, saturating at [`PROGRESS_CAP`].
    pub fn tick(&mut self) {
        if self.value >= PROGRESS_CAP {
            return;
        }
        self.value = self.value.saturating_add(self.increment).min(PROGRESS_CAP);
    }

    /// The operation settled.
    pub fn complete(&mut self) {
        self.value = 100;
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

/// A running timer task that emits [`WorkspaceEvent::Tick`] every period.
///
/// The task is aborted by [`ProgressTicker::stop`] or when the ticker is
/// dropped, so a ticker never outlives the operation that owns it.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Spawns the timer. The first tick arrives one period after the start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(profile: ProgressProfile, tag: ProgressTag, sink: EventSink) -> Self {
        let handle = tokio::spawn(async move {
            let mut timer = interval(profile.period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() completes its first tick immediately.
            timer.tick().await;
            loop {
                timer.tick().await;
                if !sink.emit(WorkspaceEvent::Tick(tag)) {
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunId;
    use tokio::sync::mpsc;

    #[test]
    fn flow_profile_is_capped_below_overshoot() {
        let mut sim = ProgressSimulator::new(ProgressProfile::FLOW);
        let mut seen = Vec::new();
        for _ in 0..40 {
            sim.tick();
            seen.push(sim.value());
        }
        assert!(seen.iter().all(|v| *v <= PROGRESS_CAP));
        assert_eq!(sim.value(), PROGRESS_CAP);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "monotonic");
    }

    #[test]
    fn complete_then_reset() {
        let mut sim = ProgressSimulator::new(ProgressProfile::ANALYSIS);
        sim.tick();
        assert_eq!(sim.value(), 3);
        sim.complete();
        assert_eq!(sim.value(), 100);
        sim.reset();
        assert_eq!(sim.value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_emits_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkspaceEvent>();
        let tag = ProgressTag::Analysis(RunId(1));
        let mut ticker = ProgressTicker::start(ProgressProfile::ANALYSIS, tag, EventSink::from_sender(tx));

        for _ in 0..3 {
            match rx.recv().await {
                Some(WorkspaceEvent::Tick(t)) => assert_eq!(t, tag),
                other => panic!("unexpected {other:?}"),
            }
        }
        ticker.stop();
        assert!(!ticker.is_running());
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        // The aborted task dropped its sender; nothing more arrives.
        assert!(rx.recv().await.is_none());
    }
}
