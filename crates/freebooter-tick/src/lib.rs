//! Fixed-rate scheduler for the Freebooter main loop.
//!
//! The main thread does all of its work in ticks: drain network events,
//! apply bus events, run deferred table changes. The scheduler decides
//! when the next tick starts and warns when a tick ran long.
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::default());
//! loop {
//!     tokio::select! {
//!         _ = tokio::signal::ctrl_c() => break,
//!         _ = scheduler.wait_for_tick() => {
//!             server.tick();
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```
//!
//! A tick that starts late does not trigger a burst of catch-up ticks.
//! The missed ticks are counted in [`TickInfo::ticks_skipped`] and the
//! next deadline is measured from now.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. Clamped to `1..=MAX_RATE_HZ`.
    pub rate_hz: u32,
    /// Share of the tick budget (0.0–1.0) above which a finished tick is
    /// logged as a warning.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: 30,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    pub const MAX_RATE_HZ: u32 = 128;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    fn validated(mut self) -> Self {
        let clamped = self.rate_hz.clamp(1, Self::MAX_RATE_HZ);
        if clamped != self.rate_hz {
            warn!(rate = self.rate_hz, clamped, "tick rate out of range");
            self.rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

/// What [`TickScheduler::wait_for_tick`] reports for each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Fixed step, always `1 / rate_hz`.
    pub dt: Duration,
    /// The tick started more than a tenth of a step late.
    pub overrun: bool,
    /// Whole ticks that were skipped to get back on schedule.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    /// Set when a tick fires, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        debug!(
            rate_hz = config.rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            "tick scheduler created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick: TokioInstant::now() + tick_duration,
            tick_start: None,
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(rate_hz))
    }

    /// Sleeps until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let deadline = self.next_tick;
        time::sleep_until(deadline).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > self.tick_duration / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64
        } else {
            0
        };

        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "main loop fell behind, skipping ahead"
            );
        }

        self.next_tick = now + self.tick_duration;
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: self.tick_duration,
            overrun,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work and checks it against the
    /// budget. Does nothing if no tick is in progress.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();

        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.tick_duration.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("rate_hz", &self.config.rate_hz)
            .field("tick_count", &self.tick_count)
            .finish_non_exhaustive()
    }
}
