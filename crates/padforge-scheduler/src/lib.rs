//! Absolute-deadline cycle scheduling for the polling pipeline.
//!
//! The pipeline runs at a fixed period (1 ms by default) on a dedicated
//! thread. Each cycle begins at `start + n·Δ` in absolute time, so work
//! that finishes early sleeps the difference and work that overruns does
//! not accumulate debt: after a long stall the schedule resynchronises
//! to "now" instead of bursting to catch up.
//!
//! A [`FrequencyMeter`] averages the last ~1000 observed periods into
//! the measured frequency the engine publishes for observability.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod frequency;

pub use frequency::FrequencyMeter;

use std::time::{Duration, Instant};

/// Sleep is handed back to the OS until this close to the deadline; the
/// rest is spent spinning for precision.
const SPIN_WINDOW: Duration = Duration::from_micros(150);

/// Information about one granted cycle.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// When the cycle actually began
    pub now: Instant,
    /// Whether the previous deadline was overrun and the schedule
    /// resynchronised
    pub resynced: bool,
    /// Measured frequency over the averaging window, once warm
    pub measured_hz: Option<f64>,
}

/// Absolute-deadline scheduler for the pipeline loop.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use padforge_scheduler::CycleScheduler;
///
/// let mut scheduler = CycleScheduler::new(Duration::from_millis(1));
/// loop {
///     let tick = scheduler.wait_for_tick();
///     // run the pipeline stages
///     # let _ = tick; break;
/// }
/// ```
#[derive(Debug)]
pub struct CycleScheduler {
    period: Duration,
    next_tick: Option<Instant>,
    meter: FrequencyMeter,
    last_tick: Option<Instant>,
}

impl CycleScheduler {
    /// A scheduler with the given period.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_micros(100)),
            next_tick: None,
            meter: FrequencyMeter::default(),
            last_tick: None,
        }
    }

    /// A 1 kHz scheduler, the pipeline default.
    pub fn new_1khz() -> Self {
        Self::new(Duration::from_millis(1))
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next cycle boundary and grant the cycle.
    ///
    /// The first call returns immediately and starts the schedule.
    pub fn wait_for_tick(&mut self) -> Tick {
        let (now, resynced) = match self.next_tick {
            None => (Instant::now(), false),
            Some(deadline) => {
                sleep_until(deadline);
                let now = Instant::now();
                // More than one full period late: resync rather than
                // burst through the missed deadlines.
                let resynced = now > deadline + self.period;
                if resynced {
                    tracing::trace!(
                        late_us = now.duration_since(deadline).as_micros() as u64,
                        "cycle overrun, resynchronising schedule"
                    );
                }
                (now, resynced)
            }
        };

        self.next_tick = Some(if resynced {
            now + self.period
        } else {
            self.next_tick.map_or(now, |d| d) + self.period
        });

        if let Some(last) = self.last_tick {
            self.meter.record(now.duration_since(last));
        }
        self.last_tick = Some(now);

        Tick {
            now,
            resynced,
            measured_hz: self.meter.measured_hz(),
        }
    }

    /// Measured frequency over the averaging window, once warm.
    pub fn measured_hz(&self) -> Option<f64> {
        self.meter.measured_hz()
    }
}

fn sleep_until(deadline: Instant) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_WINDOW {
            std::thread::sleep(remaining - SPIN_WINDOW);
        } else {
            std::hint::spin_loop();
        }
    }
}
