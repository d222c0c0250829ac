use std::{future::Future, pin::pin, time::Duration};

use chrono::NaiveTime;
use fanctl_common::FanEngine;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    cycle::{run_cycle, CycleOutcome},
    ipmi::FanGateway,
};

/// Single-worker periodic loop. Cycles run inline, so a tick that falls due
/// while a cycle is still running is dropped rather than queued.
pub struct Scheduler<G, C> {
    gateway: G,
    engine: FanEngine,
    clock: C,
    period: Duration,
}

impl<G, C> Scheduler<G, C>
where
    G: FanGateway,
    C: Fn() -> NaiveTime,
{
    pub fn new(gateway: G, engine: FanEngine, clock: C) -> Self {
        let period = engine.policy().interval;
        Self {
            gateway,
            engine,
            clock,
            period,
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &FanEngine {
        &self.engine
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let now = (self.clock)();
        run_cycle(&self.gateway, &mut self.engine, now).await
    }

    /// Runs one cycle immediately, then one per period until `shutdown`
    /// resolves. An in-flight cycle is always allowed to finish. Returns the
    /// number of cycles run.
    pub async fn run_until<S>(&mut self, shutdown: S) -> u64
    where
        S: Future<Output = ()>,
    {
        let mut shutdown = pin!(shutdown);
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.run_cycle().await;
        let mut cycles = 1;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            self.run_cycle().await;
            cycles += 1;

            let elapsed = started.elapsed();
            if elapsed > self.period {
                debug!(
                    "cycle took {:.1}s, longer than the {}s interval; overlapping ticks dropped",
                    elapsed.as_secs_f32(),
                    self.period.as_secs()
                );
            }
        }

        info!("control loop stopped after {cycles} cycles");

        if self.engine.policy().restore_auto_on_exit {
            self.restore_auto().await;
        }

        cycles
    }

    async fn restore_auto(&self) {
        info!("restoring automatic fan control");
        let output = self.gateway.set_auto_mode(true).await;
        if !output.success() {
            warn!("failed to restore automatic fan control: {}", output.detail());
        }
    }
}
