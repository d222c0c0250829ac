use chrono::NaiveTime;
use fanctl_common::{parse_temperatures, DispatchDecision, FanAction, FanEngine, NightCap, SpeedPlan};
use tracing::{debug, error, info, warn};

use crate::ipmi::FanGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    SensorReadFailed,
    NoReadings,
    Unchanged(u8),
    Applied(u8),
    DispatchFailed(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatched: bool,
    pub applied: u8,
    pub success: bool,
}

/// One control pass: read, plan, dispatch.
pub async fn run_cycle<G: FanGateway>(
    gateway: &G,
    engine: &mut FanEngine,
    now: NaiveTime,
) -> CycleOutcome {
    let output = gateway.read_sensors().await;
    if !output.success() {
        error!("failed to read sensors: {}", output.detail());
        return CycleOutcome::SensorReadFailed;
    }

    let temps = parse_temperatures(&output.stdout);
    let Some(plan) = engine.plan(&temps, now) else {
        warn!("no valid temperature readings, holding current fan state");
        return CycleOutcome::NoReadings;
    };

    info!(
        "max temperature {:.1}°C across {} sensors -> policy target {}%",
        plan.max_temp,
        temps.len(),
        plan.base_percent
    );

    let window = engine.policy().night.window;
    match plan.night {
        NightCap::Capped { from, to } => {
            info!("night limit active: {from}% -> {to}% (window {window})");
        }
        NightCap::WithinLimit(percent) => {
            debug!("night limit active, {percent}% already within the {window} cap");
        }
        NightCap::Inactive(_) => {}
    }

    let report = dispatch(gateway, engine, &plan).await;
    match report {
        DispatchReport {
            dispatched: false,
            applied,
            ..
        } => CycleOutcome::Unchanged(applied),
        DispatchReport {
            success: true,
            applied,
            ..
        } => CycleOutcome::Applied(applied),
        DispatchReport { applied, .. } => CycleOutcome::DispatchFailed(applied),
    }
}

/// Sends the planned duty cycle unless it matches the last applied one.
/// Disable-auto failures are reported but do not stop the set-duty step.
pub async fn dispatch<G: FanGateway>(
    gateway: &G,
    engine: &mut FanEngine,
    plan: &SpeedPlan,
) -> DispatchReport {
    let percent = match plan.decision {
        DispatchDecision::Skip { percent } => {
            debug!("fan speed unchanged at {percent}%, skipping dispatch");
            return DispatchReport {
                dispatched: false,
                applied: percent,
                success: true,
            };
        }
        DispatchDecision::Dispatch {
            percent,
            corrected_from,
        } => {
            if let Some(raw) = corrected_from {
                let bounds = engine.policy().bounds;
                debug!(
                    "corrected fan duty {raw}% -> {percent}% (bounds {}-{}%)",
                    bounds.min, bounds.max
                );
            }
            percent
        }
    };

    let mut success = false;
    for action in plan.actions() {
        match action {
            FanAction::DisableAuto => {
                let output = gateway.set_auto_mode(false).await;
                if !output.success() {
                    warn!("failed to disable automatic fan control: {}", output.detail());
                }
            }
            FanAction::SetDuty(duty) => {
                let output = gateway.set_duty_cycle(duty).await;
                success = output.success();
                if success {
                    info!("fan speed set to {duty}% (0x{duty:02x})");
                } else {
                    warn!("failed to set fan speed to {duty}%: {}", output.detail());
                }
            }
        }
    }

    engine.record_dispatch(percent, success);

    DispatchReport {
        dispatched: true,
        applied: percent,
        success,
    }
}
