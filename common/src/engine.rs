use chrono::NaiveTime;

use crate::{
    config::ControlPolicy,
    dispatch::{DispatchDecision, DispatchState},
    policy::select_base_speed,
    schedule::NightCap,
};

/// Hardware steps for one dispatch, executed in order by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAction {
    DisableAuto,
    SetDuty(u8),
}

/// Everything decided for one cycle from a set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedPlan {
    pub max_temp: f32,
    pub base_percent: i32,
    pub night: NightCap,
    pub decision: DispatchDecision,
}

impl SpeedPlan {
    pub fn target_percent(&self) -> u8 {
        match self.decision {
            DispatchDecision::Skip { percent } | DispatchDecision::Dispatch { percent, .. } => {
                percent
            }
        }
    }

    pub fn actions(&self) -> Vec<FanAction> {
        match self.decision {
            DispatchDecision::Skip { .. } => Vec::new(),
            DispatchDecision::Dispatch { percent, .. } => {
                vec![FanAction::DisableAuto, FanAction::SetDuty(percent)]
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FanEngine {
    policy: ControlPolicy,
    state: DispatchState,
}

impl FanEngine {
    pub fn new(policy: ControlPolicy) -> Self {
        Self {
            policy,
            state: DispatchState::new(),
        }
    }

    pub fn policy(&self) -> &ControlPolicy {
        &self.policy
    }

    pub fn last_applied(&self) -> Option<u8> {
        self.state.last_applied()
    }

    /// Plans the cycle for `temps` read at local time `now`. Returns `None`
    /// when there are no readings, in which case the fans are left alone.
    pub fn plan(&self, temps: &[f32], now: NaiveTime) -> Option<SpeedPlan> {
        let max_temp = temps.iter().copied().reduce(f32::max)?;
        let base_percent = select_base_speed(max_temp, &self.policy.rules);
        let night = self.policy.night.apply(base_percent, now);
        let decision = self.state.decide(night.percent(), self.policy.bounds);

        Some(SpeedPlan {
            max_temp,
            base_percent,
            night,
            decision,
        })
    }

    pub fn record_dispatch(&mut self, percent: u8, success: bool) {
        self.state.record(percent, success);
    }
}
