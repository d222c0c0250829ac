//! Clamping and change detection for duty cycle writes.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Inclusive clamp range applied to every candidate before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyBounds {
    pub min: u8,
    pub max: u8,
}

impl Default for DutyBounds {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

impl DutyBounds {
    pub fn new(min: u8, max: u8) -> Result<Self, ConfigError> {
        if min > max || max > 100 {
            return Err(ConfigError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn clamp(&self, candidate: i32) -> Clamped {
        let min = i32::from(self.min.min(100));
        let max = i32::from(self.max.min(100)).max(min);
        let value = candidate.clamp(min, max);
        Clamped {
            value: value as u8,
            corrected: value != candidate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    pub value: u8,
    pub corrected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchDecision {
    /// Same as the last applied duty cycle; nothing to send.
    Skip { percent: u8 },
    /// Send `percent`. `corrected_from` holds the raw candidate if clamping
    /// changed it.
    Dispatch {
        percent: u8,
        corrected_from: Option<i32>,
    },
}

/// Last duty cycle the fans were successfully commanded to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    last_applied: Option<u8>,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u8> {
        self.last_applied
    }

    pub fn decide(&self, candidate: i32, bounds: DutyBounds) -> DispatchDecision {
        let clamped = bounds.clamp(candidate);

        if self.last_applied == Some(clamped.value) {
            return DispatchDecision::Skip {
                percent: clamped.value,
            };
        }

        DispatchDecision::Dispatch {
            percent: clamped.value,
            corrected_from: clamped.corrected.then_some(candidate),
        }
    }

    /// Records a dispatch attempt. Only a successful write moves
    /// `last_applied`, so a failing BMC is retried on the next cycle.
    pub fn record(&mut self, percent: u8, success: bool) {
        if success {
            self.last_applied = Some(percent);
        }
    }
}
