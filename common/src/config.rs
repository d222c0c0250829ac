use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    dispatch::DutyBounds,
    error::ConfigError,
    policy::{SpeedRule, DEFAULT_SPEED_RULES},
    schedule::{NightLimit, TimeWindow},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IpmiConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub interface: String,
    pub ipmitool_cmd: String,
    pub command_timeout_secs: u64,
}

impl Default for IpmiConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.100".to_string(),
            user: "ADMIN".to_string(),
            password: "PASSWORD".to_string(),
            interface: "lanplus".to_string(),
            ipmitool_cmd: "ipmitool".to_string(),
            command_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NightLimitConfig {
    pub enabled: bool,
    pub start: String,
    pub end: String,
    pub max_percent: i32,
}

impl Default for NightLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start: "23:00".to_string(),
            end: "07:30".to_string(),
            max_percent: 25,
        }
    }
}

impl NightLimitConfig {
    pub fn validate(&self) -> Result<NightLimit, ConfigError> {
        let window = TimeWindow::parse(&self.start, &self.end)?;
        if !(0..=100).contains(&self.max_percent) {
            return Err(ConfigError::InvalidNightLimit(self.max_percent));
        }

        Ok(NightLimit {
            enabled: self.enabled,
            window,
            max_percent: self.max_percent,
        })
    }
}

/// Daily rotating log file alongside stdout. `dir: null` turns it off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<String>,
    pub file_name: String,
    pub retention_days: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: Some("logs".to_string()),
            file_name: "ipmi-fan.log".to_string(),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub ipmi: IpmiConfig,
    pub interval_secs: u64,
    pub rules: Vec<SpeedRule>,
    pub min_percent: u8,
    pub max_percent: u8,
    pub night_limit: NightLimitConfig,
    pub restore_auto_on_exit: bool,
    pub logging: LoggingConfig,
    /// IANA zone for the night window; host local time when unset.
    pub timezone: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ipmi: IpmiConfig::default(),
            interval_secs: 30,
            rules: DEFAULT_SPEED_RULES.to_vec(),
            min_percent: 0,
            max_percent: 100,
            night_limit: NightLimitConfig::default(),
            restore_auto_on_exit: false,
            logging: LoggingConfig::default(),
            timezone: None,
        }
    }
}

/// Validated, immutable control settings for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPolicy {
    pub rules: Vec<SpeedRule>,
    pub bounds: DutyBounds,
    pub night: NightLimit,
    pub interval: Duration,
    pub command_timeout: Duration,
    pub restore_auto_on_exit: bool,
}

impl RuntimeConfig {
    pub fn from_json_slice(raw: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn validate(&self) -> Result<ControlPolicy, ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyRules);
        }
        if let Some(index) = self.rules.iter().position(|rule| !rule.min_temp.is_finite()) {
            return Err(ConfigError::InvalidRule { index });
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("interval_secs"));
        }
        if self.ipmi.command_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("command_timeout_secs"));
        }
        if self.logging.retention_days == 0 {
            return Err(ConfigError::ZeroDuration("logging.retention_days"));
        }

        Ok(ControlPolicy {
            rules: self.rules.clone(),
            bounds: DutyBounds::new(self.min_percent, self.max_percent)?,
            night: self.night_limit.validate()?,
            interval: Duration::from_secs(self.interval_secs),
            command_timeout: Duration::from_secs(self.ipmi.command_timeout_secs),
            restore_auto_on_exit: self.restore_auto_on_exit,
        })
    }
}
