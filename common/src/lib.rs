pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod policy;
pub mod protocol;
pub mod schedule;
pub mod sensors;

pub use config::{ControlPolicy, IpmiConfig, LoggingConfig, NightLimitConfig, RuntimeConfig};
pub use dispatch::{DispatchDecision, DispatchState, DutyBounds};
pub use engine::{FanAction, FanEngine, SpeedPlan};
pub use error::ConfigError;
pub use policy::{select_base_speed, SpeedRule, DEFAULT_SPEED_RULES};
pub use protocol::RawCommand;
pub use schedule::{parse_hhmm, NightCap, NightLimit, TimeWindow};
pub use sensors::parse_temperatures;
