use std::fmt;

use chrono::{NaiveTime, Timelike};

use crate::error::ConfigError;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Parses `HH:MM` into minutes after midnight.
pub fn parse_hhmm(value: &str) -> Result<u16, ConfigError> {
    let invalid = || ConfigError::InvalidTime(value.to_string());

    let (hour, minute) = value.split_once(':').ok_or_else(invalid)?;
    let hour: u16 = hour.trim().parse().map_err(|_| invalid())?;
    let minute: u16 = minute.trim().parse().map_err(|_| invalid())?;

    if hour >= 24 || minute >= 60 {
        return Err(invalid());
    }

    Ok(hour * 60 + minute)
}

pub fn minute_of_day(now: NaiveTime) -> u16 {
    (now.hour() * 60 + now.minute()) as u16
}

/// Half-open `[start, end)` range of minutes that may wrap past midnight.
/// `start == end` covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u16,
    pub end: u16,
}

impl TimeWindow {
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            start: start % MINUTES_PER_DAY,
            end: end % MINUTES_PER_DAY,
        }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_hhmm(start)?, parse_hhmm(end)?))
    }

    pub fn contains_minute(&self, minute: u16) -> bool {
        if self.start == self.end {
            return true;
        }

        if self.start < self.end {
            self.start <= minute && minute < self.end
        } else {
            minute >= self.start || minute < self.end
        }
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        self.contains_minute(minute_of_day(now))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NightLimit {
    pub enabled: bool,
    pub window: TimeWindow,
    pub max_percent: i32,
}

/// Result of running a base speed through the night limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightCap {
    /// Limit disabled or outside the window.
    Inactive(i32),
    /// Inside the window but the base speed is already at or below the cap.
    WithinLimit(i32),
    /// Lowered from `from` to `to`.
    Capped { from: i32, to: i32 },
}

impl NightCap {
    pub fn percent(self) -> i32 {
        match self {
            Self::Inactive(percent) | Self::WithinLimit(percent) => percent,
            Self::Capped { to, .. } => to,
        }
    }
}

impl NightLimit {
    pub fn is_active(&self, now: NaiveTime) -> bool {
        self.enabled && self.window.contains(now)
    }

    /// Caps `base` at `max_percent` inside the window. Never raises it.
    pub fn apply(&self, base: i32, now: NaiveTime) -> NightCap {
        if !self.is_active(now) {
            return NightCap::Inactive(base);
        }

        if base > self.max_percent {
            NightCap::Capped {
                from: base,
                to: self.max_percent,
            }
        } else {
            NightCap::WithinLimit(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn night() -> NightLimit {
        NightLimit {
            enabled: true,
            window: TimeWindow::parse("23:00", "07:30").unwrap(),
            max_percent: 25,
        }
    }

    #[test]
    fn parses_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Ok(0));
        assert_eq!(parse_hhmm("07:30"), Ok(450));
        assert_eq!(parse_hhmm("7:05"), Ok(425));
        assert_eq!(parse_hhmm("23:59"), Ok(1439));
    }

    #[test]
    fn rejects_malformed_hhmm() {
        for value in ["", "2300", "23:00:00", "ab:cd", "23:", ":30", "24:00", "12:60", "-1:30"] {
            assert_eq!(
                parse_hhmm(value),
                Err(ConfigError::InvalidTime(value.to_string())),
                "{value:?}"
            );
        }
    }

    #[test]
    fn wrapping_window_boundaries() {
        let window = TimeWindow::parse("23:00", "07:30").unwrap();
        assert!(window.contains(at(23, 0)));
        assert!(window.contains(at(0, 0)));
        assert!(window.contains(at(7, 29)));
        assert!(!window.contains(at(7, 30)));
        assert!(!window.contains(at(12, 0)));
        assert!(!window.contains(at(22, 59)));
    }

    #[test]
    fn same_day_window_is_half_open() {
        let window = TimeWindow::parse("09:00", "17:00").unwrap();
        assert!(!window.contains(at(8, 59)));
        assert!(window.contains(at(9, 0)));
        assert!(window.contains(at(16, 59)));
        assert!(!window.contains(at(17, 0)));
    }

    #[test]
    fn degenerate_window_is_always_active() {
        let window = TimeWindow::parse("10:00", "10:00").unwrap();
        assert!((0..MINUTES_PER_DAY).all(|minute| window.contains_minute(minute)));
    }

    #[test]
    fn window_displays_as_hhmm_range() {
        let window = TimeWindow::parse("23:00", "07:30").unwrap();
        assert_eq!(window.to_string(), "23:00-07:30");
    }

    #[test]
    fn caps_inside_window() {
        assert_eq!(
            night().apply(40, at(23, 30)),
            NightCap::Capped { from: 40, to: 25 }
        );
        assert_eq!(night().apply(20, at(23, 30)), NightCap::WithinLimit(20));
        assert_eq!(night().apply(40, at(14, 0)), NightCap::Inactive(40));
    }

    #[test]
    fn disabled_limit_passes_through() {
        let limit = NightLimit {
            enabled: false,
            ..night()
        };
        assert_eq!(limit.apply(90, at(2, 0)), NightCap::Inactive(90));
    }

    #[test]
    fn cap_never_raises_speed() {
        let times = [at(1, 0), at(7, 30), at(12, 0), at(23, 0)];
        for cap in [0, 25, 50, 100] {
            let limit = NightLimit {
                max_percent: cap,
                ..night()
            };
            for base in -10..=110 {
                for now in times {
                    let result = limit.apply(base, now).percent();
                    assert!(result <= base);
                    if limit.is_active(now) {
                        assert_eq!(result, base.min(cap));
                    } else {
                        assert_eq!(result, base);
                    }
                }
            }
        }
    }
}
