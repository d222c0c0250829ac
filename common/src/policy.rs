use serde::{Deserialize, Serialize};

/// One step of the temperature/speed table: at or above `min_temp`, run the
/// fans at `percent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRule {
    pub min_temp: f32,
    pub percent: i32,
}

impl SpeedRule {
    pub const fn new(min_temp: f32, percent: i32) -> Self {
        Self { min_temp, percent }
    }
}

/// Highest bound first, closed by a catch-all below any real reading.
pub const DEFAULT_SPEED_RULES: [SpeedRule; 7] = [
    SpeedRule::new(70.0, 40),
    SpeedRule::new(65.0, 35),
    SpeedRule::new(60.0, 30),
    SpeedRule::new(50.0, 24),
    SpeedRule::new(40.0, 20),
    SpeedRule::new(30.0, 15),
    SpeedRule::new(-273.0, 5),
];

/// Returns the percent of the first rule whose bound does not exceed `temp`.
///
/// Rules are taken in the order given. When nothing matches, the last rule
/// acts as the fallback; an empty table yields 0, which config validation
/// rules out.
pub fn select_base_speed(temp: f32, rules: &[SpeedRule]) -> i32 {
    rules
        .iter()
        .find(|rule| temp >= rule.min_temp)
        .or_else(|| rules.last())
        .map(|rule| rule.percent)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<SpeedRule> {
        vec![
            SpeedRule::new(70.0, 40),
            SpeedRule::new(60.0, 30),
            SpeedRule::new(40.0, 20),
            SpeedRule::new(30.0, 15),
            SpeedRule::new(-273.0, 5),
        ]
    }

    #[test]
    fn picks_first_matching_threshold() {
        let rules = rules();
        assert_eq!(select_base_speed(65.0, &rules), 30);
        assert_eq!(select_base_speed(25.0, &rules), 5);
        assert_eq!(select_base_speed(70.0, &rules), 40);
        assert_eq!(select_base_speed(69.9, &rules), 30);
        assert_eq!(select_base_speed(120.0, &rules), 40);
    }

    #[test]
    fn falls_back_to_last_rule() {
        let rules = [SpeedRule::new(50.0, 60), SpeedRule::new(20.0, 10)];
        assert_eq!(select_base_speed(5.0, &rules), 10);
    }

    #[test]
    fn trusts_given_order() {
        // Ascending order means the lowest bound always wins.
        let rules = [SpeedRule::new(-273.0, 5), SpeedRule::new(70.0, 40)];
        assert_eq!(select_base_speed(90.0, &rules), 5);
    }

    #[test]
    fn default_table_matches_expected_steps() {
        assert_eq!(select_base_speed(71.0, &DEFAULT_SPEED_RULES), 40);
        assert_eq!(select_base_speed(66.0, &DEFAULT_SPEED_RULES), 35);
        assert_eq!(select_base_speed(55.0, &DEFAULT_SPEED_RULES), 24);
        assert_eq!(select_base_speed(-20.0, &DEFAULT_SPEED_RULES), 5);
    }
}
