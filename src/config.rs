use std::env;
use std::str::FromStr;

/// Tunables for scoring and match rules. `Default` carries the stock values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    pub base_score: f64,
    pub playtime_window_days: i64,
    pub performance_window_days: i64,
    pub playtime_weight: f64,
    pub performance_weight: f64,
    pub position_weight: f64,
    // Performance sub-score for a player with no records inside the window.
    pub neutral_performance: f64,
    pub match_minutes: u32,
    pub max_substitutions: u32,
    pub min_players_on_field: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_score: 10.0,
            playtime_window_days: 14,
            performance_window_days: 30,
            playtime_weight: 0.6,
            performance_weight: 0.4,
            position_weight: 0.2,
            neutral_performance: 5.0,
            match_minutes: 90,
            max_substitutions: 5,
            min_players_on_field: 7,
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_score: d.base_score,
            playtime_window_days: env_parse("SQUAD_PLAYTIME_WINDOW_DAYS")
                .unwrap_or(d.playtime_window_days)
                .clamp(1, 365),
            performance_window_days: env_parse("SQUAD_PERFORMANCE_WINDOW_DAYS")
                .unwrap_or(d.performance_window_days)
                .clamp(1, 365),
            playtime_weight: env_parse("SQUAD_PLAYTIME_WEIGHT")
                .unwrap_or(d.playtime_weight)
                .max(0.0),
            performance_weight: env_parse("SQUAD_PERFORMANCE_WEIGHT")
                .unwrap_or(d.performance_weight)
                .max(0.0),
            position_weight: env_parse("SQUAD_POSITION_WEIGHT")
                .unwrap_or(d.position_weight)
                .max(0.0),
            neutral_performance: d.neutral_performance,
            match_minutes: env_parse("SQUAD_MATCH_MINUTES")
                .unwrap_or(d.match_minutes)
                .clamp(20, 120),
            max_substitutions: env_parse("SQUAD_MAX_SUBSTITUTIONS")
                .unwrap_or(d.max_substitutions)
                .min(11),
            min_players_on_field: d.min_players_on_field,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_weights() {
        let cfg = PlannerConfig::default();
        assert_eq!(cfg.playtime_window_days, 14);
        assert_eq!(cfg.performance_window_days, 30);
        assert_eq!(cfg.playtime_weight, 0.6);
        assert_eq!(cfg.performance_weight, 0.4);
        assert_eq!(cfg.position_weight, 0.2);
        assert_eq!(cfg.max_substitutions, 5);
    }
}
