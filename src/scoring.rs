use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::roster::{Player, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringToggles {
    pub consider_playtime: bool,
    pub consider_performance: bool,
}

/// Weighted parts of a ranking score. `total` is their plain sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub playtime: Option<f64>,
    pub performance: Option<f64>,
    pub position: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredPlayer<'a> {
    pub player: &'a Player,
    pub score: ScoreBreakdown,
}

pub fn position_bonus(position: Option<Position>) -> f64 {
    match position {
        Some(Position::Goalkeeper) => 2.0,
        Some(Position::Defender) => 1.5,
        Some(Position::Forward) => 1.2,
        Some(Position::Midfielder) => 1.0,
        None => 0.5,
    }
}

/// Inverse playtime: 10 for a player who sat out the window, 0 for one who
/// averaged a full match.
pub fn playtime_score(player: &Player, reference: DateTime<Utc>, cfg: &PlannerConfig) -> f64 {
    let minutes: Vec<u32> = player
        .recent_stats(reference, cfg.playtime_window_days)
        .map(|r| r.minutes)
        .collect();
    let avg = if minutes.is_empty() {
        0.0
    } else {
        minutes.iter().map(|&m| m as f64).sum::<f64>() / minutes.len() as f64
    };
    (90.0 - avg) / 90.0 * 10.0
}

/// Goal contributions per 90 minutes over the performance window.
pub fn performance_score(player: &Player, reference: DateTime<Utc>, cfg: &PlannerConfig) -> f64 {
    let mut goals = 0u64;
    let mut assists = 0u64;
    let mut minutes = 0u64;
    let mut records = 0usize;
    for rec in player.recent_stats(reference, cfg.performance_window_days) {
        goals += u64::from(rec.goals);
        assists += u64::from(rec.assists);
        minutes += u64::from(rec.minutes);
        records += 1;
    }
    if records == 0 {
        return cfg.neutral_performance;
    }
    if minutes == 0 {
        return 0.0;
    }
    (goals as f64 * 3.0 + assists as f64 * 2.0) * 90.0 / minutes as f64
}

pub fn score_player(
    player: &Player,
    toggles: ScoringToggles,
    reference: DateTime<Utc>,
    cfg: &PlannerConfig,
) -> ScoreBreakdown {
    let base = cfg.base_score;
    let playtime = toggles
        .consider_playtime
        .then(|| playtime_score(player, reference, cfg) * cfg.playtime_weight);
    let performance = toggles
        .consider_performance
        .then(|| performance_score(player, reference, cfg) * cfg.performance_weight);
    let position = position_bonus(player.position) * cfg.position_weight;
    let total = base + playtime.unwrap_or(0.0) + performance.unwrap_or(0.0) + position;
    ScoreBreakdown {
        base,
        playtime,
        performance,
        position,
        total,
    }
}

/// Eligible players, best first. Ties go to name (case-insensitive), then
/// jersey number, then id, so the order never depends on roster order.
pub fn rank_players<'a>(
    roster: &'a [Player],
    toggles: ScoringToggles,
    reference: DateTime<Utc>,
    cfg: &PlannerConfig,
) -> Vec<ScoredPlayer<'a>> {
    let mut ranked: Vec<ScoredPlayer<'a>> = roster
        .iter()
        .filter(|p| p.is_eligible())
        .map(|player| ScoredPlayer {
            player,
            score: score_player(player, toggles, reference, cfg),
        })
        .collect();
    ranked.sort_by(compare_ranked);
    for sp in &ranked {
        tracing::trace!(player = %sp.player.name, score = sp.score.total, "ranked");
    }
    ranked
}

fn compare_ranked(a: &ScoredPlayer<'_>, b: &ScoredPlayer<'_>) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| a.player.name.to_lowercase().cmp(&b.player.name.to_lowercase()))
        .then_with(|| a.player.number.cmp(&b.player.number))
        .then_with(|| a.player.id.cmp(&b.player.id))
}
