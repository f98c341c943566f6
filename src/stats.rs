use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::formation::ParseError;
use crate::roster::{MatchStatRecord, Player, PlayerId, Position, Team};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardMetric {
    Goals,
    Assists,
    Minutes,
    ContributionsPer90,
}

impl FromStr for LeaderboardMetric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "goals" => Ok(LeaderboardMetric::Goals),
            "assists" => Ok(LeaderboardMetric::Assists),
            "minutes" => Ok(LeaderboardMetric::Minutes),
            "per90" | "contributions" | "contributionsper90" => Ok(LeaderboardMetric::ContributionsPer90),
            _ => Err(ParseError::Metric(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeasonSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub number: u8,
    pub position: Option<Position>,
    pub injured: bool,
    pub appearances: u32,
    pub minutes: u64,
    pub goals: u64,
    pub assists: u64,
    pub yellow_cards: u64,
    pub red_cards: u32,
    pub goal_contributions_per_90: f64,
}

impl PlayerSeasonSummary {
    fn metric(&self, metric: LeaderboardMetric) -> f64 {
        match metric {
            LeaderboardMetric::Goals => self.goals as f64,
            LeaderboardMetric::Assists => self.assists as f64,
            LeaderboardMetric::Minutes => self.minutes as f64,
            LeaderboardMetric::ContributionsPer90 => self.goal_contributions_per_90,
        }
    }
}

pub fn summarize(player: &Player, range: DateRange) -> PlayerSeasonSummary {
    let records: Vec<&MatchStatRecord> = player
        .stats
        .iter()
        .filter(|r| range.contains(r.played_at))
        .collect();

    let minutes: u64 = records.iter().map(|r| u64::from(r.minutes)).sum();
    let goals: u64 = records.iter().map(|r| u64::from(r.goals)).sum();
    let assists: u64 = records.iter().map(|r| u64::from(r.assists)).sum();
    let per90 = if minutes == 0 {
        0.0
    } else {
        (goals + assists) as f64 * 90.0 / minutes as f64
    };

    PlayerSeasonSummary {
        player_id: player.id,
        name: player.name.clone(),
        number: player.number,
        position: player.position,
        injured: player.injured,
        appearances: records.iter().filter(|r| r.minutes > 0).count() as u32,
        minutes,
        goals,
        assists,
        yellow_cards: records.iter().map(|r| u64::from(r.yellow_cards)).sum(),
        red_cards: records.iter().filter(|r| r.red_card).count() as u32,
        goal_contributions_per_90: per90,
    }
}

/// Whole squad, injured players included, best first; ties by name.
pub fn team_leaderboard(team: &Team, metric: LeaderboardMetric, range: DateRange) -> Vec<PlayerSeasonSummary> {
    let mut rows: Vec<PlayerSeasonSummary> = team.players.iter().map(|p| summarize(p, range)).collect();
    rows.sort_by(|a, b| {
        b.metric(metric)
            .total_cmp(&a.metric(metric))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamTotals {
    pub matches: usize,
    pub goals: u64,
    pub assists: u64,
    pub minutes: u64,
}

pub fn team_totals(team: &Team, range: DateRange) -> TeamTotals {
    let mut match_ids: Vec<&str> = Vec::new();
    let mut totals = TeamTotals::default();
    for rec in team.players.iter().flat_map(|p| p.stats.iter()) {
        if !range.contains(rec.played_at) {
            continue;
        }
        if !match_ids.contains(&rec.match_id.as_str()) {
            match_ids.push(&rec.match_id);
        }
        totals.goals += u64::from(rec.goals);
        totals.assists += u64::from(rec.assists);
        totals.minutes += u64::from(rec.minutes);
    }
    totals.matches = match_ids.len();
    totals
}
