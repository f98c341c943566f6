use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::formation::{Formation, PitchPoint, Slot};
use crate::roster::{Club, Player, PlayerId, Position};
use crate::scoring::{ScoredPlayer, ScoringToggles, rank_players};

pub const MIN_PLAYERS_ON_FIELD: usize = 7;
pub const MAX_PLAYERS_ON_FIELD: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineupRequest {
    pub formation: Formation,
    pub players_on_field: usize,
    pub toggles: ScoringToggles,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupAssignment {
    pub player: Player,
    /// Category of the slot, which differs from the player's own tag when the
    /// slot was filled from leftovers.
    pub position: Position,
    pub point: PitchPoint,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineupWarning {
    InsufficientPlayers { needed: usize, available: usize },
    NoGoalkeeper,
    UntaggedPlayers { count: usize },
    NoRecentStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupSuggestion {
    pub formation: Formation,
    pub players_on_field: usize,
    pub lineup: Vec<LineupAssignment>,
    pub bench: Vec<Player>,
    pub reasoning: String,
    pub balance_score: f64,
    pub warnings: Vec<LineupWarning>,
}

impl LineupSuggestion {
    pub fn count_tagged(&self, position: Position) -> usize {
        self.lineup
            .iter()
            .filter(|a| a.player.position == Some(position))
            .count()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.lineup.iter().any(|a| a.player.id == id) || self.bench.iter().any(|p| p.id == id)
    }
}

/// Stateless apart from its configuration; build one and share it by reference.
#[derive(Debug, Clone, Default)]
pub struct LineupPlanner {
    cfg: PlannerConfig,
}

impl LineupPlanner {
    pub fn new(cfg: PlannerConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.cfg
    }

    pub fn generate(
        &self,
        roster: &[Player],
        request: &LineupRequest,
        reference: DateTime<Utc>,
    ) -> LineupSuggestion {
        let on_field = request
            .players_on_field
            .clamp(MIN_PLAYERS_ON_FIELD, MAX_PLAYERS_ON_FIELD);
        if on_field != request.players_on_field {
            tracing::warn!(
                requested = request.players_on_field,
                using = on_field,
                "players on field out of range, clamped"
            );
        }

        let ranked = rank_players(roster, request.toggles, reference, &self.cfg);
        let mut warnings = data_warnings(&ranked, request.toggles, reference, &self.cfg);

        if ranked.len() < on_field {
            tracing::info!(
                needed = on_field,
                available = ranked.len(),
                "not enough eligible players for a lineup"
            );
            warnings.insert(
                0,
                LineupWarning::InsufficientPlayers {
                    needed: on_field,
                    available: ranked.len(),
                },
            );
            return LineupSuggestion {
                formation: request.formation,
                players_on_field: on_field,
                lineup: Vec::new(),
                bench: ranked.iter().map(|sp| sp.player.clone()).collect(),
                reasoning: format!(
                    "Not enough available players: need {on_field}, have {}.",
                    ranked.len()
                ),
                balance_score: 0.0,
                warnings,
            };
        }

        let picks = assign_slots(&ranked, request.formation, on_field);
        let picked: HashSet<PlayerId> = picks.iter().map(|(sp, _)| sp.player.id).collect();

        let lineup: Vec<LineupAssignment> = picks
            .iter()
            .map(|(sp, slot)| LineupAssignment {
                player: sp.player.clone(),
                position: slot.position,
                point: slot.point,
                score: sp.score.total,
            })
            .collect();
        let bench: Vec<Player> = ranked
            .iter()
            .filter(|sp| !picked.contains(&sp.player.id))
            .map(|sp| sp.player.clone())
            .collect();

        let starters: Vec<&Player> = picks.iter().map(|(sp, _)| sp.player).collect();
        let balance_score = balance_score(&starters, reference, &self.cfg);
        if !starters.iter().any(|p| p.position == Some(Position::Goalkeeper)) {
            warnings.insert(0, LineupWarning::NoGoalkeeper);
        }

        let mut suggestion = LineupSuggestion {
            formation: request.formation,
            players_on_field: on_field,
            lineup,
            bench,
            reasoning: String::new(),
            balance_score,
            warnings,
        };
        suggestion.reasoning = reasoning(&suggestion, &picks, request.toggles);
        tracing::debug!(
            formation = %suggestion.formation,
            starters = suggestion.lineup.len(),
            bench = suggestion.bench.len(),
            balance = suggestion.balance_score,
            "lineup generated"
        );
        suggestion
    }

    /// Plans every team of a club independently; results keep club order.
    pub fn plan_club(
        &self,
        club: &Club,
        request: &LineupRequest,
        reference: DateTime<Utc>,
    ) -> Vec<(String, LineupSuggestion)> {
        club.teams
            .par_iter()
            .map(|team| (team.name.clone(), self.generate(&team.players, request, reference)))
            .collect()
    }
}

/// Convenience wrapper over a default-configured planner.
pub fn generate_lineup(
    roster: &[Player],
    formation: Formation,
    players_on_field: usize,
    consider_playtime: bool,
    consider_performance: bool,
    reference: DateTime<Utc>,
) -> LineupSuggestion {
    let request = LineupRequest {
        formation,
        players_on_field,
        toggles: ScoringToggles {
            consider_playtime,
            consider_performance,
        },
    };
    LineupPlanner::default().generate(roster, &request, reference)
}

// Greedy, single pass: keeper, then each outfield line in ranking order, then
// leftovers into whatever slots are still open.
fn assign_slots<'a>(
    ranked: &[ScoredPlayer<'a>],
    formation: Formation,
    on_field: usize,
) -> Vec<(ScoredPlayer<'a>, Slot)> {
    let slots: Vec<Slot> = formation.slots().collect();
    let mut occupied = vec![false; slots.len()];
    let mut used: HashSet<PlayerId> = HashSet::new();
    let mut picks: Vec<(ScoredPlayer<'a>, Slot)> = Vec::with_capacity(on_field);

    for position in Position::ALL {
        let open: Vec<usize> = (0..slots.len())
            .filter(|&i| slots[i].position == position && !occupied[i])
            .collect();
        let candidates = ranked
            .iter()
            .filter(|sp| sp.player.position == Some(position) && !used.contains(&sp.player.id));
        // Only one keeper is ever taken by tag.
        let take = if position == Position::Goalkeeper { 1 } else { open.len() };
        let mut placed = Vec::new();
        for (&slot_idx, sp) in open.iter().take(take).zip(candidates) {
            if picks.len() + placed.len() >= on_field {
                break;
            }
            placed.push((slot_idx, *sp));
        }
        for (slot_idx, sp) in placed {
            occupied[slot_idx] = true;
            used.insert(sp.player.id);
            picks.push((sp, slots[slot_idx]));
        }
    }

    for sp in ranked {
        if picks.len() >= on_field {
            break;
        }
        if used.contains(&sp.player.id) {
            continue;
        }
        let slot = match occupied.iter().position(|taken| !taken) {
            Some(idx) => {
                occupied[idx] = true;
                slots[idx]
            }
            None => Slot {
                position: Position::Midfielder,
                point: PitchPoint::CENTER,
            },
        };
        used.insert(sp.player.id);
        picks.push((*sp, slot));
    }

    picks
}

/// 0-10 quality of a starting set: positional minimums by each starter's own
/// tag, minus the spread of recent minutes.
pub fn balance_score(starters: &[&Player], reference: DateTime<Utc>, cfg: &PlannerConfig) -> f64 {
    let count = |position: Position| starters.iter().filter(|p| p.position == Some(position)).count();

    let mut score = 10.0;
    if count(Position::Goalkeeper) == 0 {
        score -= 3.0;
    }
    if count(Position::Defender) < 2 {
        score -= 2.0;
    }
    if count(Position::Midfielder) < 2 {
        score -= 1.0;
    }
    if count(Position::Forward) < 1 {
        score -= 1.0;
    }

    if !starters.is_empty() {
        let minutes: Vec<f64> = starters
            .iter()
            .map(|p| p.recent_minutes(reference, cfg.playtime_window_days) as f64)
            .collect();
        score -= population_variance(&minutes) / 100.0;
    }

    score.clamp(0.0, 10.0)
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

fn data_warnings(
    ranked: &[ScoredPlayer<'_>],
    toggles: ScoringToggles,
    reference: DateTime<Utc>,
    cfg: &PlannerConfig,
) -> Vec<LineupWarning> {
    let mut out = Vec::new();
    let untagged = ranked.iter().filter(|sp| sp.player.position.is_none()).count();
    if untagged > 0 {
        out.push(LineupWarning::UntaggedPlayers { count: untagged });
    }
    let uses_history = toggles.consider_playtime || toggles.consider_performance;
    let window = cfg.playtime_window_days.max(cfg.performance_window_days);
    let any_recent = ranked
        .iter()
        .any(|sp| sp.player.recent_stats(reference, window).next().is_some());
    if uses_history && !ranked.is_empty() && !any_recent {
        out.push(LineupWarning::NoRecentStats);
    }
    out
}

fn reasoning(
    suggestion: &LineupSuggestion,
    picks: &[(ScoredPlayer<'_>, Slot)],
    toggles: ScoringToggles,
) -> String {
    let mut text = format!(
        "{} with {} starters ({} GK, {} DEF, {} MID, {} FWD).",
        suggestion.formation,
        suggestion.lineup.len(),
        suggestion.count_tagged(Position::Goalkeeper),
        suggestion.count_tagged(Position::Defender),
        suggestion.count_tagged(Position::Midfielder),
        suggestion.count_tagged(Position::Forward),
    );

    let mut basis = vec!["availability", "position"];
    if toggles.consider_playtime {
        basis.push("fair playtime over recent matches");
    }
    if toggles.consider_performance {
        basis.push("recent goals and assists");
    }
    let _ = write!(text, " Ranked by {}.", basis.join(", "));

    if let Some((top, _)) = picks.iter().max_by(|a, b| a.0.score.total.total_cmp(&b.0.score.total)) {
        let _ = write!(text, " Top pick: {} ({:.1}).", top.player.name, top.score.total);
    }

    let covering: Vec<&str> = picks
        .iter()
        .filter(|(sp, slot)| sp.player.position != Some(slot.position))
        .map(|(sp, _)| sp.player.name.as_str())
        .collect();
    if !covering.is_empty() {
        let _ = write!(text, " Out of position: {}.", covering.join(", "));
    }

    match suggestion.bench.len() {
        0 => text.push_str(" No substitutes available."),
        1 => text.push_str(" 1 player on the bench."),
        n => {
            let _ = write!(text, " {n} players on the bench.");
        }
    }

    for warning in &suggestion.warnings {
        match warning {
            LineupWarning::NoGoalkeeper => text.push_str(" Warning: no natural goalkeeper available."),
            LineupWarning::UntaggedPlayers { count } => {
                let _ = write!(text, " Note: {count} player(s) have no position tag.");
            }
            LineupWarning::NoRecentStats => text.push_str(" Note: no recent match statistics recorded."),
            LineupWarning::InsufficientPlayers { .. } => {}
        }
    }
    if suggestion.count_tagged(Position::Defender) < 2 {
        text.push_str(" Warning: thin defence.");
    }
    text
}
