use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PlannerConfig;
use crate::roster::{MatchStatRecord, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    FullTime,
    Abandoned,
}

impl MatchPhase {
    pub fn in_play(self) -> bool {
        matches!(self, MatchPhase::FirstHalf | MatchPhase::SecondHalf)
    }

    pub fn is_over(self) -> bool {
        matches!(self, MatchPhase::FullTime | MatchPhase::Abandoned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRules {
    pub match_minutes: u32,
    pub max_substitutions: u32,
    pub min_players_on_field: usize,
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules::from(&PlannerConfig::default())
    }
}

impl From<&PlannerConfig> for MatchRules {
    fn from(cfg: &PlannerConfig) -> Self {
        Self {
            match_minutes: cfg.match_minutes,
            max_substitutions: cfg.max_substitutions,
            min_players_on_field: cfg.min_players_on_field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchRuleError {
    #[error("a match needs at least {min} starters, got {got}")]
    TooFewStarters { min: usize, got: usize },
    #[error("player {0} is listed more than once")]
    DuplicatePlayer(PlayerId),
    #[error("cannot {action} while the match is {phase:?}")]
    InvalidPhase {
        action: &'static str,
        phase: MatchPhase,
    },
    #[error("player {0} is not on the field")]
    NotOnField(PlayerId),
    #[error("player {0} is not available on the bench")]
    NotOnBench(PlayerId),
    #[error("player {0} is not part of this match squad")]
    UnknownPlayer(PlayerId),
    #[error("all {0} substitutions have been used")]
    SubstitutionLimit(u32),
    #[error("player {0} cannot assist their own goal")]
    SelfAssist(PlayerId),
    #[error("minute {minute} is earlier than the last event at minute {last}")]
    MinuteOutOfOrder { minute: u32, last: u32 },
}

/// One entry of a recorded match; also the on-disk replay format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    KickOff,
    EndHalf { minute: u32 },
    SecondHalf,
    Goal {
        minute: u32,
        scorer: PlayerId,
        #[serde(default)]
        assist: Option<PlayerId>,
    },
    OpponentGoal { minute: u32 },
    Yellow { minute: u32, player: PlayerId },
    Red { minute: u32, player: PlayerId },
    Substitution { minute: u32, off: PlayerId, on: PlayerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOutcome {
    Booked,
    SentOff { second_yellow: bool },
}

#[derive(Debug, Clone, Default)]
struct PlayerLine {
    entered_at: Option<u32>,
    minutes: u32,
    appeared: bool,
    goals: u32,
    assists: u32,
    yellow_cards: u32,
    red_card: bool,
}

#[derive(Debug, Clone)]
pub struct LiveMatch {
    match_id: String,
    rules: MatchRules,
    phase: MatchPhase,
    on_field: Vec<PlayerId>,
    bench: Vec<PlayerId>,
    lines: HashMap<PlayerId, PlayerLine>,
    substitutions: u32,
    goals_for: u32,
    goals_against: u32,
    last_minute: u32,
    events: Vec<MatchEvent>,
}

impl LiveMatch {
    pub fn new(
        match_id: impl Into<String>,
        starters: &[PlayerId],
        bench: &[PlayerId],
        rules: MatchRules,
    ) -> Result<Self, MatchRuleError> {
        if starters.len() < rules.min_players_on_field {
            return Err(MatchRuleError::TooFewStarters {
                min: rules.min_players_on_field,
                got: starters.len(),
            });
        }
        let mut lines = HashMap::new();
        for &id in starters.iter().chain(bench) {
            if lines.insert(id, PlayerLine::default()).is_some() {
                return Err(MatchRuleError::DuplicatePlayer(id));
            }
        }
        Ok(Self {
            match_id: match_id.into(),
            rules,
            phase: MatchPhase::NotStarted,
            on_field: starters.to_vec(),
            bench: bench.to_vec(),
            lines,
            substitutions: 0,
            goals_for: 0,
            goals_against: 0,
            last_minute: 0,
            events: Vec::new(),
        })
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn on_field(&self) -> &[PlayerId] {
        &self.on_field
    }

    pub fn bench(&self) -> &[PlayerId] {
        &self.bench
    }

    pub fn score(&self) -> (u32, u32) {
        (self.goals_for, self.goals_against)
    }

    pub fn substitutions_used(&self) -> u32 {
        self.substitutions
    }

    pub fn substitutions_left(&self) -> u32 {
        self.rules.max_substitutions.saturating_sub(self.substitutions)
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn yellow_cards(&self, id: PlayerId) -> u32 {
        self.lines.get(&id).map(|l| l.yellow_cards).unwrap_or(0)
    }

    pub fn kick_off(&mut self) -> Result<(), MatchRuleError> {
        self.require_phase("kick off", MatchPhase::NotStarted)?;
        self.phase = MatchPhase::FirstHalf;
        for &id in &self.on_field {
            if let Some(line) = self.lines.get_mut(&id) {
                line.entered_at = Some(0);
                line.appeared = true;
            }
        }
        self.events.push(MatchEvent::KickOff);
        Ok(())
    }

    pub fn end_half(&mut self, minute: u32) -> Result<(), MatchRuleError> {
        let next = match self.phase {
            MatchPhase::FirstHalf => MatchPhase::HalfTime,
            MatchPhase::SecondHalf => MatchPhase::FullTime,
            phase => {
                return Err(MatchRuleError::InvalidPhase {
                    action: "end the half",
                    phase,
                });
            }
        };
        self.advance_clock(minute)?;
        if next == MatchPhase::FullTime {
            self.close_all_stints(minute);
        }
        self.phase = next;
        self.events.push(MatchEvent::EndHalf { minute });
        Ok(())
    }

    pub fn start_second_half(&mut self) -> Result<(), MatchRuleError> {
        self.require_phase("start the second half", MatchPhase::HalfTime)?;
        // Second-half minutes restart from the regulation half, whatever stoppage time the
        // first half ran to.
        self.last_minute = self.last_minute.min(self.rules.match_minutes / 2);
        self.phase = MatchPhase::SecondHalf;
        self.events.push(MatchEvent::SecondHalf);
        Ok(())
    }

    pub fn record_goal(
        &mut self,
        minute: u32,
        scorer: PlayerId,
        assist: Option<PlayerId>,
    ) -> Result<(), MatchRuleError> {
        self.require_in_play("record a goal")?;
        self.require_on_field(scorer)?;
        if let Some(helper) = assist {
            if helper == scorer {
                return Err(MatchRuleError::SelfAssist(scorer));
            }
            self.require_on_field(helper)?;
        }
        self.advance_clock(minute)?;
        self.goals_for += 1;
        if let Some(line) = self.lines.get_mut(&scorer) {
            line.goals += 1;
        }
        if let Some(helper) = assist {
            if let Some(line) = self.lines.get_mut(&helper) {
                line.assists += 1;
            }
        }
        self.events.push(MatchEvent::Goal {
            minute,
            scorer,
            assist,
        });
        Ok(())
    }

    pub fn record_opponent_goal(&mut self, minute: u32) -> Result<(), MatchRuleError> {
        self.require_in_play("record a goal")?;
        self.advance_clock(minute)?;
        self.goals_against += 1;
        self.events.push(MatchEvent::OpponentGoal { minute });
        Ok(())
    }

    /// A second yellow becomes a red and removes the player.
    pub fn book_yellow(&mut self, minute: u32, player: PlayerId) -> Result<CardOutcome, MatchRuleError> {
        self.require_in_play("show a card")?;
        self.require_on_field(player)?;
        self.advance_clock(minute)?;
        let yellows = match self.lines.get_mut(&player) {
            Some(line) => {
                line.yellow_cards += 1;
                line.yellow_cards
            }
            None => return Err(MatchRuleError::UnknownPlayer(player)),
        };
        self.events.push(MatchEvent::Yellow { minute, player });
        if yellows >= 2 {
            tracing::debug!(match_id = %self.match_id, player, minute, "second yellow, sent off");
            self.dismiss(minute, player);
            return Ok(CardOutcome::SentOff { second_yellow: true });
        }
        Ok(CardOutcome::Booked)
    }

    pub fn send_off(&mut self, minute: u32, player: PlayerId) -> Result<CardOutcome, MatchRuleError> {
        self.require_in_play("show a card")?;
        self.require_on_field(player)?;
        self.advance_clock(minute)?;
        self.events.push(MatchEvent::Red { minute, player });
        self.dismiss(minute, player);
        Ok(CardOutcome::SentOff { second_yellow: false })
    }

    pub fn substitute(&mut self, minute: u32, off: PlayerId, on: PlayerId) -> Result<(), MatchRuleError> {
        if !matches!(
            self.phase,
            MatchPhase::FirstHalf | MatchPhase::HalfTime | MatchPhase::SecondHalf
        ) {
            return Err(MatchRuleError::InvalidPhase {
                action: "make a substitution",
                phase: self.phase,
            });
        }
        if self.substitutions >= self.rules.max_substitutions {
            return Err(MatchRuleError::SubstitutionLimit(self.rules.max_substitutions));
        }
        self.require_on_field(off)?;
        let Some(bench_idx) = self.bench.iter().position(|&id| id == on) else {
            return Err(MatchRuleError::NotOnBench(on));
        };
        self.advance_clock(minute)?;

        self.bench.remove(bench_idx);
        self.on_field.retain(|&id| id != off);
        self.on_field.push(on);
        self.close_stint(off, minute);
        if let Some(line) = self.lines.get_mut(&on) {
            line.entered_at = Some(minute.min(self.rules.match_minutes));
            line.appeared = true;
        }
        self.substitutions += 1;
        self.events.push(MatchEvent::Substitution { minute, off, on });
        Ok(())
    }

    pub fn apply(&mut self, event: &MatchEvent) -> Result<(), MatchRuleError> {
        match *event {
            MatchEvent::KickOff => self.kick_off(),
            MatchEvent::EndHalf { minute } => self.end_half(minute),
            MatchEvent::SecondHalf => self.start_second_half(),
            MatchEvent::Goal {
                minute,
                scorer,
                assist,
            } => self.record_goal(minute, scorer, assist),
            MatchEvent::OpponentGoal { minute } => self.record_opponent_goal(minute),
            MatchEvent::Yellow { minute, player } => self.book_yellow(minute, player).map(|_| ()),
            MatchEvent::Red { minute, player } => self.send_off(minute, player).map(|_| ()),
            MatchEvent::Substitution { minute, off, on } => self.substitute(minute, off, on),
        }
    }

    /// Stat records for everyone who took the field, ordered by player id.
    pub fn finalize(&self, played_at: DateTime<Utc>) -> Result<Vec<MatchStatRecord>, MatchRuleError> {
        if !self.phase.is_over() {
            return Err(MatchRuleError::InvalidPhase {
                action: "finalize",
                phase: self.phase,
            });
        }
        let mut out: Vec<MatchStatRecord> = self
            .lines
            .iter()
            .filter(|(_, line)| line.appeared)
            .map(|(&player_id, line)| MatchStatRecord {
                match_id: self.match_id.clone(),
                player_id,
                played_at,
                minutes: line.minutes.min(self.rules.match_minutes),
                goals: line.goals,
                assists: line.assists,
                yellow_cards: line.yellow_cards,
                red_card: line.red_card,
            })
            .collect();
        out.sort_by_key(|r| r.player_id);
        Ok(out)
    }

    fn dismiss(&mut self, minute: u32, player: PlayerId) {
        self.on_field.retain(|&id| id != player);
        self.close_stint(player, minute);
        if let Some(line) = self.lines.get_mut(&player) {
            line.red_card = true;
        }
        if self.on_field.len() < self.rules.min_players_on_field {
            tracing::info!(
                match_id = %self.match_id,
                minute,
                remaining = self.on_field.len(),
                "below minimum players, match abandoned"
            );
            self.close_all_stints(minute);
            self.phase = MatchPhase::Abandoned;
        }
    }

    fn close_stint(&mut self, player: PlayerId, minute: u32) {
        let cap = self.rules.match_minutes;
        if let Some(line) = self.lines.get_mut(&player) {
            if let Some(start) = line.entered_at.take() {
                line.minutes += minute.min(cap).saturating_sub(start);
            }
        }
    }

    fn close_all_stints(&mut self, minute: u32) {
        let ids = self.on_field.clone();
        for id in ids {
            self.close_stint(id, minute);
        }
    }

    fn advance_clock(&mut self, minute: u32) -> Result<(), MatchRuleError> {
        if minute < self.last_minute {
            return Err(MatchRuleError::MinuteOutOfOrder {
                minute,
                last: self.last_minute,
            });
        }
        self.last_minute = minute;
        Ok(())
    }

    fn require_phase(&self, action: &'static str, phase: MatchPhase) -> Result<(), MatchRuleError> {
        if self.phase != phase {
            return Err(MatchRuleError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn require_in_play(&self, action: &'static str) -> Result<(), MatchRuleError> {
        if !self.phase.in_play() {
            return Err(MatchRuleError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn require_on_field(&self, player: PlayerId) -> Result<(), MatchRuleError> {
        if self.on_field.contains(&player) {
            return Ok(());
        }
        if self.lines.contains_key(&player) {
            Err(MatchRuleError::NotOnField(player))
        } else {
            Err(MatchRuleError::UnknownPlayer(player))
        }
    }
}

/// A recorded match as stored on disk and replayed by `match_replay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchLog {
    pub match_id: String,
    #[serde(default)]
    pub team: Option<String>,
    pub played_at: DateTime<Utc>,
    pub starters: Vec<PlayerId>,
    #[serde(default)]
    pub bench: Vec<PlayerId>,
    pub events: Vec<MatchEvent>,
}

pub fn replay(log: &MatchLog, rules: MatchRules) -> Result<LiveMatch, MatchRuleError> {
    let mut live = LiveMatch::new(log.match_id.clone(), &log.starters, &log.bench, rules)?;
    for event in &log.events {
        live.apply(event)?;
        if live.phase() == MatchPhase::Abandoned {
            break;
        }
    }
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> LiveMatch {
        let starters: Vec<PlayerId> = (1..=11).collect();
        let bench: Vec<PlayerId> = (12..=18).collect();
        let mut m = LiveMatch::new("m1", &starters, &bench, MatchRules::default()).unwrap();
        m.kick_off().unwrap();
        m
    }

    #[test]
    fn rejects_short_squads_and_duplicates() {
        let err = LiveMatch::new("m", &[1, 2, 3, 4, 5, 6], &[], MatchRules::default()).unwrap_err();
        assert_eq!(err, MatchRuleError::TooFewStarters { min: 7, got: 6 });
        let err = LiveMatch::new("m", &[1, 2, 3, 4, 5, 6, 7], &[7], MatchRules::default()).unwrap_err();
        assert_eq!(err, MatchRuleError::DuplicatePlayer(7));
    }

    #[test]
    fn phases_only_move_forward() {
        let mut m = started();
        assert!(matches!(m.kick_off(), Err(MatchRuleError::InvalidPhase { .. })));
        assert!(m.start_second_half().is_err());
        m.end_half(45).unwrap();
        assert_eq!(m.phase(), MatchPhase::HalfTime);
        assert!(m.record_goal(46, 9, None).is_err());
        m.start_second_half().unwrap();
        m.end_half(90).unwrap();
        assert_eq!(m.phase(), MatchPhase::FullTime);
        assert!(m.end_half(90).is_err());
    }

    #[test]
    fn second_half_clock_ignores_first_half_stoppage() {
        let mut m = started();
        m.end_half(47).unwrap();
        m.start_second_half().unwrap();
        m.record_goal(46, 9, None).unwrap();
        assert_eq!(
            m.record_goal(45, 9, None),
            Err(MatchRuleError::MinuteOutOfOrder { minute: 45, last: 46 })
        );
        m.end_half(90).unwrap();
        let recs = m.finalize(Utc::now()).unwrap();
        assert!(recs.iter().all(|r| r.minutes == 90));
        assert_eq!(m.score(), (1, 0));
    }

    #[test]
    fn second_yellow_is_a_red() {
        let mut m = started();
        assert_eq!(m.book_yellow(10, 4).unwrap(), CardOutcome::Booked);
        assert_eq!(
            m.book_yellow(30, 4).unwrap(),
            CardOutcome::SentOff { second_yellow: true }
        );
        assert!(!m.on_field().contains(&4));
        assert_eq!(m.on_field().len(), 10);
        assert_eq!(m.book_yellow(31, 4), Err(MatchRuleError::NotOnField(4)));
    }

    #[test]
    fn substitution_limit_is_five() {
        let mut m = started();
        for (i, on) in (12..=16).enumerate() {
            m.substitute(50 + i as u32, (i + 1) as PlayerId, on).unwrap();
        }
        assert_eq!(m.substitutions_left(), 0);
        assert_eq!(m.substitute(70, 6, 17), Err(MatchRuleError::SubstitutionLimit(5)));
    }

    #[test]
    fn subbed_off_players_cannot_return() {
        let mut m = started();
        m.substitute(60, 7, 12).unwrap();
        assert_eq!(m.substitute(61, 8, 7), Err(MatchRuleError::NotOnBench(7)));
    }

    #[test]
    fn dropping_below_seven_abandons() {
        let mut m = started();
        for (minute, player) in [(10, 1), (20, 2), (30, 3), (40, 4)] {
            m.send_off(minute, player).unwrap();
        }
        assert_eq!(m.phase(), MatchPhase::FirstHalf);
        m.send_off(44, 5).unwrap();
        assert_eq!(m.phase(), MatchPhase::Abandoned);
        assert_eq!(m.on_field().len(), 6);
        assert!(m.send_off(45, 6).is_err());
        assert!(m.finalize(Utc::now()).is_ok());
    }

    #[test]
    fn minutes_follow_time_on_field() {
        let mut m = started();
        m.record_goal(20, 9, Some(10)).unwrap();
        m.end_half(45).unwrap();
        m.start_second_half().unwrap();
        m.substitute(60, 9, 12).unwrap();
        m.send_off(80, 5).unwrap();
        m.end_half(94).unwrap();
        assert!(m.record_opponent_goal(95).is_err());

        let recs = m.finalize(Utc::now()).unwrap();
        let by_id: HashMap<PlayerId, &MatchStatRecord> = recs.iter().map(|r| (r.player_id, r)).collect();
        assert_eq!(recs.len(), 12);
        assert_eq!(by_id[&1].minutes, 90);
        assert_eq!(by_id[&9].minutes, 60);
        assert_eq!(by_id[&9].goals, 1);
        assert_eq!(by_id[&10].assists, 1);
        assert_eq!(by_id[&12].minutes, 30);
        assert_eq!(by_id[&5].minutes, 80);
        assert!(by_id[&5].red_card);
        assert!(!by_id.contains_key(&13));
        assert_eq!(m.score(), (1, 0));
    }

    #[test]
    fn finalize_requires_final_whistle() {
        let m = started();
        assert!(matches!(
            m.finalize(Utc::now()),
            Err(MatchRuleError::InvalidPhase { action: "finalize", .. })
        ));
    }
}
