use std::fmt;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type PlayerId = u32;

/// Longest single appearance a stat record may claim, extra time included.
pub const MAX_RECORD_MINUTES: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    /// Order used whenever slots or categories are walked.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "goalkeeper",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Lenient position parsing for hand-written roster files.
pub fn position_from_text(raw: &str) -> Option<Position> {
    let s = raw.trim().to_lowercase();
    match s.as_str() {
        "gk" | "g" => return Some(Position::Goalkeeper),
        "def" | "df" | "d" => return Some(Position::Defender),
        "mid" | "mf" | "m" => return Some(Position::Midfielder),
        "fwd" | "fw" | "f" | "st" => return Some(Position::Forward),
        _ => {}
    }
    if s.contains("goalkeeper") || s.contains("keeper") {
        return Some(Position::Goalkeeper);
    }
    if s.contains("defender") || s.contains("back") {
        return Some(Position::Defender);
    }
    if s.contains("midfield") {
        return Some(Position::Midfielder);
    }
    if s.contains("forward") || s.contains("striker") || s.contains("wing") || s.contains("attacker") {
        return Some(Position::Forward);
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStatRecord {
    pub match_id: String,
    pub player_id: PlayerId,
    pub played_at: DateTime<Utc>,
    pub minutes: u32,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_card: bool,
}

impl MatchStatRecord {
    /// Inclusive window `[reference - days, reference]`; future records are outside.
    pub fn within(&self, reference: DateTime<Utc>, days: i64) -> bool {
        let cutoff = reference - ChronoDuration::days(days);
        self.played_at >= cutoff && self.played_at <= reference
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub number: u8,
    #[serde(default, with = "position_tag")]
    pub position: Option<Position>,
    #[serde(default)]
    pub injured: bool,
    #[serde(default)]
    pub stats: Vec<MatchStatRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player {name} has jersey number {number}, expected 1-99")]
    JerseyOutOfRange { name: String, number: u8 },
    #[error(
        "stat record for match {match_id} gives player {player} {minutes} minutes (at most {})",
        MAX_RECORD_MINUTES
    )]
    MinutesOutOfRange {
        match_id: String,
        player: PlayerId,
        minutes: u32,
    },
    #[error("duplicate player id {0}")]
    DuplicateId(PlayerId),
    #[error("stat record for match {match_id} belongs to player {owner}, not {player}")]
    ForeignStatRecord {
        match_id: String,
        owner: PlayerId,
        player: PlayerId,
    },
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, number: u8, position: Option<Position>) -> Self {
        Self {
            id,
            name: name.into(),
            number,
            position,
            injured: false,
            stats: Vec::new(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        !self.injured
    }

    pub fn validate(&self) -> Result<(), RosterError> {
        if !(1..=99).contains(&self.number) {
            return Err(RosterError::JerseyOutOfRange {
                name: self.name.clone(),
                number: self.number,
            });
        }
        if let Some(rec) = self.stats.iter().find(|r| r.player_id != self.id) {
            return Err(RosterError::ForeignStatRecord {
                match_id: rec.match_id.clone(),
                owner: rec.player_id,
                player: self.id,
            });
        }
        if let Some(rec) = self.stats.iter().find(|r| r.minutes > MAX_RECORD_MINUTES) {
            return Err(RosterError::MinutesOutOfRange {
                match_id: rec.match_id.clone(),
                player: self.id,
                minutes: rec.minutes,
            });
        }
        Ok(())
    }

    pub fn recent_stats(&self, reference: DateTime<Utc>, days: i64) -> impl Iterator<Item = &MatchStatRecord> {
        self.stats.iter().filter(move |r| r.within(reference, days))
    }

    pub fn recent_minutes(&self, reference: DateTime<Utc>, days: i64) -> u64 {
        self.recent_stats(reference, days).map(|r| u64::from(r.minutes)).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Team {
    pub fn validate(&self) -> Result<(), RosterError> {
        let mut seen = std::collections::HashSet::new();
        for player in &self.players {
            if !seen.insert(player.id) {
                return Err(RosterError::DuplicateId(player.id));
            }
            player.validate()?;
        }
        Ok(())
    }

    pub fn eligible(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_eligible())
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Club {
    #[serde(default)]
    pub teams: Vec<Team>,
}

impl Club {
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn team_mut(&mut self, name: &str) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

// Tags are written as "GK"/"DEF"/... but read leniently, and a missing or
// unrecognised tag becomes `None` rather than a parse failure.
mod position_tag {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Position, position_from_text};

    pub fn serialize<S: Serializer>(value: &Option<Position>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(p) => s.serialize_str(p.tag()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Position>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(position_from_text))
    }
}
