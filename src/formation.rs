use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::roster::{Player, Position};

/// Normalized pitch coordinate: x across the pitch, y from own goal line (0) to
/// the opponent's (1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f64,
    pub y: f64,
}

impl PitchPoint {
    pub const CENTER: PitchPoint = PitchPoint { x: 0.5, y: 0.5 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub position: Position,
    pub point: PitchPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    #[serde(rename = "4-4-2")]
    F442,
    #[serde(rename = "4-3-3")]
    F433,
    #[serde(rename = "3-5-2")]
    F352,
    #[serde(rename = "4-2-3-1")]
    F4231,
    #[serde(rename = "5-3-2")]
    F532,
    #[serde(rename = "3-4-3")]
    F343,
    #[serde(rename = "4-5-1")]
    F451,
    #[serde(rename = "5-4-1")]
    F541,
}

pub const FALLBACK_FORMATIONS: [Formation; 3] = [Formation::F442, Formation::F433, Formation::F352];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Regular,
    Attacking,
    Defensive,
    Midfield,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown formation '{0}'")]
    Formation(String),
    #[error("unknown match type '{0}' (expected regular, attacking, defensive or midfield)")]
    MatchType(String),
    #[error("unknown metric '{0}' (expected goals, assists, minutes or per90)")]
    Metric(String),
}

struct Layout {
    lines: HashMap<Position, Vec<PitchPoint>>,
}

const GOALKEEPER_SPOT: PitchPoint = PitchPoint::new(0.5, 0.05);

// (category, players in the line, depth). Midfield is split into two lines for
// shapes like 4-2-3-1.
fn line_layout(formation: Formation) -> &'static [(Position, usize, f64)] {
    use Position::*;
    match formation {
        Formation::F442 => &[(Defender, 4, 0.22), (Midfielder, 4, 0.50), (Forward, 2, 0.78)],
        Formation::F433 => &[(Defender, 4, 0.22), (Midfielder, 3, 0.48), (Forward, 3, 0.78)],
        Formation::F352 => &[(Defender, 3, 0.20), (Midfielder, 5, 0.50), (Forward, 2, 0.80)],
        Formation::F4231 => &[
            (Defender, 4, 0.22),
            (Midfielder, 2, 0.40),
            (Midfielder, 3, 0.62),
            (Forward, 1, 0.82),
        ],
        Formation::F532 => &[(Defender, 5, 0.20), (Midfielder, 3, 0.48), (Forward, 2, 0.76)],
        Formation::F343 => &[(Defender, 3, 0.20), (Midfielder, 4, 0.48), (Forward, 3, 0.78)],
        Formation::F451 => &[(Defender, 4, 0.22), (Midfielder, 5, 0.50), (Forward, 1, 0.80)],
        Formation::F541 => &[(Defender, 5, 0.20), (Midfielder, 4, 0.46), (Forward, 1, 0.78)],
    }
}

fn spread(count: usize, y: f64) -> impl Iterator<Item = PitchPoint> {
    (0..count).map(move |i| PitchPoint::new((i + 1) as f64 / (count + 1) as f64, y))
}

static LAYOUTS: Lazy<HashMap<Formation, Layout>> = Lazy::new(|| {
    Formation::ALL
        .iter()
        .map(|&formation| {
            let mut lines: HashMap<Position, Vec<PitchPoint>> = HashMap::new();
            lines.insert(Position::Goalkeeper, vec![GOALKEEPER_SPOT]);
            for &(position, count, y) in line_layout(formation) {
                lines.entry(position).or_default().extend(spread(count, y));
            }
            (formation, Layout { lines })
        })
        .collect()
});

// Anything not listed scores DEFAULT_FIT.
const DEFAULT_FIT: f64 = 7.0;

static FIT_TABLE: Lazy<HashMap<(Formation, MatchType), f64>> = Lazy::new(|| {
    use Formation::*;
    use MatchType::*;
    HashMap::from([
        ((F442, Regular), 8.5),
        ((F442, Attacking), 7.5),
        ((F442, Defensive), 8.0),
        ((F442, Midfield), 8.0),
        ((F433, Regular), 8.0),
        ((F433, Attacking), 9.0),
        ((F433, Defensive), 6.5),
        ((F433, Midfield), 7.5),
        ((F352, Regular), 7.5),
        ((F352, Attacking), 7.5),
        ((F352, Defensive), 6.5),
        ((F352, Midfield), 9.0),
        ((F4231, Regular), 8.0),
        ((F4231, Attacking), 8.0),
        ((F4231, Defensive), 7.5),
        ((F4231, Midfield), 8.5),
        ((F532, Regular), 6.5),
        ((F532, Attacking), 5.5),
        ((F532, Defensive), 9.0),
        ((F343, Attacking), 8.5),
        ((F343, Defensive), 5.5),
        ((F451, Defensive), 8.5),
        ((F451, Midfield), 8.5),
        ((F451, Attacking), 6.0),
        ((F541, Defensive), 9.5),
        ((F541, Attacking), 5.0),
    ])
});

impl Formation {
    pub const ALL: [Formation; 8] = [
        Formation::F442,
        Formation::F433,
        Formation::F352,
        Formation::F4231,
        Formation::F532,
        Formation::F343,
        Formation::F451,
        Formation::F541,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Formation::F442 => "4-4-2",
            Formation::F433 => "4-3-3",
            Formation::F352 => "3-5-2",
            Formation::F4231 => "4-2-3-1",
            Formation::F532 => "5-3-2",
            Formation::F343 => "3-4-3",
            Formation::F451 => "4-5-1",
            Formation::F541 => "5-4-1",
        }
    }

    /// Coordinates for one category, in assignment order.
    pub fn coordinates(self, position: Position) -> &'static [PitchPoint] {
        LAYOUTS
            .get(&self)
            .and_then(|layout| layout.lines.get(&position))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn required(self, position: Position) -> usize {
        self.coordinates(position).len()
    }

    pub fn total_players(self) -> usize {
        Position::ALL.iter().map(|&p| self.required(p)).sum()
    }

    /// Every slot, goalkeeper first, then defence, midfield and attack.
    pub fn slots(self) -> impl Iterator<Item = Slot> {
        Position::ALL.into_iter().flat_map(move |position| {
            self.coordinates(position)
                .iter()
                .map(move |&point| Slot { position, point })
        })
    }

    pub fn fit_score(self, match_type: MatchType) -> f64 {
        FIT_TABLE
            .get(&(self, match_type))
            .copied()
            .unwrap_or(DEFAULT_FIT)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Formation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.trim().chars().filter(|c| c.is_ascii_digit()).collect();
        Formation::ALL
            .into_iter()
            .find(|f| f.name().replace('-', "") == wanted)
            .ok_or_else(|| ParseError::Formation(s.to_string()))
    }
}

impl MatchType {
    pub fn label(self) -> &'static str {
        match self {
            MatchType::Regular => "regular",
            MatchType::Attacking => "attacking",
            MatchType::Defensive => "defensive",
            MatchType::Midfield => "midfield",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatchType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" | "normal" | "balanced" => Ok(MatchType::Regular),
            "attacking" | "attack" | "offensive" => Ok(MatchType::Attacking),
            "defensive" | "defence" | "defense" => Ok(MatchType::Defensive),
            "midfield" | "possession" => Ok(MatchType::Midfield),
            _ => Err(ParseError::MatchType(s.to_string())),
        }
    }
}

/// Count of available (non-injured) players per position tag.
pub fn available_by_position(roster: &[Player]) -> HashMap<Position, usize> {
    let mut counts = HashMap::new();
    for player in roster.iter().filter(|p| p.is_eligible()) {
        if let Some(position) = player.position {
            *counts.entry(position).or_insert(0) += 1;
        }
    }
    counts
}

/// Formations the roster can field, best fit for `match_type` first. Never empty.
pub fn recommend_formations(roster: &[Player], match_type: MatchType) -> Vec<Formation> {
    let counts = available_by_position(roster);
    let mut out: Vec<Formation> = Formation::ALL
        .into_iter()
        .filter(|f| {
            Position::ALL
                .iter()
                .all(|p| counts.get(p).copied().unwrap_or(0) >= f.required(*p))
        })
        .collect();

    if out.is_empty() {
        tracing::debug!(?counts, "no formation fits the available players, using fallback list");
        return FALLBACK_FORMATIONS.to_vec();
    }

    // Stable: equal fits keep catalogue order.
    out.sort_by(|a, b| b.fit_score(match_type).total_cmp(&a.fit_score(match_type)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_formation_fields_eleven() {
        for f in Formation::ALL {
            assert_eq!(f.total_players(), 11, "{f}");
            assert_eq!(f.required(Position::Goalkeeper), 1, "{f}");
            assert_eq!(f.slots().count(), 11, "{f}");
        }
    }

    #[test]
    fn coordinates_are_normalized_and_distinct() {
        for f in Formation::ALL {
            let slots: Vec<Slot> = f.slots().collect();
            for (i, a) in slots.iter().enumerate() {
                assert!((0.0..=1.0).contains(&a.point.x) && (0.0..=1.0).contains(&a.point.y));
                for b in &slots[i + 1..] {
                    assert_ne!(a.point, b.point, "{f} reuses a coordinate");
                }
            }
        }
    }

    #[test]
    fn four_two_three_one_splits_midfield() {
        let mids = Formation::F4231.coordinates(Position::Midfielder);
        assert_eq!(mids.len(), 5);
        assert!(mids[..2].iter().all(|p| p.y < mids[2].y));
    }

    #[test]
    fn parses_names_and_match_types() {
        assert_eq!("4-4-2".parse::<Formation>(), Ok(Formation::F442));
        assert_eq!(" 4231 ".parse::<Formation>(), Ok(Formation::F4231));
        assert!("4-4-3".parse::<Formation>().is_err());
        assert_eq!("Attacking".parse::<MatchType>(), Ok(MatchType::Attacking));
        assert!("chaotic".parse::<MatchType>().is_err());
    }

    #[test]
    fn unlisted_pairs_use_default_fit() {
        assert_eq!(Formation::F343.fit_score(MatchType::Regular), DEFAULT_FIT);
        assert_eq!(Formation::F433.fit_score(MatchType::Attacking), 9.0);
    }
}
