use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::roster::{MatchStatRecord, Player, Position, Team};

const FIRST_NAMES: &[&str] = &[
    "Alex", "Sam", "Jo", "Max", "Kim", "Noah", "Lena", "Omar", "Ivy", "Theo", "Mia", "Luca",
    "Nina", "Ravi", "Zoe", "Finn", "Ada", "Leo", "Maya", "Ezra",
];
const LAST_NAMES: &[&str] = &[
    "Stone", "Vega", "Holt", "Park", "Moss", "Quinn", "Hale", "Noor", "Ash", "Rook", "Vale",
    "Brook", "Lind", "Cruz", "Okafor", "Berg",
];

#[derive(Debug, Clone, Copy)]
pub struct FakeRosterOptions {
    pub players: usize,
    pub weeks_of_history: u32,
    pub injury_rate: f64,
}

impl Default for FakeRosterOptions {
    fn default() -> Self {
        Self {
            players: 18,
            weeks_of_history: 8,
            injury_rate: 0.08,
        }
    }
}

/// Deterministic for a given seed and reference time. One match per week,
/// ending the day before `reference`.
pub fn fake_team(name: &str, opts: FakeRosterOptions, seed: u64, reference: DateTime<Utc>) -> Team {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut numbers: Vec<u8> = (1..=99).collect();
    numbers[1..].shuffle(&mut rng);

    let players: Vec<Player> = (0..opts.players)
        .map(|idx| {
            let position = position_for_index(idx);
            let number = if position == Some(Position::Goalkeeper) && idx == 0 {
                1
            } else {
                numbers[1 + idx % 98]
            };
            let name = format!(
                "{} {}",
                FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
                LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())]
            );
            let mut player = Player::new(idx as u32 + 1, name, number, position);
            player.injured = idx != 0 && rng.gen_bool(opts.injury_rate.clamp(0.0, 1.0));
            player.stats = fake_history(&mut rng, &player, opts.weeks_of_history, reference);
            player
        })
        .collect();

    Team {
        name: name.to_string(),
        players,
    }
}

// Two keepers, then roughly 4:4:3 outfield; every tenth player untagged.
fn position_for_index(idx: usize) -> Option<Position> {
    match idx {
        0 | 11 => Some(Position::Goalkeeper),
        _ if idx % 10 == 9 => None,
        _ => match idx % 11 {
            1..=4 => Some(Position::Defender),
            5..=8 => Some(Position::Midfielder),
            _ => Some(Position::Forward),
        },
    }
}

fn fake_history(rng: &mut StdRng, player: &Player, weeks: u32, reference: DateTime<Utc>) -> Vec<MatchStatRecord> {
    let attacking = match player.position {
        Some(Position::Forward) => 0.35,
        Some(Position::Midfielder) => 0.18,
        Some(Position::Defender) => 0.05,
        _ => 0.02,
    };
    (1..=weeks)
        .filter_map(|week| {
            if !rng.gen_bool(0.8) {
                return None;
            }
            let minutes = match rng.gen_range(0..4) {
                0 => rng.gen_range(10..45),
                1 => 45,
                _ => 90,
            };
            let goals = u32::from(rng.gen_bool(attacking)) + u32::from(rng.gen_bool(attacking / 4.0));
            let assists = u32::from(rng.gen_bool(attacking * 0.8));
            Some(MatchStatRecord {
                match_id: format!("wk{week:02}"),
                player_id: player.id,
                played_at: reference - ChronoDuration::days(7 * i64::from(week) - 6),
                minutes,
                goals,
                assists,
                yellow_cards: u32::from(rng.gen_bool(0.06)),
                red_card: false,
            })
        })
        .collect()
}
