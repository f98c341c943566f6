use std::collections::HashSet;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use proptest::prelude::*;

use squad_planner::formation::{FALLBACK_FORMATIONS, Formation, MatchType, recommend_formations};
use squad_planner::lineup::{MAX_PLAYERS_ON_FIELD, MIN_PLAYERS_ON_FIELD, generate_lineup};
use squad_planner::roster::{MatchStatRecord, Player, Position};

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

// (position index, injured, history as (days ago, minutes, goals, assists)).
type RawPlayer = (u8, bool, Vec<(i64, u32, u32, u32)>);

fn build_roster(raw: Vec<RawPlayer>) -> Vec<Player> {
    raw.into_iter()
        .enumerate()
        .map(|(idx, (pos, injured, history))| {
            let id = idx as u32 + 1;
            let position = match pos {
                0 => Some(Position::Goalkeeper),
                1 => Some(Position::Defender),
                2 => Some(Position::Midfielder),
                3 => Some(Position::Forward),
                _ => None,
            };
            let mut player = Player::new(id, format!("P{id:02}"), (id % 99) as u8 + 1, position);
            player.injured = injured;
            player.stats = history
                .into_iter()
                .enumerate()
                .map(|(n, (days_ago, minutes, goals, assists))| MatchStatRecord {
                    match_id: format!("m{n}"),
                    player_id: id,
                    played_at: reference() - ChronoDuration::days(days_ago),
                    minutes,
                    goals,
                    assists,
                    yellow_cards: 0,
                    red_card: false,
                })
                .collect();
            player
        })
        .collect()
}

fn arb_roster() -> impl Strategy<Value = Vec<Player>> {
    prop::collection::vec(
        (
            0u8..5,
            any::<bool>(),
            prop::collection::vec((-3i64..45, 0u32..=120, 0u32..3, 0u32..3), 0..5),
        ),
        0..22,
    )
    .prop_map(build_roster)
}

proptest! {
    #[test]
    fn suggestions_respect_roster_and_bounds(
        roster in arb_roster(),
        formation_idx in 0usize..8,
        on_field in 0usize..16,
        playtime in any::<bool>(),
        performance in any::<bool>(),
    ) {
        let formation = Formation::ALL[formation_idx];
        let s = generate_lineup(&roster, formation, on_field, playtime, performance, reference());
        let eligible = roster.iter().filter(|p| !p.injured).count();
        let effective = on_field.clamp(MIN_PLAYERS_ON_FIELD, MAX_PLAYERS_ON_FIELD);

        prop_assert_eq!(s.players_on_field, effective);
        prop_assert!((0.0..=10.0).contains(&s.balance_score));
        prop_assert!(s.lineup.iter().all(|a| !a.player.injured));
        prop_assert!(s.bench.iter().all(|p| !p.injured));

        let mut seen = HashSet::new();
        for id in s.lineup.iter().map(|a| a.player.id).chain(s.bench.iter().map(|p| p.id)) {
            prop_assert!(seen.insert(id), "player {} listed twice", id);
        }
        prop_assert_eq!(seen.len(), eligible);

        if eligible >= effective {
            prop_assert_eq!(s.lineup.len(), effective);
        } else {
            prop_assert!(s.lineup.is_empty());
            prop_assert_eq!(s.balance_score, 0.0);
        }

        let points: HashSet<(u64, u64)> = s
            .lineup
            .iter()
            .map(|a| (a.point.x.to_bits(), a.point.y.to_bits()))
            .collect();
        prop_assert_eq!(points.len(), s.lineup.len());
        prop_assert!(s.lineup.iter().filter(|a| a.position == Position::Goalkeeper).count() <= 1);
    }

    #[test]
    fn same_inputs_same_suggestion(roster in arb_roster(), formation_idx in 0usize..8) {
        let formation = Formation::ALL[formation_idx];
        let a = generate_lineup(&roster, formation, 11, true, true, reference());
        let mut shuffled = roster.clone();
        shuffled.reverse();
        let b = generate_lineup(&shuffled, formation, 11, true, true, reference());
        let ids = |s: &squad_planner::lineup::LineupSuggestion| -> Vec<u32> {
            s.lineup.iter().map(|a| a.player.id).chain(s.bench.iter().map(|p| p.id)).collect()
        };
        prop_assert_eq!(ids(&a), ids(&b));
        prop_assert_eq!(a.balance_score, b.balance_score);
    }

    #[test]
    fn recommendations_are_never_empty(roster in arb_roster(), kind in 0usize..4) {
        let match_type = [
            MatchType::Regular,
            MatchType::Attacking,
            MatchType::Defensive,
            MatchType::Midfield,
        ][kind];
        let list = recommend_formations(&roster, match_type);
        prop_assert!(!list.is_empty());
        if list != FALLBACK_FORMATIONS.to_vec() {
            for pair in list.windows(2) {
                prop_assert!(pair[0].fit_score(match_type) >= pair[1].fit_score(match_type));
            }
        }
    }
}
