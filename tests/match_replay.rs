use std::fs;
use std::path::PathBuf;

use squad_planner::match_rules::{MatchEvent, MatchLog, MatchPhase, MatchRuleError, MatchRules, replay};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_log() -> MatchLog {
    serde_json::from_str(&read_fixture("match_log.json")).expect("match log should parse")
}

#[test]
fn replays_a_recorded_match_to_full_time() {
    let log = fixture_log();
    let live = replay(&log, MatchRules::default()).expect("replay should succeed");

    assert_eq!(live.phase(), MatchPhase::FullTime);
    assert_eq!(live.score(), (2, 1));
    assert_eq!(live.substitutions_used(), 1);
    assert_eq!(live.substitutions_left(), 4);
    assert_eq!(live.on_field().len(), 10);
    assert!(live.on_field().contains(&14));
    assert!(!live.on_field().contains(&4));
    assert_eq!(live.bench(), &[12]);
    assert_eq!(live.yellow_cards(4), 2);
    assert_eq!(live.events().len(), log.events.len());
}

#[test]
fn finalized_records_cover_everyone_who_played() {
    let log = fixture_log();
    let live = replay(&log, MatchRules::default()).expect("replay should succeed");
    let records = live.finalize(log.played_at).expect("full time can be finalized");

    let ids: Vec<u32> = records.iter().map(|r| r.player_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 14]);
    assert!(records.iter().all(|r| r.match_id == "2026-05-10-athletic"));
    assert!(records.iter().all(|r| r.played_at == log.played_at));

    let by_id = |id: u32| records.iter().find(|r| r.player_id == id).expect("record present");
    // Stoppage time is capped at the regulation length.
    assert_eq!(by_id(1).minutes, 90);
    assert_eq!(by_id(11).minutes, 46);
    assert_eq!(by_id(14).minutes, 44);
    assert_eq!(by_id(14).goals, 1);
    assert_eq!(by_id(10).goals, 1);
    assert_eq!(by_id(9).assists, 1);

    let sent_off = by_id(4);
    assert_eq!(sent_off.minutes, 70);
    assert_eq!(sent_off.yellow_cards, 2);
    assert!(sent_off.red_card);
}

#[test]
fn unfinished_match_cannot_be_finalized() {
    let mut log = fixture_log();
    log.events.truncate(3);
    let live = replay(&log, MatchRules::default()).expect("partial replay should succeed");
    assert_eq!(live.phase(), MatchPhase::FirstHalf);
    let err = live.finalize(log.played_at).unwrap_err();
    assert!(matches!(err, MatchRuleError::InvalidPhase { .. }));
}

#[test]
fn replay_stops_at_the_first_illegal_event() {
    let mut log = fixture_log();
    // Player 4 is already off the field after the second yellow.
    log.events.insert(
        8,
        MatchEvent::Goal {
            minute: 75,
            scorer: 4,
            assist: None,
        },
    );
    let err = replay(&log, MatchRules::default()).unwrap_err();
    assert_eq!(err, MatchRuleError::NotOnField(4));
}

#[test]
fn substitution_limit_comes_from_rules() {
    let log = fixture_log();
    let rules = MatchRules {
        max_substitutions: 0,
        ..MatchRules::default()
    };
    let err = replay(&log, rules).unwrap_err();
    assert_eq!(err, MatchRuleError::SubstitutionLimit(0));
}

#[test]
fn first_half_stoppage_time_replays() {
    let mut log = fixture_log();
    // Half-time whistle at 45+3, changes made before the restart, then an early second-half goal.
    log.events[4] = MatchEvent::EndHalf { minute: 48 };
    log.events[5] = MatchEvent::Substitution {
        minute: 48,
        off: 11,
        on: 14,
    };
    log.events.insert(
        7,
        MatchEvent::Goal {
            minute: 46,
            scorer: 10,
            assist: Some(14),
        },
    );

    let live = replay(&log, MatchRules::default()).expect("stoppage time should not break replay");
    assert_eq!(live.phase(), MatchPhase::FullTime);
    assert_eq!(live.score(), (3, 1));

    let records = live.finalize(log.played_at).expect("full time can be finalized");
    let by_id = |id: u32| records.iter().find(|r| r.player_id == id).expect("record present");
    assert_eq!(by_id(10).goals, 2);
    assert_eq!(by_id(14).assists, 1);
    assert_eq!(by_id(14).minutes, 42);
    assert_eq!(by_id(11).minutes, 48);
}
