use squad_planner::formation::{FALLBACK_FORMATIONS, Formation, MatchType, recommend_formations};
use squad_planner::roster::{Player, Position};

fn squad(gk: usize, def: usize, mid: usize, fwd: usize) -> Vec<Player> {
    let mut out = Vec::new();
    let groups = [
        (Position::Goalkeeper, gk),
        (Position::Defender, def),
        (Position::Midfielder, mid),
        (Position::Forward, fwd),
    ];
    for (position, count) in groups {
        for _ in 0..count {
            let id = out.len() as u32 + 1;
            out.push(Player::new(id, format!("Player {id}"), id as u8, Some(position)));
        }
    }
    out
}

#[test]
fn thin_squad_gets_the_fallback_list() {
    let roster = squad(1, 3, 3, 1);
    for match_type in [
        MatchType::Regular,
        MatchType::Attacking,
        MatchType::Defensive,
        MatchType::Midfield,
    ] {
        assert_eq!(recommend_formations(&roster, match_type), FALLBACK_FORMATIONS.to_vec());
    }
    assert_eq!(
        FALLBACK_FORMATIONS,
        [Formation::F442, Formation::F433, Formation::F352]
    );
}

#[test]
fn only_shapes_the_squad_can_field_are_listed() {
    let roster = squad(1, 4, 4, 2);
    assert_eq!(recommend_formations(&roster, MatchType::Attacking), vec![Formation::F442]);
}

#[test]
fn deep_squad_is_ranked_for_attack() {
    let roster = squad(2, 5, 5, 3);
    assert_eq!(
        recommend_formations(&roster, MatchType::Attacking),
        vec![
            Formation::F433,
            Formation::F343,
            Formation::F4231,
            Formation::F442,
            Formation::F352,
            Formation::F451,
            Formation::F532,
            Formation::F541,
        ]
    );
}

#[test]
fn deep_squad_is_ranked_for_defence() {
    let roster = squad(2, 5, 5, 3);
    let ranked = recommend_formations(&roster, MatchType::Defensive);
    assert_eq!(ranked.len(), Formation::ALL.len());
    assert_eq!(&ranked[..4], &[Formation::F541, Formation::F532, Formation::F451, Formation::F442]);
    for pair in ranked.windows(2) {
        assert!(pair[0].fit_score(MatchType::Defensive) >= pair[1].fit_score(MatchType::Defensive));
    }
}

#[test]
fn injured_and_untagged_players_do_not_count() {
    let mut roster = squad(1, 4, 4, 2);
    roster[0].injured = true;
    roster.push(Player::new(40, "Spare", 40, None));
    assert_eq!(
        recommend_formations(&roster, MatchType::Regular),
        FALLBACK_FORMATIONS.to_vec()
    );
}

#[test]
fn empty_roster_still_gets_suggestions() {
    assert_eq!(recommend_formations(&[], MatchType::Midfield).len(), 3);
}
