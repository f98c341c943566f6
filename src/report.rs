use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::formation::{Formation, MatchType, available_by_position};
use crate::lineup::LineupSuggestion;
use crate::roster::{MatchStatRecord, Player, Position};
use crate::stats::PlayerSeasonSummary;

const PITCH_COLS: usize = 41;
const PITCH_ROWS: usize = 13;

/// RFC 3339, or a bare date meaning the end of that day (UTC).
pub fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{raw}' is neither RFC 3339 nor YYYY-MM-DD"))?;
    let end = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(|| anyhow!("invalid end-of-day time"))?;
    Ok(date.and_time(end).and_utc())
}

/// Like `parse_reference_time`, but a bare date means the start of that day.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    parse_reference_time(raw)
}

pub fn render_suggestion(team: &str, s: &LineupSuggestion) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{team} | {} | {} on field | balance {:.1}/10",
        s.formation, s.players_on_field, s.balance_score
    );
    if !s.lineup.is_empty() {
        out.push_str(&render_pitch(s));
        out.push('\n');
        for a in &s.lineup {
            let tag = a.player.position.map(Position::tag).unwrap_or("--");
            let _ = writeln!(
                out,
                "  {:>3}  #{:<2} {:<22} tag {:<3} score {:>5.2}",
                a.position.tag(),
                a.player.number,
                a.player.name,
                tag,
                a.score
            );
        }
    }
    if !s.bench.is_empty() {
        let bench: Vec<String> = s
            .bench
            .iter()
            .map(|p| format!("#{} {}", p.number, p.name))
            .collect();
        let _ = writeln!(out, "  bench: {}", bench.join(", "));
    }
    let _ = writeln!(out, "  {}", s.reasoning);
    out
}

// Own goal at the bottom, attack at the top.
fn render_pitch(s: &LineupSuggestion) -> String {
    let mut grid = vec![vec![' '; PITCH_COLS]; PITCH_ROWS];
    for row in grid.iter_mut() {
        row[0] = '|';
        row[PITCH_COLS - 1] = '|';
    }
    for cell in &mut grid[PITCH_ROWS / 2][1..PITCH_COLS - 1] {
        *cell = '-';
    }
    for a in &s.lineup {
        let label = a.player.number.to_string();
        let col = ((a.point.x * (PITCH_COLS - 4) as f64).round() as usize + 1).min(PITCH_COLS - 3);
        let row = ((1.0 - a.point.y) * (PITCH_ROWS - 1) as f64).round() as usize;
        let row = row.min(PITCH_ROWS - 1);
        for (i, ch) in label.chars().enumerate() {
            grid[row][col + i] = ch;
        }
    }
    let border = format!("  +{}+", "-".repeat(PITCH_COLS - 2));
    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    for row in grid {
        let line: String = row.into_iter().collect();
        let _ = writeln!(out, "  {line}");
    }
    out.push_str(&border);
    out
}

pub fn render_formations(roster: &[Player], match_type: MatchType, formations: &[Formation]) -> String {
    let counts = available_by_position(roster);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "available: {} GK, {} DEF, {} MID, {} FWD ({match_type})",
        counts.get(&Position::Goalkeeper).copied().unwrap_or(0),
        counts.get(&Position::Defender).copied().unwrap_or(0),
        counts.get(&Position::Midfielder).copied().unwrap_or(0),
        counts.get(&Position::Forward).copied().unwrap_or(0),
    );
    for (idx, f) in formations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {:<8} fit {:.1}", idx + 1, f.name(), f.fit_score(match_type));
    }
    out
}

pub fn render_leaderboard(rows: &[PlayerSeasonSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<3} {:<22} {:<3} {:>4} {:>5} {:>3} {:>3} {:>4} {:>5}",
        "#", "name", "pos", "apps", "min", "g", "a", "card", "g+a/90"
    );
    for r in rows {
        let cards = format!("{}/{}", r.yellow_cards, r.red_cards);
        let name = if r.injured {
            format!("{} (inj)", r.name)
        } else {
            r.name.clone()
        };
        let _ = writeln!(
            out,
            "  {:<3} {:<22} {:<3} {:>4} {:>5} {:>3} {:>3} {:>4} {:>5.2}",
            r.number,
            name,
            r.position.map(Position::tag).unwrap_or("--"),
            r.appearances,
            r.minutes,
            r.goals,
            r.assists,
            cards,
            r.goal_contributions_per_90
        );
    }
    out
}

pub fn render_stat_records(records: &[MatchStatRecord], names: impl Fn(u32) -> Option<String>) -> String {
    let mut out = String::new();
    for r in records {
        let name = names(r.player_id).unwrap_or_else(|| format!("player {}", r.player_id));
        let _ = writeln!(
            out,
            "  {:<22} {:>3}' g{} a{} y{}{}",
            name,
            r.minutes,
            r.goals,
            r.assists,
            r.yellow_cards,
            if r.red_card { " red" } else { "" }
        );
    }
    out
}
