use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use squad_planner::config::PlannerConfig;
use squad_planner::match_rules::{MatchLog, MatchRules, replay};
use squad_planner::persist::{load_club, save_club};
use squad_planner::report::render_stat_records;

/// Replays a recorded match and prints the per-player stat lines it produces.
#[derive(Debug, Parser)]
#[command(name = "match_replay")]
struct Cli {
    /// Match event log (JSON).
    events: PathBuf,
    /// Club file to append the resulting stat records to.
    #[arg(long = "append-to")]
    append_to: Option<PathBuf>,
    /// Team in the club file; defaults to the team named in the log.
    #[arg(long)]
    team: Option<String>,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let raw = fs::read_to_string(&cli.events)
        .with_context(|| format!("read {}", cli.events.display()))?;
    let log: MatchLog = serde_json::from_str(&raw).context("parse match log")?;

    let rules = MatchRules::from(&PlannerConfig::from_env());
    let live = replay(&log, rules).with_context(|| format!("replay match {}", log.match_id))?;
    let records = live.finalize(log.played_at)?;
    let (goals_for, goals_against) = live.score();
    println!(
        "{} ({:?}) {goals_for}-{goals_against}, {} substitutions",
        log.match_id,
        live.phase(),
        live.substitutions_used()
    );

    let Some(path) = cli.append_to else {
        print!("{}", render_stat_records(&records, |_| None));
        return Ok(());
    };

    let mut club = load_club(&path)?;
    let team_name = cli
        .team
        .or(log.team.clone())
        .ok_or_else(|| anyhow!("no team given and the match log does not name one"))?;
    let team = club
        .team_mut(&team_name)
        .ok_or_else(|| anyhow!("no team named '{team_name}' in {}", path.display()))?;

    let mut appended = 0usize;
    for record in &records {
        let Some(player) = team.player_mut(record.player_id) else {
            tracing::warn!(player_id = record.player_id, "player not on roster, record skipped");
            continue;
        };
        // Replaying the same log twice must not double count.
        if player.stats.iter().any(|r| r.match_id == record.match_id) {
            continue;
        }
        player.stats.push(record.clone());
        appended += 1;
    }
    let names: Vec<(u32, String)> = team.players.iter().map(|p| (p.id, p.name.clone())).collect();
    save_club(&path, &club)?;

    print!(
        "{}",
        render_stat_records(&records, |id| names
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, name)| name.clone()))
    );
    println!("appended {appended} record(s) to {}", path.display());
    Ok(())
}
