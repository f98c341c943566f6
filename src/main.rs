use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use squad_planner::config::PlannerConfig;
use squad_planner::fake_roster::{FakeRosterOptions, fake_team};
use squad_planner::formation::{Formation, MatchType, recommend_formations};
use squad_planner::lineup::{LineupPlanner, LineupRequest};
use squad_planner::persist::{load_club, resolve_roster_path, select_team};
use squad_planner::report;
use squad_planner::scoring::ScoringToggles;
use squad_planner::stats::{DateRange, LeaderboardMetric, team_leaderboard, team_totals};

#[derive(Debug, Parser)]
#[command(name = "squad_planner", version, about = "Lineup suggestions for amateur football teams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Suggest a starting lineup and bench.
    Suggest(SuggestArgs),
    /// List formations the available players can field.
    Formations(FormationArgs),
    /// Season leaderboard for a team.
    Stats(StatsArgs),
    /// Suggest a lineup for a generated roster.
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
struct RosterArgs {
    /// Club or team JSON file.
    #[arg(long, env = "SQUAD_PLANNER_ROSTER")]
    roster: Option<PathBuf>,
    #[arg(long)]
    team: Option<String>,
}

#[derive(Debug, Args)]
struct LineupArgs {
    #[arg(long, default_value = "4-4-2")]
    formation: Formation,
    #[arg(long = "on-field", default_value_t = 11)]
    on_field: usize,
    /// Favour players with less recent playtime.
    #[arg(long)]
    playtime: bool,
    /// Favour recent goals and assists.
    #[arg(long)]
    performance: bool,
    /// Reference time for recency windows (RFC 3339 or YYYY-MM-DD); defaults to now.
    #[arg(long)]
    at: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    #[command(flatten)]
    roster: RosterArgs,
    #[command(flatten)]
    lineup: LineupArgs,
    /// Plan every team in the club file.
    #[arg(long = "all-teams", conflicts_with = "team")]
    all_teams: bool,
}

#[derive(Debug, Args)]
struct FormationArgs {
    #[command(flatten)]
    roster: RosterArgs,
    #[arg(long = "match-type", default_value = "regular")]
    match_type: MatchType,
}

#[derive(Debug, Args)]
struct StatsArgs {
    #[command(flatten)]
    roster: RosterArgs,
    #[arg(long, default_value = "goals")]
    metric: LeaderboardMetric,
    /// Only count matches on or after this date.
    #[arg(long)]
    since: Option<String>,
}

#[derive(Debug, Args)]
struct DemoArgs {
    #[arg(long, default_value_t = 7)]
    seed: u64,
    #[arg(long, default_value_t = 18)]
    players: usize,
    #[command(flatten)]
    lineup: LineupArgs,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let planner = LineupPlanner::new(PlannerConfig::from_env());
    match cli.command {
        Command::Suggest(args) => run_suggest(&planner, args),
        Command::Formations(args) => run_formations(args),
        Command::Stats(args) => run_stats(args),
        Command::Demo(args) => run_demo(&planner, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn reference_time(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => report::parse_reference_time(raw),
        None => Ok(Utc::now()),
    }
}

fn request_from(args: &LineupArgs) -> LineupRequest {
    LineupRequest {
        formation: args.formation,
        players_on_field: args.on_field,
        toggles: ScoringToggles {
            consider_playtime: args.playtime,
            consider_performance: args.performance,
        },
    }
}

fn run_suggest(planner: &LineupPlanner, args: SuggestArgs) -> Result<()> {
    let path = resolve_roster_path(args.roster.roster.as_deref())?;
    let club = load_club(&path)?;
    let at = reference_time(args.lineup.at.as_deref())?;
    let request = request_from(&args.lineup);

    let plans = if args.all_teams {
        planner.plan_club(&club, &request, at)
    } else {
        let team = select_team(&club, args.roster.team.as_deref())?;
        vec![(team.name.clone(), planner.generate(&team.players, &request, at))]
    };

    if args.lineup.json {
        let json = if plans.len() == 1 {
            serde_json::to_string_pretty(&plans[0].1)
        } else {
            serde_json::to_string_pretty(&plans)
        };
        println!("{}", json.context("serialize suggestion")?);
        return Ok(());
    }
    for (name, suggestion) in &plans {
        println!("{}", report::render_suggestion(name, suggestion));
    }
    Ok(())
}

fn run_formations(args: FormationArgs) -> Result<()> {
    let path = resolve_roster_path(args.roster.roster.as_deref())?;
    let club = load_club(&path)?;
    let team = select_team(&club, args.roster.team.as_deref())?;
    let formations = recommend_formations(&team.players, args.match_type);
    print!("{}", report::render_formations(&team.players, args.match_type, &formations));
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let path = resolve_roster_path(args.roster.roster.as_deref())?;
    let club = load_club(&path)?;
    let team = select_team(&club, args.roster.team.as_deref())?;
    let range = DateRange {
        from: args.since.as_deref().map(report::parse_start_time).transpose()?,
        to: None,
    };
    let totals = team_totals(team, range);
    println!(
        "{}: {} matches, {} goals, {} assists",
        team.name, totals.matches, totals.goals, totals.assists
    );
    print!("{}", report::render_leaderboard(&team_leaderboard(team, args.metric, range)));
    Ok(())
}

fn run_demo(planner: &LineupPlanner, args: DemoArgs) -> Result<()> {
    let at = reference_time(args.lineup.at.as_deref())?;
    let opts = FakeRosterOptions {
        players: args.players.clamp(1, 60),
        ..FakeRosterOptions::default()
    };
    let team = fake_team("Demo FC", opts, args.seed, at);
    let suggestion = planner.generate(&team.players, &request_from(&args.lineup), at);
    if args.lineup.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&suggestion).context("serialize suggestion")?
        );
    } else {
        println!("{}", report::render_suggestion(&team.name, &suggestion));
    }
    Ok(())
}
