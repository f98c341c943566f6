use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::roster::{Club, Team};

const DATA_DIR: &str = "squad_planner";
const DATA_FILE: &str = "club.json";
const FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClubFile {
    version: u32,
    #[serde(default)]
    teams: Vec<Team>,
}

// A club file, or a single team written by hand.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnyRosterFile {
    Club(ClubFile),
    Team(Team),
}

pub fn load_club(path: &Path) -> Result<Club> {
    let raw = fs::read_to_string(path).with_context(|| format!("read roster {}", path.display()))?;
    parse_club_json(&raw).with_context(|| format!("parse roster {}", path.display()))
}

pub fn parse_club_json(raw: &str) -> Result<Club> {
    let parsed: AnyRosterFile = serde_json::from_str(raw).context("invalid roster json")?;
    let club = match parsed {
        AnyRosterFile::Club(file) => {
            if file.version != FILE_VERSION {
                bail!(
                    "unsupported roster file version {} (expected {FILE_VERSION})",
                    file.version
                );
            }
            Club { teams: file.teams }
        }
        AnyRosterFile::Team(team) => Club { teams: vec![team] },
    };
    for team in &club.teams {
        team.validate()
            .with_context(|| format!("team '{}'", team.name))?;
    }
    Ok(club)
}

pub fn save_club(path: &Path, club: &Club) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
    }
    let file = ClubFile {
        version: FILE_VERSION,
        teams: club.teams.clone(),
    };
    let json = serde_json::to_string_pretty(&file).context("serialize roster")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write roster")?;
    fs::rename(&tmp, path).context("swap roster")?;
    tracing::debug!(path = %path.display(), teams = club.teams.len(), "roster saved");
    Ok(())
}

/// `$SQUAD_PLANNER_ROSTER`, else the XDG data dir, else `~/.local/share`.
pub fn default_roster_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SQUAD_PLANNER_ROSTER") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR).join(DATA_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DATA_FILE),
    )
}

pub fn resolve_roster_path(explicit: Option<&Path>) -> Result<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(default_roster_path)
        .ok_or_else(|| anyhow!("no roster file given and no default data directory available"))
}

/// Team by name, or the only team when the club has one.
pub fn select_team<'a>(club: &'a Club, name: Option<&str>) -> Result<&'a Team> {
    match name {
        Some(name) => club
            .team(name)
            .ok_or_else(|| anyhow!("no team named '{name}' in roster")),
        None => match club.teams.as_slice() {
            [only] => Ok(only),
            [] => Err(anyhow!("roster has no teams")),
            many => Err(anyhow!(
                "roster has {} teams, pick one with --team ({})",
                many.len(),
                many.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
            )),
        },
    }
}
