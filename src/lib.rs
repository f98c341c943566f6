pub mod config;
pub mod fake_roster;
pub mod formation;
pub mod lineup;
pub mod match_rules;
pub mod persist;
pub mod report;
pub mod roster;
pub mod scoring;
pub mod stats;
