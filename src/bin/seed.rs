//! Demo data seeder for pulseboard
//!
//! Fills users, teams, projects, documents with sections, daily visitor
//! stats and one KPI snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Seed the configured database (PULSEBOARD__DATABASE_URL / _PATH)
//! cargo run --bin seed
//!
//! # Wipe first, seed 180 days into a specific sqlite file
//! cargo run --bin seed -- --db ./demo.db --days 180 --reset
//!
//! # Then start the server with this database:
//! PULSEBOARD__DATABASE_PATH=./demo.db cargo run
//! ```

use chrono::{Datelike, Duration, Utc, Weekday};
use rand::prelude::*;
use rand_distr::Normal;
use std::path::PathBuf;
use std::time::Instant;

use pulseboard::config::Settings;
use pulseboard::db::{self, Pool};
use pulseboard::domain::{
    CreateDocument, CreateMetrics, CreateSection, CreateUser, DeviceType, SectionStatus,
    SectionType, UserId, VisitorStat,
};
use pulseboard::error::{Error, Result};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Alan", "Radia",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson", "Allen",
    "Turing", "Perlman",
];

const TEAM_NAMES: &[&str] = &["Alpha Team", "Bravo Team", "Design Crew", "Backend Guild"];

const ROLES: &[&str] = &["Member", "Member", "Lead", "Admin"];

const DOCUMENT_TITLES: &[&str] = &[
    "Quarterly Business Review",
    "Platform Migration Proposal",
    "Security Audit Findings",
    "Annual Budget Narrative",
    "Customer Onboarding Playbook",
];

const SECTION_WORDS: &[&str] = &[
    "overview", "scope", "timeline", "risks", "budget", "staffing", "metrics", "goals",
    "appendix", "summary", "findings", "next steps",
];

const PROJECT_NAMES: &[&str] = &[
    "Aurora", "Beacon", "Cascade", "Drift", "Ember", "Fathom", "Granite", "Harbor",
];

/// Average daily visitors per device type
const DESKTOP_MEAN: f64 = 620.0;
const MOBILE_MEAN: f64 = 340.0;

struct Options {
    db: Option<PathBuf>,
    days: i64,
    reset: bool,
}

fn print_usage() {
    eprintln!(
        r#"pulseboard demo data seeder

Usage: seed [OPTIONS]

Options:
  --db <PATH>     SQLite file to seed (default: configured database)
  --days <N>      Days of visitor history ending today (default: 90)
  --reset         Delete all existing rows first
  -h, --help      Show this message"#
    );
}

fn parse_args(args: &[String]) -> std::result::Result<Options, String> {
    let mut options = Options {
        db: None,
        days: 90,
        reset: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                i += 1;
                let path = args.get(i).ok_or("--db needs a path")?;
                options.db = Some(PathBuf::from(path));
            }
            "--days" => {
                i += 1;
                let raw = args.get(i).ok_or("--days needs a number")?;
                options.days = raw
                    .parse()
                    .map_err(|_| format!("Invalid days count: {}", raw))?;
                if options.days < 1 {
                    return Err("--days must be at least 1".to_string());
                }
            }
            "--reset" => options.reset = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(options)
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Weekends are quieter on desktop and slightly busier on mobile
fn weekday_factor(day: Weekday, device: DeviceType) -> f64 {
    let weekend = matches!(day, Weekday::Sat | Weekday::Sun);
    match (weekend, device) {
        (true, DeviceType::Desktop) => 0.6,
        (true, DeviceType::Mobile) => 1.15,
        _ => 1.0,
    }
}

async fn seed_users(pool: &Pool, rng: &mut impl Rng) -> Result<Vec<UserId>> {
    let mut ids = Vec::new();
    for (first, last) in FIRST_NAMES.iter().zip(LAST_NAMES) {
        let id = db::create_user(
            pool,
            CreateUser {
                name: format!("{} {}", first, last),
                email: format!("{}.{}@example.com", first, last),
                avatar_url: Some(format!(
                    "https://avatars.example.com/{}.png",
                    rng.random_range(1..=70)
                )),
            },
        )
        .await?;
        ids.push(id);
    }
    println!("  Users: {}", ids.len());
    Ok(ids)
}

async fn seed_teams(pool: &Pool, rng: &mut impl Rng, users: &[UserId]) -> Result<()> {
    let mut teams = Vec::new();
    for name in TEAM_NAMES {
        teams.push(db::create_team(pool, name).await?);
    }

    let mut memberships = 0;
    for user in users {
        let count = rng.random_range(1..=2);
        for team in teams.choose_multiple(rng, count) {
            db::add_team_member(pool, *team, *user, pick(rng, ROLES)).await?;
            memberships += 1;
        }
    }
    println!("  Teams: {} ({} memberships)", teams.len(), memberships);
    Ok(())
}

async fn seed_documents(pool: &Pool, rng: &mut impl Rng, users: &[UserId]) -> Result<()> {
    let mut sections = 0;
    for title in DOCUMENT_TITLES {
        let document_id = db::create_document(
            pool,
            CreateDocument {
                title: title.to_string(),
                owner_id: users.choose(rng).copied(),
            },
        )
        .await?;

        for order in 0..rng.random_range(3..=10) {
            let header = (0..rng.random_range(2..=4))
                .map(|_| pick(rng, SECTION_WORDS))
                .collect::<Vec<_>>()
                .join(" ");
            let reviewer_id = if rng.random_bool(0.7) {
                users.choose(rng).copied()
            } else {
                None
            };

            db::create_section(
                pool,
                CreateSection {
                    document_id,
                    header: capitalize(&header),
                    section_type: SectionType::ALL.choose(rng).copied(),
                    status: SectionStatus::ALL.choose(rng).copied().unwrap_or_default(),
                    target: Some(rng.random_range(500..=2000)),
                    limit: Some(rng.random_range(2000..=5000)),
                    reviewer_id,
                    order,
                },
            )
            .await?;
            sections += 1;
        }
    }
    println!(
        "  Documents: {} ({} sections)",
        DOCUMENT_TITLES.len(),
        sections
    );
    Ok(())
}

async fn seed_visitors(pool: &Pool, rng: &mut impl Rng, days: i64) -> Result<()> {
    let today = Utc::now().date_naive();
    let desktop = Normal::new(DESKTOP_MEAN, DESKTOP_MEAN * 0.2)
        .map_err(|e| Error::Internal(format!("desktop distribution: {}", e)))?;
    let mobile = Normal::new(MOBILE_MEAN, MOBILE_MEAN * 0.25)
        .map_err(|e| Error::Internal(format!("mobile distribution: {}", e)))?;

    let mut rows = 0;
    for offset in 0..days {
        let day = today - Duration::days(offset);
        // Mild upward trend toward today
        let trend = 1.0 + 0.3 * (1.0 - offset as f64 / days as f64);

        for (device, dist) in [(DeviceType::Desktop, &desktop), (DeviceType::Mobile, &mobile)] {
            let sample = dist.sample(rng) * trend * weekday_factor(day.weekday(), device);
            let count = sample.round().max(0.0) as i64;
            db::upsert_visitor_stat(pool, &VisitorStat::daily(day, device, count)).await?;
            rows += 1;
        }
    }
    println!("  Visitor stats: {} rows over {} days", rows, days);
    Ok(())
}

async fn seed_metrics(pool: &Pool, rng: &mut impl Rng) -> Result<()> {
    let revenue_cents = rng.random_range(5_000_000..=100_000_000i64);
    let growth_bp = rng.random_range(-500..=1500i64);

    db::insert_metrics(
        pool,
        CreateMetrics {
            recorded_at: Some(Utc::now()),
            total_revenue: Some(revenue_cents as f64 / 100.0),
            new_customers: Some(rng.random_range(50..=500)),
            active_accounts: Some(rng.random_range(1000..=10000)),
            growth_rate: Some(growth_bp as f64 / 100.0),
        },
    )
    .await?;
    println!("  Dashboard metrics: 1 snapshot");
    Ok(())
}

async fn seed_projects(pool: &Pool, rng: &mut impl Rng) -> Result<()> {
    for name in PROJECT_NAMES {
        let description = format!(
            "Workstream covering {} and {}.",
            pick(rng, SECTION_WORDS),
            pick(rng, SECTION_WORDS)
        );
        db::create_project(pool, &format!("{} Project", name), Some(&description)).await?;
    }
    println!("  Projects: {}", PROJECT_NAMES.len());
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    let db_url = match &options.db {
        Some(path) => format!("sqlite:{}?mode=rwc", path.display()),
        None => Settings::new()?.database_url(),
    };

    println!("{}", "=".repeat(60));
    println!("Pulseboard - Demo Data Seeder");
    println!("{}", "=".repeat(60));
    println!("Database: {}", db_url);
    println!("Days of history: {}", options.days);
    println!();

    let start = Instant::now();
    let pool = db::create_pool(&db_url).await?;
    db::run_migrations(&pool).await?;

    if options.reset {
        println!("Clearing existing data...");
        db::clear_all(&pool).await?;
    }

    let mut rng = rand::rng();

    println!("Seeding:");
    let users = seed_users(&pool, &mut rng).await?;
    seed_teams(&pool, &mut rng, &users).await?;
    seed_documents(&pool, &mut rng, &users).await?;
    seed_visitors(&pool, &mut rng, options.days).await?;
    seed_metrics(&pool, &mut rng).await?;
    seed_projects(&pool, &mut rng).await?;

    println!("\nSeeding finished in {:.2?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(&[]).unwrap();
        assert!(options.db.is_none());
        assert_eq!(options.days, 90);
        assert!(!options.reset);
    }

    #[test]
    fn test_parse_args_all() {
        let options = parse_args(&args(&["--db", "demo.db", "--days", "30", "--reset"])).unwrap();
        assert_eq!(options.db, Some(PathBuf::from("demo.db")));
        assert_eq!(options.days, 30);
        assert!(options.reset);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--days"])).is_err());
        assert!(parse_args(&args(&["--days", "zero"])).is_err());
        assert!(parse_args(&args(&["--days", "0"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_weekday_factor() {
        assert!(weekday_factor(Weekday::Sat, DeviceType::Desktop) < 1.0);
        assert!(weekday_factor(Weekday::Sun, DeviceType::Mobile) > 1.0);
        assert_eq!(weekday_factor(Weekday::Wed, DeviceType::Desktop), 1.0);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("scope timeline"), "Scope timeline");
        assert_eq!(capitalize(""), "");
    }
}
