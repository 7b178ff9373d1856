use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::Parser;
use pelagica::{
    favourites::FavouriteStore,
    scoring::{ScoringConfig, leaderboard},
    window::{Window, previous_hour},
};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

/// Writes fake favourites into the previous hour so `FAV_DEBUG_WINDOW=true` has something to score.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "data/processed")]
    data_dir: PathBuf,

    #[arg(long, default_value_t = 25)]
    sessions: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Chance that a session takes its favourite back later in the hour.
    #[arg(long, default_value_t = 0.2)]
    unfavourite_rate: f64,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "Orcinus orca,Salmo trutta,Gadus morhua,Thunnus thynnus"
    )]
    species: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(!args.species.is_empty(), "no species given");

    let store = FavouriteStore::new(&args.data_dir, Duration::zero())?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let now = Utc::now();
    let span = previous_hour(now);

    for session in 0..args.sessions {
        let sid = format!("tester-{}-{session}", now.timestamp());
        let Some(species) = args.species.choose(&mut rng) else {
            continue;
        };

        let favourited_at = span.start + Duration::seconds(rng.random_range(0..1800));
        store.toggle(&sid, species, true, favourited_at)?;

        if rng.random_bool(args.unfavourite_rate.clamp(0.0, 1.0)) {
            let dropped_at = favourited_at + Duration::seconds(rng.random_range(60..1500));
            store.toggle(&sid, species, false, dropped_at)?;
        }
    }

    let config = ScoringConfig {
        window: Window::PreviousHour,
        ..ScoringConfig::default()
    };
    let board = leaderboard(&store.events()?, &store.winners()?, now, &config);

    println!(
        "Wrote {} sessions into {} .. {}",
        args.sessions, span.start, span.end
    );
    for row in &board {
        println!(
            "{:<24} raw {:>3}  x{:.2}  score {:.2}",
            row.species, row.raw, row.multiplier, row.score
        );
    }

    Ok(())
}
