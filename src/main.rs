use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod auth;
mod client;
mod config;
mod error;
mod models;
mod recommend;
mod service;
mod tracks;

use crate::config::load_config;
use crate::error::MatchError;
use crate::models::Term;
use crate::service::{AuthMode, PredictionReport, Recommender};
use crate::tracks::LoadedTable;

/// Playlist used by `predict` when none is given
const DEFAULT_PLAYLIST_ID: &str = "37i9dQZF1DXb5BKLTO7ULa";

#[derive(Parser)]
#[command(name = "playlist-match")]
#[command(about = "Find the song in a playlist that best matches your top tracks")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding cached track tables (overrides PLAYLIST_MATCH_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Allow the interactive Spotify authorization prompt
    #[arg(long, global = true, conflicts_with = "offline")]
    login: bool,

    /// Skip authentication and use cached or default data only
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show your most listened songs
    TopTracks {
        #[arg(short, long, value_enum, default_value_t = Term::ShortTerm)]
        term: Term,

        /// Maximum number of songs to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of songs to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Show the songs in a playlist
    Playlist {
        /// Spotify playlist id
        playlist_id: String,
    },
    /// Predict which playlist song is most similar to one of your top songs
    Predict {
        #[arg(short, long, value_enum, default_value_t = Term::ShortTerm)]
        term: Term,

        #[arg(short, long, default_value = DEFAULT_PLAYLIST_ID)]
        playlist_id: String,

        /// Also show the closest playlist song for each of your top songs
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<MatchError>() {
            Some(err) if err.is_not_found() => {
                eprintln!("Not found: {err}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = load_config()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let mode = if args.offline {
        AuthMode::Offline
    } else if args.login {
        AuthMode::Interactive
    } else {
        AuthMode::Cached
    };

    let recommender = Recommender::connect(&config, mode)?;
    if !recommender.is_authenticated() && mode != AuthMode::Offline {
        eprintln!("Not able to authenticate, continue with cached or default data.");
    }

    match args.command {
        Command::TopTracks {
            term,
            limit,
            offset,
        } => {
            let loaded = recommender.top_tracks(term, limit, offset)?;
            print_tracks(&format!("Your top tracks ({term})"), &loaded, args.json)?;
        }
        Command::Playlist { playlist_id } => {
            let loaded = recommender.playlist_tracks(&playlist_id)?;
            print_tracks(&format!("Playlist {playlist_id}"), &loaded, args.json)?;
        }
        Command::Predict {
            term,
            playlist_id,
            all,
        } => {
            let report = recommender.predict(term, &playlist_id, all)?;
            print_prediction(&report, args.json)?;
        }
    }

    Ok(())
}

fn print_tracks(title: &str, loaded: &LoadedTable, json: bool) -> Result<()> {
    if json {
        let records: Vec<_> = loaded.table.iter().map(|t| &t.record).collect();
        let out = serde_json::json!({
            "source": loaded.provenance,
            "tracks": records,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{title} [{}]", loaded.provenance);
    println!("{}", "=".repeat(title.len()));
    if loaded.table.is_empty() {
        println!("No tracks.");
    }
    for (i, track) in loaded.table.iter().enumerate() {
        println!("{:>3}. {}", i + 1, track.display_name());
    }
    Ok(())
}

fn print_prediction(report: &PredictionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if report.is_degraded() {
        println!("(prediction based on default data)");
    }
    println!("Favourite song:    {}", report.result.favourite_song);
    println!("Most similar song: {}", report.result.most_similar_song);
    println!("Distance:          {:.4}", report.result.distance);

    if let Some(rows) = &report.per_track {
        println!("\nClosest playlist song per top track:");
        for (i, row) in rows.iter().enumerate() {
            println!(
                "{:>3}. {} -> {} ({:.4})",
                i + 1,
                row.favourite_song,
                row.most_similar_song,
                row.distance
            );
        }
    }
    Ok(())
}
