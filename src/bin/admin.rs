//! Admin utility for exercising the curious-mind pipelines from a terminal.
//!
//! Usage:
//!   cargo run --bin admin -- ask "cats purring in the sun" --wildcard funny
//!   cargo run --bin admin -- answer "Why do cats purr?" --count 2
//!   cargo run --bin admin -- tones
//!   cargo run --bin admin -- cache-stats
//!   cargo run --bin admin -- clear-expired

use anyhow::Result;
use clap::{Parser, Subcommand};
use curious_mind::config::Config;
use curious_mind::http::AppState;
use curious_mind::pipeline::InputKind;
use curious_mind::tones;

#[derive(Parser)]
#[command(name = "admin")]
#[command(about = "curious-mind admin utilities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a question from free-form input
    Ask {
        input: String,
        /// Tone name (funny, scientific, poetic, childlike, philosophical)
        #[arg(long)]
        wildcard: Option<String>,
        /// Track history under this user id
        #[arg(long)]
        user: Option<String>,
    },
    /// Generate one or more answers for a question
    Answer {
        question: String,
        #[arg(long)]
        wildcard: Option<String>,
        /// Generate this many answers, one per tone
        #[arg(long)]
        count: Option<usize>,
    },
    /// List the tone catalog
    Tones,
    /// Show offline cache occupancy
    CacheStats,
    /// Purge expired offline cache entries
    ClearExpired,
}

#[tokio::main]
async fn main() -> Result<()> {
    curious_mind::load_env();
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.runtime.log_level.clone())
        .init();

    let state = AppState::from_config(&config)?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            input,
            wildcard,
            user,
        } => {
            let result = state
                .questions
                .generate_question(
                    &input,
                    wildcard.as_deref(),
                    user.as_deref(),
                    None,
                    InputKind::Text,
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Answer {
            question,
            wildcard,
            count,
        } => match count {
            Some(count) => {
                let answers = state.answers.generate_multiple_answers(&question, count).await;
                println!("{}", serde_json::to_string_pretty(&answers)?);
            }
            None => {
                let tone = wildcard.as_deref().map(tones::by_name);
                let answer = state.answers.generate_answer(&question, tone, None).await?;
                println!("{}", serde_json::to_string_pretty(&answer)?);
            }
        },
        Commands::Tones => {
            println!("{}", serde_json::to_string_pretty(tones::all_tones())?);
        }
        Commands::CacheStats => {
            let stats = state.questions.cache_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::ClearExpired => {
            state.questions.clear_expired_cache().await;
            println!("Expired cache entries cleared");
        }
    }

    Ok(())
}
