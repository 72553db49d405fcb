mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lexis-cli", about = "Learner knowledge-state tracker CLI", version)]
struct Cli {
    /// Data directory (default: platform local data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/lexis.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Learner id to act as
    #[arg(long, global = true, default_value = "local")]
    user: String,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Spaced repetition of harvested errors
    #[command(subcommand)]
    Review(ReviewCommand),

    /// Word encounters and definition unlocking
    #[command(subcommand)]
    Encounter(EncounterCommand),

    /// Recognition vs. production tracking
    #[command(subcommand)]
    Vocab(VocabCommand),
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// Schedule a harvested error for review
    Add {
        /// What the learner wrote
        original: String,
        /// The corrected form
        correct: String,
        #[arg(long)]
        language: String,
        /// Item id (default: random UUID)
        #[arg(long)]
        id: Option<String>,
        /// Sentence the error came from
        #[arg(long)]
        context: Option<String>,
    },

    /// List items due now
    Due {
        #[arg(long)]
        language: Option<String>,
    },

    /// Grade a review (quality 0-5)
    Grade {
        item_id: String,
        #[arg(allow_negative_numbers = true)]
        quality: i32,
    },

    /// Show one item with interval previews
    Show { item_id: String },

    /// Review statistics
    Stats {
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Subcommand)]
enum EncounterCommand {
    /// Record an exposure to a word
    Record {
        word: String,
        #[arg(long)]
        language: String,
        #[arg(long)]
        context: Option<String>,
        /// Story or lesson the word appeared in
        #[arg(long)]
        source: Option<String>,
    },

    /// Mark a word as looked up (unlocks its definition)
    Lookup {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// Mark a word as self-discovered (unlocks its definition)
    Discover {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// Show the record for a word
    Show {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// List records, most recently seen first
    List {
        #[arg(long)]
        language: Option<String>,
        /// Only words whose definition is unlocked
        #[arg(long)]
        unlocked: bool,
    },

    /// Encounter statistics
    Stats {
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Subcommand)]
enum VocabCommand {
    /// Record that a word was recognized
    Recognize {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// Record that a word was produced
    Produce {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// Show the state of a word
    Show {
        word: String,
        #[arg(long)]
        language: String,
    },

    /// Production gap and focus words
    Gap {
        #[arg(long)]
        language: Option<String>,
    },

    /// Vocabulary statistics
    Stats {
        #[arg(long)]
        language: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.data_dir.as_deref(), cli.config.as_deref(), &cli.user)?;
    let format = &cli.format;

    match cli.command {
        Command::Review(subcmd) => match subcmd {
            ReviewCommand::Add { original, correct, language, id, context } => {
                commands::review::run_add(
                    &app,
                    id,
                    &language,
                    &original,
                    &correct,
                    context,
                    format,
                    use_color,
                )?;
            }
            ReviewCommand::Due { language } => {
                commands::review::run_due(&app, language.as_deref(), format, use_color)?;
            }
            ReviewCommand::Grade { item_id, quality } => {
                commands::review::run_grade(&app, &item_id, quality, format, use_color)?;
            }
            ReviewCommand::Show { item_id } => {
                commands::review::run_show(&app, &item_id, format, use_color)?;
            }
            ReviewCommand::Stats { language } => {
                commands::review::run_stats(&app, language.as_deref(), format)?;
            }
        },
        Command::Encounter(subcmd) => match subcmd {
            EncounterCommand::Record { word, language, context, source } => {
                commands::encounter::run_record(
                    &app,
                    &word,
                    &language,
                    context.as_deref(),
                    source.as_deref(),
                    format,
                    use_color,
                )?;
            }
            EncounterCommand::Lookup { word, language } => {
                commands::encounter::run_lookup(&app, &word, &language, format, use_color)?;
            }
            EncounterCommand::Discover { word, language } => {
                commands::encounter::run_discover(&app, &word, &language, format, use_color)?;
            }
            EncounterCommand::Show { word, language } => {
                commands::encounter::run_show(&app, &word, &language, format, use_color)?;
            }
            EncounterCommand::List { language, unlocked } => {
                commands::encounter::run_list(&app, language, unlocked, format, use_color)?;
            }
            EncounterCommand::Stats { language } => {
                commands::encounter::run_stats(&app, language.as_deref(), format)?;
            }
        },
        Command::Vocab(subcmd) => match subcmd {
            VocabCommand::Recognize { word, language } => {
                commands::vocab::run_recognize(&app, &word, &language, format, use_color)?;
            }
            VocabCommand::Produce { word, language } => {
                commands::vocab::run_produce(&app, &word, &language, format, use_color)?;
            }
            VocabCommand::Show { word, language } => {
                commands::vocab::run_show(&app, &word, &language, format, use_color)?;
            }
            VocabCommand::Gap { language } => {
                commands::vocab::run_gap(&app, language.as_deref(), format, use_color)?;
            }
            VocabCommand::Stats { language } => {
                commands::vocab::run_stats(&app, language.as_deref(), format)?;
            }
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
