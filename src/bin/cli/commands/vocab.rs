use anyhow::{Context, Result};

use lexis_lib::vocabulary::VocabularyState;

use crate::app::App;
use crate::render::{paint, print_json, Color};
use crate::OutputFormat;

pub fn run_recognize(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let state = app
        .tracker
        .vocabulary
        .record_recognition(&app.user_id, word, language)
        .context("Failed to record recognition")?;

    output_state(&state, format, use_color)
}

pub fn run_produce(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let state = app
        .tracker
        .vocabulary
        .record_production(&app.user_id, word, language)
        .context("Failed to record production")?;

    output_state(&state, format, use_color)
}

pub fn run_show(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let state = app
        .tracker
        .vocabulary
        .get_state(&app.user_id, word, language)
        .context("Failed to get vocabulary state")?;

    match state {
        Some(state) => output_state(&state, format, use_color),
        None => {
            match format {
                OutputFormat::Json => println!("null"),
                OutputFormat::Plain => println!("No recognition or production recorded for '{}'.", word),
            }
            Ok(())
        }
    }
}

pub fn run_gap(app: &App, language: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let gap = app
        .tracker
        .vocabulary
        .get_production_gap(&app.user_id, language)
        .context("Failed to compute production gap")?;

    match format {
        OutputFormat::Json => print_json(&gap)?,
        OutputFormat::Plain => {
            println!(
                "Production gap: {}",
                paint(&format!("{}%", gap.gap_percentage), Color::BOLD, use_color)
            );
            println!("  Recognize only: {}", gap.recognize_only_count);
            println!("  Produce only:   {}", gap.produce_only_count);
            println!("  Both:           {}", gap.both_count);

            if !gap.focus_words.is_empty() {
                println!();
                println!("Focus words:");
                for focus in &gap.focus_words {
                    println!(
                        "  {} [{}] recognized {}x",
                        paint(&focus.word, Color::YELLOW, use_color),
                        focus.language,
                        focus.recognition_count
                    );
                }
            }
        }
    }

    Ok(())
}

pub fn run_stats(app: &App, language: Option<&str>, format: &OutputFormat) -> Result<()> {
    let stats = app
        .tracker
        .vocabulary
        .get_stats(&app.user_id, language)
        .context("Failed to get vocabulary stats")?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Plain => {
            println!("Words:      {}", stats.total_words);
            println!("Recognized: {}", stats.recognized);
            println!("Produced:   {}", stats.produced);
            println!("Gap words:  {}", stats.gap_words);
        }
    }

    Ok(())
}

fn output_state(state: &VocabularyState, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(state)?,
        OutputFormat::Plain => {
            let mark = |yes: bool| {
                if yes {
                    paint("yes", Color::GREEN, use_color)
                } else {
                    paint("no", Color::RED, use_color)
                }
            };
            println!("{} [{}]", paint(&state.word, Color::BOLD, use_color), state.language);
            println!("  Recognize: {} ({}x)", mark(state.can_recognize), state.recognition_count);
            println!("  Produce:   {} ({}x)", mark(state.can_produce), state.production_count);
        }
    }
    Ok(())
}
