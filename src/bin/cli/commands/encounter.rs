use anyhow::{Context, Result};

use lexis_lib::encounters::{EncounterRecord, ListOptions};

use crate::app::App;
use crate::render::{paint, print_json, Color};
use crate::OutputFormat;

pub fn run_record(
    app: &App,
    word: &str,
    language: &str,
    context: Option<&str>,
    source: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let record = app
        .tracker
        .encounters
        .record_encounter(&app.user_id, word, language, context, source)
        .context("Failed to record encounter")?;

    output_record(app, &record, format, use_color)
}

pub fn run_lookup(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let record = app
        .tracker
        .encounters
        .mark_looked_up(&app.user_id, word, language)
        .with_context(|| format!("Failed to mark '{}' as looked up", word))?;

    output_record(app, &record, format, use_color)
}

pub fn run_discover(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let record = app
        .tracker
        .encounters
        .mark_self_discovered(&app.user_id, word, language)
        .with_context(|| format!("Failed to mark '{}' as self-discovered", word))?;

    output_record(app, &record, format, use_color)
}

pub fn run_show(app: &App, word: &str, language: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let record = app
        .tracker
        .encounters
        .get_record(&app.user_id, word, language)
        .context("Failed to get encounter record")?;

    match record {
        Some(record) => output_record(app, &record, format, use_color),
        None => {
            match format {
                OutputFormat::Json => println!("null"),
                OutputFormat::Plain => println!("'{}' has not been encountered yet.", word),
            }
            Ok(())
        }
    }
}

pub fn run_list(
    app: &App,
    language: Option<String>,
    unlocked_only: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let options = ListOptions {
        language,
        unlocked_only,
    };
    let records = app
        .tracker
        .encounters
        .list_records(&app.user_id, &options)
        .context("Failed to list encounter records")?;

    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Plain => {
            if records.is_empty() {
                println!("No words yet.");
            }
            for record in &records {
                println!("{}", summary_line(app, record, use_color));
            }
        }
    }

    Ok(())
}

pub fn run_stats(app: &App, language: Option<&str>, format: &OutputFormat) -> Result<()> {
    let stats = app
        .tracker
        .encounters
        .get_stats(&app.user_id, language)
        .context("Failed to get encounter stats")?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Plain => {
            println!("Words:           {}", stats.total);
            println!("Unlocked:        {}", stats.unlocked);
            println!("Self-discovered: {}", stats.self_discovered);
            println!("Looked up:       {}", stats.looked_up);
            println!("Pending unlock:  {}", stats.pending_unlock);
        }
    }

    Ok(())
}

fn output_record(app: &App, record: &EncounterRecord, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(record)?,
        OutputFormat::Plain => {
            println!("{}", summary_line(app, record, use_color));
            if let Some(context) = &record.context {
                println!("  {}", paint(context, Color::DIM, use_color));
            }
            println!(
                "  First seen {}, last seen {}",
                record.first_seen_at.format("%Y-%m-%d"),
                record.last_seen_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

fn summary_line(app: &App, record: &EncounterRecord, use_color: bool) -> String {
    let status = if record.definition_unlocked {
        let how = if record.looked_up {
            " (looked up)"
        } else if record.self_discovered {
            " (self-discovered)"
        } else {
            ""
        };
        paint(&format!("unlocked{}", how), Color::GREEN, use_color)
    } else {
        paint(
            &format!(
                "locked {}/{}",
                record.encounter_count, app.config.encounters.unlock_threshold
            ),
            Color::YELLOW,
            use_color,
        )
    };

    format!(
        "{} [{}] seen {}x, {}",
        paint(&record.word, Color::BOLD, use_color),
        record.language,
        record.encounter_count,
        status
    )
}
