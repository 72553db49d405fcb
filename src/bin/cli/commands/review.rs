use anyhow::{Context, Result};
use uuid::Uuid;

use lexis_lib::review::algorithm::format_interval;
use lexis_lib::review::{NewReviewItem, ReviewItem};

use crate::app::App;
use crate::render::{paint, print_json, Color};
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run_add(
    app: &App,
    id: Option<String>,
    language: &str,
    original: &str,
    correct: &str,
    context: Option<String>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let request = NewReviewItem {
        user_id: app.user_id.clone(),
        item_id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        language: language.to_string(),
        original: original.to_string(),
        correct_answer: correct.to_string(),
        context,
    };

    let item = app
        .tracker
        .scheduler
        .record_new_item(request)
        .context("Failed to schedule review item")?;

    match format {
        OutputFormat::Json => print_json(&item)?,
        OutputFormat::Plain => {
            println!("Scheduled for review: {}", paint(&item.item_id, Color::BOLD, use_color));
            println!("  {} -> {}", item.original, item.correct_answer);
        }
    }

    Ok(())
}

pub fn run_due(app: &App, language: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let items = app
        .tracker
        .scheduler
        .get_due_items(&app.user_id, language)
        .context("Failed to list due items")?;

    match format {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Plain => {
            if items.is_empty() {
                println!("Nothing due.");
            }
            for item in &items {
                println!(
                    "{} [{}] {} {}",
                    paint(&item.item_id, Color::BOLD, use_color),
                    item.language,
                    item.original,
                    paint(&format!("(due {})", item.due_at.format("%Y-%m-%d %H:%M")), Color::DIM, use_color),
                );
            }
        }
    }

    Ok(())
}

pub fn run_grade(
    app: &App,
    item_id: &str,
    quality: i32,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let completion = app
        .tracker
        .complete_review(item_id, quality)
        .with_context(|| format!("Failed to grade review item {}", item_id))?;

    match format {
        OutputFormat::Json => print_json(&completion)?,
        OutputFormat::Plain => {
            let item = &completion.item;
            // A passing recall always leaves at least one repetition
            let verdict = if item.repetition_count > 0 {
                paint("passed", Color::GREEN, use_color)
            } else {
                paint("failed", Color::RED, use_color)
            };
            println!("{} {}: next review in {}", item.item_id, verdict, format_interval(item.interval_days));
            println!(
                "  EF {:.2}, repetitions {}, due {}",
                item.easiness_factor,
                item.repetition_count,
                item.due_at.format("%Y-%m-%d")
            );
            for state in &completion.production {
                println!("  '{}' produced {}x", state.word, state.production_count);
            }
        }
    }

    Ok(())
}

pub fn run_show(app: &App, item_id: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let item = app
        .tracker
        .scheduler
        .get_item(item_id)
        .with_context(|| format!("Failed to get review item {}", item_id))?;
    let preview = app.tracker.scheduler.preview_intervals(&item);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "item": item,
                "previewIntervals": preview,
            });
            print_json(&output)?;
        }
        OutputFormat::Plain => print_item(&item, &preview, use_color),
    }

    Ok(())
}

fn print_item(item: &ReviewItem, preview: &[u32; 6], use_color: bool) {
    println!("{} [{}]", paint(&item.item_id, Color::BOLD, use_color), item.language);
    println!("  {} -> {}", item.original, item.correct_answer);
    if let Some(context) = &item.context {
        println!("  {}", paint(context, Color::DIM, use_color));
    }
    println!(
        "  EF {:.2}, interval {}, repetitions {}",
        item.easiness_factor,
        format_interval(item.interval_days),
        item.repetition_count
    );
    match item.last_reviewed_at {
        Some(at) => println!("  Last reviewed {}", at.format("%Y-%m-%d %H:%M")),
        None => println!("  Never reviewed"),
    }
    println!("  Due {}", item.due_at.format("%Y-%m-%d %H:%M"));

    let labels: Vec<String> = preview
        .iter()
        .enumerate()
        .map(|(quality, days)| format!("{}={}", quality, format_interval(*days)))
        .collect();
    println!("  Next interval by quality: {}", labels.join("  "));
}

pub fn run_stats(app: &App, language: Option<&str>, format: &OutputFormat) -> Result<()> {
    let stats = app
        .tracker
        .scheduler
        .get_stats(&app.user_id, language)
        .context("Failed to get review stats")?;

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Plain => {
            println!("Due:              {}", stats.due_count);
            println!("Total:            {}", stats.total_count);
            println!("Average interval: {:.1} days", stats.average_interval);
        }
    }

    Ok(())
}
