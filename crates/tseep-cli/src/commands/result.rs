//! The `tseep result` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use tseep_core::model::ResultSummary;

use super::App;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path)?;
    show(&app).await
}

/// Fetch the scored answers for the logged-in user and print them.
pub async fn show(app: &App) -> Result<()> {
    let user_id = app.user_id()?;
    let answers = app.api().results(&user_id).await?;
    let summary = ResultSummary::new(answers, app.config.max_score);
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ResultSummary) {
    if !summary.answers.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Question", "Answer", "Score"]);
        for answer in &summary.answers {
            let selected = answer
                .extra
                .get("selectedAnswer")
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            table.add_row(vec![
                Cell::new(
                    answer
                        .index()
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(selected),
                Cell::new(answer.score),
            ]);
        }
        println!("{table}");
    }
    println!("Your score: {summary}");
}
