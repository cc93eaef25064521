//! The `tseep feedback` command.

use std::path::PathBuf;

use anyhow::Result;

use tseep_core::model::Rating;
use tseep_core::FeedbackSubmitter;

use super::App;

pub async fn execute(
    rating: Option<u8>,
    comment: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let app = App::load(config_path)?;
    let form = FeedbackSubmitter::new(app.api(), app.session.as_ref())?;

    if let Some(value) = rating {
        let rating = form.set_rating(value)?;
        println!("Rating: {rating}");
    } else {
        eprintln!("How was your experience?");
        for rating in Rating::all() {
            eprintln!("  {} = {}", rating.value(), rating.label());
        }
    }
    if let Some(comment) = comment {
        form.set_comment(comment);
    }

    let message = form.submit().await?;
    println!("{message}");
    Ok(())
}
