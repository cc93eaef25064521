//! The `tseep login` command.

use std::path::PathBuf;

use anyhow::Result;

use tseep_core::model::Credentials;

use super::App;

pub async fn execute(
    mobile: String,
    password: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let credentials = Credentials::new(mobile, password);
    // Reject a malformed form before touching config or network.
    credentials.validate()?;

    let app = App::load(config_path)?;
    let session = app.client.login(&credentials).await?;
    println!("Logged in as {}", session.user_id);
    Ok(())
}
