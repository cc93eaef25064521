//! The `tseep logout` command.

use std::path::PathBuf;

use anyhow::Result;

use tseep_core::traits::SessionStore;

use super::App;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let app = App::load(config_path)?;
    if app.session.load().is_none() {
        println!("Not logged in.");
        return Ok(());
    }
    app.client.logout()?;
    println!("Logged out.");
    Ok(())
}
