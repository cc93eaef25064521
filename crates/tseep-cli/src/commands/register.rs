//! The `tseep register` command.

use std::path::PathBuf;

use anyhow::Result;

use tseep_core::model::{Registration, UserStatus};
use tseep_core::traits::SessionStore;

use super::App;

pub async fn execute(
    name: String,
    email: String,
    mobile: String,
    status: String,
    password: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let status: UserStatus = status.parse().map_err(anyhow::Error::msg)?;
    let registration = Registration {
        name,
        email,
        mobile_no: mobile,
        status,
        password,
    };
    registration.validate()?;

    let app = App::load(config_path)?;
    let before = app.session.load();
    let message = app.client.register(&registration).await?;
    println!("{message}");
    match app.session.load() {
        Some(session) if Some(&session) != before.as_ref() => {
            println!("Logged in as {}", session.user_id)
        }
        _ => println!("Now log in: tseep login --mobile {}", registration.mobile_no),
    }
    Ok(())
}
