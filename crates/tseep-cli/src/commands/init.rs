//! The `tseep init` command.

use std::path::Path;

use anyhow::Result;

use tseep_client::config::{ClientConfig, LOCAL_CONFIG_FILE};

pub fn execute() -> Result<()> {
    if Path::new(LOCAL_CONFIG_FILE).exists() {
        println!("{LOCAL_CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(LOCAL_CONFIG_FILE, ClientConfig::starter_toml())?;
        println!("Created {LOCAL_CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Edit {LOCAL_CONFIG_FILE} if your server is not the default one");
    println!("  2. Run: tseep register --name <name> --email <email> --mobile <mobile> --status student --password <password>");
    println!("  3. Run: tseep login --mobile <mobile> --password <password>");
    println!("  4. Run: tseep quiz");

    Ok(())
}
