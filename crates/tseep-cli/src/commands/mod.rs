pub mod feedback;
pub mod init;
pub mod login;
pub mod logout;
pub mod quiz;
pub mod register;
pub mod result;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tseep_client::{load_config_from, ClientConfig, TseepClient};
use tseep_core::traits::{SessionObserver, SessionStore};
use tseep_core::{AssessmentApi, FileSessionStore};

/// Tells the user to log in again when the session is dropped.
struct ConsoleSessionObserver;

impl SessionObserver for ConsoleSessionObserver {
    fn on_session_expired(&self, reason: &str) {
        eprintln!("Session expired ({reason}), please log in again: tseep login");
    }
}

/// Everything a command needs: config, the persisted session and the client.
pub struct App {
    pub config: ClientConfig,
    pub session: Arc<FileSessionStore>,
    pub client: Arc<TseepClient>,
}

impl App {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let session = Arc::new(FileSessionStore::open(config.session_file.clone()));
        let store: Arc<dyn SessionStore> = session.clone();
        let client = TseepClient::from_config(&config, store)
            .context("failed to build HTTP client")?
            .with_observer(Arc::new(ConsoleSessionObserver));
        tracing::debug!(
            base_url = %config.base_url,
            session_file = %config.session_file.display(),
            "loaded config"
        );
        Ok(Self {
            config,
            session,
            client: Arc::new(client),
        })
    }

    pub fn api(&self) -> Arc<dyn AssessmentApi> {
        self.client.clone()
    }

    pub fn user_id(&self) -> Result<String> {
        self.session
            .user_id()
            .context("not logged in, run: tseep login")
    }
}
