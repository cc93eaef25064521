//! The `tseep` command: take the assessment from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tseep", version, about = "Online assessment client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter tseep.toml
    Init,

    /// Create an account
    Register {
        /// Full name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Mobile number (digits only)
        #[arg(long)]
        mobile: String,

        /// Current status: student or employee
        #[arg(long, default_value = "student")]
        status: String,

        /// Password (at least 6 characters)
        #[arg(long)]
        password: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Log in and store the session
    Login {
        /// 10-digit mobile number
        #[arg(long)]
        mobile: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Forget the stored session
    Logout {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Answer the questions interactively
    Quiz {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show your scored answers and total
    Result {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rate the test (1-5) and leave a comment
    Feedback {
        /// 1 = very dissatisfied ... 5 = very satisfied
        #[arg(long)]
        rating: Option<u8>,

        /// Free-form comment
        #[arg(long)]
        comment: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tseep=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Register {
            name,
            email,
            mobile,
            status,
            password,
            config,
        } => commands::register::execute(name, email, mobile, status, password, config).await,
        Commands::Login {
            mobile,
            password,
            config,
        } => commands::login::execute(mobile, password, config).await,
        Commands::Logout { config } => commands::logout::execute(config),
        Commands::Quiz { config } => commands::quiz::execute(config).await,
        Commands::Result { config } => commands::result::execute(config).await,
        Commands::Feedback {
            rating,
            comment,
            config,
        } => commands::feedback::execute(rating, comment, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
