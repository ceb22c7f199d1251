//! Pexo Forms auth CLI.
//!
//! A small front end over `pexo-core`: it seeds the demo accounts,
//! opens and clears sessions, resets passwords, registers accounts,
//! and runs the expiry sweep. Persisted state lives under the platform
//! data directory (override with `PEXO_STATE_DIR`).

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pexo_core::{
    check_access, spawn_expiry_sweep, Clock, Config, RestoreOutcome, Role, SessionEvent,
    SessionManager, StateStore, SystemClock, RESET_PASSWORD, SWEEP_INTERVAL,
};

#[derive(Parser)]
#[command(name = "pexo", about = "Pexo Forms accounts and sessions", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the demo accounts if no database exists yet
    Seed,
    /// Sign in and open a 30-minute session
    SignIn {
        /// Account email; defaults to the last one used
        email: Option<String>,
        /// Read the password from this flag instead of prompting
        #[arg(long)]
        password: Option<String>,
    },
    /// Clear the active session
    SignOut,
    /// Show the current session, if any
    Status,
    /// Overwrite the account password with the fixed reset value
    ResetPassword { email: String },
    /// Create a new account
    Register {
        name: String,
        email: String,
        #[arg(long, default_value = "respondent")]
        role: Role,
        /// Read the password from this flag instead of prompting
        #[arg(long)]
        password: Option<String>,
    },
    /// Run the expiry sweep until interrupted
    Watch,
    /// Report the access decision for a path
    Check {
        path: String,
        /// Gate the path as publisher-only
        #[arg(long)]
        publisher: bool,
    },
}

fn init_tracing() {
    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let store = StateStore::new(Config::state_dir()?).context("Failed to open state store")?;
    let mut manager = SessionManager::new(store.clone(), Arc::new(SystemClock));

    match cli.command {
        Commands::Seed => {
            manager.credentials().seed()?;
            println!("Demo accounts ready.");
        }
        Commands::SignIn { email, password } => sign_in(&mut manager, email, password)?,
        Commands::SignOut => {
            manager.sign_out()?;
            println!("Signed out.");
        }
        Commands::Status => status(&mut manager)?,
        Commands::ResetPassword { email } => {
            manager.reset_password(&email)?;
            println!("Password for {} reset to \"{}\".", email, RESET_PASSWORD);
        }
        Commands::Register {
            name,
            email,
            role,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")
                    .context("Failed to read password")?,
            };
            manager.credentials().register(&name, &email, &password, role)?;
            println!("Registered {} as {}.", email, role);
        }
        Commands::Watch => watch(store).await?,
        Commands::Check { path, publisher } => check(&mut manager, &path, publisher)?,
    }

    Ok(())
}

fn sign_in(
    manager: &mut SessionManager,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => bail!("No email given and none remembered; run `pexo sign-in <email>`"),
    };

    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?,
    };

    let session = manager.sign_in(&email, &password)?;

    config.last_email = Some(session.email.clone());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to remember last email");
    }

    println!(
        "Signed in as {} ({}), session expires in {} minutes.",
        session.name,
        session.role,
        session.minutes_until_expiry(SystemClock.now())
    );
    Ok(())
}

fn status(manager: &mut SessionManager) -> Result<()> {
    match manager.restore_session()? {
        RestoreOutcome::Restored(session) => {
            println!(
                "{} <{}> — {}, {} minutes remaining",
                session.name,
                session.email,
                session.role,
                session.minutes_until_expiry(SystemClock.now())
            );
        }
        RestoreOutcome::Expired => {
            println!("Your session has expired. Please sign in again.");
        }
        RestoreOutcome::Anonymous => println!("Not signed in."),
    }
    Ok(())
}

fn check(manager: &mut SessionManager, path: &str, publisher: bool) -> Result<()> {
    manager.restore_session()?;
    match check_access(manager, path, publisher).redirect_target() {
        None => println!("allow {}", path),
        Some(target) => println!("redirect {}", target),
    }
    Ok(())
}

async fn watch(store: StateStore) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(8);
    let handle = spawn_expiry_sweep(store, Arc::new(SystemClock), SWEEP_INTERVAL, tx);

    println!("Watching for session expiry (Ctrl-C to stop)...");
    loop {
        tokio::select! {
            Some(SessionEvent::Expired { message }) = rx.recv() => println!("{}", message),
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.abort();
    Ok(())
}
