//! crewcache - team attendance and show scheduling from the terminal.
//!
//! Signs in against the hosted backend (or the built-in demo backend with
//! `--demo`), refreshes the local mirrors, and prints a team's attendance
//! and availability matrices. With no team argument the signed-in user's
//! own team is shown; admins get all three.

use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crewcache_core::auth::CredentialStore;
use crewcache_core::models::Team;
use crewcache_core::store::Matrix;
use crewcache_core::{App, Config};

/// Give up after this many rejected login attempts.
const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Initialize the tracing subscriber for logging.
fn init_tracing() {
    // Use RUST_LOG to control the log level (e.g. RUST_LOG=debug).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present (silently ignore if not found).
    let _ = dotenvy::dotenv();
    init_tracing();
    info!("crewcache starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let demo = args.iter().any(|a| a == "--demo");
    let team_arg = args.iter().find(|a| !a.starts_with("--")).cloned();

    let mut app = if demo {
        println!("Running against the demo backend.");
        println!("Demo accounts share the password \"password123\" (try samurai@example.com).\n");
        App::demo()?
    } else {
        let config = Config::from_env().context("Backend not configured")?;
        App::connect(config)?
    };

    if let Some(user) = app.users.current_user() {
        println!("Signed in as {} <{}>", user.name, user.email);
    } else {
        login_interactive(&mut app).await?;
    }

    app.bootstrap().await;

    let team = match team_arg {
        Some(arg) => Some(arg.parse::<Team>().map_err(|e| anyhow!(e))?),
        None => app.users.current_team(),
    };

    match team {
        Some(team) => print_team(&mut app, team).await?,
        None => {
            // Admins have no team of their own; show all three.
            for team in Team::ALL {
                print_team(&mut app, team).await?;
            }
        }
    }

    info!("crewcache done");
    Ok(())
}

/// Prompt for credentials, offering the remembered email and any password
/// saved in the OS keychain.
async fn login_interactive(app: &mut App) -> Result<()> {
    println!("\n=== crewcache login ===\n");

    let email = match app.config.last_email.clone() {
        Some(last) => {
            print!("Email [{}]: ", last);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();
            if input.is_empty() {
                last
            } else {
                input.to_string()
            }
        }
        None => prompt_email()?,
    };

    let mut saved_password = if !app.config.is_demo() && CredentialStore::has_saved(&email) {
        CredentialStore::load(&email).ok()
    } else {
        None
    };

    let mut attempts = 0;
    loop {
        let candidate = match saved_password.take() {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };

        match app.users.login(&email, &candidate).await {
            Ok(user) => {
                if !app.config.is_demo() {
                    if let Err(e) = CredentialStore::save(&email, &candidate) {
                        warn!(error = %e, "Failed to save credentials");
                    }
                    app.config.last_email = Some(email.clone());
                    if let Err(e) = app.config.save() {
                        warn!(error = %e, "Failed to save config");
                    }
                }
                println!("Welcome, {}!\n", user.name);
                return Ok(());
            }
            Err(e) => {
                attempts += 1;
                eprintln!("{}", e);
                if attempts >= MAX_LOGIN_ATTEMPTS {
                    return Err(anyhow!("Too many failed login attempts"));
                }
            }
        }
    }
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

async fn print_team(app: &mut App, team: Team) -> Result<()> {
    let attendance = app
        .attendance_matrix(team)
        .await
        .with_context(|| format!("Failed to build attendance matrix for {}", team))?;
    print_matrix(&format!("{} - coaching sessions", team), &attendance);

    let availability = app
        .availability_matrix(team)
        .await
        .with_context(|| format!("Failed to build availability matrix for {}", team))?;
    print_matrix(&format!("{} - show dates", team), &availability);
    Ok(())
}

fn print_matrix(title: &str, matrix: &Matrix) {
    println!("{}", title);
    if matrix.columns.is_empty() {
        println!("  (no events)\n");
        return;
    }
    if matrix.rows.is_empty() {
        println!("  (no roster)\n");
        return;
    }

    let name_width = matrix
        .rows
        .iter()
        .map(|r| r.user_name.len())
        .max()
        .unwrap_or(0)
        .max(4);

    print!("  {:name_width$}", "");
    for column in &matrix.columns {
        print!("  {}", column.date.format("%m/%d"));
    }
    println!();

    for row in &matrix.rows {
        print!("  {:name_width$}", row.user_name);
        for status in &row.statuses {
            print!("  {:>5}", status.symbol());
        }
        println!();
    }
    println!("  (P present, A absent, ? undecided)\n");
}
