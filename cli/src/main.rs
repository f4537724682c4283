//! WorkFun account shell - binary entry point and composition root.
//!
//! The binary owns the lifecycle of every long-lived object: it loads the
//! config, initializes file logging, opens the account store, and wires
//! store -> directory -> service -> controller explicitly. Nothing here is
//! a global; the shell only ever talks to the controller's read surfaces
//! and its five operations (login, register, logout, clear-error,
//! clear-registration-success).

mod config;
mod onboarding;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use workfun_auth::{AuthController, AuthService};
use workfun_store::{AccountDirectory, AccountStore};

use crate::config::WorkfunConfig;

fn init_tracing(data_dir: &Path, config_filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = data_dir.join("logs");
    let log_file = std::fs::create_dir_all(&log_dir).ok().and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("workfun.log"))
            .ok()
    });

    // The shell owns the terminal; logs go to a file or nowhere.
    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %log_dir.join("workfun.log").display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match WorkfunConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("warning: {e:#}; using defaults");
            WorkfunConfig::default()
        }
    };

    let data_dir = config.data_dir();
    init_tracing(&data_dir, config.log_filter());

    let store = AccountStore::open(data_dir.join("accounts.db"))
        .with_context(|| format!("Failed to open account store in {}", data_dir.display()))?;
    let directory = Arc::new(AccountDirectory::new(store));
    let service = Arc::new(AuthService::new(directory));
    let controller = AuthController::new(service).await;

    if onboarding::has_completed_onboarding(&data_dir) {
        println!("WorkFun account shell. Type 'help' for commands.");
    } else {
        println!("Welcome to WorkFun! Register an account to get started.");
        println!("Type 'help' for commands.");
        onboarding::mark_onboarding_complete(&data_dir);
    }

    run_shell(&controller).await
}

async fn run_shell(controller: &AuthController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt(controller);
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            None => {}
            Some("help") => print_help(),
            Some("register") => {
                let (Some(email), Some(secret), Some(dob)) =
                    (parts.next(), parts.next(), parts.next())
                else {
                    println!("usage: register <email> <secret> <yyyy-mm-dd> <display name>");
                    continue;
                };
                let display_name = parts.collect::<Vec<_>>().join(" ");
                if display_name.is_empty() {
                    println!("usage: register <email> <secret> <yyyy-mm-dd> <display name>");
                    continue;
                }
                let Ok(date_of_birth) = dob.parse::<NaiveDate>() else {
                    println!("invalid date of birth, expected yyyy-mm-dd");
                    continue;
                };

                controller
                    .register(email, secret, &display_name, date_of_birth)
                    .await;
                let state = controller.snapshot();
                if state.registration_success {
                    println!("registered {email}; log in to start a session");
                    controller.clear_registration_success();
                } else if let Some(message) = state.error_message {
                    println!("{message}");
                    controller.clear_error();
                }
            }
            Some("login") => {
                let (Some(email), Some(secret)) = (parts.next(), parts.next()) else {
                    println!("usage: login <email> <secret>");
                    continue;
                };

                controller.login(email, secret).await;
                let state = controller.snapshot();
                if state.is_logged_in {
                    println!("logged in as {email}");
                } else if let Some(message) = state.error_message {
                    println!("{message}");
                    controller.clear_error();
                }
            }
            Some("logout") => {
                controller.logout().await;
                println!("logged out");
            }
            Some("whoami") => match controller.current_account().borrow().as_ref() {
                Some(account) => {
                    println!("{} <{}> (account {})", account.display_name, account.email, account.id);
                }
                None => println!("no active session"),
            },
            Some("state") => {
                let state = controller.snapshot();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&state)
                        .unwrap_or_else(|_| "<unprintable>".to_string())
                );
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command '{other}', try 'help'"),
        }
    }

    Ok(())
}

fn print_prompt(controller: &AuthController) {
    let state = controller.snapshot();
    if state.is_logged_in {
        print!("workfun* ");
    } else {
        print!("workfun> ");
    }
    use std::io::Write;
    let _ = std::io::stdout().flush();
}

fn print_help() {
    println!("commands:");
    println!("  register <email> <secret> <yyyy-mm-dd> <display name>");
    println!("  login <email> <secret>");
    println!("  logout");
    println!("  whoami          show the active account");
    println!("  state           dump the transient UI state");
    println!("  quit");
}
