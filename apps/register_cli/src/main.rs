use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    config, HttpRegistrationApi, MemorySessionStore, Navigator, Notice, Notifier,
    RegistrationFormController, RegistrationScreen, SubmitOutcome,
};
use shared::domain::{FormState, RegistrationField};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Create a pharmacy account from the command line")]
struct Args {
    /// Overrides base_url from settings.
    #[arg(long)]
    base_url: Option<String>,
    /// Settings file; defaults to ./client.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    password: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    address: String,
    /// Extra `field=value` assignments, applied after the named flags.
    #[arg(long = "set", value_parser = parse_assignment)]
    assignments: Vec<(RegistrationField, String)>,
    /// Open the sign-in route instead of registering.
    #[arg(long)]
    sign_in: bool,
}

impl Args {
    fn field_values(&self) -> Vec<(RegistrationField, String)> {
        let mut values = vec![
            (RegistrationField::FirstName, self.first_name.clone()),
            (RegistrationField::LastName, self.last_name.clone()),
            (RegistrationField::Email, self.email.clone()),
            (RegistrationField::Password, self.password.clone()),
            (RegistrationField::Phone, self.phone.clone()),
            (RegistrationField::Address, self.address.clone()),
        ];
        values.extend(self.assignments.iter().cloned());
        values
    }
}

fn parse_assignment(raw: &str) -> Result<(RegistrationField, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{raw}'"))?;
    let field = name.trim().parse::<RegistrationField>().map_err(|err| err.to_string())?;
    Ok((field, value.to_string()))
}

/// One `label: value` line per field, secret values masked.
fn form_summary(form: &FormState) -> Vec<String> {
    RegistrationField::ALL
        .into_iter()
        .map(|field| {
            let value = form.get(field);
            let shown = if field.is_secret() && !value.is_empty() {
                "*".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            format!("{}: {shown}", field.placeholder())
        })
        .collect()
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        println!("[{}] {}", notice.title, notice.message);
    }
}

#[derive(Default)]
struct StackNavigator {
    stack: Mutex<Vec<String>>,
}

impl StackNavigator {
    fn stack(&self) -> MutexGuard<'_, Vec<String>> {
        self.stack.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("navigation stack lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn current(&self) -> Option<String> {
        self.stack().last().cloned()
    }

    fn depth(&self) -> usize {
        self.stack().len()
    }
}

impl Navigator for StackNavigator {
    fn replace(&self, path: &str) {
        let mut stack = self.stack();
        stack.pop();
        stack.push(path.to_string());
        tracing::debug!(route = path, "navigation replaced");
    }

    fn push(&self, path: &str) {
        self.stack().push(path.to_string());
        tracing::debug!(route = path, "navigation pushed");
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => config::load_settings_from(path)?,
        None => config::load_settings()?,
    };
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    settings.validate()?;

    let api = HttpRegistrationApi::new(&settings).context("failed to build registration client")?;
    tracing::info!(endpoint = api.endpoint(), "registration client ready");

    let session = Arc::new(MemorySessionStore::new());
    let navigator = Arc::new(StackNavigator::default());
    navigator.push("/register");

    let app_lifetime = CancellationToken::new();
    let controller =
        RegistrationFormController::with_lifetime(Arc::new(api), session.clone(), &app_lifetime);
    let mut screen = RegistrationScreen::new(controller, Arc::new(ConsoleNotifier), navigator.clone());

    if args.sign_in {
        screen.go_to_login();
        println!("route: {}", navigator.current().unwrap_or_default());
        return Ok(ExitCode::SUCCESS);
    }

    for (field, value) in args.field_values() {
        screen.on_input(field, value);
    }
    for line in form_summary(screen.controller().form()) {
        println!("{line}");
    }

    let interrupt = app_lifetime.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; tearing down registration screen");
            interrupt.cancel();
        }
    });

    let outcome = screen.on_submit().await;
    println!(
        "route: {} (history depth {})",
        navigator.current().unwrap_or_default(),
        navigator.depth()
    );

    match outcome {
        SubmitOutcome::Success(_) => {
            if let Some(auth) = session.auth_session().await {
                println!(
                    "signed in as {} <{}>",
                    auth.full_name.unwrap_or_default(),
                    auth.email.unwrap_or_default()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Abandoned => Ok(ExitCode::from(130)),
        _ => Ok(ExitCode::FAILURE),
    }
}
