use std::io::{IsTerminal as _, Write as _};
use std::process::ExitCode;
use std::sync::Arc;

use bus_tracker::config::{AppwriteConfig, ConfigError};
use bus_tracker::services::appwrite::AppwriteAuth;
use bus_tracker::services::auth::{AuthFailure, ErrorKind};
use bus_tracker::services::credentials::{self, CredentialError};
use bus_tracker::services::oauth::{CallbackUrls, OAuthBrowser};
use bus_tracker::services::session::{SessionError, SessionStateMachine};
use bus_tracker::services::stops;
use bus_tracker::state::Screen;
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use reqwest::Url;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Credentials(#[from] CredentialError),
    #[error("{}", .0.friendly_message())]
    Provider(AuthFailure),
    #[error("another auth operation is already in progress")]
    Busy,
    #[error("no bus is currently assigned to '{0}'")]
    UnknownStop(String),
    #[error("input closed before `{0}` was entered")]
    MissingInput(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<SessionError> for CliError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Busy => Self::Busy,
            SessionError::Provider(failure) => Self::Provider(failure),
        }
    }
}

impl From<AuthFailure> for CliError {
    fn from(failure: AuthFailure) -> Self {
        Self::Provider(failure)
    }
}

#[derive(Parser, Debug)]
#[command(name = "bus-tracker", about = "Bus Tracker client: sign in and find your bus")]
struct Cli {
    /// Appwrite API endpoint. Falls back to APPWRITE_ENDPOINT.
    #[arg(long)]
    endpoint: Option<String>,

    /// Appwrite project id. Falls back to APPWRITE_PROJECT_ID.
    #[arg(long)]
    project: Option<String>,

    /// Client platform (web, android, ios). Falls back to BUS_TRACKER_PLATFORM.
    #[arg(long)]
    platform: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the endpoint and project are reachable.
    Ping,
    /// List stops whose name contains the query.
    Stops { query: Option<String> },
    /// Show the bus assigned to a stop.
    Locate { stop: String },
    /// Sign in with email and password. The password prompt does not echo.
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "BUS_TRACKER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in. The password prompt does not echo.
    Signup {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "BUS_TRACKER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign in with Google by pasting the redirect URL back.
    Google,
    /// Interactive session over stdin.
    Shell,
}

#[derive(Debug, Serialize)]
struct LocateOutput<'a> {
    stop: &'a str,
    bus_number: u32,
    latitude: f64,
    longitude: f64,
    map_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Stops { ref query } => print_json(&stops::search(query.as_deref().unwrap_or_default())),
        Command::Locate { ref stop } => run_locate(stop),
        Command::Ping => {
            let auth = build_auth(&cli, &Prompt::new())?;
            auth.test_connection().await?;
            println!("ok");
            Ok(())
        }
        Command::Login { ref email, ref password } => {
            let prompt = Prompt::new();
            let machine = build_machine(&cli, &prompt)?;
            let email = prompt.value_or_ask(email.as_deref(), "email: ", "email").await?;
            let password = prompt.secret_or_ask(password.as_deref(), "password: ").await?;
            credentials::validate_sign_in(&email, &password)?;
            machine.sign_in(&email, &password).await?;
            print_json(&machine.user())
        }
        Command::Signup { ref email, ref password, ref name } => {
            let prompt = Prompt::new();
            let machine = build_machine(&cli, &prompt)?;
            let email = prompt.value_or_ask(email.as_deref(), "email: ", "email").await?;
            let password = prompt.secret_or_ask(password.as_deref(), "password: ").await?;
            let name = prompt.value_or_ask(name.as_deref(), "name: ", "name").await?;
            credentials::validate_sign_up(&email, &password, &name)?;
            machine.sign_up(&email, &password, &name).await?;
            print_json(&machine.user())
        }
        Command::Google => {
            let prompt = Prompt::new();
            let machine = build_machine(&cli, &prompt)?;
            machine.sign_in_with_google().await?;
            print_json(&machine.user())
        }
        Command::Shell => {
            let prompt = Prompt::new();
            let machine = build_machine(&cli, &prompt)?;
            run_shell(&machine, &prompt).await
        }
    }
}

// =============================================================================
// WIRING
// =============================================================================

fn load_config(cli: &Cli) -> Result<AppwriteConfig, CliError> {
    let flag = |key: &str| match key {
        "APPWRITE_ENDPOINT" => cli.endpoint.clone(),
        "APPWRITE_PROJECT_ID" => cli.project.clone(),
        "BUS_TRACKER_PLATFORM" => cli.platform.clone(),
        _ => None,
    };
    Ok(AppwriteConfig::from_lookup(|key| flag(key).or_else(|| std::env::var(key).ok()))?)
}

fn build_auth(cli: &Cli, prompt: &Prompt) -> Result<AppwriteAuth, CliError> {
    let config = load_config(cli)?;
    tracing::info!(
        endpoint = %config.endpoint,
        project_id = %config.project_id,
        platform = %config.platform,
        "appwrite client configured"
    );
    let browser = Arc::new(PastedRedirect { prompt: prompt.clone() });
    Ok(AppwriteAuth::new(config)?.with_browser(browser))
}

fn build_machine(cli: &Cli, prompt: &Prompt) -> Result<SessionStateMachine, CliError> {
    let auth = build_auth(cli, prompt)?;
    Ok(SessionStateMachine::new(Arc::new(auth)))
}

fn run_locate(stop: &str) -> Result<(), CliError> {
    let location = stops::locate(stop).ok_or_else(|| CliError::UnknownStop(stop.to_owned()))?;
    print_json(&LocateOutput {
        stop,
        bus_number: location.bus_number,
        latitude: location.driver_location.latitude,
        longitude: location.driver_location.longitude,
        map_url: stops::map_embed_url(location.driver_location),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// STDIN
// =============================================================================

/// Shared line reader so the shell and the OAuth paste prompt never race
/// for stdin.
#[derive(Clone)]
struct Prompt {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Prompt {
    fn new() -> Self {
        Self { lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())) }
    }

    /// Print `label` to stderr and read one trimmed line; `None` at EOF.
    async fn ask(&self, label: &str) -> std::io::Result<Option<String>> {
        eprint!("{label}");
        std::io::stderr().flush()?;
        let mut lines = self.lines.lock().await;
        Ok(lines.next_line().await?.map(|line| line.trim().to_owned()))
    }

    async fn value_or_ask(
        &self,
        value: Option<&str>,
        label: &str,
        field: &'static str,
    ) -> Result<String, CliError> {
        if let Some(value) = value {
            return Ok(value.to_owned());
        }
        self.ask(label).await?.ok_or(CliError::MissingInput(field))
    }

    /// Like [`Prompt::value_or_ask`], but a terminal read does not echo.
    /// Piped input is read as a plain line.
    async fn secret_or_ask(&self, value: Option<&str>, label: &str) -> Result<String, CliError> {
        if let Some(value) = value {
            return Ok(value.to_owned());
        }
        if !std::io::stdin().is_terminal() {
            return self.ask(label).await?.ok_or(CliError::MissingInput("password"));
        }
        // Hold the reader so no other prompt consumes the keystrokes.
        let _lines = self.lines.lock().await;
        eprint!("{label}");
        std::io::stderr().flush()?;
        let secret = tokio::task::spawn_blocking(read_hidden_line)
            .await
            .map_err(std::io::Error::other)??;
        eprintln!();
        secret.ok_or(CliError::MissingInput("password"))
    }
}

/// Read one line from the terminal in raw mode so it is not echoed.
/// `None` when the user aborts with Esc, Ctrl-C or Ctrl-D.
fn read_hidden_line() -> std::io::Result<Option<String>> {
    terminal::enable_raw_mode()?;
    let read = (|| -> std::io::Result<Option<String>> {
        let mut secret = String::new();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => return Ok(Some(secret)),
                KeyCode::Esc => return Ok(None),
                KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(None),
                KeyCode::Char(c) => secret.push(c),
                KeyCode::Backspace => {
                    secret.pop();
                }
                _ => {}
            }
        }
    })();
    terminal::disable_raw_mode()?;
    read
}

/// Prints the authorize URL and waits for the user to paste the address the
/// provider redirected them to.
struct PastedRedirect {
    prompt: Prompt,
}

#[async_trait::async_trait]
impl OAuthBrowser for PastedRedirect {
    async fn open(&self, authorize_url: &Url, callbacks: &CallbackUrls) -> Result<String, AuthFailure> {
        eprintln!("Open this URL in a browser to continue with Google:\n\n  {authorize_url}\n");
        eprintln!("You will be sent to {} afterwards. Paste that full address below.", callbacks.success);
        match self.prompt.ask("redirect> ").await {
            Ok(Some(line)) if !line.is_empty() => Ok(line),
            Ok(_) => Err(AuthFailure::new(ErrorKind::Cancelled, "OAuth redirect was not provided")),
            Err(e) => Err(AuthFailure::new(ErrorKind::Other, format!("failed to read redirect: {e}"))),
        }
    }
}

// =============================================================================
// SHELL
// =============================================================================

const SHELL_HELP: &str = "\
commands:
  login             sign in with email and password
  signup            create an account and sign in
  google            sign in with Google
  whoami            show the signed-in user
  logout            sign out
  stops [query]     search bus stops
  locate <stop>     show the bus assigned to a stop
  quit              leave the shell";

async fn run_shell(machine: &SessionStateMachine, prompt: &Prompt) -> Result<(), CliError> {
    let mut changes = machine.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().clone();
            tracing::debug!(phase = ?state.phase, loading = state.loading, "auth state changed");
        }
    });

    if let Err(e) = machine.initialize().await {
        tracing::warn!(error = %e, "session check failed");
    }
    greet(machine);

    loop {
        let Some(line) = prompt.ask("bus-tracker> ").await? else {
            break;
        };
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line.as_str(), ""));
        let rest = rest.trim();

        let outcome = match command {
            "" => Ok(()),
            "quit" | "exit" => break,
            "help" => {
                println!("{SHELL_HELP}");
                Ok(())
            }
            "whoami" => whoami(machine),
            "login" => shell_login(machine, prompt).await,
            "signup" => shell_signup(machine, prompt).await,
            "google" => machine.sign_in_with_google().await.map_err(CliError::from).map(|()| greet(machine)),
            "logout" => machine.sign_out().await.map_err(CliError::from).map(|()| greet(machine)),
            "stops" => print_json(&stops::search(rest)),
            "locate" => run_locate(rest),
            other => {
                println!("unknown command '{other}'; type `help`");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("error: {e}");
            machine.clear_error();
        }
    }

    watcher.abort();
    Ok(())
}

fn greet(machine: &SessionStateMachine) {
    let state = machine.snapshot();
    match (state.screen(), &state.user) {
        (Screen::Home, Some(user)) => println!("Welcome, {}!", user.display_name()),
        (Screen::Loading, _) => println!("Checking session..."),
        _ => println!("Not signed in. Try `login`, `signup` or `google`."),
    }
}

fn whoami(machine: &SessionStateMachine) -> Result<(), CliError> {
    let state = machine.snapshot();
    if state.should_redirect_unauth() {
        println!("not signed in");
        return Ok(());
    }
    print_json(&state.user)
}

async fn shell_login(machine: &SessionStateMachine, prompt: &Prompt) -> Result<(), CliError> {
    let email = prompt.value_or_ask(None, "email: ", "email").await?;
    let password = prompt.secret_or_ask(None, "password: ").await?;
    credentials::validate_sign_in(&email, &password)?;
    machine.sign_in(&email, &password).await?;
    greet(machine);
    Ok(())
}

async fn shell_signup(machine: &SessionStateMachine, prompt: &Prompt) -> Result<(), CliError> {
    let email = prompt.value_or_ask(None, "email: ", "email").await?;
    let password = prompt.secret_or_ask(None, "password: ").await?;
    let name = prompt.value_or_ask(None, "name: ", "name").await?;
    credentials::validate_sign_up(&email, &password, &name)?;
    machine.sign_up(&email, &password, &name).await?;
    greet(machine);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
