//! `dispatch` - command-line console for the dispatcher API

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dispatch_console::http::ApiRequest;
use dispatch_console::resources::{
    AdminApi, AuthApi, ChangePassword, Credentials, ImageUpload, ProductsApi, RestaurantApi,
};
use dispatch_console::session::FileTokenStore;
use dispatch_console::{ApiClient, ApiError, Config, Scope, SessionContext, SessionEvent};

/// Operations console for the dispatcher restaurant/delivery API
#[derive(Parser, Debug)]
#[command(name = "dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DISPATCH_CONFIG")]
    config: Option<String>,

    /// Override the API base URL
    #[arg(long, env = "DISPATCH_BASE_URL")]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "DISPATCH_LOG_LEVEL")]
    log_level: String,

    /// Log file path (enables file logging)
    #[arg(long, env = "DISPATCH_LOG_FILE")]
    log_file: Option<String>,

    /// Enable JSON structured logging
    #[arg(long, env = "DISPATCH_LOG_JSON")]
    log_json: bool,

    /// Generate default configuration and exit
    #[arg(long)]
    generate_config: bool,

    /// Write the generated configuration to --config (or the default path) instead of stdout
    #[arg(long, requires = "generate_config")]
    write: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session tokens
    Login {
        #[arg(long, default_value = "admin")]
        scope: Scope,
        #[arg(long)]
        email: String,
        #[arg(long, env = "DISPATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the session tokens
    Logout {
        #[arg(long, default_value = "admin")]
        scope: Scope,
    },

    /// Show the signed-in admin
    Profile,

    /// List a resource
    List {
        resource: Resource,
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size, products only
        #[arg(long, default_value_t = 10)]
        limit: u64,
        /// Required for orders
        #[arg(long)]
        restaurant_id: Option<String>,
    },

    /// Send an arbitrary authenticated request
    Request {
        method: String,
        path: String,
        #[arg(long, default_value = "admin")]
        scope: Scope,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
        /// Query parameter as key=value, repeatable
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Upload an image and print its URL
    Upload {
        file: PathBuf,
        #[arg(long, default_value = "admin")]
        scope: Scope,
        /// What the image is for, e.g. profile_image or logo
        #[arg(long, default_value = "profile_image")]
        kind: String,
    },

    /// Change the restaurant account password
    ChangePassword {
        #[arg(long, env = "DISPATCH_OLD_PASSWORD", hide_env_values = true)]
        old: String,
        #[arg(long, env = "DISPATCH_NEW_PASSWORD", hide_env_values = true)]
        new: String,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum Resource {
    Countries,
    Cities,
    Areas,
    Drivers,
    Roles,
    Permissions,
    Restaurants,
    Orders,
    Products,
    Categories,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.generate_config {
        return report(generate_default_config(&cli));
    }

    if let Err(e) = init_logging(&cli) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting dispatch");

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return report(Err(e)),
    };

    if cli.validate_config {
        println!("Configuration is valid");
        return ExitCode::SUCCESS;
    }

    let Some(command) = cli.command else {
        eprintln!("no command given, see `dispatch --help`");
        return ExitCode::FAILURE;
    };

    report(run(command, config).await)
}

/// Print the outcome and turn it into an exit status
fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(ApiError::LoginRequired { scope }) => {
                    eprintln!("session expired, run `dispatch login --scope {}`", scope);
                }
                Some(ApiError::Validation { message, errors }) => {
                    eprintln!("error: {}", message);
                    for (field, messages) in errors {
                        for message in messages {
                            eprintln!("  {}: {}", field, message);
                        }
                    }
                }
                Some(api) => eprintln!("error: {}", api.user_message()),
                None => eprintln!("error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if let Some(log_path) = &cli.log_file {
        let file_appender = if log_path.contains('/') || log_path.contains('\\') {
            let path = Path::new(log_path);
            let dir = path.parent().unwrap_or(Path::new("."));
            let filename = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("dispatch.log");
            RollingFileAppender::new(Rotation::DAILY, dir, filename)
        } else {
            let log_dir = Config::data_dir()
                .map(|d| d.join("logs"))
                .unwrap_or_else(|_| PathBuf::from("."));
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
            RollingFileAppender::new(Rotation::DAILY, log_dir, log_path)
        };

        if cli.log_json {
            let file_layer = fmt::layer().json().with_writer(file_appender).with_ansi(false);
            subscriber.with(file_layer).init();
        } else {
            let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
            subscriber.with(file_layer).init();
        }
    } else if cli.log_json {
        subscriber.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        // stdout carries command output
        subscriber.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    Ok(())
}

/// Load configuration with CLI overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }

    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// Generate default configuration file
fn generate_default_config(cli: &Cli) -> Result<()> {
    let config = Config::default();
    if cli.write {
        config.save(cli.config.as_deref()).context("Failed to write configuration")?;
        eprintln!("configuration written");
        return Ok(());
    }

    let toml = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

    println!("{}", toml);
    Ok(())
}

async fn run(command: Command, config: Config) -> Result<()> {
    let store_path = config.session_store_path()?;
    let store = FileTokenStore::open(&store_path)
        .with_context(|| format!("Failed to open session store {:?}", store_path))?;
    tracing::debug!(path = %store.path().display(), "Session store ready");
    let session = SessionContext::new(Arc::new(store));
    let mut events = session.subscribe();

    let client = ApiClient::from_config(&config, session)?;
    let result = dispatch(command, &client).await;

    announce_session_events(&mut events);
    result
}

/// Report what happened to the stored sessions while the command ran
fn announce_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::SignedIn { scope } => eprintln!("signed in ({})", scope),
            SessionEvent::SignedOut { scope } => eprintln!("signed out ({})", scope),
            SessionEvent::TokenRefreshed { scope } => {
                tracing::info!(%scope, "Session token was renewed");
            }
            SessionEvent::LoginRequired { scope } => {
                tracing::warn!(%scope, "Stored session was discarded");
            }
        }
    }
}

async fn dispatch(command: Command, client: &ApiClient) -> Result<()> {
    match command {
        Command::Login {
            scope,
            email,
            password,
        } => {
            AuthApi::new(client)
                .login(scope, &Credentials::new(email, password))
                .await?;
        }
        Command::Logout { scope } => {
            AuthApi::new(client).logout(scope).await?;
        }
        Command::Profile => print_json(&AdminApi::new(client).profile().await?)?,
        Command::List {
            resource,
            page,
            limit,
            restaurant_id,
        } => list(client, resource, page, limit, restaurant_id.as_deref()).await?,
        Command::Request {
            method,
            path,
            scope,
            body,
            params,
            timeout,
        } => {
            let method = reqwest::Method::from_str(&method.to_ascii_uppercase())
                .with_context(|| format!("Invalid HTTP method '{}'", method))?;
            let mut builder = ApiRequest::builder(method, &path);
            for (key, value) in &params {
                builder = builder.param(key, value);
            }
            if let Some(seconds) = timeout {
                builder = builder.timeout(seconds);
            }
            if let Some(body) = body {
                let json: serde_json::Value =
                    serde_json::from_str(&body).context("--body is not valid JSON")?;
                builder = builder.json(&json);
            }

            let response = client.scoped(scope).send(&builder.build()?).await?;
            match response.json::<serde_json::Value>() {
                Ok(json) => print_json(&json)?,
                Err(_) => println!("{}", response.body_text()),
            }
        }
        Command::Upload { file, scope, kind } => {
            let image = read_image(&file, kind)?;
            let uploaded = match scope {
                Scope::Admin => AdminApi::new(client).upload_image(image).await?,
                Scope::Restaurant => RestaurantApi::new(client).upload_image(image).await?,
            };
            println!("{}", uploaded.url);
        }
        Command::ChangePassword { old, new } => {
            RestaurantApi::new(client)
                .change_password(&ChangePassword::new(old, new))
                .await?;
            eprintln!("password changed");
        }
    }

    Ok(())
}

async fn list(
    client: &ApiClient,
    resource: Resource,
    page: u64,
    limit: u64,
    restaurant_id: Option<&str>,
) -> Result<()> {
    let admin = AdminApi::new(client);
    let restaurant = RestaurantApi::new(client);

    match resource {
        Resource::Countries => print_json(&admin.countries(page).await?),
        Resource::Cities => print_json(&admin.cities(page).await?),
        Resource::Areas => print_json(&admin.areas(page).await?),
        Resource::Drivers => print_json(&admin.drivers(page).await?),
        Resource::Roles => print_json(&admin.roles(page).await?),
        Resource::Permissions => print_json(&admin.permissions().await?),
        Resource::Restaurants => print_json(&restaurant.restaurants(page).await?),
        Resource::Orders => {
            let restaurant_id = restaurant_id.context("--restaurant-id is required for orders")?;
            print_json(&restaurant.orders(restaurant_id, page).await?)
        }
        Resource::Products => print_json(&ProductsApi::new(client).list(page, limit).await?),
        Resource::Categories => print_json(&ProductsApi::new(client).categories().await?),
    }
}

fn read_image(path: &Path, kind: String) -> Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload")
        .to_string();
    let content_type = match path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        Some("svg") => Some("image/svg+xml"),
        _ => None,
    };

    Ok(ImageUpload {
        file_name,
        content_type: content_type.map(str::to_string),
        bytes,
        kind,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_generate_config() {
        assert!(Cli::try_parse_from(["dispatch", "--write"]).is_err());

        let cli = Cli::try_parse_from(["dispatch", "--generate-config", "--write", "-c", "/tmp/d.toml"])
            .unwrap();
        assert!(cli.write);
        assert_eq!(cli.config.as_deref(), Some("/tmp/d.toml"));
    }

    #[test]
    fn test_generated_config_is_written_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatch.toml");
        let path_str = path.to_str().unwrap();
        let cli = Cli::try_parse_from(["dispatch", "--generate-config", "--write", "-c", path_str]).unwrap();

        generate_default_config(&cli).unwrap();

        assert!(path.exists());
        let written = Config::load(Some(path_str)).unwrap();
        assert_eq!(written.api.base_url, Config::default().api.base_url);
    }

    #[test]
    fn test_request_accepts_timeout() {
        let cli = Cli::try_parse_from([
            "dispatch", "request", "get", "/admin/countries", "--timeout", "5", "--param", "page=2",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Request { timeout, params, .. }) => {
                assert_eq!(timeout, Some(5));
                assert_eq!(params, vec![("page".to_string(), "2".to_string())]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
