//! Gatehouse CLI entrypoint.
//!
//! Hydrates the persisted session, logs in when credentials are configured
//! and no session exists, evaluates the navigation gate for the requested
//! route, and prints a one-shot summary of pending review activity.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use gatehouse::{
    ApiError, AuthApi, AuthSession, DecliningPlanPrompt, FileSessionStorage, GatehouseConfig,
    HttpApiClient, HttpRefreshTransport, NavigationGate, NoopTelemetrySink, PollingCoordinator,
    RequestGateway, ReviewListingApi, RouteDecision, SessionStore, StderrJsonlTelemetrySink,
    SubscriptionApi, TelemetrySink, TokenRefresher, build_http_client, parse_base_url,
};
use ortho_config::OrthoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ApiError> {
    let config = load_config()?;
    let telemetry: Arc<dyn TelemetrySink> = if config.telemetry_enabled() {
        Arc::new(StderrJsonlTelemetrySink)
    } else {
        Arc::new(NoopTelemetrySink)
    };

    let storage = Arc::new(FileSessionStorage::new(config.resolve_state_dir()));
    let store = SessionStore::hydrate(storage, Arc::clone(&telemetry))?;

    let base_url = parse_base_url(config.require_api_base_url()?)?;
    let client = build_http_client()?;
    let transport = HttpRefreshTransport::new(client.clone(), base_url.clone());
    let refresher = Arc::new(TokenRefresher::new(
        store.clone(),
        Arc::new(transport),
        Arc::clone(&telemetry),
    ));
    let gateway = RequestGateway::new(client, base_url, store.clone(), refresher);
    let api = Arc::new(HttpApiClient::new(gateway));

    let flows = AuthSession::new(store.clone(), Arc::clone(&api) as Arc<dyn AuthApi>);
    if !store.is_authenticated() {
        let (username, password) = config.credentials().ok_or(ApiError::MissingCredentials)?;
        let user = flows.login(username, password).await?;
        write_line(&format!("Signed in as {}", user.username))?;
    }

    let gate = NavigationGate::new(
        store.clone(),
        Arc::clone(&api) as Arc<dyn SubscriptionApi>,
        Arc::new(DecliningPlanPrompt),
        Arc::clone(&telemetry),
    );
    let route = config.resolve_route();
    match gate.evaluate(&route).await {
        RouteDecision::Allow => {}
        RouteDecision::RedirectToLogin { reason, .. } => {
            let detail = reason.unwrap_or_else(|| "authentication required".to_owned());
            return Err(ApiError::Unauthorized { message: detail });
        }
        RouteDecision::RedirectTo { route: target } => {
            write_line(&format!("Redirected to {target}"))?;
            return Ok(());
        }
    }

    let coordinator = PollingCoordinator::with_cadence(
        Arc::clone(&api) as Arc<dyn ReviewListingApi>,
        telemetry,
        config.poll_interval(),
        config.resolve_review_limit(),
    );
    let listing = coordinator.refresh_now().await?;
    let activity = coordinator.subscribe().borrow().clone();

    write_line(&format!(
        "Reviews: {total} listed, {pending} pending, {active} actively processing",
        total = listing.reviews.len(),
        pending = activity.pending.len(),
        active = activity.actively_processing.len(),
    ))?;
    coordinator.stop_all();
    Ok(())
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<GatehouseConfig, ApiError> {
    GatehouseConfig::load().map_err(|error| ApiError::Configuration {
        message: error.to_string(),
    })
}

fn write_line(message: &str) -> Result<(), ApiError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{message}").map_err(|error| ApiError::Io {
        message: error.to_string(),
    })
}
