#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_web::{
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use anyhow::Context;
use wardgate::{
    configure_services, edge_gate, origin_gate, proxy_upstream, settings::GateSettings,
    verification::TurnstileVerifier, GateState, UpstreamClient,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = GateSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let (state, upstream) =
        build_components(&settings).map_err(|e| std::io::Error::other(format!("{e:#}")))?;

    start_server(state, upstream, settings).await
}

/// Build the verification provider, the gates and the upstream client
///
/// # Errors
///
/// Returns an error if the provider or upstream client cannot be built
fn build_components(settings: &GateSettings) -> anyhow::Result<(GateState, UpstreamClient)> {
    let verifier = TurnstileVerifier::from_settings(&settings.verification)
        .context("Failed to initialize verification provider")?;

    let upstream = UpstreamClient::from_settings(&settings.proxy)
        .context("Failed to initialize upstream")?;

    log::info!("Proxying admitted requests to {}", settings.proxy.upstream_url);
    Ok((
        GateState::from_settings(settings, Arc::new(verifier)),
        upstream,
    ))
}

/// Start the gating proxy
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    state: GateState,
    upstream: UpstreamClient,
    settings: GateSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let upstream = web::Data::new(upstream);

    HttpServer::new(move || {
        // Last wrap runs first: edge, then origin, then the route
        App::new()
            .app_data(state.edge.clone())
            .app_data(state.origin.clone())
            .app_data(state.issuer.clone())
            .app_data(upstream.clone())
            .wrap(from_fn(origin_gate))
            .wrap(from_fn(edge_gate))
            .wrap(Logger::default())
            .configure(configure_services)
            .default_service(web::route().to(proxy_upstream))
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &GateSettings) {
    println!(
        "Starting Wardgate {} on http://{bind_address}",
        wardgate::VERSION
    );
    println!("Environment: {:?}", settings.application.environment);
    println!("Session check: {:?}", settings.session.check_mode);
    println!("Origin header policy: {:?}", settings.origin.header_policy);
    println!();
    println!("Gate endpoints:");
    println!("  POST /api/verify-session - Exchange a challenge token for a session cookie");
    println!("  GET  /ping               - Health check");
    println!();
    println!("Proxy:");
    println!("  ALL {{any path}} - Gated, then proxied as-is");
    println!("  Upstream URL: {}", settings.proxy.upstream_url);
    println!(
        "  Challenge page: {} (served by upstream)",
        settings.rules.challenge_path
    );
}
