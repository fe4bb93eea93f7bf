use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use unihaven::config::AppConfig;
use unihaven::error::AppError;
use unihaven::geo::{AddressResolver, GeodataResolver, ReferenceTable};
use unihaven::housing::{
    accommodation_router, member_router, rating_router, reservation_router, AccommodationService,
    InMemoryHousingStore, MemberService, RatingService, ReservationService, TracingNotifier,
};
use unihaven::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "UniHaven",
    about = "Run the accommodation management service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Geocoding utilities
    Geo {
        #[command(subcommand)]
        command: GeoCommand,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum GeoCommand {
    /// Resolve an address and print its campus distances
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct ResolveArgs {
    /// Free-text address to resolve (the configured locality suffix is appended)
    #[arg(long)]
    address: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Geo {
            command: GeoCommand::Resolve(args),
        } => run_geo_resolve(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = Arc::new(InMemoryHousingStore::default());
    let resolver = Arc::new(GeodataResolver::new(&config.geocoder)?);
    let notifier = Arc::new(TracingNotifier);

    let accommodations = Arc::new(AccommodationService::new(
        store.clone(),
        resolver,
        ReferenceTable::campus_sites(),
    ));
    let members = Arc::new(MemberService::new(store.clone()));
    let reservations = Arc::new(ReservationService::new(store.clone(), notifier));
    let ratings = Arc::new(RatingService::new(store));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(accommodation_router(accommodations))
        .merge(member_router(members))
        .merge(reservation_router(reservations))
        .merge(rating_router(ratings))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "accommodation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_geo_resolve(args: ResolveArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let resolver = GeodataResolver::new(&config.geocoder)?;

    let coordinate = resolver.resolve(&args.address).await?;
    println!(
        "Resolved '{}' to latitude {:.5}, longitude {:.5}",
        args.address, coordinate.latitude, coordinate.longitude
    );

    println!("\nCampus distances");
    for (campus, km) in ReferenceTable::campus_sites().distances_from(coordinate) {
        println!("- {campus}: {km} km");
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
