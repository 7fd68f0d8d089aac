use std::{
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::{AppState, BillingConfig, build_router, graceful_shutdown, logging_middleware};

/// The REST API server for fintrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,

    /// The secret used to encrypt auth cookies.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The API key for the Lemon Squeezy billing provider.
    #[arg(long, env = "LEMONSQUEEZY_API_KEY", hide_env_values = true)]
    lemonsqueezy_api_key: String,

    /// The store that sells the subscription.
    #[arg(long, env = "LEMONSQUEEZY_STORE_ID")]
    lemonsqueezy_store_id: String,

    /// The product variant to check out.
    #[arg(long, env = "LEMONSQUEEZY_PRODUCT_ID")]
    lemonsqueezy_product_id: String,

    /// The secret Lemon Squeezy signs webhooks with.
    #[arg(long, env = "LEMONSQUEEZY_WEBHOOK_SECRET", hide_env_values = true)]
    lemonsqueezy_webhook_secret: String,

    /// The base URL of the Lemon Squeezy API.
    #[arg(
        long,
        env = "LEMONSQUEEZY_API_URL",
        default_value = "https://api.lemonsqueezy.com"
    )]
    lemonsqueezy_api_url: String,

    /// The public URL of the app, where users return to after checking out.
    #[arg(long, env = "APP_URL")]
    app_url: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let addr = SocketAddr::from((args.host, args.port));

    let conn = Connection::open(&args.db_path)
        .unwrap_or_else(|error| panic!("Could not open database at {}: {error}", args.db_path));

    let billing_config = BillingConfig {
        api_url: args.lemonsqueezy_api_url.trim_end_matches('/').to_owned(),
        api_key: args.lemonsqueezy_api_key,
        store_id: args.lemonsqueezy_store_id,
        product_id: args.lemonsqueezy_product_id,
        webhook_secret: args.lemonsqueezy_webhook_secret,
        app_url: args.app_url,
    };

    let app_state = AppState::new(conn, &args.secret, &args.timezone, billing_config)
        .expect("Could not create app state");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(app_state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server exited with an error");
}

fn setup_logging(log_path: &Path) {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
