use std::collections::HashSet;
use std::sync::Arc;

use tokio::net::TcpListener;

use heraldbot::broadcast::scheduler;
use heraldbot::config::Config;
use heraldbot::session::SessionStore;
use heraldbot::state::AppState;
use heraldbot::transport::HttpTransport;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heraldbot=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = heraldbot::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    let transport = Arc::new(HttpTransport::new(&config.api_base, &config.bot_token));
    let operators: HashSet<i64> = config.operator_ids.iter().copied().collect();

    let state = AppState {
        db,
        sessions: SessionStore::new(),
        transport,
        operators: Arc::new(operators),
    };

    // Pick deferred broadcasts that were pending when the last process
    // stopped back up before accepting new updates.
    match scheduler::reconcile(&state).await {
        Ok(0) => {}
        Ok(n) => tracing::info!("re-armed {n} pending broadcast(s) from the queue"),
        Err(e) => tracing::error!("queue reconciliation failed: {e:?}"),
    }

    let app = heraldbot::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mheraldbot\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2mapi base\x1b[0m     {}", config.api_base);
    eprintln!("  \x1b[2moperators\x1b[0m    {}", config.operator_ids.len());

    if config.test_mode {
        eprintln!();
        eprintln!("  \x1b[33m! test mode enabled\x1b[0m");
    }

    eprintln!();
}
