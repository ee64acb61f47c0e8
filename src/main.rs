use renova::{
    Store,
    config::{self, database},
    core::{
        expiration::days_until_expiration,
        report,
        session::{Liveness, SessionMonitor, check_session_liveness},
    },
    errors::Result,
};
use chrono::Utc;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load application configuration (defaults when config.toml is absent)
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Using storage namespace '{}'", app_config.storage.namespace);

    // 4. Initialize database
    let db = database::init_database(&database::get_database_url())
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let store = Store::new(db, &app_config);

    // 5. Seed or repair the region and user tables
    let regions = store.list_regions().await?;
    let users = store.list_users().await?;
    info!("Loaded {} regions and {} accounts", regions.len(), users.len());

    // 6. Report the current dashboard
    let now = Utc::now();
    let stats = report::dashboard_stats_at(&regions, now);
    for line in report::format_dashboard_summary(&stats).lines() {
        info!("{}", line);
    }
    for region in report::expiring_regions_at(&regions, now) {
        match days_until_expiration(region, now) {
            Some(days) if days < 0 => warn!("{} is overdue by {} days", region.code, -days),
            Some(days) => warn!("{} expires in {} days", region.code, days),
            None => {}
        }
    }

    let pending = store.list_requests().await?.len();
    if pending > 0 {
        info!("{} access request(s) awaiting review", pending);
    }

    // 7. Check the open session, optionally watching it until it ends
    let watch = std::env::args().nth(1).is_some_and(|arg| arg == "watch");
    match check_session_liveness(&store).await? {
        Liveness::Alive(user) if watch => {
            let period = app_config.policy.session_check_interval();
            info!("Watching session of {} every {:?}", user.email, period);
            if let Some(ended) = SessionMonitor::spawn(store.clone(), period).join().await? {
                warn!("Session ended: {:?}", ended);
            }
        }
        Liveness::Alive(user) => info!("Session open for {}", user.email),
        Liveness::Revoked { email } => warn!("Closed session of revoked account {}", email),
        Liveness::NoSession => info!("No open session"),
    }

    Ok(())
}
