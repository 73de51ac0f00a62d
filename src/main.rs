use finance_tracker::{Store, StoreConfig, api};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "finance_tracker=info,rocket=warn";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Rocket.toml / ROCKET_DB_PATH / ROCKET_POOL_SIZE
    let figment = rocket::Config::figment();
    let config: StoreConfig = figment.extract()?;
    let store = Store::open(&config)?;
    info!(path = %config.db_path.display(), "starting finance tracker");

    api::mount(rocket::custom(figment), store).launch().await?;
    Ok(())
}
