use jobdesk_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobdesk_api=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let (_state, router) = jobdesk_api::setup::initialize_app(config.clone()).await?;

    jobdesk_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
