use dotenvy::dotenv;
use tracing::info;

use flowboard::infra::{
    app::create_app,
    config::AppConfig,
    setup::{init_app_state, init_tracing},
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    let app_state = init_app_state(config).await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
