use std::sync::Arc;

use anyhow::{Context, Result};
use common_db::init_db_pool;
use teleacolhe::session::SessionStore;
use teleacolhe::{build_info, routes, telemetry, AppConfig, AppState, DiagnosisClient, OpenAiClient};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env é opcional; variáveis já definidas no ambiente têm precedência
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Configuração inválida")?;
    telemetry::init_tracing(config.log_format)?;

    info!(version = build_info::PKG_VERSION, "Iniciando TeleAcolhe");
    if config.uses_default_session_secret() {
        warn!("SESSION_SECRET não definido, usando o segredo de desenvolvimento");
    }

    let pool = init_db_pool(&config.database).await?;

    let chat = OpenAiClient::new(&config.model).context("Falha ao criar cliente do modelo")?;
    let diagnosis = DiagnosisClient::new(Arc::new(chat), &config.model);
    let state = AppState::new(pool, diagnosis, SessionStore::new(&config.session));

    let app = routes::router(state, config.max_concurrent_requests);

    info!(addr = %config.bind_addr, model = %config.model.model, "Servidor HTTP escutando");
    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Falha no servidor HTTP")?;

    info!("Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Não foi possível escutar o sinal de encerramento");
        std::future::pending::<()>().await;
    }
}
