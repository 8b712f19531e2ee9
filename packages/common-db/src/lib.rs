//! Common DB - Biblioteca compartilhada para acesso ao banco de dados do TeleAcolhe
//!
//! Esta biblioteca fornece:
//! - Modelos de dados compartilhados (consulta e resultado de diagnóstico)
//! - Migrações automáticas do banco de dados
//! - Repositório de consultas
//! - Pool de conexão e funções de utilidades para SQLite

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

pub mod consultations;
pub mod error;
pub mod migrations;
pub mod models;

pub use consultations::{count_consultations, find_consultation, insert_consultation};
pub use error::DbError;
pub use models::{Consultation, Diagnosis, DiagnosisResult, NewConsultation, Probability, Severity};

/// Configuração da conexão com o banco de dados
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Caminho para o arquivo SQLite
    pub db_path: String,
    /// Número máximo de conexões no pool
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            db_path: "teleacolhe.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Inicializa uma conexão com o banco de dados SQLite e aplica as migrações
pub async fn init_db_pool(config: &DbConfig) -> Result<SqlitePool> {
    let db_path = Path::new(&config.db_path);

    // Verifica se o diretório pai existe
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .context("Falha ao criar diretório para banco de dados")?;
        }
    }

    let connection_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connection_options)
        .await
        .context("Falha ao conectar ao banco de dados SQLite")?;

    migrations::run_migrations(&pool).await
        .context("Falha ao aplicar migrações")?;

    info!("Banco de dados inicializado com sucesso: {}", config.db_path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_db_connection() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test.db");

        let config = DbConfig {
            db_path: db_path.to_str().unwrap().to_string(),
            max_connections: 2,
        };

        let pool = init_db_pool(&config).await?;

        let result: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await?;

        assert_eq!(result.0, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("data").join("nested").join("teleacolhe.db");

        let config = DbConfig {
            db_path: db_path.to_string_lossy().into_owned(),
            ..DbConfig::default()
        };
        init_db_pool(&config).await?;

        assert!(db_path.exists());
        Ok(())
    }
}
