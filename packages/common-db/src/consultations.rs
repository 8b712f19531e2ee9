//! Repositório de consultas
//!
//! Uma consulta é gravada uma única vez por envio do formulário e nunca é
//! alterada ou removida.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbError;
use crate::models::{Consultation, NewConsultation};

/// Insere uma nova consulta e devolve o identificador atribuído
pub async fn insert_consultation(pool: &SqlitePool, new: &NewConsultation) -> Result<i64, DbError> {
    let diagnosis_json = serde_json::to_string(&new.diagnosis)?;

    let result = sqlx::query(
        "INSERT INTO consultations \
         (age, sex, symptoms, duration, intensity, additional_info, diagnosis_result, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(i64::from(new.age))
    .bind(&new.sex)
    .bind(&new.symptoms)
    .bind(&new.duration)
    .bind(&new.intensity)
    .bind(&new.additional_info)
    .bind(diagnosis_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    debug!(consultation_id = id, "Consulta registrada");
    Ok(id)
}

/// Busca uma consulta pelo identificador
pub async fn find_consultation(pool: &SqlitePool, id: i64) -> Result<Consultation, DbError> {
    sqlx::query_as::<_, Consultation>(
        "SELECT id, age, sex, symptoms, duration, intensity, additional_info, diagnosis_result, created_at \
         FROM consultations WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DbError::NotFound(format!("Consulta {}", id)),
        other => other.into(),
    })
}

/// Conta as consultas registradas
pub async fn count_consultations(pool: &SqlitePool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consultations")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
