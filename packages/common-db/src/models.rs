//! Modelos de dados compartilhados entre aplicações
//!
//! Este módulo define as estruturas de dados principais do TeleAcolhe: a
//! consulta persistida e o resultado de diagnóstico que ela carrega.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Normaliza um rótulo vindo do modelo: minúsculas, sem acentos, sem espaços nas bordas.
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Probabilidade estimada de uma hipótese diagnóstica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Probability {
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "média")]
    Medium,
    #[serde(rename = "baixa")]
    Low,
    #[serde(rename = "desconhecida")]
    Unknown,
}

impl Probability {
    /// Interpreta o rótulo livre devolvido pelo modelo.
    ///
    /// Qualquer valor fora do conjunto conhecido vira `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "alta" => Probability::High,
            "media" => Probability::Medium,
            "baixa" => Probability::Low,
            _ => Probability::Unknown,
        }
    }

    /// Rótulo em português gravado no banco e exibido ao paciente
    pub fn label(&self) -> &'static str {
        match self {
            Probability::High => "alta",
            Probability::Medium => "média",
            Probability::Low => "baixa",
            Probability::Unknown => "desconhecida",
        }
    }
}

impl std::fmt::Display for Probability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Probability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Probability::Unknown, |s| Probability::from_label(&s)))
    }
}

/// Gravidade de uma hipótese diagnóstica
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    #[serde(rename = "leve")]
    Mild,
    #[serde(rename = "moderada")]
    Moderate,
    #[serde(rename = "grave")]
    Severe,
    #[serde(rename = "desconhecida")]
    Unknown,
}

impl Severity {
    /// Interpreta o rótulo livre devolvido pelo modelo.
    pub fn from_label(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "leve" => Severity::Mild,
            "moderada" => Severity::Moderate,
            "grave" => Severity::Severe,
            _ => Severity::Unknown,
        }
    }

    /// Rótulo em português gravado no banco e exibido ao paciente
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Mild => "leve",
            Severity::Moderate => "moderada",
            Severity::Severe => "grave",
            Severity::Unknown => "desconhecida",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Severity::Unknown, |s| Severity::from_label(&s)))
    }
}

/// Uma hipótese de diagnóstico diferencial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Nome da condição
    pub name: String,
    /// Probabilidade estimada
    pub probability: Probability,
    /// Descrição breve e clara
    pub description: String,
    /// Gravidade da condição
    pub severity: Severity,
}

/// Resultado completo da análise de sintomas
///
/// É isto que fica serializado na coluna `diagnosis_result` de cada consulta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Hipóteses em ordem de relevância
    pub diagnoses: Vec<Diagnosis>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
    /// Indica se o paciente deve procurar atendimento imediato
    pub seek_immediate_care: bool,
    #[serde(default)]
    pub general_advice: String,
}

/// Consulta realizada por um usuário, como lida do banco
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    /// Identificador atribuído na inserção
    pub id: i64,
    pub age: u32,
    pub sex: String,
    pub symptoms: String,
    pub duration: String,
    pub intensity: String,
    pub additional_info: String,
    /// Diagnóstico gerado pela IA (ou o resultado de erro)
    pub diagnosis_result: DiagnosisResult,
    /// Data e hora de criação do registro
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for Consultation {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let age: i64 = row.try_get("age")?;
        let age = u32::try_from(age).map_err(|e| sqlx::Error::ColumnDecode {
            index: String::from("age"),
            source: Box::new(e),
        })?;

        let raw_diagnosis: String = row.try_get("diagnosis_result")?;
        let diagnosis_result =
            serde_json::from_str(&raw_diagnosis).map_err(|e| sqlx::Error::ColumnDecode {
                index: String::from("diagnosis_result"),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            age,
            sex: row.try_get("sex")?,
            symptoms: row.try_get("symptoms")?,
            duration: row.try_get("duration")?,
            intensity: row.try_get("intensity")?,
            additional_info: row
                .try_get::<Option<String>, _>("additional_info")?
                .unwrap_or_default(),
            diagnosis_result,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Dados de uma nova consulta, antes da inserção
#[derive(Debug, Clone)]
pub struct NewConsultation {
    pub age: u32,
    pub sex: String,
    pub symptoms: String,
    pub duration: String,
    pub intensity: String,
    pub additional_info: String,
    pub diagnosis: DiagnosisResult,
}
