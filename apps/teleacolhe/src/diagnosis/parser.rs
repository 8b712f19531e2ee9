//! Leitura tolerante da resposta do modelo.
//!
//! Primeiro tenta o texto inteiro como JSON; se falhar, recorta do primeiro `{`
//! até o último `}` e tenta de novo.

use common_db::DiagnosisResult;
use serde_json::error::Category;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Nenhum objeto JSON encontrado na resposta")]
    NoJsonObject,

    #[error("JSON inválido: {0}")]
    InvalidJson(String),

    #[error("JSON fora do formato esperado: {0}")]
    Shape(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        match error.classify() {
            Category::Data => ParseError::Shape(error.to_string()),
            Category::Io | Category::Syntax | Category::Eof => ParseError::InvalidJson(error.to_string()),
        }
    }
}

/// Recorta o trecho entre o primeiro `{` e o último `}`.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Interpreta o texto devolvido pelo modelo como um `DiagnosisResult`.
pub fn parse_diagnosis(text: &str) -> Result<DiagnosisResult, ParseError> {
    let trimmed = text.trim();
    if let Ok(result) = serde_json::from_str::<DiagnosisResult>(trimmed) {
        return Ok(result);
    }

    let span = brace_span(trimmed).ok_or(ParseError::NoJsonObject)?;
    Ok(serde_json::from_str::<DiagnosisResult>(span)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_db::{Probability, Severity};

    const WELL_FORMED: &str = r#"{
        "diagnoses": [
            {"name": "Dengue", "probability": "média", "description": "Infecção viral", "severity": "moderada"},
            {"name": "Gripe", "probability": "alta", "description": "Infecção respiratória", "severity": "leve"}
        ],
        "recommendations": ["Hidrate-se", "Repouse"],
        "warning_signs": ["Sangramentos"],
        "seek_immediate_care": false,
        "general_advice": "Procure uma unidade de saúde se piorar."
    }"#;

    #[test]
    fn parses_plain_json() {
        let result = parse_diagnosis(WELL_FORMED).unwrap();

        assert_eq!(result.diagnoses.len(), 2);
        assert_eq!(result.diagnoses[0].name, "Dengue");
        assert_eq!(result.diagnoses[0].probability, Probability::Medium);
        assert_eq!(result.diagnoses[1].severity, Severity::Mild);
        assert_eq!(result.warning_signs, vec!["Sangramentos".to_string()]);
    }

    #[test]
    fn extracts_object_surrounded_by_noise() {
        let noisy = format!("Claro! Segue a análise:\n```json\n{WELL_FORMED}\n```\nEspero ter ajudado.");

        let direct = parse_diagnosis(WELL_FORMED).unwrap();
        let extracted = parse_diagnosis(&noisy).unwrap();

        assert_eq!(extracted, direct);
    }

    #[test]
    fn text_without_braces_is_rejected() {
        assert_eq!(
            parse_diagnosis("Não consigo ajudar com isso."),
            Err(ParseError::NoJsonObject)
        );
        assert_eq!(parse_diagnosis("} ao contrário {"), Err(ParseError::NoJsonObject));
        assert_eq!(parse_diagnosis(""), Err(ParseError::NoJsonObject));
    }

    #[test]
    fn broken_span_is_invalid_json() {
        let err = parse_diagnosis("resposta: {\"diagnoses\": [ }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn wrong_shape_is_reported() {
        let err = parse_diagnosis(r#"{"diagnosis": "gripe"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Shape(_)));
    }
}
