//! Diagnóstico diferencial assistido por modelo de linguagem
//!
//! O cliente monta o prompt a partir dos dados do formulário, faz uma única
//! chamada ao modelo e interpreta a resposta. `try_analyze` expõe a falha
//! como `Result`; `analyze` nunca falha e devolve o resultado de erro fixo
//! quando algo dá errado. Não há novas tentativas nem cache.

pub mod openai;
pub mod parser;
pub mod prompt;

use std::sync::Arc;

use common_db::{Diagnosis, DiagnosisResult, Probability, Severity};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ModelConfig;
use crate::intake::Intake;
pub use openai::{ChatCompletion, ChatMessage, ChatRequest, OpenAiClient, ResponseFormat};
pub use parser::{parse_diagnosis, ParseError};

/// Nome da hipótese usada no resultado de erro
pub const FALLBACK_DIAGNOSIS_NAME: &str = "Erro na Análise";

/// Falhas possíveis de uma análise
#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Falha na comunicação com o modelo: {0}")]
    Http(String),

    #[error("A API do modelo respondeu com status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Resposta da API em formato inesperado: {0}")]
    Envelope(String),

    #[error("O modelo devolveu uma resposta vazia")]
    EmptyResponse,

    #[error("Falha ao interpretar a resposta do modelo: {0}")]
    Parse(#[from] ParseError),
}

/// Resultado devolvido quando a análise não pode ser concluída
pub fn fallback_result() -> DiagnosisResult {
    DiagnosisResult {
        diagnoses: vec![Diagnosis {
            name: FALLBACK_DIAGNOSIS_NAME.to_string(),
            probability: Probability::Unknown,
            description: "Não foi possível processar sua solicitação no momento. Por favor, tente novamente."
                .to_string(),
            severity: Severity::Unknown,
        }],
        recommendations: vec![
            "Por favor, tente novamente mais tarde".to_string(),
            "Se os sintomas persistirem, procure atendimento médico presencial".to_string(),
        ],
        warning_signs: Vec::new(),
        seek_immediate_care: false,
        general_advice: "Em caso de dúvida, sempre procure atendimento médico.".to_string(),
    }
}

/// Cliente de diagnóstico: prompt, chamada ao modelo e interpretação
pub struct DiagnosisClient {
    chat: Arc<dyn ChatCompletion>,
    model: String,
    temperature: Option<f32>,
    max_completion_tokens: u32,
    json_mode: bool,
}

impl DiagnosisClient {
    pub fn new(chat: Arc<dyn ChatCompletion>, config: &ModelConfig) -> Self {
        Self {
            chat,
            model: config.model.clone(),
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
            json_mode: config.json_mode,
        }
    }

    /// Monta a requisição de chat para os dados informados
    pub fn build_request(&self, intake: &Intake) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompt::SYSTEM_PROMPT),
                ChatMessage::user(prompt::build_user_prompt(intake)),
            ],
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
            response_format: self.json_mode.then(ResponseFormat::json_object),
        }
    }

    /// Executa a análise, expondo qualquer falha ao chamador
    pub async fn try_analyze(&self, intake: &Intake) -> Result<DiagnosisResult, DiagnosisError> {
        let request = self.build_request(intake);
        let raw = self.chat.complete(&request).await?;
        debug!(response = %raw, "Resposta bruta do modelo");

        parse_diagnosis(&raw).map_err(|e| {
            warn!(error = %e, response = %raw, "Resposta do modelo não pôde ser interpretada");
            DiagnosisError::from(e)
        })
    }

    /// Executa a análise; em caso de falha devolve `fallback_result()`
    pub async fn analyze(&self, intake: &Intake) -> DiagnosisResult {
        match self.try_analyze(intake).await {
            Ok(result) => {
                info!(
                    diagnoses = result.diagnoses.len(),
                    seek_immediate_care = result.seek_immediate_care,
                    "Análise concluída"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "Erro ao analisar sintomas, usando resultado de erro");
                fallback_result()
            }
        }
    }
}
