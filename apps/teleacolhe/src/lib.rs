//! TeleAcolhe - triagem de sintomas com diagnóstico diferencial assistido por IA
//!
//! O fluxo é linear: o formulário é validado, os dados seguem para o modelo
//! de linguagem, a consulta é registrada no SQLite e o resultado fica na
//! sessão do navegador para exibição.

pub mod config;
pub mod diagnosis;
pub mod intake;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod views;

/// Metadados gerados em tempo de compilação
#[allow(dead_code)]
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use config::AppConfig;
pub use diagnosis::{DiagnosisClient, DiagnosisError, OpenAiClient};
pub use state::AppState;
