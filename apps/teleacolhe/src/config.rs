//! Configuração do serviço
//!
//! Toda a configuração é resolvida uma única vez na inicialização e então
//! repassada explicitamente aos componentes. Nenhum handler lê variáveis de
//! ambiente durante o atendimento de uma requisição.

use std::net::SocketAddr;
use std::time::Duration;

use common_db::DbConfig;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SESSION_SECRET: &str = "dev-secret";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Famílias de modelos de raciocínio que só aceitam a temperatura padrão
const FIXED_TEMPERATURE_MODELS: &[&str] = &["gpt-5", "o1", "o3", "o4"];

/// Temperatura usada quando `OPENAI_TEMPERATURE` não foi definida.
///
/// Modelos de raciocínio rejeitam qualquer valor explícito, então o campo é
/// omitido para eles.
pub fn default_temperature(model: &str) -> Option<f32> {
    let model = model.trim().to_ascii_lowercase();
    let fixed = FIXED_TEMPERATURE_MODELS.iter().any(|family| {
        model == *family
            || model
                .strip_prefix(family)
                .is_some_and(|rest| rest.starts_with('-') || rest.starts_with('.'))
    });
    (!fixed).then_some(DEFAULT_TEMPERATURE)
}

/// Erros de configuração detectados na inicialização
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("A variável OPENAI_API_KEY é obrigatória")]
    MissingApiKey,

    #[error("Valor inválido para {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Formato de saída dos logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Parâmetros da chamada ao modelo de linguagem
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// `None` omite o campo da requisição
    pub temperature: Option<f32>,
    pub max_completion_tokens: u32,
    /// Envia `response_format: json_object`
    pub json_mode: bool,
    /// `None` mantém o padrão do cliente HTTP
    pub timeout: Option<Duration>,
}

impl ModelConfig {
    /// Configuração com os valores padrão, útil para testes
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: default_temperature(DEFAULT_MODEL),
            max_completion_tokens: 2048,
            json_mode: true,
            timeout: None,
        }
    }
}

/// Configuração das sessões de navegador
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Configuração completa do processo
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub max_concurrent_requests: usize,
    pub log_format: LogFormat,
    pub database: DbConfig,
    pub model: ModelConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Lê a configuração das variáveis de ambiente do processo
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Lê a configuração a partir de uma função de consulta arbitrária
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = var("OPENAI_API_KEY").ok_or(ConfigError::MissingApiKey)?;
        let model_name = var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        // Uma variável presente mas vazia desliga a temperatura
        let temperature = match lookup("OPENAI_TEMPERATURE") {
            None => default_temperature(&model_name),
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(parse("OPENAI_TEMPERATURE", raw.trim())?),
        };

        let model = ModelConfig {
            api_key,
            model: model_name,
            base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature,
            max_completion_tokens: parse_or(&var, "OPENAI_MAX_TOKENS", 2048)?,
            json_mode: parse_bool_or(&var, "OPENAI_JSON_MODE", true)?,
            timeout: var("OPENAI_TIMEOUT_SECS")
                .map(|raw| parse::<u64>("OPENAI_TIMEOUT_SECS", &raw))
                .transpose()?
                .map(Duration::from_secs),
        };

        let defaults = DbConfig::default();
        let database = DbConfig {
            db_path: var("DATABASE_PATH").unwrap_or(defaults.db_path),
            max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
        };

        let session = SessionConfig {
            secret: var("SESSION_SECRET").unwrap_or_else(|| DEFAULT_SESSION_SECRET.to_string()),
            ttl: Duration::from_secs(parse_or(&var, "SESSION_TTL_SECS", 3600)?),
        };

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let max_concurrent_requests: usize = parse_or(&var, "MAX_CONCURRENT_REQUESTS", 64)?;
        if max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_CONCURRENT_REQUESTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or(&var, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000)))?,
            max_concurrent_requests,
            log_format,
            database,
            model,
            session,
        })
    }

    /// Indica se o segredo de sessão ainda é o valor de desenvolvimento
    pub fn uses_default_session_secret(&self) -> bool {
        self.session.secret == DEFAULT_SESSION_SECRET
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => parse(name, &raw),
        None => Ok(default),
    }
}

fn parse_bool_or<V>(var: &V, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(name).map(|v| v.to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "sim") => Ok(true),
        Some("0" | "false" | "no" | "nao" | "não") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            name,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use crate::diagnosis::openai::MockChatCompletion;
    use crate::diagnosis::DiagnosisClient;
    use crate::intake::Intake;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model.temperature, None);
        assert_eq!(config.model.max_completion_tokens, 2048);
        assert!(config.model.json_mode);
        assert!(config.model.timeout.is_none());
        assert_eq!(config.database.db_path, "teleacolhe.db");
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.uses_default_session_secret());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_TEMPERATURE", ""),
            ("OPENAI_JSON_MODE", "false"),
            ("OPENAI_TIMEOUT_SECS", "30"),
            ("DATABASE_PATH", "/tmp/consultas.db"),
            ("SESSION_SECRET", "segredo"),
            ("LOG_FORMAT", "json"),
            ("BIND_ADDR", "127.0.0.1:8000"),
        ]))
        .unwrap();

        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model.temperature, None);
        assert!(!config.model.json_mode);
        assert_eq!(config.model.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.database.db_path, "/tmp/consultas.db");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_addr, "127.0.0.1:8000".parse().unwrap());
        assert!(!config.uses_default_session_secret());
    }

    #[test]
    fn test_default_model_request_omits_temperature() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        let client = DiagnosisClient::new(Arc::new(MockChatCompletion::new()), &config.model);
        let intake = Intake {
            age: 34,
            sex: "feminino".to_string(),
            symptoms: "febre".to_string(),
            duration: "2 dias".to_string(),
            intensity: "moderada".to_string(),
            additional_info: String::new(),
        };

        let body = serde_json::to_value(client.build_request(&intake)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["max_completion_tokens"], 2048);
    }

    #[test]
    fn test_temperature_follows_model_family() {
        for model in ["gpt-5", "gpt-5-mini", "GPT-5.1", "o3", "o4-mini"] {
            let config = AppConfig::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", model),
            ]))
            .unwrap();
            assert_eq!(config.model.temperature, None, "{model}");
        }

        for model in ["gpt-4o-mini", "gpt-4.1", "llama3", "o1x"] {
            let config = AppConfig::from_lookup(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", model),
            ]))
            .unwrap();
            assert_eq!(config.model.temperature, Some(DEFAULT_TEMPERATURE), "{model}");
        }
    }

    #[test]
    fn test_explicit_temperature_is_kept() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEMPERATURE", "1"),
        ]))
        .unwrap();

        assert_eq!(config.model.model, DEFAULT_MODEL);
        assert_eq!(config.model.temperature, Some(1.0));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MAX_TOKENS", "muitos"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::Invalid { name, value } => {
                assert_eq!(name, "OPENAI_MAX_TOKENS");
                assert_eq!(value, "muitos");
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }
}
