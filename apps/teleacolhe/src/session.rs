//! Sessões de navegador
//!
//! O estado fica em memória no servidor; o cookie carrega apenas o
//! identificador da sessão assinado com HMAC-SHA256. Cookies com assinatura
//! inválida são ignorados e uma nova sessão é emitida.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use common_db::DiagnosisResult;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "teleacolhe_session";

type HmacSha256 = Hmac<Sha256>;

/// Dados guardados para um navegador
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub last_diagnosis: Option<DiagnosisResult>,
    pub consultation_id: Option<i64>,
    /// Mensagem exibida uma única vez no próximo formulário
    pub error_message: Option<String>,
}

struct Entry {
    data: SessionData,
    touched: Instant,
}

/// Armazenamento compartilhado de sessões
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
    secret: Arc<Vec<u8>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            secret: Arc::new(config.secret.as_bytes().to_vec()),
            ttl: config.ttl,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC aceita chaves de qualquer tamanho")
    }

    fn sign(&self, id: &Uuid) -> String {
        let mut mac = self.mac();
        mac.update(id.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Valor do cookie para a sessão: `<uuid>.<assinatura>`
    pub fn cookie_value(&self, id: &Uuid) -> String {
        format!("{}.{}", id, self.sign(id))
    }

    /// Recupera o identificador de um valor de cookie, se a assinatura conferir
    pub fn verify(&self, value: &str) -> Option<Uuid> {
        let (raw_id, raw_sig) = value.split_once('.')?;
        let id = Uuid::parse_str(raw_id).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(raw_sig).ok()?;

        let mut mac = self.mac();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(id)
    }

    /// Abre a sessão indicada pelo cabeçalho `Cookie`, ou cria uma nova
    pub fn open(&self, cookie_header: Option<&str>) -> Session {
        let existing = cookie_header
            .and_then(|header| find_cookie(header, SESSION_COOKIE))
            .and_then(|value| self.verify(value));

        match existing {
            Some(id) => Session { id, is_new: false, store: self.clone() },
            None => Session { id: Uuid::new_v4(), is_new: true, store: self.clone() },
        }
    }

    async fn read<T>(&self, id: &Uuid, f: impl FnOnce(&SessionData) -> T) -> Option<T> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|entry| entry.touched.elapsed() < self.ttl)
            .map(|entry| f(&entry.data))
    }

    async fn write<T>(&self, id: &Uuid, f: impl FnOnce(&mut SessionData) -> T) -> T {
        let mut entries = self.entries.write().await;

        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, entry| entry.touched.elapsed() < ttl);
        if entries.len() < before {
            debug!(expired = before - entries.len(), "Sessões expiradas removidas");
        }

        let entry = entries.entry(*id).or_insert_with(|| Entry {
            data: SessionData::default(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        f(&mut entry.data)
    }

    /// Quantidade de sessões em memória
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Procura um cookie pelo nome em um cabeçalho `Cookie`
fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// Sessão da requisição atual
pub struct Session {
    id: Uuid,
    is_new: bool,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Guarda o diagnóstico da última consulta
    pub async fn set_diagnosis(&self, diagnosis: DiagnosisResult, consultation_id: i64) {
        self.store
            .write(&self.id, |data| {
                data.last_diagnosis = Some(diagnosis);
                data.consultation_id = Some(consultation_id);
            })
            .await;
    }

    /// Diagnóstico da última consulta e o identificador dela
    pub async fn diagnosis(&self) -> Option<(DiagnosisResult, Option<i64>)> {
        self.store
            .read(&self.id, |data| {
                data.last_diagnosis
                    .clone()
                    .map(|diagnosis| (diagnosis, data.consultation_id))
            })
            .await
            .flatten()
    }

    /// Registra uma mensagem de erro para o próximo formulário
    pub async fn flash_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.store
            .write(&self.id, |data| data.error_message = Some(message))
            .await;
    }

    /// Consome a mensagem de erro pendente
    pub async fn take_error(&self) -> Option<String> {
        let pending = self
            .store
            .read(&self.id, |data| data.error_message.is_some())
            .await
            .unwrap_or(false);
        if !pending {
            return None;
        }
        self.store.write(&self.id, |data| data.error_message.take()).await
    }

    /// Cabeçalho `Set-Cookie` para sessões recém-criadas
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            self.store.cookie_value(&self.id)
        );
        HeaderValue::from_str(&cookie).ok()
    }

    /// Anexa o cookie da sessão à resposta quando necessário
    pub fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = self.set_cookie() {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        response
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let header = parts.headers.get(COOKIE).and_then(|v| v.to_str().ok());
        Ok(store.open(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_db::{Diagnosis, Probability, Severity};

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig {
            secret: "segredo-de-teste".to_string(),
            ttl: Duration::from_secs(60),
        })
    }

    fn diagnosis() -> DiagnosisResult {
        DiagnosisResult {
            diagnoses: vec![Diagnosis {
                name: "Resfriado".to_string(),
                probability: Probability::High,
                description: "Infecção leve das vias aéreas".to_string(),
                severity: Severity::Mild,
            }],
            recommendations: vec![],
            warning_signs: vec![],
            seek_immediate_care: false,
            general_advice: String::new(),
        }
    }

    #[test]
    fn signed_cookie_round_trips() {
        let store = store();
        let id = Uuid::new_v4();

        assert_eq!(store.verify(&store.cookie_value(&id)), Some(id));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let store = store();
        let value = store.cookie_value(&Uuid::new_v4());
        let (_, signature) = value.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::new_v4(), signature);

        assert_eq!(store.verify(&forged), None);
        assert_eq!(store.verify("sem-ponto"), None);
        assert_eq!(store.verify("abc.def"), None);
    }

    #[test]
    fn cookie_from_other_secret_is_rejected() {
        let other = SessionStore::new(&SessionConfig {
            secret: "outro".to_string(),
            ttl: Duration::from_secs(60),
        });
        let value = other.cookie_value(&Uuid::new_v4());

        assert_eq!(store().verify(&value), None);
    }

    #[test]
    fn open_reuses_valid_cookie() {
        let store = store();
        let id = Uuid::new_v4();
        let header = format!("tema=escuro; {}={}", SESSION_COOKIE, store.cookie_value(&id));

        let session = store.open(Some(&header));
        assert_eq!(session.id(), id);
        assert!(!session.is_new());
        assert!(session.set_cookie().is_none());

        let fresh = store.open(None);
        assert!(fresh.is_new());
        assert!(fresh.set_cookie().is_some());
    }

    #[tokio::test]
    async fn flash_error_is_consumed_once() {
        let store = store();
        let session = store.open(None);

        session.flash_error("Tente novamente").await;

        assert_eq!(session.take_error().await.as_deref(), Some("Tente novamente"));
        assert_eq!(session.take_error().await, None);
    }

    #[tokio::test]
    async fn diagnosis_is_kept_per_session() {
        let store = store();
        let first = store.open(None);
        let second = store.open(None);

        first.set_diagnosis(diagnosis(), 7).await;

        assert_eq!(first.diagnosis().await, Some((diagnosis(), Some(7))));
        assert_eq!(second.diagnosis().await, None);
    }

    #[tokio::test]
    async fn expired_sessions_are_empty_and_pruned() {
        let store = SessionStore::new(&SessionConfig {
            secret: "segredo".to_string(),
            ttl: Duration::ZERO,
        });
        let session = store.open(None);

        session.set_diagnosis(diagnosis(), 1).await;
        assert_eq!(session.diagnosis().await, None);

        store.open(None).flash_error("x").await;
        assert_eq!(store.len().await, 1);
    }
}
