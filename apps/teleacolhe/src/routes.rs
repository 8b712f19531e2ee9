//! Rotas HTTP do TeleAcolhe

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use common_db::{insert_consultation, NewConsultation};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::build_info;
use crate::intake::IntakeForm;
use crate::session::Session;
use crate::state::AppState;
use crate::views;

/// Mensagem exibida quando a consulta não pôde ser registrada
pub const PROCESSING_ERROR: &str =
    "Não foi possível processar sua solicitação. Por favor, tente novamente mais tarde.";

/// Mensagem exibida quando o corpo do formulário não pôde ser lido
pub const INVALID_FORM: &str =
    "Não foi possível ler o formulário enviado. Por favor, preencha os campos novamente.";

/// Monta o roteador completo com as camadas de middleware
pub fn router(state: AppState, max_concurrent_requests: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sintomas", get(symptoms_form))
        .route("/processar", post(process_symptoms))
        .route("/resultados", get(results))
        .route("/sobre", get(about))
        .route("/como-funciona", get(how_it_works))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests))
        .with_state(state)
}

async fn index() -> Html<String> {
    Html(views::index())
}

async fn symptoms_form(session: Session) -> Response {
    let error = session.take_error().await;
    session.respond(Html(views::symptoms_form(error.as_deref())))
}

async fn process_symptoms(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<IntakeForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(error = %rejection, "Corpo do formulário rejeitado");
            session.flash_error(INVALID_FORM).await;
            return session.respond(Redirect::to("/sintomas"));
        }
    };

    let intake = match form.validate() {
        Ok(intake) => intake,
        Err(e) => {
            info!(field = e.field, "Formulário de sintomas rejeitado");
            session.flash_error(e.message).await;
            return session.respond(Redirect::to("/sintomas"));
        }
    };

    let diagnosis = state.diagnosis.analyze(&intake).await;

    let consultation = NewConsultation {
        age: intake.age,
        sex: intake.sex,
        symptoms: intake.symptoms,
        duration: intake.duration,
        intensity: intake.intensity,
        additional_info: intake.additional_info,
        diagnosis: diagnosis.clone(),
    };

    match insert_consultation(&state.pool, &consultation).await {
        Ok(id) => {
            info!(consultation_id = id, "Consulta processada");
            session.set_diagnosis(diagnosis, id).await;
            session.respond(Redirect::to("/resultados"))
        }
        Err(e) => {
            error!(error = %e, "Erro ao registrar consulta");
            session.flash_error(PROCESSING_ERROR).await;
            session.respond(Redirect::to("/sintomas"))
        }
    }
}

async fn results(session: Session) -> Response {
    match session.diagnosis().await {
        Some((diagnosis, consultation_id)) => {
            session.respond(Html(views::results(&diagnosis, consultation_id)))
        }
        None => session.respond(Redirect::to("/")),
    }
}

async fn about() -> Html<String> {
    Html(views::about(build_info::PKG_VERSION))
}

async fn how_it_works() -> Html<String> {
    Html(views::how_it_works())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(views::not_found()))
}
