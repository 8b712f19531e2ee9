//! Validação do formulário de sintomas

use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Campos brutos do `POST /processar`. Campos ausentes chegam vazios.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeForm {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub intensity: String,
    #[serde(default)]
    pub additional_info: String,
}

/// Dados do paciente já validados
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Intake {
    #[validate(range(min = 1, max = 130, message = "Informe uma idade válida."))]
    pub age: u32,
    #[validate(length(max = 20, message = "O sexo informado é muito longo."))]
    pub sex: String,
    #[validate(length(max = 4000, message = "A descrição dos sintomas está muito longa."))]
    pub symptoms: String,
    #[validate(length(max = 50, message = "A duração informada é muito longa."))]
    pub duration: String,
    #[validate(length(max = 20, message = "A intensidade informada é muito longa."))]
    pub intensity: String,
    #[validate(length(max = 4000, message = "As informações adicionais estão muito longas."))]
    pub additional_info: String,
}

/// Falha de validação com a mensagem a ser exibida ao usuário
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct IntakeError {
    pub field: &'static str,
    pub message: String,
}

impl IntakeError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl IntakeForm {
    /// Converte e valida os campos do formulário.
    ///
    /// Idade não numérica e idade zero têm mensagens próprias.
    pub fn validate(&self) -> Result<Intake, IntakeError> {
        let raw_age = self.age.trim();
        if raw_age.is_empty() {
            return Err(IntakeError::new("age", "Informe a sua idade."));
        }
        if !raw_age.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IntakeError::new("age", "Informe a idade usando apenas números."));
        }
        // Só dígitos: a falha restante é estouro de u32
        let age: u32 = raw_age
            .parse()
            .map_err(|_| IntakeError::new("age", "Informe uma idade válida."))?;
        if age == 0 {
            return Err(IntakeError::new("age", "A idade deve ser maior que zero."));
        }

        let intake = Intake {
            age,
            sex: self.sex.trim().to_string(),
            symptoms: self.symptoms.trim().to_string(),
            duration: self.duration.trim().to_string(),
            intensity: self.intensity.trim().to_string(),
            additional_info: self.additional_info.trim().to_string(),
        };

        intake.check()?;
        Ok(intake)
    }
}

impl Intake {
    /// Aplica as regras de campo obrigatório e de tamanho, na ordem do
    /// formulário, e devolve o primeiro erro encontrado.
    fn check(&self) -> Result<(), IntakeError> {
        let errors = self.validate().err();

        if let Some(e) = field_error(errors.as_ref(), "age") {
            return Err(e);
        }

        let fields = [
            ("sex", &self.sex, Some("Informe o sexo.")),
            ("symptoms", &self.symptoms, Some("Descreva os sintomas que você está sentindo.")),
            ("duration", &self.duration, Some("Informe há quanto tempo os sintomas começaram.")),
            ("intensity", &self.intensity, Some("Informe a intensidade dos sintomas.")),
            ("additional_info", &self.additional_info, None),
        ];
        for (field, value, missing) in fields {
            if let Some(message) = missing.filter(|_| value.is_empty()) {
                return Err(IntakeError::new(field, message));
            }
            if let Some(e) = field_error(errors.as_ref(), field) {
                return Err(e);
            }
        }

        match errors {
            Some(_) => Err(IntakeError::new("form", "Verifique os dados informados.")),
            None => Ok(()),
        }
    }
}

fn field_error(errors: Option<&ValidationErrors>, field: &'static str) -> Option<IntakeError> {
    let field_errors = errors?.field_errors();
    let message = field_errors.get(field)?.first()?.message.as_ref()?;
    Some(IntakeError::new(field, message.to_string()))
}
