//! Prompts enviados ao modelo

use crate::intake::Intake;

pub const SYSTEM_PROMPT: &str = r#"Você é um assistente médico especializado em triagem inicial e diagnóstico diferencial.
Sua função é ajudar pessoas em regiões com baixa cobertura médica a entender seus sintomas.

IMPORTANTE:
- Sempre enfatize que isto NÃO substitui consulta médica presencial
- Foque em orientações gerais de saúde e sinais de alerta
- Use linguagem simples e acessível
- Considere condições comuns e prevalentes no Brasil
- Sempre recomende procurar atendimento médico quando necessário
- Responda sempre em português do Brasil

Responda APENAS em JSON válido, sem texto fora do objeto, com este formato exato:
{
  "diagnoses": [
    {
      "name": "Nome da condição",
      "probability": "alta/média/baixa",
      "description": "Descrição breve e clara",
      "severity": "leve/moderada/grave"
    }
  ],
  "recommendations": [
    "Recomendação 1",
    "Recomendação 2"
  ],
  "warning_signs": [
    "Sinal de alerta 1",
    "Sinal de alerta 2"
  ],
  "seek_immediate_care": true/false,
  "general_advice": "Conselho geral de cuidados"
}"#;

/// Monta a mensagem do usuário com os dados do formulário.
///
/// A linha de informações adicionais só aparece quando há conteúdo.
pub fn build_user_prompt(intake: &Intake) -> String {
    let mut lines = vec![
        "Paciente com as seguintes características:".to_string(),
        format!("- Idade: {} anos", intake.age),
        format!("- Sexo: {}", intake.sex),
        format!("- Sintomas: {}", intake.symptoms),
        format!("- Duração: {}", intake.duration),
        format!("- Intensidade: {}", intake.intensity),
    ];
    if !intake.additional_info.is_empty() {
        lines.push(format!("- Informações adicionais: {}", intake.additional_info));
    }
    lines.push(String::new());
    lines.push(
        "Por favor, analise estes sintomas e forneça diagnósticos diferenciais prováveis com recomendações."
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(additional_info: &str) -> Intake {
        Intake {
            age: 34,
            sex: "feminino".to_string(),
            symptoms: "febre e dor de cabeça".to_string(),
            duration: "2 dias".to_string(),
            intensity: "moderada".to_string(),
            additional_info: additional_info.to_string(),
        }
    }

    #[test]
    fn user_prompt_interpolates_every_field() {
        let prompt = build_user_prompt(&intake("hipertensa"));

        assert!(prompt.contains("- Idade: 34 anos"));
        assert!(prompt.contains("- Sexo: feminino"));
        assert!(prompt.contains("- Sintomas: febre e dor de cabeça"));
        assert!(prompt.contains("- Duração: 2 dias"));
        assert!(prompt.contains("- Intensidade: moderada"));
        assert!(prompt.contains("- Informações adicionais: hipertensa"));
    }

    #[test]
    fn user_prompt_skips_empty_additional_info() {
        let prompt = build_user_prompt(&intake(""));
        assert!(!prompt.contains("Informações adicionais"));
        assert!(prompt.ends_with("com recomendações."));
    }

    #[test]
    fn system_prompt_carries_disclaimer_and_shape() {
        assert!(SYSTEM_PROMPT.contains("NÃO substitui consulta médica presencial"));
        for key in ["diagnoses", "recommendations", "warning_signs", "seek_immediate_care", "general_advice"] {
            assert!(SYSTEM_PROMPT.contains(key), "faltando {key}");
        }
    }
}
