//! Páginas HTML renderizadas no servidor

use std::fmt::Write as _;

use common_db::{DiagnosisResult, Severity};

/// Escapa texto para uso dentro de HTML
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | TeleAcolhe</title>
</head>
<body>
<header>
<nav>
<a href="/">TeleAcolhe</a>
<a href="/sintomas">Avaliar sintomas</a>
<a href="/como-funciona">Como funciona</a>
<a href="/sobre">Sobre</a>
</nav>
</header>
<main>
{body}
</main>
<footer>
<p>O TeleAcolhe oferece orientação inicial e <strong>não substitui uma consulta médica presencial</strong>.
Em caso de emergência, ligue 192 (SAMU).</p>
</footer>
</body>
</html>
"#,
        title = escape(title),
        body = body,
    )
}

pub fn index() -> String {
    layout(
        "Início",
        r#"<section>
<h1>Acolhimento em saúde, onde você estiver</h1>
<p>Descreva o que está sentindo e receba uma orientação inicial sobre possíveis causas,
cuidados recomendados e sinais de alerta.</p>
<p><a href="/sintomas">Começar avaliação</a></p>
</section>"#,
    )
}

pub fn symptoms_form(error: Option<&str>) -> String {
    let mut body = String::from("<section>\n<h1>Conte-nos sobre seus sintomas</h1>\n");
    if let Some(message) = error {
        let _ = writeln!(body, r#"<div class="alert alert-error" role="alert">{}</div>"#, escape(message));
    }
    body.push_str(
        r#"<form id="symptomsForm" method="post" action="/processar">
<fieldset>
<legend>Seus dados</legend>
<label for="age">Idade</label>
<input id="age" name="age" type="number" min="1" max="130" required>
<label for="sex">Sexo</label>
<select id="sex" name="sex" required>
<option value="">Selecione</option>
<option value="feminino">Feminino</option>
<option value="masculino">Masculino</option>
<option value="outro">Outro</option>
</select>
</fieldset>
<fieldset>
<legend>Sintomas</legend>
<label for="symptoms">O que você está sentindo?</label>
<textarea id="symptoms" name="symptoms" rows="5" required></textarea>
<label for="duration">Há quanto tempo?</label>
<select id="duration" name="duration" required>
<option value="">Selecione</option>
<option value="menos de 24 horas">Menos de 24 horas</option>
<option value="1 a 3 dias">1 a 3 dias</option>
<option value="4 a 7 dias">4 a 7 dias</option>
<option value="1 a 4 semanas">1 a 4 semanas</option>
<option value="mais de 1 mês">Mais de 1 mês</option>
</select>
<label for="intensity">Intensidade</label>
<select id="intensity" name="intensity" required>
<option value="">Selecione</option>
<option value="leve">Leve</option>
<option value="moderada">Moderada</option>
<option value="intensa">Intensa</option>
</select>
</fieldset>
<fieldset>
<legend>Informações adicionais</legend>
<label for="additional_info">Condições pré-existentes, medicamentos em uso, alergias (opcional)</label>
<textarea id="additional_info" name="additional_info" rows="3"></textarea>
</fieldset>
<button type="submit">Analisar sintomas</button>
</form>
</section>"#,
    );
    layout("Sintomas", &body)
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Mild => "severity-mild",
        Severity::Moderate => "severity-moderate",
        Severity::Severe => "severity-severe",
        Severity::Unknown => "severity-unknown",
    }
}

fn list(items: &[String]) -> String {
    let mut out = String::from("<ul>\n");
    for item in items {
        let _ = writeln!(out, "<li>{}</li>", escape(item));
    }
    out.push_str("</ul>\n");
    out
}

pub fn results(diagnosis: &DiagnosisResult, consultation_id: Option<i64>) -> String {
    let mut body = String::from("<section>\n<h1>Resultado da avaliação</h1>\n");

    if diagnosis.seek_immediate_care {
        body.push_str(
            r#"<div class="alert alert-urgent" role="alert"><strong>Procure atendimento médico imediatamente.</strong>
Dirija-se à unidade de saúde mais próxima ou ligue 192.</div>
"#,
        );
    }

    body.push_str("<h2>Possíveis condições</h2>\n");
    for item in &diagnosis.diagnoses {
        let _ = write!(
            body,
            r#"<article class="diagnosis {class}">
<h3>{name}</h3>
<p>Probabilidade: <strong>{probability}</strong> · Gravidade: <strong>{severity}</strong></p>
<p>{description}</p>
</article>
"#,
            class = severity_class(item.severity),
            name = escape(&item.name),
            probability = item.probability,
            severity = item.severity,
            description = escape(&item.description),
        );
    }

    if !diagnosis.recommendations.is_empty() {
        body.push_str("<h2>Recomendações</h2>\n");
        body.push_str(&list(&diagnosis.recommendations));
    }
    if !diagnosis.warning_signs.is_empty() {
        body.push_str("<h2>Sinais de alerta</h2>\n");
        body.push_str(&list(&diagnosis.warning_signs));
    }
    if !diagnosis.general_advice.is_empty() {
        let _ = writeln!(body, "<h2>Orientação geral</h2>\n<p>{}</p>", escape(&diagnosis.general_advice));
    }
    if let Some(id) = consultation_id {
        let _ = writeln!(body, r#"<p class="consultation-id">Protocolo da consulta: #{id}</p>"#);
    }

    body.push_str(r#"<p><a href="/sintomas">Fazer nova avaliação</a></p>
</section>"#);
    layout("Resultados", &body)
}

pub fn about(version: &str) -> String {
    layout(
        "Sobre",
        &format!(
            r#"<section>
<h1>Sobre o TeleAcolhe</h1>
<p>O TeleAcolhe nasceu para apoiar pessoas em regiões com pouca cobertura médica,
oferecendo uma primeira orientação sobre sintomas com linguagem simples.</p>
<p>As respostas são geradas por inteligência artificial e servem apenas como apoio.
Elas não substituem a avaliação de um profissional de saúde.</p>
<p class="version">Versão {}</p>
</section>"#,
            escape(version)
        ),
    )
}

pub fn how_it_works() -> String {
    layout(
        "Como funciona",
        r#"<section>
<h1>Como funciona</h1>
<ol>
<li>Você informa idade, sexo e descreve seus sintomas, a duração e a intensidade.</li>
<li>As informações são analisadas por um modelo de inteligência artificial orientado para triagem inicial.</li>
<li>Você recebe possíveis condições, recomendações de cuidado e sinais de alerta.</li>
</ol>
<p>Se algum sinal de alerta aparecer, procure atendimento médico presencial.</p>
</section>"#,
    )
}

pub fn not_found() -> String {
    layout(
        "Página não encontrada",
        r#"<section>
<h1>Página não encontrada</h1>
<p><a href="/">Voltar para o início</a></p>
</section>"#,
    )
}
