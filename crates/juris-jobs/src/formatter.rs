//! Notification formatter: subject and HTML body for each notification kind.
//!
//! Pure: same record, same `today`, same output.

use chrono::NaiveDate;
use juris_core::{CaseDeadlineRecord, NotificationKind, WeeklyStats};

pub const WEEKLY_SUBJECT: &str = "📊 Resumo Semanal - Sistema Jurídico";

const DATE_FORMAT: &str = "%d/%m/%Y";
const CLIENT_FALLBACK: &str = "Cliente";

/// What to render.
#[derive(Debug, Clone, Copy)]
pub enum NotificationInput<'a> {
    Deadline(&'a CaseDeadlineRecord),
    Weekly(&'a WeeklyStats),
}

impl NotificationInput<'_> {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationInput::Deadline(_) => NotificationKind::DeadlineReminder,
            NotificationInput::Weekly(_) => NotificationKind::WeeklySummary,
        }
    }
}

/// Rendering options shared by every kind.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Web app base URL. Adds an "open in the system" link when set.
    pub app_url: Option<String>,
}

impl FormatOptions {
    fn link(&self, path: &str) -> Option<String> {
        let base = self.app_url.as_deref()?.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{base}{path}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

pub fn render(input: NotificationInput<'_>, today: NaiveDate, options: &FormatOptions) -> RenderedEmail {
    match input {
        NotificationInput::Deadline(record) => render_deadline(record, today, options),
        NotificationInput::Weekly(stats) => render_weekly(stats, options),
    }
}

/// "em 3 dias", "em 1 dia", "hoje".
fn days_phrase(days: i64) -> String {
    match days {
        0 => "hoje".to_string(),
        1 => "em 1 dia".to_string(),
        n => format!("em {n} dias"),
    }
}

fn render_deadline(record: &CaseDeadlineRecord, today: NaiveDate, options: &FormatOptions) -> RenderedEmail {
    let days = record.days_remaining(today);
    let phrase = days_phrase(days);
    let subject = format!("⚠️ Prazo {phrase}: {}", record.description);

    let name = escape_html(record.client_name().unwrap_or(CLIENT_FALLBACK));
    let description = escape_html(&record.description);
    let deadline = record.deadline.format(DATE_FORMAT);

    let mut html = String::new();
    html.push_str("<html>\n<body>\n");
    html.push_str("<h2>Lembrete de Prazo</h2>\n");
    html.push_str(&format!("<p>Olá {name},</p>\n"));
    html.push_str(&format!(
        "<p>A demanda <strong>{description}</strong> vence <strong>{phrase}</strong>.</p>\n"
    ));
    html.push_str(&format!("<p>Prazo: {deadline}</p>\n"));
    match options.link(&format!("/demandas/{}", record.id)) {
        Some(url) => html.push_str(&format!(
            "<p><a href=\"{}\">Abrir no sistema</a></p>\n",
            escape_html(&url)
        )),
        None => html.push_str("<p>Acesse o sistema para mais detalhes.</p>\n"),
    }
    html.push_str("</body>\n</html>\n");

    RenderedEmail { subject, html }
}

fn render_weekly(stats: &WeeklyStats, options: &FormatOptions) -> RenderedEmail {
    let start = stats.window_start.format(DATE_FORMAT);
    let end = stats.window_end.format(DATE_FORMAT);

    let mut html = String::new();
    html.push_str("<html>\n<body>\n");
    html.push_str("<h2>Resumo Semanal</h2>\n");
    html.push_str(&format!("<p>Período: {start} a {end}</p>\n"));
    html.push_str("<ul>\n");
    html.push_str(&format!("<li>Novas demandas: {}</li>\n", stats.new_cases));
    html.push_str("</ul>\n");

    if !stats.by_status.is_empty() {
        html.push_str("<h3>Por status</h3>\n<ul>\n");
        for (status, count) in &stats.by_status {
            html.push_str(&format!("<li>{}: {count}</li>\n", escape_html(status)));
        }
        html.push_str("</ul>\n");
    }

    match options.link("/dashboard") {
        Some(url) => html.push_str(&format!(
            "<p><a href=\"{}\">Abrir o dashboard</a></p>\n",
            escape_html(&url)
        )),
        None => html.push_str("<p>Acesse o dashboard para mais detalhes.</p>\n"),
    }
    html.push_str("</body>\n</html>\n");

    RenderedEmail {
        subject: WEEKLY_SUBJECT.to_string(),
        html,
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
