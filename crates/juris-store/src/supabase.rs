//! Supabase case store: PostgREST reads over HTTPS.
//!
//! Credentials are checked on each call rather than at construction, so a
//! process started without them logs an authentication failure on the first
//! tick instead of refusing to start.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use juris_core::{
    CaseCreated, CaseDeadlineRecord, CaseStore, ClientContact, ConfigError, DatabaseConfig,
    ManagerRecord, QueryError,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

const DEADLINE_SELECT: &str = "id,demanda,prazo,clientes(nome,email)";
const PROFILE_SELECT: &str = "email,role,ativo";
const CASE_SELECT: &str = "id,status,created_at";

/// Read-only PostgREST client for the case and profile tables.
pub struct SupabaseStore {
    config: DatabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> Result<String, QueryError> {
        let base = self.config.url.trim();
        if base.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL").into());
        }
        Ok(format!("{}/rest/v1/{}", base.trim_end_matches('/'), table))
    }

    fn service_key(&self) -> Result<&str, QueryError> {
        let key = self.config.service_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_KEY").into());
        }
        Ok(key)
    }

    /// Read every matching row, one `Range` page at a time. Stops on an
    /// empty page, on reaching the `Content-Range` total, or (when the server
    /// reports no total) on a short page. Fewer rows than the reported total
    /// is a malformed response, never a silently shorter list.
    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&'static str, String)],
    ) -> Result<Vec<T>, QueryError> {
        let url = self.table_url(table)?;
        let key = self.service_key()?;
        let page_size = u64::from(self.config.page_size.max(1));

        let mut rows = Vec::new();
        let mut total = None;
        loop {
            let start = rows.len() as u64;
            let end = start + page_size - 1;
            let (page, reported) = self.fetch_page::<T>(table, &url, key, params, start, end).await?;
            let received = page.len() as u64;
            rows.extend(page);
            total = reported.or(total);

            let done = match total {
                Some(total) => received == 0 || rows.len() as u64 >= total,
                None => received < page_size,
            };
            if done {
                break;
            }
        }

        if let Some(total) = total {
            if (rows.len() as u64) < total {
                return Err(QueryError::Malformed(format!(
                    "{table}: received {} of {total} rows",
                    rows.len()
                )));
            }
        }
        if rows.len() as u64 > page_size {
            tracing::debug!("📄 {table}: read {} rows in pages of {page_size}", rows.len());
        }
        Ok(rows)
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        table: &str,
        url: &str,
        key: &str,
        params: &[(&'static str, String)],
        start: u64,
        end: u64,
    ) -> Result<(Vec<T>, Option<u64>), QueryError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
            .header("Range-Unit", "items")
            .header("Range", format!("{start}-{end}"))
            .header("Prefer", "count=exact")
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| QueryError::Unavailable(format!("{table}: {e}")))?;

        let status = resp.status();
        let total = resp
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        let body = resp
            .text()
            .await
            .map_err(|e| QueryError::Unavailable(format!("{table}: {e}")))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(QueryError::Unauthorized(format!("{table}: {body}")));
        }
        // Rows vanished between two pages.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok((Vec::new(), total));
        }
        if !status.is_success() {
            return Err(QueryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        decode_rows(table, &body).map(|rows| (rows, total))
    }
}

#[async_trait]
impl CaseStore for SupabaseStore {
    async fn deadlines_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseDeadlineRecord>, QueryError> {
        let params = deadline_params(from, to);
        let rows: Vec<DeadlineRow> = self.fetch_rows(&self.config.deadline_table, &params).await?;
        rows.into_iter().map(DeadlineRow::into_record).collect()
    }

    async fn active_users_with_roles(&self, roles: &[String]) -> Result<Vec<ManagerRecord>, QueryError> {
        let params = profile_params(roles);
        let rows: Vec<ProfileRow> = self.fetch_rows(&self.config.profiles_table, &params).await?;
        Ok(rows.into_iter().map(ProfileRow::into_record).collect())
    }

    async fn cases_created_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseCreated>, QueryError> {
        let params = case_params(from, to);
        let rows: Vec<CaseRow> = self.fetch_rows(&self.config.deadline_table, &params).await?;
        rows.into_iter().map(CaseRow::into_record).collect()
    }
}

// Every query carries a total order so pages don't overlap or skip rows.

fn deadline_params(from: NaiveDate, to: NaiveDate) -> Vec<(&'static str, String)> {
    vec![
        ("select", DEADLINE_SELECT.to_string()),
        ("prazo", format!("gte.{from}")),
        ("prazo", format!("lte.{to}")),
        ("order", "prazo.asc,id.asc".to_string()),
    ]
}

fn profile_params(roles: &[String]) -> Vec<(&'static str, String)> {
    let quoted: Vec<String> = roles.iter().map(|r| format!("\"{r}\"")).collect();
    vec![
        ("select", PROFILE_SELECT.to_string()),
        ("role", format!("in.({})", quoted.join(","))),
        ("ativo", "eq.true".to_string()),
        ("order", "email.asc".to_string()),
    ]
}

fn case_params(from: NaiveDate, to: NaiveDate) -> Vec<(&'static str, String)> {
    // `created_at` is a timestamp: the whole of `to` is included.
    let until = to
        .checked_add_signed(TimeDelta::days(1))
        .unwrap_or(NaiveDate::MAX);
    vec![
        ("select", CASE_SELECT.to_string()),
        ("created_at", format!("gte.{from}")),
        ("created_at", format!("lt.{until}")),
        ("order", "created_at.asc,id.asc".to_string()),
    ]
}

/// Total from a `Content-Range` value such as `0-999/1500` or `*/0`. `None`
/// when the server did not count (`0-999/*`).
fn content_range_total(raw: &str) -> Option<u64> {
    raw.rsplit_once('/')?.1.trim().parse().ok()
}

fn decode_rows<T: DeserializeOwned>(table: &str, body: &str) -> Result<Vec<T>, QueryError> {
    serde_json::from_str(body).map_err(|e| QueryError::Malformed(format!("{table}: {e}")))
}

/// PostgREST embeds a to-one relation as an object, but views and some
/// relationship shapes return an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Embedded<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Embedded<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Embedded::Many(items) => items.into_iter().next(),
            Embedded::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    #[serde(default)]
    nome: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeadlineRow {
    id: Value,
    #[serde(default)]
    demanda: Option<String>,
    #[serde(default)]
    prazo: Option<String>,
    #[serde(default)]
    clientes: Option<Embedded<ClientRow>>,
}

impl DeadlineRow {
    fn into_record(self) -> Result<CaseDeadlineRecord, QueryError> {
        let id = id_string(&self.id);
        let deadline = self
            .prazo
            .as_deref()
            .and_then(parse_date)
            .ok_or_else(|| QueryError::Malformed(format!("case {id}: invalid prazo {:?}", self.prazo)))?;
        let client = self
            .clientes
            .and_then(Embedded::into_first)
            .map(|c| ClientContact {
                name: c.nome,
                email: c.email,
            });
        Ok(CaseDeadlineRecord {
            id,
            description: self
                .demanda
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "(sem descrição)".to_string()),
            deadline,
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    ativo: Option<bool>,
}

impl ProfileRow {
    fn into_record(self) -> ManagerRecord {
        ManagerRecord {
            email: self.email,
            role: self.role.unwrap_or_default(),
            active: self.ativo.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CaseRow {
    id: Value,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl CaseRow {
    fn into_record(self) -> Result<CaseCreated, QueryError> {
        let id = id_string(&self.id);
        let created_on = self
            .created_at
            .as_deref()
            .and_then(parse_date)
            .ok_or_else(|| {
                QueryError::Malformed(format!("case {id}: invalid created_at {:?}", self.created_at))
            })?;
        Ok(CaseCreated {
            id,
            status: self.status,
            created_on,
        })
    }
}

fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Calendar date of a PostgREST date or timestamp value. Timestamps with an
/// offset keep the date in that offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // Postgres `timestamptz` text output: "2026-10-16 12:00:00+00"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}
