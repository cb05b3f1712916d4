//! Table and statement generation for records of open-ended shape.
//!
//! Column types follow a fixed policy:
//!
//! | value       | column type        |
//! |-------------|--------------------|
//! | `Text`      | `TEXT`             |
//! | `Integer`   | `BIGINT`           |
//! | `Decimal`   | `DOUBLE PRECISION` |
//! | `Boolean`   | `BOOLEAN`          |
//! | `Timestamp` | `TIMESTAMPTZ`      |
//! | `Null`      | `TEXT`             |
//!
//! Null values are written as literal `NULL` rather than bound, so they
//! coerce to whatever type the existing column has.

use chrono::{DateTime, Utc};
use serde_json::Value as Json;

use fieldform_forms::FormData;

use crate::error::{PipelineError, Result};
use crate::models::Submission;

/// Postgres identifier length limit, in bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

const TABLE_PREFIX: &str = "form_";
const RECORD_ID_COLUMN: &str = "record_id";
const FORM_VERSION_COLUMN: &str = "form_version";

/// A scalar destined for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl ColumnValue {
    #[must_use]
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Text(_) | Self::Null => "TEXT",
            Self::Integer(_) => "BIGINT",
            Self::Decimal(_) => "DOUBLE PRECISION",
            Self::Boolean(_) => "BOOLEAN",
            Self::Timestamp(_) => "TIMESTAMPTZ",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Infer a column value from a JSON scalar.
    ///
    /// Strings in RFC 3339 form become timestamps; arrays and objects are
    /// stored as their JSON text.
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Boolean(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Text(n.to_string()), Self::Decimal),
            },
            Json::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(ts) => Self::Timestamp(ts.with_timezone(&Utc)),
                Err(_) => Self::Text(s.clone()),
            },
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ColumnValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ColumnValue {
    fn from(d: f64) -> Self {
        Self::Decimal(d)
    }
}

impl From<bool> for ColumnValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// One row destined for the table of its form.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub id: String,
    pub form_id: String,
    pub form_version: Option<String>,
    columns: Vec<(String, ColumnValue)>,
}

impl ExportRecord {
    pub fn new(id: impl Into<String>, form_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            form_id: form_id.into(),
            form_version: None,
            columns: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.form_version = Some(version.into());
        self
    }

    /// Set a column. An existing column keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ColumnValue>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn columns(&self) -> &[(String, ColumnValue)] {
        &self.columns
    }

    /// Table this record is exported to, derived from its form.
    pub fn table_name(&self) -> Result<String> {
        let form = sanitize_identifier(&self.form_id).ok_or_else(|| {
            PipelineError::InvalidInput(format!("form id '{}' yields no table name", self.form_id))
        })?;
        let mut table = format!("{TABLE_PREFIX}{form}");
        table.truncate(MAX_IDENTIFIER_LEN);
        Ok(table)
    }

    /// Build a record from a submission's payload.
    ///
    /// Top-level data fields become columns; nested groups are flattened
    /// with `_` between the path segments. The `meta` block is left out.
    /// A flattened path that repeats an earlier column is rejected.
    pub fn from_submission(submission: &Submission) -> Result<Self> {
        let payload: Json = serde_json::from_str(&submission.json)?;
        let data = FormData::from_payload(&payload)?;

        let mut record = Self::new(&submission.instance_id, &submission.form_id);
        record.form_version = submission.form_version.clone();
        for (name, value) in data.fields() {
            if name == "meta" {
                continue;
            }
            flatten_into(&mut record, name, value)?;
        }
        Ok(record)
    }
}

fn flatten_into(record: &mut ExportRecord, path: &str, value: &Json) -> Result<()> {
    match value {
        Json::Object(fields) => {
            for (name, inner) in fields {
                flatten_into(record, &format!("{path}_{name}"), inner)?;
            }
        }
        scalar => {
            if record.columns.iter().any(|(n, _)| n == path) {
                return Err(PipelineError::InvalidInput(format!(
                    "field '{path}' appears more than once in record {}",
                    record.id
                )));
            }
            record.columns.push((path.to_string(), ColumnValue::from_json(scalar)));
        }
    }
    Ok(())
}

/// Lowercase, replace everything outside `[a-z0-9_]` with `_`, and prefix
/// a leading digit. `None` when nothing usable remains.
#[must_use]
pub fn sanitize_identifier(name: &str) -> Option<String> {
    let mut ident: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if ident.chars().all(|c| c == '_') {
        return None;
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident.truncate(MAX_IDENTIFIER_LEN);
    Some(ident)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A column of an export table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumn {
    pub name: String,
    pub sql_type: &'static str,
    pub not_null: bool,
}

/// Statements for exporting one record.
///
/// The column list is derived once; the create-table statement and the
/// insert both render from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    table: String,
    columns: Vec<ExportColumn>,
    values: Vec<ColumnValue>,
}

impl ExportPlan {
    pub fn build(record: &ExportRecord) -> Result<Self> {
        if record.columns.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "record {} has no columns",
                record.id
            )));
        }

        let table = record.table_name()?;

        let version = record
            .form_version
            .clone()
            .map_or(ColumnValue::Null, ColumnValue::Text);
        let mut columns = vec![
            ExportColumn {
                name: RECORD_ID_COLUMN.to_string(),
                sql_type: "TEXT",
                not_null: true,
            },
            ExportColumn {
                name: FORM_VERSION_COLUMN.to_string(),
                sql_type: "TEXT",
                not_null: false,
            },
        ];
        let mut values = vec![ColumnValue::Text(record.id.clone()), version];

        for (name, value) in &record.columns {
            let ident = sanitize_identifier(name).ok_or_else(|| {
                PipelineError::InvalidInput(format!("column name '{name}' is not usable"))
            })?;
            if columns.iter().any(|c| c.name == ident) {
                return Err(PipelineError::InvalidInput(format!(
                    "column '{name}' collides with '{ident}' in record {}",
                    record.id
                )));
            }
            columns.push(ExportColumn {
                name: ident,
                sql_type: value.sql_type(),
                not_null: false,
            });
            values.push(value.clone());
        }

        Ok(Self {
            table,
            columns,
            values,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[ExportColumn] {
        &self.columns
    }

    /// `CREATE TABLE IF NOT EXISTS` for the record's table.
    pub fn ddl(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let constraint = if c.not_null { " NOT NULL" } else { "" };
                format!("{} {}{}", quote_ident(&c.name), c.sql_type, constraint)
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            columns.join(", ")
        )
    }

    /// Parameterized insert and the values to bind, in placeholder order.
    pub fn insert(&self) -> (String, Vec<ColumnValue>) {
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(&c.name)).collect();

        let mut placeholders = Vec::with_capacity(self.values.len());
        let mut params = Vec::with_capacity(self.values.len());
        for value in &self.values {
            if value.is_null() {
                placeholders.push("NULL".to_string());
            } else {
                params.push(value.clone());
                placeholders.push(format!("${}", params.len()));
            }
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            names.join(", "),
            placeholders.join(", ")
        );
        (sql, params)
    }
}

/// Create-table statement for `record`.
pub fn build_ddl(record: &ExportRecord) -> Result<String> {
    Ok(ExportPlan::build(record)?.ddl())
}

/// Insert statement and bound values for `record`.
pub fn build_insert(record: &ExportRecord) -> Result<(String, Vec<ColumnValue>)> {
    Ok(ExportPlan::build(record)?.insert())
}
