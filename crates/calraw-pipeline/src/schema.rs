//! Destination table schemas.
//!
//! Static registry replacing dynamic model lookup: each app registers, once
//! at startup, the tables it loads into — ordered field names, which fields
//! are date-typed, and the physical table identifier. The loader consults
//! this to decide which columns need coercion before ingestion, and the
//! load stage enumerates its worklist from it.
//!
//! Field names are stored lowercase; source file headers are matched
//! case-insensitively (the raw files ship uppercase headers).

use crate::error::{PipelineError, Result};
use sqlx::PgPool;
use std::collections::BTreeMap;

/// Schema of one destination table
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Model name used as the work-item identity
    pub name: &'static str,
    /// Physical table identifier
    pub db_table: &'static str,
    /// Expected fields in declaration order
    pub fields: &'static [&'static str],
    /// Fields ingested through the date reformatting expression
    pub date_fields: &'static [&'static str],
}

impl TableSchema {
    /// Whether `field` (case-insensitive) is date-typed.
    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields
            .iter()
            .any(|f| f.eq_ignore_ascii_case(field))
    }

    /// Whether `field` (case-insensitive) is declared at all.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.eq_ignore_ascii_case(field))
    }

    /// File stem the cleaned CSV for this table is expected under.
    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.db_table.to_uppercase())
    }
}

/// Registered schemas for one target app
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    app: String,
    tables: BTreeMap<&'static str, TableSchema>,
}

impl SchemaRegistry {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            tables: BTreeMap::new(),
        }
    }

    /// Registry for the named app.
    ///
    /// Only `calaccess` is built in; an unknown app is a configuration
    /// error (there is no dynamic lookup to fall back on).
    pub fn for_app(app: &str) -> Result<Self> {
        match app {
            "calaccess" => Ok(Self::calaccess()),
            other => Err(PipelineError::config(format!(
                "no schema registry for app '{}'",
                other
            ))),
        }
    }

    /// The campaign-finance raw tables.
    pub fn calaccess() -> Self {
        let mut registry = Self::new("calaccess");

        registry.register(TableSchema {
            name: "cvr_so",
            db_table: "cvr_so_cd",
            fields: &[
                "filing_id",
                "amend_id",
                "rec_type",
                "form_type",
                "filer_id",
                "entity_cd",
                "filer_naml",
                "filer_namf",
                "rpt_date",
                "acct_opendt",
                "acct_closedt",
                "city",
                "st",
                "zip4",
            ],
            date_fields: &["rpt_date", "acct_opendt", "acct_closedt"],
        });

        registry.register(TableSchema {
            name: "filername",
            db_table: "filername_cd",
            fields: &[
                "xref_filer_id",
                "filer_id",
                "filer_type",
                "status",
                "effect_dt",
                "naml",
                "namf",
                "namt",
                "nams",
                "adr1",
                "adr2",
                "city",
                "st",
                "zip4",
                "phon",
                "fax",
                "email",
            ],
            date_fields: &["effect_dt"],
        });

        registry.register(TableSchema {
            name: "filer_filings",
            db_table: "filer_filings_cd",
            fields: &[
                "filer_id",
                "filing_id",
                "period_id",
                "form_id",
                "filing_sequence",
                "filing_date",
                "stmnt_type",
                "stmnt_status",
                "session_id",
                "user_id",
                "special_audit",
                "fine_audit",
                "rpt_start",
                "rpt_end",
                "rpt_date",
                "filing_type",
            ],
            date_fields: &["filing_date", "rpt_start", "rpt_end", "rpt_date"],
        });

        registry.register(TableSchema {
            name: "smry",
            db_table: "smry_cd",
            fields: &[
                "filing_id",
                "amend_id",
                "line_item",
                "rec_type",
                "form_type",
                "amount_a",
                "amount_b",
                "amount_c",
                "elec_dt",
            ],
            date_fields: &["elec_dt"],
        });

        registry
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn register(&mut self, schema: TableSchema) {
        self.tables.insert(schema.name, schema);
    }

    pub fn get(&self, model: &str) -> Result<&TableSchema> {
        self.tables
            .get(model)
            .ok_or_else(|| PipelineError::UnknownModel {
                app: self.app.clone(),
                model: model.to_string(),
            })
    }

    /// All registered schemas, in stable (name) order.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// DDL for one destination table: TEXT columns, DATE for date-typed fields.
pub fn destination_table_ddl(schema: &TableSchema) -> String {
    let columns: Vec<String> = schema
        .fields
        .iter()
        .map(|field| {
            let sql_type = if schema.is_date_field(field) {
                "DATE"
            } else {
                "TEXT"
            };
            format!("\"{}\" {}", field, sql_type)
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        schema.db_table,
        columns.join(", ")
    )
}

/// Create any missing destination tables for the registry.
pub async fn ensure_destination_tables(pool: &PgPool, registry: &SchemaRegistry) -> Result<()> {
    for schema in registry.tables() {
        sqlx::query(&destination_table_ddl(schema))
            .execute(pool)
            .await?;
    }
    tracing::debug!(
        app = registry.app(),
        tables = registry.len(),
        "Destination tables ensured"
    );
    Ok(())
}
