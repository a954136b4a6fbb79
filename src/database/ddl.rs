// CREATE TABLE generation for declared collections
use std::collections::HashMap;

use crate::collections::{Collection, CollectionKind, Field, FieldKind};
use crate::migrations::MigrationError;

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Build the CREATE TABLE statement for a collection.
///
/// `tables` maps collection ids to table names and is used to resolve
/// relation targets.
pub fn create_table_ddl(
    collection: &Collection,
    tables: &HashMap<String, String>,
) -> Result<String, MigrationError> {
    let mut columns = vec![format!("{} TEXT PRIMARY KEY", quote_identifier("id"))];

    if collection.kind == CollectionKind::Auth {
        columns.push("\"email\" TEXT UNIQUE".to_string());
        columns.push("\"emailVisibility\" BOOLEAN NOT NULL DEFAULT FALSE".to_string());
        columns.push("\"verified\" BOOLEAN NOT NULL DEFAULT FALSE".to_string());
        columns.push("\"password\" TEXT NOT NULL".to_string());
        columns.push("\"tokenKey\" TEXT NOT NULL UNIQUE".to_string());
    }

    for field in &collection.fields {
        columns.push(column_ddl(field, tables)?);
    }

    Ok(format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_identifier(&collection.name),
        columns.join(",\n    ")
    ))
}

fn column_ddl(field: &Field, tables: &HashMap<String, String>) -> Result<String, MigrationError> {
    let column = quote_identifier(&field.name);
    let not_null = if field.required { " NOT NULL" } else { "" };

    let ddl = match &field.kind {
        FieldKind::Text { min, max } => {
            let check = match (min, max) {
                (Some(min), Some(max)) => {
                    format!(" CHECK (char_length({}) BETWEEN {} AND {})", column, min, max)
                }
                (Some(min), None) => format!(" CHECK (char_length({}) >= {})", column, min),
                (None, Some(max)) => format!(" CHECK (char_length({}) <= {})", column, max),
                (None, None) => String::new(),
            };
            format!("{} TEXT{}{}", column, not_null, check)
        }
        FieldKind::Select { values } => {
            let allowed: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
            format!("{} TEXT{} CHECK ({} IN ({}))", column, not_null, column, allowed.join(", "))
        }
        FieldKind::Number => format!("{} DOUBLE PRECISION{}", column, not_null),
        FieldKind::Bool => format!("{} BOOLEAN{} DEFAULT FALSE", column, not_null),
        FieldKind::Json { max_size } => {
            let check = max_size
                .map(|max| format!(" CHECK (octet_length({}::text) <= {})", column, max))
                .unwrap_or_default();
            format!("{} JSONB{}{}", column, not_null, check)
        }
        FieldKind::Autodate { .. } => format!("{} TIMESTAMPTZ NOT NULL DEFAULT now()", column),
        FieldKind::Relation { collection_id, cascade_delete, .. } => {
            let target = tables.get(collection_id).ok_or_else(|| MigrationError::UnknownRelation {
                field: field.name.clone(),
                collection_id: collection_id.clone(),
            })?;

            if field.is_multiple() {
                // Multi-relations hold an array of ids; no FK possible
                format!("{} JSONB{} DEFAULT '[]'", column, not_null)
            } else {
                let on_delete = if *cascade_delete { "CASCADE" } else { "SET NULL" };
                format!(
                    "{} TEXT{} REFERENCES {}(\"id\") ON DELETE {}",
                    column,
                    not_null,
                    quote_identifier(target),
                    on_delete
                )
            }
        }
    };

    Ok(ddl)
}
