//! DDL post-processing.

use mf_core::sql_utils::quote_ident;
use mf_db::ForeignKeyMetadata;

/// Append one `FOREIGN KEY` clause per foreign key before the closing
/// parenthesis of a `CREATE TABLE` statement.
pub fn append_foreign_keys(ddl: &str, foreign_keys: &[ForeignKeyMetadata]) -> String {
    if foreign_keys.is_empty() {
        return ddl.to_string();
    }
    let Some(body) = ddl.trim_end().strip_suffix(')') else {
        return ddl.to_string();
    };

    let mut out = body.trim_end().to_string();
    for fk in foreign_keys {
        out.push_str(&format!(
            ",\n\tFOREIGN KEY({}) REFERENCES {} ({})",
            join_idents(&fk.columns),
            quote_ident(&fk.referenced_table),
            join_idents(&fk.referenced_columns)
        ));
    }
    out.push_str("\n)");
    out
}

fn join_idents(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}
