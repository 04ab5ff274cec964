//! Schema command implementation

use anyhow::Result;
use mf_core::MANIFEST_JSON_SCHEMA;

/// Print the embedded JSON Schema of the wire format
pub async fn execute() -> Result<()> {
    print!("{}", MANIFEST_JSON_SCHEMA);
    Ok(())
}
