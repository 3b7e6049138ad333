use crate::Result;
use crate::metadata::{AggregateProjectMetadata, stats};
use chrono::{DateTime, Utc};
use core::fmt::Write;
use serde_json::json;

/// Write `aggregate` as pretty-printed JSON.
///
/// Alongside the raw aggregate, the output carries the derived language percentages and the
/// time the report was generated, so consumers need not recompute them.
pub fn generate<W: Write>(aggregate: &AggregateProjectMetadata, now: DateTime<Utc>, writer: &mut W) -> Result<()> {
    let output = json!({
        "generated_at": now.to_rfc3339(),
        "repository": aggregate,
        "language_percentages": stats::percentages(&aggregate.languages),
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
