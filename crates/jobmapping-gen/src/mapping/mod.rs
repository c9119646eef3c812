//! Job mapping synthesis.
//!
//! Every parsed column becomes one [`JobMapping`] seeded with the
//! passthrough transformer. Operators edit the generated defaults later.

use crate::core::{JobMapping, Table, TransformerKind};

/// Build the default job mappings: tables in order, columns in order.
pub fn generate_job_mappings(tables: &[Table]) -> Vec<JobMapping> {
    tables
        .iter()
        .flat_map(|table| {
            table.columns.iter().map(move |column| JobMapping {
                schema: table.schema.clone(),
                table: table.name.clone(),
                column: column.name.clone(),
                transformer: TransformerKind::Passthrough,
            })
        })
        .collect()
}
