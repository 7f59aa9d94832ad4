//! CSV export
//!
//! Renders collected resources through each collector's column contract:
//! one file per collector, one header row, one line per resource, cells in
//! column order.

use crate::inventory::model::{Collector, Resource};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Write one collector's rows to `<dir>/<collector-name>.csv`.
///
/// Rows are ordered by (name, self-link) when the collector asks for sorted
/// output; otherwise the collected order is kept.
pub fn write_collector_csv(
    dir: &Path,
    collector: &dyn Collector,
    mut resources: Vec<Resource>,
) -> Result<PathBuf> {
    if collector.should_sort() {
        resources.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.self_link().cmp(b.self_link()))
        });
    }

    let columns = collector.columns();
    let path = dir.join(format!("{}.csv", collector.name()));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer
        .write_record(columns.iter().map(|column| column.header))
        .context("failed to write CSV header")?;

    for resource in &resources {
        writer
            .write_record(columns.iter().map(|column| (column.extract)(resource)))
            .with_context(|| format!("failed to write row for {}", resource.name()))?;
    }

    writer.flush().context("failed to flush CSV output")?;
    Ok(path)
}
