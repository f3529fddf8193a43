//! CSV export of per-cycle, per-charge-point allocation records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::cluster::CycleResult;

/// Schema v1 column header for CSV telemetry export.
const HEADER: &str = "cycle,charge_point,mode,active,allocated_w,measured_w,\
                      grid_w,ess_discharge_w,excess_w,distributable_w,excluded";

/// Exports cycle results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per charge point per
/// cycle. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[CycleResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes cycle results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[CycleResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        for e in &r.entries {
            wtr.write_record(&[
                r.cycle.to_string(),
                e.charge_point_id.clone(),
                e.mode.to_string(),
                e.active.to_string(),
                e.allocated_power.to_string(),
                e.measured_power.to_string(),
                r.grid_active_power.to_string(),
                r.ess_discharge_power.to_string(),
                r.excess_power.to_string(),
                r.distributable_power.to_string(),
                e.excluded.clone().unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
