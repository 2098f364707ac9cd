//! CSV export for simulation series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::SimulationResult;

/// Column header of the city series export.
const CITY_HEADER: &str = "hour,load_mw,capacity_mw,utilization,solar_mw,\
                           carbon_intensity,cost_index,alert";

/// Column header of the long-form per-district export.
const DISTRICT_HEADER: &str = "hour,district,load_mw,capacity_mw,stress,probability,\
                               solar_mw,base_mw,ev_mw,ac_mw,event_mw,storage_shave_mw";

/// Exports the city series to a CSV file at the given path.
///
/// One row per hour. The `alert` column holds `warn`/`crit` for hours on
/// the alert timeline and is empty otherwise.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_city_csv(result: &SimulationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_city_csv(result, io::BufWriter::new(file))
}

/// Writes the city series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_city_csv(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CITY_HEADER.split(',').map(str::trim))?;

    let city = &result.city;
    for &t in &result.hours {
        let alert = result
            .alerts
            .iter()
            .find(|a| a.hour == t)
            .map(|a| a.level.as_str())
            .unwrap_or("");
        wtr.write_record(&[
            t.to_string(),
            format!("{:.4}", city.load_mw[t]),
            format!("{:.4}", city.capacity_mw[t]),
            format!("{:.4}", city.load_mw[t] / city.capacity_mw[t].max(1.0)),
            format!("{:.4}", city.solar_mw[t]),
            format!("{:.2}", city.carbon_intensity[t]),
            format!("{:.4}", city.cost_index[t]),
            alert.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports every district's series in long form (one row per hour and
/// district, catalog order within each hour).
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_districts_csv(result: &SimulationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_districts_csv(result, io::BufWriter::new(file))
}

/// Writes the long-form district series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_districts_csv(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DISTRICT_HEADER.split(',').map(str::trim))?;

    for &t in &result.hours {
        for d in &result.districts {
            let c = &d.components[t];
            wtr.write_record(&[
                t.to_string(),
                d.id.as_str().to_string(),
                format!("{:.4}", d.load_mw[t]),
                format!("{:.4}", d.capacity_mw[t]),
                format!("{:.4}", d.stress[t]),
                format!("{:.4}", d.probability[t]),
                format!("{:.4}", d.solar_mw[t]),
                format!("{:.4}", c.base_mw),
                format!("{:.4}", c.ev_mw),
                format!("{:.4}", c.ac_mw),
                format!("{:.4}", c.event_mw),
                format!("{:.4}", c.storage_shave_mw),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::CityParams;
    use crate::sim::run_simulation;

    fn storm() -> SimulationResult {
        let params = CityParams {
            storm_enabled: true,
            event_enabled: true,
            ..CityParams::default()
        };
        run_simulation(&params, None)
    }

    #[test]
    fn city_header_and_row_count() {
        let mut buf = Vec::new();
        write_city_csv(&storm(), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(
            lines.first().copied(),
            Some("hour,load_mw,capacity_mw,utilization,solar_mw,carbon_intensity,cost_index,alert")
        );
        // 1 header + 73 hours
        assert_eq!(lines.len(), 74);
    }

    #[test]
    fn alert_column_matches_timeline() {
        let result = storm();
        let mut buf = Vec::new();
        write_city_csv(&result, &mut buf).ok();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let flagged = rdr
            .records()
            .filter_map(Result::ok)
            .filter(|rec| !rec[7].is_empty())
            .count();
        assert_eq!(flagged, result.alerts.len());
    }

    #[test]
    fn district_rows_are_long_form() {
        let mut buf = Vec::new();
        write_districts_csv(&storm(), &mut buf).ok();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(12));
        let records: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(records.len(), 73 * 8);
        assert_eq!(&records[0][1], "downtown");
        assert_eq!(&records[8][0], "1");
        for rec in &records {
            for i in 2..12 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
        }
    }

    #[test]
    fn deterministic_output() {
        let result = storm();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_districts_csv(&result, &mut buf1).ok();
        write_districts_csv(&result, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
