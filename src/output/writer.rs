//! Patient table and run summary writer
//!
//! The patient table is written one row per patient, as JSON Lines or CSV.
//! The summary is a single pretty-printed JSON document.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::patient::{Patient, PatientPool, StatusCounts};
use crate::simulation::error::SimulationResult;
use crate::simulation::statistics::SimulationStatistics;
use crate::types::{OutputFormat, PatientStatus, RunId, SimulationParameters};

/// Base name of the patient table file
pub const PATIENTS_FILE_STEM: &str = "patients";
/// Name of the run summary file
pub const SUMMARY_FILE_NAME: &str = "summary.json";

const CSV_HEADER: [&str; 17] = [
    "id",
    "birthdate",
    "sex",
    "status",
    "alive",
    "death_date",
    "active",
    "due",
    "ltfu",
    "admitted_dt",
    "ltfu_dt",
    "first_visit_dt",
    "last_visit_dt",
    "last_visit_at",
    "last_vl",
    "last_supp_vl_dt",
    "visit_count",
];

/// One patient row with its derived lifecycle status
#[derive(Debug, Serialize)]
struct PatientRow<'a> {
    #[serde(flatten)]
    patient: &'a Patient,
    status: PatientStatus,
}

/// Everything about a finished run except the patient table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the run
    pub run_id: RunId,
    /// Date the clock stopped at
    pub final_date: NaiveDate,
    /// Patients per lifecycle status at the end of the run
    pub status_counts: StatusCounts,
    /// Counters and monthly indicators
    pub statistics: SimulationStatistics,
    /// Parameters the run used
    pub parameters: SimulationParameters,
}

/// Writes run output into one directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    directory: PathBuf,
    format: OutputFormat,
}

impl OutputWriter {
    /// Create the writer, creating `directory` and its parents if missing
    pub fn new(directory: impl AsRef<Path>, format: OutputFormat) -> SimulationResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory, format })
    }

    /// Output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the patient table for the configured format
    pub fn patients_path(&self) -> PathBuf {
        self.directory.join(format!("{}.{}", PATIENTS_FILE_STEM, self.format.extension()))
    }

    /// Path of the run summary
    pub fn summary_path(&self) -> PathBuf {
        self.directory.join(SUMMARY_FILE_NAME)
    }

    /// Write every patient in the pool; returns the file written
    pub fn write_patients(&self, pool: &PatientPool) -> SimulationResult<PathBuf> {
        let path = self.patients_path();
        let mut writer = BufWriter::new(File::create(&path)?);

        match self.format {
            OutputFormat::Json => {
                for patient in pool.patients() {
                    let row = PatientRow { patient, status: patient.status() };
                    serde_json::to_writer(&mut writer, &row)?;
                    writeln!(writer)?;
                }
            }
            OutputFormat::Csv => {
                writeln!(writer, "{}", CSV_HEADER.join(","))?;
                for patient in pool.patients() {
                    writeln!(writer, "{}", csv_row(patient).join(","))?;
                }
            }
        }

        writer.flush()?;
        info!("Wrote {} patients to {}", pool.len(), path.display());
        Ok(path)
    }

    /// Write the run summary; returns the file written
    pub fn write_summary(&self, summary: &RunSummary) -> SimulationResult<PathBuf> {
        let path = self.summary_path();
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, summary)?;
        writeln!(writer)?;
        writer.flush()?;
        info!("Wrote run summary to {}", path.display());
        Ok(path)
    }
}

fn csv_row(patient: &Patient) -> Vec<String> {
    vec![
        patient.id.to_string(),
        patient.birthdate.to_string(),
        optional(patient.sex),
        csv_escape(&patient.status().to_string()),
        patient.alive.to_string(),
        optional(patient.death_date),
        patient.active.to_string(),
        patient.due.to_string(),
        patient.ltfu.to_string(),
        optional(patient.admitted_dt),
        optional(patient.ltfu_dt),
        optional(patient.first_visit_dt),
        optional(patient.last_visit_dt),
        patient.last_visit_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
        optional(patient.last_vl),
        optional(patient.last_supp_vl_dt),
        patient.visit_count.to_string(),
    ]
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn csv_escape(field: &str) -> String {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::PatientDemographics;
    use crate::types::PatientId;

    fn pool() -> PatientPool {
        let mut pool = PatientPool::new();
        for id in 1..=3 {
            pool.insert(Patient::new(PatientDemographics {
                id: PatientId::new(id),
                birthdate: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                sex: None,
            }))
            .unwrap();
        }
        pool.get_mut(0).unwrap().admit(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        pool
    }

    #[test]
    fn test_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = OutputWriter::new(&nested, OutputFormat::Json).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.patients_path(), nested.join("patients.jsonl"));
    }

    #[test]
    fn test_write_patients_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputFormat::Json).unwrap();
        let path = writer.write_patients(&pool()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "PT_0000000001");
        assert_eq!(first["status"], "ActiveNotDue");
        assert_eq!(first["admitted_dt"], "2021-01-04");
        assert!(first["death_date"].is_null());
    }

    #[test]
    fn test_write_patients_csv() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputFormat::Csv).unwrap();
        let path = writer.write_patients(&pool()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER.join(","));

        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first.len(), CSV_HEADER.len());
        assert_eq!(first[0], "PT_0000000001");
        assert_eq!(first[3], "Active (not due)");
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path(), OutputFormat::Json).unwrap();
        let pool = pool();
        let summary = RunSummary {
            run_id: RunId::new(),
            final_date: NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
            status_counts: pool.status_counts(),
            statistics: SimulationStatistics::new(),
            parameters: SimulationParameters::default(),
        };

        let path = writer.write_summary(&summary).unwrap();
        let loaded: RunSummary = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, summary.run_id);
        assert_eq!(loaded.status_counts.inactive, 2);
        assert_eq!(loaded.status_counts.active_not_due, 1);
    }
}
