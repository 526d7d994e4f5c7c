//! CSV rendering for the admin analytics export.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// What to export; parsed from the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Results,
    Users,
}

impl ExportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "results" => Some(Self::Results),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Results => "results",
            Self::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultExportRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub test_title: String,
    pub test_category: String,
    pub total_score: i64,
    pub time_taken_secs: u64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserExportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub tests_completed: usize,
    pub joined_at: DateTime<Utc>,
}

/// A rendered CSV attachment.
#[derive(Debug, Clone)]
pub struct CsvDocument {
    pub filename: String,
    pub body: Vec<u8>,
}

fn finish(
    writer: csv::Writer<Vec<u8>>,
    kind: ExportKind,
    date: NaiveDate,
) -> Result<CsvDocument, csv::Error> {
    let body = writer
        .into_inner()
        .map_err(|error| error.into_error())?;
    Ok(CsvDocument {
        filename: format!("{}_export_{date}.csv", kind.file_stem()),
        body,
    })
}

pub fn results_csv(rows: &[ResultExportRow], date: NaiveDate) -> Result<CsvDocument, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "ID",
        "User Name",
        "User Email",
        "Test Title",
        "Category",
        "Score",
        "Time (seconds)",
        "Completed At",
    ])?;
    for row in rows {
        writer.write_record([
            row.id.as_str(),
            row.user_name.as_str(),
            row.user_email.as_str(),
            row.test_title.as_str(),
            row.test_category.as_str(),
            &row.total_score.to_string(),
            &row.time_taken_secs.to_string(),
            &row.completed_at.to_rfc3339(),
        ])?;
    }
    finish(writer, ExportKind::Results, date)
}

pub fn users_csv(rows: &[UserExportRow], date: NaiveDate) -> Result<CsvDocument, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ID", "Name", "Email", "Tests Completed", "Joined At"])?;
    for row in rows {
        writer.write_record([
            row.id.as_str(),
            row.name.as_str(),
            row.email.as_str(),
            &row.tests_completed.to_string(),
            &row.joined_at.to_rfc3339(),
        ])?;
    }
    finish(writer, ExportKind::Users, date)
}
