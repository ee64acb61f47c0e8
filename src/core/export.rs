//! Spreadsheet export of a single region.
//!
//! Builds a three-sheet table model (general data, documents, timeline).
//! Rendering it to a file format is left to the caller; the model is
//! serializable so any writer can consume it.

use crate::{
    core::{
        authz::{Action, require},
        store::Store,
    },
    errors::Result,
    models::{Actor, ChangeStamp, Region},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Institution named in the report header.
pub const INSTITUTION_NAME: &str = "RENOVA";

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One sheet as rows of cells. Empty rows are spacers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    /// Sheet tab name
    pub name: String,
    /// Rows of text cells
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn spacer(&mut self) {
        self.rows.push(Vec::new());
    }
}

/// Export document for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workbook {
    /// Suggested file name, embedding the region code and date
    pub file_name: String,
    /// Sheets in display order
    pub sheets: Vec<Sheet>,
}

/// `Reregistration_{code}_{YYYY-MM-DD}.xlsx`
#[must_use]
pub fn export_file_name(code: &str, now: DateTime<Utc>) -> String {
    format!("Reregistration_{code}_{}.xlsx", now.format("%Y-%m-%d"))
}

fn describe_stamp(stamp: Option<&ChangeStamp>) -> String {
    stamp.map_or_else(
        || "-".to_string(),
        |s| format!("{} by {}", s.last_updated.format(DATETIME_FORMAT), s.user),
    )
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn general_sheet(region: &Region, now: DateTime<Utc>) -> Sheet {
    let mut sheet = Sheet::new("General");
    let latest = region.latest_entry();

    sheet.row(["Re-registration report", INSTITUTION_NAME]);
    sheet.row(["Issued at".to_string(), now.format(DATETIME_FORMAT).to_string()]);
    sheet.spacer();
    sheet.row(["STATE", region.name.as_str()]);
    sheet.row(["CODE", region.code.as_str()]);
    sheet.row(["CURRENT STATUS", region.current_status.label()]);
    sheet.spacer();
    sheet.row(["--- DEADLINES ---"]);
    sheet.row([
        "Expiration date".to_string(),
        region
            .expiration_date
            .map_or_else(|| "Not set".to_string(), |d| d.format(DATE_FORMAT).to_string()),
    ]);
    sheet.row(["Alert (days before)".to_string(), region.alert_days.to_string()]);
    sheet.row([
        "Last deadline change".to_string(),
        describe_stamp(region.config_metadata.as_ref()),
    ]);
    sheet.spacer();
    sheet.row(["--- CONTACTS ---"]);
    sheet.row(["Contact name".to_string(), or_dash(&region.contact.name)]);
    sheet.row(["Phone".to_string(), or_dash(&region.contact.phone)]);
    sheet.row(["Email".to_string(), or_dash(&region.contact.email)]);
    sheet.row([
        "Last contact change".to_string(),
        describe_stamp(region.contact_metadata.as_ref()),
    ]);
    sheet.spacer();
    sheet.row(["--- LATEST NOTE ---"]);
    sheet.row([
        "Date and time".to_string(),
        latest.map_or_else(
            || "-".to_string(),
            |h| h.date.format(DATETIME_FORMAT).to_string(),
        ),
    ]);
    sheet.row([
        "Responsible user".to_string(),
        latest.map_or_else(|| "-".to_string(), |h| h.author().to_string()),
    ]);
    sheet.row([
        "Note".to_string(),
        latest.map_or_else(|| "-".to_string(), |h| or_dash(&h.notes)),
    ]);

    sheet
}

fn documents_sheet(region: &Region) -> Sheet {
    let mut sheet = Sheet::new("Documents");
    sheet.row(["Document description", "Last updated", "Status"]);
    for doc in &region.documents {
        sheet.row([
            doc.description.clone(),
            doc.last_updated.format(DATETIME_FORMAT).to_string(),
            doc.compliance_label().to_string(),
        ]);
    }
    sheet
}

fn timeline_sheet(region: &Region) -> Sheet {
    let mut sheet = Sheet::new("Timeline");
    sheet.row(["Date", "Time", "Phase / Status", "Responsible user", "Notes / Details"]);
    for entry in &region.status_history {
        sheet.row([
            entry.date.format(DATE_FORMAT).to_string(),
            entry.date.format(TIME_FORMAT).to_string(),
            entry.status.label().to_string(),
            entry.author().to_string(),
            or_dash(&entry.notes),
        ]);
    }
    sheet
}

/// Builds the export for a fully loaded region.
#[must_use]
pub fn export_region(region: &Region, now: DateTime<Utc>) -> Workbook {
    Workbook {
        file_name: export_file_name(&region.code, now),
        sheets: vec![
            general_sheet(region, now),
            documents_sheet(region),
            timeline_sheet(region),
        ],
    }
}

/// Loads a region and exports it for an authorized actor.
pub async fn export_region_for(store: &Store, actor: &Actor, code: &str) -> Result<Workbook> {
    require(actor, Action::ExportRegion)?;
    let region = store.get_region(code).await?;
    info!("{} exported {}", actor.username, region.code);
    Ok(export_region(&region, Utc::now()))
}
