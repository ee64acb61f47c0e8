//! Dashboard statistics over the region table.
//!
//! All functions are pure over a slice of regions, except [`dashboard`] which
//! loads the table for an authorized actor.

use crate::{
    core::{
        authz::{Action, require},
        expiration::is_expiring_at,
        store::Store,
    },
    errors::Result,
    models::{Actor, Region, RegistrationStatus},
};
use chrono::{DateTime, Utc};

/// Region counts per status plus the number of critical regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    /// Number of regions
    pub total: usize,
    /// Regions in "concluded"
    pub concluded: usize,
    /// Regions re-registered successfully
    pub success: usize,
    /// Regions in progress
    pub in_progress: usize,
    /// Regions started
    pub started: usize,
    /// Regions not started
    pub not_started: usize,
    /// Regions pending
    pub pending: usize,
    /// Unfinished regions inside their alert window
    pub expiring: usize,
}

impl DashboardStats {
    /// Concluded plus re-registered.
    #[must_use]
    pub const fn finished(&self) -> usize {
        self.concluded + self.success
    }

    /// In progress plus started.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.in_progress + self.started
    }

    /// Pending plus not started.
    #[must_use]
    pub const fn stalled(&self) -> usize {
        self.pending + self.not_started
    }
}

/// Critical = inside the alert window and not yet finished.
fn is_critical(region: &Region, now: DateTime<Utc>) -> bool {
    !region.current_status.is_finished() && is_expiring_at(region, now)
}

/// Computes the dashboard counters at `now`.
#[must_use]
pub fn dashboard_stats_at(regions: &[Region], now: DateTime<Utc>) -> DashboardStats {
    let mut stats = DashboardStats {
        total: regions.len(),
        ..DashboardStats::default()
    };

    for region in regions {
        if is_critical(region, now) {
            stats.expiring += 1;
        }
        match region.current_status {
            RegistrationStatus::NotStarted => stats.not_started += 1,
            RegistrationStatus::Started => stats.started += 1,
            RegistrationStatus::InProgress => stats.in_progress += 1,
            RegistrationStatus::Pending => stats.pending += 1,
            RegistrationStatus::Concluded => stats.concluded += 1,
            RegistrationStatus::ReRegistered => stats.success += 1,
        }
    }

    stats
}

/// Regions that need attention at `now`, in table order.
#[must_use]
pub fn expiring_regions_at(regions: &[Region], now: DateTime<Utc>) -> Vec<&Region> {
    regions.iter().filter(|r| is_critical(r, now)).collect()
}

/// One cell of the status grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    /// Region code
    pub code: String,
    /// Current status
    pub status: RegistrationStatus,
    /// Progress heuristic for the status
    pub progress_percent: u8,
}

/// Status of every region, sorted by code.
#[must_use]
pub fn status_grid(regions: &[Region]) -> Vec<GridCell> {
    let mut cells: Vec<GridCell> = regions
        .iter()
        .map(|r| GridCell {
            code: r.code.clone(),
            status: r.current_status,
            progress_percent: r.current_status.progress_percent(),
        })
        .collect();
    cells.sort_by(|a, b| a.code.cmp(&b.code));
    cells
}

/// Loads the region table and computes the dashboard for an actor.
pub async fn dashboard(store: &Store, actor: &Actor) -> Result<DashboardStats> {
    require(actor, Action::ViewRegions)?;
    let regions = store.list_regions().await?;
    Ok(dashboard_stats_at(&regions, Utc::now()))
}

/// One-paragraph text summary of the dashboard.
#[must_use]
pub fn format_dashboard_summary(stats: &DashboardStats) -> String {
    format!(
        "Regions tracked: {}\nExpiring: {}\nFinished: {}\nIn progress: {}\nPending/stalled: {}",
        stats.total,
        stats.expiring,
        stats.finished(),
        stats.active(),
        stats.stalled()
    )
}
