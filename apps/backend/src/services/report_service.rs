//! Sales reports over a calendar-date window.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::views::ReportView;
use crate::AppState;
use tillpoint_core::report::{aggregate, ReportWindow};
use tillpoint_core::TenantScope;

/// Report service.
pub struct ReportService {
    state: Arc<AppState>,
}

impl ReportService {
    pub fn new(state: Arc<AppState>) -> Self {
        ReportService { state }
    }

    /// Aggregates the tenant's committed sales between two `YYYY-MM-DD`
    /// dates, both inclusive.
    ///
    /// ## Errors
    /// `Validation` when a date is malformed, `start_date` is after
    /// `end_date`, or a sum leaves the decimal range.
    pub async fn sales_report(
        &self,
        scope: &TenantScope,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<ReportView> {
        let window = ReportWindow::parse(start_date, end_date)?;

        let lines = self
            .state
            .db
            .reports()
            .lines_in_window(scope, &window)
            .await
            .map_err(|e| ApiError::from_db("sales report", e, &self.state.codec))?;

        debug!(tenant = %scope, lines = lines.len(), "Aggregating report");
        let report = aggregate(lines)?;

        Ok(ReportView::new(start_date, end_date, report, &self.state.codec))
    }
}
