use serde::{Deserialize, Serialize};

use super::repo_types::{Balance, DailyLog, HistoryWindow};

/// A day's log together with its derived balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    #[serde(flatten)]
    pub log: DailyLog,
    pub balance: Option<i64>,
    pub balance_status: Option<Balance>,
}

impl From<DailyLog> for DayView {
    fn from(log: DailyLog) -> Self {
        Self {
            balance: log.balance(),
            balance_status: log.balance_status(),
            log,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_view")]
    pub view: HistoryWindow,
}

fn default_view() -> HistoryWindow {
    HistoryWindow::Weekly
}
