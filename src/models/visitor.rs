use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::StatusCatalog;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorLog {
    pub id: i64,
    pub booking_room_id: i64,
    pub visitor_name: String,
    pub purpose: String,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
    pub status_id: i64,
}

impl VisitorLog {
    /// Still on the premises: no checkout stamp and not in a terminal status.
    ///
    /// Ids the catalog does not recognise count as non-terminal.
    pub fn is_active(&self, catalog: &StatusCatalog) -> bool {
        self.check_out.is_none()
            && !catalog
                .visitor_status(self.status_id)
                .map(|s| s.is_terminal())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisitorStatus;

    fn log(status: VisitorStatus, check_out: Option<NaiveDateTime>) -> VisitorLog {
        let catalog = StatusCatalog::standard();
        VisitorLog {
            id: 1,
            booking_room_id: 1,
            visitor_name: "Ana".to_string(),
            purpose: "Delivery".to_string(),
            check_in: NaiveDateTime::parse_from_str("2025-03-10 09:00", "%Y-%m-%d %H:%M").unwrap(),
            check_out,
            status_id: catalog.visitor_status_id(status),
        }
    }

    #[test]
    fn test_active_requires_open_log_and_live_status() {
        let catalog = StatusCatalog::standard();
        assert!(log(VisitorStatus::Pending, None).is_active(&catalog));
        assert!(log(VisitorStatus::Approved, None).is_active(&catalog));
        assert!(!log(VisitorStatus::Left, None).is_active(&catalog));
        assert!(!log(VisitorStatus::CheckedOut, None).is_active(&catalog));
        assert!(!log(VisitorStatus::Cancelled, None).is_active(&catalog));

        let out = NaiveDateTime::parse_from_str("2025-03-10 11:00", "%Y-%m-%d %H:%M").unwrap();
        assert!(!log(VisitorStatus::Approved, Some(out)).is_active(&catalog));
    }

    #[test]
    fn test_unknown_status_counts_as_active() {
        let catalog = StatusCatalog::standard();
        let mut entry = log(VisitorStatus::Approved, None);
        entry.status_id = 999;
        assert!(entry.is_active(&catalog));
    }
}
