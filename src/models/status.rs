use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusScope {
    Booking,
    Visitor,
}

impl StatusScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booking" => Some(StatusScope::Booking),
            "visitor" => Some(StatusScope::Visitor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::CheckedIn,
        BookingStatus::CheckedOut,
        BookingStatus::Cancelled,
    ];

    /// Canonical catalog name.
    pub fn name(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::CheckedIn => "Checked-In",
            BookingStatus::CheckedOut => "Checked-Out",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Approved)
                | (BookingStatus::Approved, BookingStatus::CheckedIn)
                | (BookingStatus::CheckedIn, BookingStatus::CheckedOut)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Approved, BookingStatus::Cancelled)
        )
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VisitorStatus {
    Pending,
    Approved,
    Left,
    CheckedOut,
    Cancelled,
}

impl VisitorStatus {
    pub const ALL: [VisitorStatus; 5] = [
        VisitorStatus::Pending,
        VisitorStatus::Approved,
        VisitorStatus::Left,
        VisitorStatus::CheckedOut,
        VisitorStatus::Cancelled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            VisitorStatus::Pending => "Pending",
            VisitorStatus::Approved => "Approved",
            VisitorStatus::Left => "Left",
            VisitorStatus::CheckedOut => "Checked-Out",
            VisitorStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VisitorStatus::Left | VisitorStatus::CheckedOut | VisitorStatus::Cancelled
        )
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// One row of the approval-status lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovalStatus {
    pub id: i64,
    pub scope: StatusScope,
    pub name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("status catalog is missing the {scope} status \"{name}\"")]
    Missing {
        scope: &'static str,
        name: &'static str,
    },

    #[error("status id {0} appears more than once in the catalog")]
    DuplicateId(i64),
}

/// Immutable id <-> status lookup, loaded once per session.
///
/// Resolution from names happens only while building the catalog, by exact
/// canonical name. Everything downstream works on ids.
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    records: Vec<ApprovalStatus>,
    booking_ids: [i64; 5],
    visitor_ids: [i64; 5],
    booking_by_id: HashMap<i64, BookingStatus>,
    visitor_by_id: HashMap<i64, VisitorStatus>,
}

impl StatusCatalog {
    pub fn from_records(records: Vec<ApprovalStatus>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id) {
                return Err(CatalogError::DuplicateId(record.id));
            }
        }

        let find = |scope: StatusScope, name: &str| {
            records
                .iter()
                .find(|r| r.scope == scope && r.name == name)
                .map(|r| r.id)
        };

        let mut booking_ids = [0; 5];
        for status in BookingStatus::ALL {
            booking_ids[status.index()] =
                find(StatusScope::Booking, status.name()).ok_or(CatalogError::Missing {
                    scope: "booking",
                    name: status.name(),
                })?;
        }

        let mut visitor_ids = [0; 5];
        for status in VisitorStatus::ALL {
            visitor_ids[status.index()] =
                find(StatusScope::Visitor, status.name()).ok_or(CatalogError::Missing {
                    scope: "visitor",
                    name: status.name(),
                })?;
        }

        Ok(Self::assemble(records, booking_ids, visitor_ids))
    }

    /// The seed catalog shipped with the migrations.
    pub fn standard() -> Self {
        Self::assemble(Self::standard_records(), [1, 2, 3, 4, 5], [11, 12, 13, 14, 15])
    }

    pub fn standard_records() -> Vec<ApprovalStatus> {
        let booking = BookingStatus::ALL
            .into_iter()
            .zip(1..)
            .map(|(s, id)| ApprovalStatus {
                id,
                scope: StatusScope::Booking,
                name: s.name().to_string(),
            });
        let visitor = VisitorStatus::ALL
            .into_iter()
            .zip(11..)
            .map(|(s, id)| ApprovalStatus {
                id,
                scope: StatusScope::Visitor,
                name: s.name().to_string(),
            });
        booking.chain(visitor).collect()
    }

    fn assemble(records: Vec<ApprovalStatus>, booking_ids: [i64; 5], visitor_ids: [i64; 5]) -> Self {
        let booking_by_id = BookingStatus::ALL
            .into_iter()
            .map(|s| (booking_ids[s.index()], s))
            .collect();
        let visitor_by_id = VisitorStatus::ALL
            .into_iter()
            .map(|s| (visitor_ids[s.index()], s))
            .collect();
        Self {
            records,
            booking_ids,
            visitor_ids,
            booking_by_id,
            visitor_by_id,
        }
    }

    pub fn booking_status(&self, id: i64) -> Option<BookingStatus> {
        self.booking_by_id.get(&id).copied()
    }

    pub fn booking_status_id(&self, status: BookingStatus) -> i64 {
        self.booking_ids[status.index()]
    }

    pub fn visitor_status(&self, id: i64) -> Option<VisitorStatus> {
        self.visitor_by_id.get(&id).copied()
    }

    pub fn visitor_status_id(&self, status: VisitorStatus) -> i64 {
        self.visitor_ids[status.index()]
    }

    /// Display name for any id, including statuses the engine has no kind for.
    pub fn name(&self, id: i64) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.name.as_str())
    }

    pub fn records(&self) -> &[ApprovalStatus] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_round_trips_ids() {
        let catalog = StatusCatalog::standard();
        for status in BookingStatus::ALL {
            let id = catalog.booking_status_id(status);
            assert_eq!(catalog.booking_status(id), Some(status));
            assert_eq!(catalog.name(id), Some(status.name()));
        }
        for status in VisitorStatus::ALL {
            let id = catalog.visitor_status_id(status);
            assert_eq!(catalog.visitor_status(id), Some(status));
        }
    }

    #[test]
    fn test_from_records_matches_standard() {
        let catalog = StatusCatalog::from_records(StatusCatalog::standard_records()).unwrap();
        assert_eq!(catalog.booking_status_id(BookingStatus::CheckedIn), 3);
        assert_eq!(catalog.visitor_status_id(VisitorStatus::Left), 13);
    }

    #[test]
    fn test_name_match_is_exact() {
        let mut records = StatusCatalog::standard_records();
        // "checked-in" must not satisfy "Checked-In"
        records
            .iter_mut()
            .filter(|r| r.scope == StatusScope::Booking && r.name == "Checked-In")
            .for_each(|r| r.name = "checked-in".to_string());

        let err = StatusCatalog::from_records(records).unwrap_err();
        assert_eq!(
            err,
            CatalogError::Missing {
                scope: "booking",
                name: "Checked-In"
            }
        );
    }

    #[test]
    fn test_visitor_scope_does_not_satisfy_booking_scope() {
        let records: Vec<_> = StatusCatalog::standard_records()
            .into_iter()
            .filter(|r| !(r.scope == StatusScope::Booking && r.name == "Pending"))
            .collect();
        let err = StatusCatalog::from_records(records).unwrap_err();
        assert!(matches!(err, CatalogError::Missing { scope: "booking", name: "Pending" }));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut records = StatusCatalog::standard_records();
        records.push(ApprovalStatus {
            id: 1,
            scope: StatusScope::Booking,
            name: "No-Show".to_string(),
        });
        assert_eq!(
            StatusCatalog::from_records(records).unwrap_err(),
            CatalogError::DuplicateId(1)
        );
    }

    #[test]
    fn test_extra_statuses_keep_names_but_no_kind() {
        let mut records = StatusCatalog::standard_records();
        records.push(ApprovalStatus {
            id: 42,
            scope: StatusScope::Booking,
            name: "No-Show".to_string(),
        });
        let catalog = StatusCatalog::from_records(records).unwrap();
        assert_eq!(catalog.name(42), Some("No-Show"));
        assert_eq!(catalog.booking_status(42), None);
    }

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Approved.can_transition_to(CheckedIn));
        assert!(CheckedIn.can_transition_to(CheckedOut));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(!CheckedIn.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(CheckedIn));
        for next in BookingStatus::ALL {
            assert!(!CheckedOut.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }
}
