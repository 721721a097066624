pub mod sqlite;

use async_trait::async_trait;

use crate::models::{
    ApprovalStatus, Booking, BookingRoom, ExtensionCommand, RoomExtension, StatusCommand,
    VisitorCheckoutCommand, VisitorCommand, VisitorLog, VisitorStatusCommand,
};

/// Read side of the backend. Lookups that match nothing return `None` or an
/// empty list, never an error.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn approval_statuses(&self) -> anyhow::Result<Vec<ApprovalStatus>>;

    async fn booking(&self, booking_id: i64) -> anyhow::Result<Option<Booking>>;

    async fn booking_room(&self, booking_room_id: i64) -> anyhow::Result<Option<BookingRoom>>;

    async fn visitor_logs_for_room(&self, booking_room_id: i64) -> anyhow::Result<Vec<VisitorLog>>;

    async fn visitor_log(&self, visitor_log_id: i64) -> anyhow::Result<Option<VisitorLog>>;

    async fn extensions_for_booking(&self, booking_id: i64) -> anyhow::Result<Vec<RoomExtension>>;
}

/// Write side of the backend. Each command either lands or reports why not.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn set_booking_status(&self, command: &StatusCommand) -> anyhow::Result<()>;

    async fn record_extension(&self, command: &ExtensionCommand) -> anyhow::Result<()>;

    /// Returns the id of the new visitor log.
    async fn record_visitor(&self, command: &VisitorCommand) -> anyhow::Result<i64>;

    async fn set_visitor_status(&self, command: &VisitorStatusCommand) -> anyhow::Result<()>;

    async fn record_visitor_checkout(&self, command: &VisitorCheckoutCommand) -> anyhow::Result<()>;
}
