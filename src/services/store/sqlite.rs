use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use super::{BookingSink, BookingSource};
use crate::db::{self, queries};
use crate::models::{
    ApprovalStatus, Booking, BookingRoom, ExtensionCommand, RoomExtension, StatusCommand,
    VisitorCheckoutCommand, VisitorCommand, VisitorLog, VisitorStatusCommand,
};

/// Local sqlite backend acting as both data source and data sink.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    pub fn connection(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

#[async_trait]
impl BookingSource for SqliteStore {
    async fn approval_statuses(&self) -> anyhow::Result<Vec<ApprovalStatus>> {
        let conn = self.connection()?;
        queries::list_approval_statuses(&conn)
    }

    async fn booking(&self, booking_id: i64) -> anyhow::Result<Option<Booking>> {
        let conn = self.connection()?;
        queries::get_booking(&conn, booking_id)
    }

    async fn booking_room(&self, booking_room_id: i64) -> anyhow::Result<Option<BookingRoom>> {
        let conn = self.connection()?;
        queries::get_booking_room(&conn, booking_room_id)
    }

    async fn visitor_logs_for_room(&self, booking_room_id: i64) -> anyhow::Result<Vec<VisitorLog>> {
        let conn = self.connection()?;
        queries::get_visitor_logs_for_room(&conn, booking_room_id)
    }

    async fn visitor_log(&self, visitor_log_id: i64) -> anyhow::Result<Option<VisitorLog>> {
        let conn = self.connection()?;
        queries::get_visitor_log(&conn, visitor_log_id)
    }

    async fn extensions_for_booking(&self, booking_id: i64) -> anyhow::Result<Vec<RoomExtension>> {
        let conn = self.connection()?;
        queries::get_extensions_for_booking(&conn, booking_id)
    }
}

#[async_trait]
impl BookingSink for SqliteStore {
    async fn set_booking_status(&self, command: &StatusCommand) -> anyhow::Result<()> {
        let conn = self.connection()?;
        let applied = queries::update_booking_status(&conn, command)?;
        anyhow::ensure!(
            applied,
            "booking {} changed since it was read (status or balance), reload and try again",
            command.booking_id
        );
        Ok(())
    }

    async fn record_extension(&self, command: &ExtensionCommand) -> anyhow::Result<()> {
        let conn = self.connection()?;
        queries::insert_extension(&conn, command)?;
        Ok(())
    }

    async fn record_visitor(&self, command: &VisitorCommand) -> anyhow::Result<i64> {
        let conn = self.connection()?;
        queries::insert_visitor_log(&conn, command)
    }

    async fn set_visitor_status(&self, command: &VisitorStatusCommand) -> anyhow::Result<()> {
        let conn = self.connection()?;
        let updated = queries::update_visitor_status(&conn, command.visitor_log_id, command.status_id)?;
        anyhow::ensure!(updated, "visitor log {} not found", command.visitor_log_id);
        Ok(())
    }

    async fn record_visitor_checkout(&self, command: &VisitorCheckoutCommand) -> anyhow::Result<()> {
        let conn = self.connection()?;
        let updated = queries::set_visitor_checkout(&conn, command)?;
        anyhow::ensure!(
            updated,
            "visitor log {} is missing or already checked out",
            command.visitor_log_id
        );
        Ok(())
    }
}
