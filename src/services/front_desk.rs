use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::errors::{EngineError, ValidationError};
use crate::models::{
    Booking, BookingRoom, BookingStatus, Money, PaymentMethod, StatusCatalog, StatusCommand,
    VisitorCheckoutCommand, VisitorCommand, VisitorLog, VisitorStatus, VisitorStatusCommand,
};
use crate::services::checkout::{self, BalanceSummary};
use crate::services::clock::Clock;
use crate::services::extension::{ExtensionQuote, Settlement};
use crate::services::ledger::{ExtensionLedger, RoomEligibility};
use crate::services::occupancy::{self, Occupancy};
use crate::services::status_machine::StatusMachine;
use crate::services::store::{BookingSink, BookingSource};
use crate::services::wizard::{ConfirmedExtension, ExtensionWizard, VisitorWizard};

#[derive(Debug, Clone)]
pub struct ExtensionRequest {
    pub rooms: Vec<String>,
    pub new_checkout: NaiveDate,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
    pub employee_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionReceipt {
    pub reference: String,
    pub new_checkout: NaiveDateTime,
    pub quote: ExtensionQuote,
    pub settlement: Settlement,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomOccupancy {
    pub booking_room_id: i64,
    pub room_number: String,
    #[serde(flatten)]
    pub occupancy: Occupancy,
}

/// Entry point for every front-desk operation.
///
/// Each call refetches the snapshot it needs, runs the engine over it and only
/// then forwards a command to the sink. Nothing is cached between calls apart
/// from the status catalog.
pub struct FrontDesk {
    catalog: StatusCatalog,
    source: Arc<dyn BookingSource>,
    sink: Arc<dyn BookingSink>,
    clock: Arc<dyn Clock>,
}

impl FrontDesk {
    pub fn new(
        catalog: StatusCatalog,
        source: Arc<dyn BookingSource>,
        sink: Arc<dyn BookingSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            source,
            sink,
            clock,
        }
    }

    /// Loads the status catalog from the source once for this session.
    pub async fn load(
        source: Arc<dyn BookingSource>,
        sink: Arc<dyn BookingSink>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let records = source
            .approval_statuses()
            .await
            .context("failed to load approval statuses")?;
        let catalog = StatusCatalog::from_records(records)?;
        tracing::info!(statuses = catalog.records().len(), "status catalog loaded");
        Ok(Self::new(catalog, source, sink, clock))
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    // ── Snapshots ──

    pub async fn booking(&self, booking_id: i64) -> Result<Booking, EngineError> {
        let booking = self
            .source
            .booking(booking_id)
            .await
            .map_err(EngineError::collaborator)?
            .ok_or_else(|| EngineError::NotFound(format!("booking {booking_id}")))?;

        if !booking.is_consistent() {
            return Err(ValidationError::InconsistentBooking(booking_id).into());
        }
        Ok(booking)
    }

    async fn ledger(&self, booking_id: i64) -> Result<ExtensionLedger, EngineError> {
        let extensions = self
            .source
            .extensions_for_booking(booking_id)
            .await
            .map_err(EngineError::collaborator)?;
        Ok(ExtensionLedger::from_extensions(booking_id, &extensions))
    }

    async fn visitor_log(&self, visitor_log_id: i64) -> Result<VisitorLog, EngineError> {
        self.source
            .visitor_log(visitor_log_id)
            .await
            .map_err(EngineError::collaborator)?
            .ok_or_else(|| EngineError::NotFound(format!("visitor log {visitor_log_id}")))
    }

    // ── Balance & status ──

    pub async fn balance(&self, booking_id: i64) -> Result<BalanceSummary, EngineError> {
        let booking = self.booking(booking_id).await?;
        Ok(checkout::summarize(&booking))
    }

    pub async fn settable_statuses(&self, booking_id: i64) -> Result<Vec<BookingStatus>, EngineError> {
        let booking = self.booking(booking_id).await?;
        Ok(StatusMachine::new(&self.catalog).settable_statuses(&booking))
    }

    pub async fn change_status(
        &self,
        booking_id: i64,
        target: BookingStatus,
        employee_id: i64,
    ) -> Result<StatusCommand, EngineError> {
        let booking = self.booking(booking_id).await?;
        let command = StatusMachine::new(&self.catalog).change_status(&booking, target, employee_id, self.clock.now());
        self.apply_status(booking_id, command).await
    }

    pub async fn approve(&self, booking_id: i64, employee_id: i64) -> Result<StatusCommand, EngineError> {
        let booking = self.booking(booking_id).await?;
        let command = StatusMachine::new(&self.catalog).approve(&booking, employee_id, self.clock.now());
        self.apply_status(booking_id, command).await
    }

    pub async fn cancel(&self, booking_id: i64, employee_id: i64) -> Result<StatusCommand, EngineError> {
        let booking = self.booking(booking_id).await?;
        let command = StatusMachine::new(&self.catalog).cancel(&booking, employee_id, self.clock.now());
        self.apply_status(booking_id, command).await
    }

    pub async fn check_out(&self, booking_id: i64, employee_id: i64) -> Result<StatusCommand, EngineError> {
        let booking = self.booking(booking_id).await?;
        let command = StatusMachine::new(&self.catalog).check_out(&booking, employee_id, self.clock.now());
        self.apply_status(booking_id, command).await
    }

    async fn apply_status(
        &self,
        booking_id: i64,
        command: Result<StatusCommand, ValidationError>,
    ) -> Result<StatusCommand, EngineError> {
        let command = command.map_err(|e| {
            tracing::warn!(booking_id, error = %e, "status change refused");
            e
        })?;

        self.sink
            .set_booking_status(&command)
            .await
            .map_err(EngineError::collaborator)?;

        tracing::info!(
            booking_id,
            employee_id = command.employee_id,
            from = self.catalog.name(command.from_status_id).unwrap_or("?"),
            to = self.catalog.name(command.to_status_id).unwrap_or("?"),
            "booking status changed"
        );
        Ok(command)
    }

    // ── Extensions ──

    /// Fresh wizard over a just-fetched booking and ledger.
    pub async fn start_extension(&self, booking_id: i64) -> Result<ExtensionWizard, EngineError> {
        let booking = self.booking(booking_id).await?;
        let ledger = self.ledger(booking_id).await?;
        ExtensionWizard::start(booking, ledger, &self.catalog)
    }

    pub async fn extension_rooms(&self, booking_id: i64) -> Result<Vec<RoomEligibility>, EngineError> {
        let booking = self.booking(booking_id).await?;
        let ledger = self.ledger(booking_id).await?;
        Ok(ledger.eligibility(&booking))
    }

    /// Runs room and date selection without touching the backend.
    pub async fn quote_extension(
        &self,
        booking_id: i64,
        rooms: &[String],
        new_checkout: NaiveDate,
    ) -> Result<ExtensionQuote, EngineError> {
        let mut wizard = self.start_extension(booking_id).await?;
        wizard.select_rooms(rooms)?;
        wizard.choose_date(new_checkout)
    }

    pub async fn extend(&self, booking_id: i64, request: ExtensionRequest) -> Result<ExtensionReceipt, EngineError> {
        let wizard = self.start_extension(booking_id).await?;
        let confirmed = drive_extension(wizard, &request, self.clock.now()).map_err(|e| {
            tracing::warn!(booking_id, error = %e, "extension refused");
            e
        })?;

        let command = &confirmed.command;
        self.sink
            .record_extension(command)
            .await
            .map_err(EngineError::collaborator)?;

        tracing::info!(
            booking_id,
            reference = %command.reference,
            rooms = ?command.room_numbers,
            nights = command.additional_nights,
            amount = %command.additional_amount,
            paid = %command.payment_amount,
            "booking extended"
        );

        Ok(ExtensionReceipt {
            reference: confirmed.command.reference,
            new_checkout: confirmed.command.new_checkout,
            quote: confirmed.quote,
            settlement: confirmed.settlement,
        })
    }

    // ── Occupancy & visitors ──

    pub async fn room_occupancy(&self, booking_room_id: i64) -> Result<RoomOccupancy, EngineError> {
        let room = self
            .source
            .booking_room(booking_room_id)
            .await
            .map_err(EngineError::collaborator)?
            .ok_or_else(|| EngineError::NotFound(format!("booking room {booking_room_id}")))?;
        let visitors = self
            .source
            .visitor_logs_for_room(booking_room_id)
            .await
            .map_err(EngineError::collaborator)?;

        Ok(RoomOccupancy {
            booking_room_id,
            room_number: room.room_number.clone(),
            occupancy: occupancy::occupancy(&room, &visitors, &self.catalog),
        })
    }

    pub async fn add_visitor(
        &self,
        booking_room_id: i64,
        visitor_name: &str,
        purpose: &str,
    ) -> Result<VisitorLog, EngineError> {
        let room = self
            .source
            .booking_room(booking_room_id)
            .await
            .map_err(EngineError::collaborator)?
            .ok_or_else(|| EngineError::NotFound(format!("booking room {booking_room_id}")))?;
        let booking = self.booking(room.booking_id).await?;
        let visitors = self
            .source
            .visitor_logs_for_room(booking_room_id)
            .await
            .map_err(EngineError::collaborator)?;

        let room_number = room.room_number.clone();
        let now = self.clock.now();
        let command = drive_visitor(&booking, room, &visitors, &self.catalog, visitor_name, purpose, now).map_err(|e| {
            tracing::warn!(booking_room_id, room_number = %room_number, error = %e, "visitor refused");
            e
        })?;

        let id = self
            .sink
            .record_visitor(&command)
            .await
            .map_err(EngineError::collaborator)?;

        tracing::info!(booking_room_id, room_number = %room_number, visitor_log_id = id, "visitor logged");

        Ok(VisitorLog {
            id,
            booking_room_id: command.booking_room_id,
            visitor_name: command.visitor_name,
            purpose: command.purpose,
            check_in: command.check_in,
            check_out: None,
            status_id: command.status_id,
        })
    }

    /// Moves an open visitor log to another status. Checked-Out goes through
    /// [`FrontDesk::check_out_visitor`] so the time gets stamped.
    pub async fn set_visitor_status(
        &self,
        visitor_log_id: i64,
        status: VisitorStatus,
    ) -> Result<VisitorLog, EngineError> {
        if status == VisitorStatus::CheckedOut {
            return self.check_out_visitor(visitor_log_id).await;
        }

        let mut log = self.visitor_log(visitor_log_id).await?;
        if !log.is_active(&self.catalog) {
            return Err(ValidationError::VisitorClosed(visitor_log_id).into());
        }

        let command = VisitorStatusCommand {
            visitor_log_id,
            status_id: self.catalog.visitor_status_id(status),
        };
        self.sink
            .set_visitor_status(&command)
            .await
            .map_err(EngineError::collaborator)?;

        tracing::info!(visitor_log_id, status = status.name(), "visitor status changed");
        log.status_id = command.status_id;
        Ok(log)
    }

    /// Stamps the checkout time. A log already in a terminal status keeps it.
    pub async fn check_out_visitor(&self, visitor_log_id: i64) -> Result<VisitorLog, EngineError> {
        let mut log = self.visitor_log(visitor_log_id).await?;
        if log.check_out.is_some() {
            return Err(ValidationError::VisitorClosed(visitor_log_id).into());
        }

        let status_id = match self.catalog.visitor_status(log.status_id) {
            Some(current) if current.is_terminal() => log.status_id,
            _ => self.catalog.visitor_status_id(VisitorStatus::CheckedOut),
        };
        let command = VisitorCheckoutCommand {
            visitor_log_id,
            check_out: self.clock.now(),
            status_id,
        };
        self.sink
            .record_visitor_checkout(&command)
            .await
            .map_err(EngineError::collaborator)?;

        tracing::info!(visitor_log_id, "visitor checked out");
        log.check_out = Some(command.check_out);
        log.status_id = command.status_id;
        Ok(log)
    }
}

fn drive_extension(
    mut wizard: ExtensionWizard,
    request: &ExtensionRequest,
    now: NaiveDateTime,
) -> Result<ConfirmedExtension, EngineError> {
    wizard.select_rooms(&request.rooms)?;
    wizard.choose_date(request.new_checkout)?;
    wizard.enter_payment(request.payment_amount, request.payment_method)?;
    wizard.confirm(request.employee_id, now)
}

/// Visitors are only logged while the booking is still open.
fn drive_visitor(
    booking: &Booking,
    room: BookingRoom,
    visitors: &[VisitorLog],
    catalog: &StatusCatalog,
    visitor_name: &str,
    purpose: &str,
    now: NaiveDateTime,
) -> Result<VisitorCommand, EngineError> {
    match booking.status(catalog) {
        Some(status) if status.is_terminal() => return Err(ValidationError::BookingClosed(status).into()),
        Some(_) => {}
        None => return Err(ValidationError::UnknownStatus(booking.status_id).into()),
    }

    let mut wizard = VisitorWizard::new();
    wizard.choose_room(room, visitors, catalog)?;
    wizard.enter_details(visitor_name, purpose)?;
    wizard.confirm(catalog, now)
}
