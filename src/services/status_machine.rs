use chrono::NaiveDateTime;

use crate::errors::ValidationError;
use crate::models::{Booking, BookingStatus, StatusCatalog, StatusCommand};
use crate::services::checkout;

/// Targets the generic status editor may offer. Approval and cancellation
/// have their own flows; Pending is only ever set at intake.
pub const MANUALLY_SETTABLE: [BookingStatus; 2] = [BookingStatus::CheckedIn, BookingStatus::CheckedOut];

/// Forward-only booking transitions. Produces commands, never writes.
pub struct StatusMachine<'a> {
    catalog: &'a StatusCatalog,
}

impl<'a> StatusMachine<'a> {
    pub fn new(catalog: &'a StatusCatalog) -> Self {
        Self { catalog }
    }

    pub fn current(&self, booking: &Booking) -> Result<BookingStatus, ValidationError> {
        booking
            .status(self.catalog)
            .ok_or(ValidationError::UnknownStatus(booking.status_id))
    }

    /// Statuses the editor can move this booking into right now.
    pub fn settable_statuses(&self, booking: &Booking) -> Vec<BookingStatus> {
        let Ok(current) = self.current(booking) else {
            return Vec::new();
        };
        MANUALLY_SETTABLE
            .into_iter()
            .filter(|next| current.can_transition_to(*next))
            .collect()
    }

    pub fn change_status_by_id(
        &self,
        booking: &Booking,
        target_id: i64,
        employee_id: i64,
        at: NaiveDateTime,
    ) -> Result<StatusCommand, ValidationError> {
        let target = self
            .catalog
            .booking_status(target_id)
            .ok_or(ValidationError::UnknownStatus(target_id))?;
        self.change_status(booking, target, employee_id, at)
    }

    /// The generic status editor.
    pub fn change_status(
        &self,
        booking: &Booking,
        target: BookingStatus,
        employee_id: i64,
        at: NaiveDateTime,
    ) -> Result<StatusCommand, ValidationError> {
        if !MANUALLY_SETTABLE.contains(&target) {
            return Err(ValidationError::ForbiddenStatus(target));
        }
        if target == BookingStatus::CheckedOut {
            return self.check_out(booking, employee_id, at);
        }
        self.transition(booking, target, employee_id, at)
    }

    pub fn approve(&self, booking: &Booking, employee_id: i64, at: NaiveDateTime) -> Result<StatusCommand, ValidationError> {
        self.transition(booking, BookingStatus::Approved, employee_id, at)
    }

    pub fn cancel(&self, booking: &Booking, employee_id: i64, at: NaiveDateTime) -> Result<StatusCommand, ValidationError> {
        self.transition(booking, BookingStatus::Cancelled, employee_id, at)
    }

    /// Checkout is only legal from Checked-In and only once nothing is owed.
    pub fn check_out(&self, booking: &Booking, employee_id: i64, at: NaiveDateTime) -> Result<StatusCommand, ValidationError> {
        let from = self.current(booking)?;
        ensure_edge(from, BookingStatus::CheckedOut)?;
        checkout::ensure_settled(booking)?;
        Ok(self.command(booking, BookingStatus::CheckedOut, employee_id, at))
    }

    fn transition(
        &self,
        booking: &Booking,
        to: BookingStatus,
        employee_id: i64,
        at: NaiveDateTime,
    ) -> Result<StatusCommand, ValidationError> {
        let from = self.current(booking)?;
        ensure_edge(from, to)?;
        Ok(self.command(booking, to, employee_id, at))
    }

    fn command(&self, booking: &Booking, to: BookingStatus, employee_id: i64, at: NaiveDateTime) -> StatusCommand {
        StatusCommand {
            booking_id: booking.id,
            from_status_id: booking.status_id,
            to_status_id: self.catalog.booking_status_id(to),
            employee_id,
            at,
        }
    }
}

fn ensure_edge(from: BookingStatus, to: BookingStatus) -> Result<(), ValidationError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ValidationError::IllegalTransition { from, to })
    }
}
