//! Multi-step front-desk flows.
//!
//! A wizard is built fresh for each flow and holds every input collected so
//! far. Nothing is sent anywhere until `confirm`; dropping the wizard aborts.

use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::{EngineError, ValidationError};
use crate::models::{
    Booking, BookingRoom, ExtensionCommand, Money, PaymentMethod, StatusCatalog, VisitorCommand,
    VisitorLog, VisitorStatus,
};
use crate::services::extension::{self, ExtensionQuote, Settlement};
use crate::services::ledger::{ExtensionLedger, RoomEligibility};
use crate::services::occupancy::{self, Occupancy};

// ── Extension ──

#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionStep {
    SelectingRooms,
    SelectingDate {
        rooms: Vec<String>,
    },
    ReviewingPayment {
        quote: ExtensionQuote,
    },
    SubmittingPayment {
        quote: ExtensionQuote,
        settlement: Settlement,
        method: PaymentMethod,
    },
}

impl ExtensionStep {
    pub fn name(&self) -> &'static str {
        match self {
            ExtensionStep::SelectingRooms => "selecting rooms",
            ExtensionStep::SelectingDate { .. } => "selecting a checkout date",
            ExtensionStep::ReviewingPayment { .. } => "reviewing payment",
            ExtensionStep::SubmittingPayment { .. } => "submitting payment",
        }
    }
}

/// Everything the sink needs, plus the figures shown back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedExtension {
    pub command: ExtensionCommand,
    pub quote: ExtensionQuote,
    pub settlement: Settlement,
}

/// Room selection → date selection → payment review → payment submission.
#[derive(Debug, Clone)]
pub struct ExtensionWizard {
    booking: Booking,
    ledger: ExtensionLedger,
    step: ExtensionStep,
}

impl ExtensionWizard {
    pub fn start(booking: Booking, ledger: ExtensionLedger, catalog: &StatusCatalog) -> Result<Self, EngineError> {
        extension::ensure_extendable_status(&booking, catalog)?;
        Ok(Self {
            booking,
            ledger,
            step: ExtensionStep::SelectingRooms,
        })
    }

    pub fn step(&self) -> &ExtensionStep {
        &self.step
    }

    /// All rooms of the booking; already-extended ones come back disabled.
    pub fn eligibility(&self) -> Vec<RoomEligibility> {
        self.ledger.eligibility(&self.booking)
    }

    pub fn quote(&self) -> Option<&ExtensionQuote> {
        match &self.step {
            ExtensionStep::ReviewingPayment { quote } | ExtensionStep::SubmittingPayment { quote, .. } => Some(quote),
            _ => None,
        }
    }

    pub fn select_rooms(&mut self, rooms: &[String]) -> Result<(), EngineError> {
        if self.step != ExtensionStep::SelectingRooms {
            return Err(out_of_step("select rooms", &self.step));
        }

        let picked = extension::select_rooms(&self.booking, rooms)?;
        self.ledger
            .ensure_extendable(picked.iter().map(|r| r.room_number.as_str()))?;

        let rooms = picked.iter().map(|r| r.room_number.clone()).collect();
        self.step = ExtensionStep::SelectingDate { rooms };
        Ok(())
    }

    pub fn choose_date(&mut self, new_checkout: NaiveDate) -> Result<ExtensionQuote, EngineError> {
        let ExtensionStep::SelectingDate { rooms } = &self.step else {
            return Err(out_of_step("choose a checkout date", &self.step));
        };

        let selected: Vec<&BookingRoom> = rooms.iter().filter_map(|n| self.booking.room(n)).collect();
        let quote = extension::quote(&self.booking, &selected, new_checkout)?;
        self.step = ExtensionStep::ReviewingPayment {
            quote: quote.clone(),
        };
        Ok(quote)
    }

    pub fn enter_payment(&mut self, amount: Money, method: PaymentMethod) -> Result<(), EngineError> {
        let ExtensionStep::ReviewingPayment { quote } = &self.step else {
            return Err(out_of_step("enter a payment", &self.step));
        };

        let settlement = quote.settle(&self.booking, amount)?;
        self.step = ExtensionStep::SubmittingPayment {
            quote: quote.clone(),
            settlement,
            method,
        };
        Ok(())
    }

    /// Returns to the previous step, keeping what that step had collected.
    pub fn back(&mut self) {
        self.step = match std::mem::replace(&mut self.step, ExtensionStep::SelectingRooms) {
            ExtensionStep::SubmittingPayment { quote, .. } => ExtensionStep::ReviewingPayment { quote },
            ExtensionStep::ReviewingPayment { quote } => ExtensionStep::SelectingDate {
                rooms: quote.room_numbers(),
            },
            ExtensionStep::SelectingDate { .. } | ExtensionStep::SelectingRooms => ExtensionStep::SelectingRooms,
        };
    }

    /// Final step: fixes the new checkout at noon and mints the reference.
    pub fn confirm(self, employee_id: i64, now: NaiveDateTime) -> Result<ConfirmedExtension, EngineError> {
        match self.step {
            ExtensionStep::SubmittingPayment {
                quote,
                settlement,
                method,
            } => {
                let command = ExtensionCommand {
                    booking_id: self.booking.id,
                    reference: extension::new_reference(),
                    room_numbers: quote.room_numbers(),
                    new_checkout: quote.new_checkout_at(),
                    additional_nights: quote.additional_nights,
                    additional_amount: quote.total_additional_amount,
                    payment_amount: settlement.payment_amount,
                    payment_method: method,
                    employee_id,
                    recorded_at: now,
                };
                Ok(ConfirmedExtension {
                    command,
                    quote,
                    settlement,
                })
            }
            other => Err(out_of_step("confirm the extension", &other)),
        }
    }
}

fn out_of_step(action: &'static str, step: &ExtensionStep) -> EngineError {
    ValidationError::OutOfStep {
        action,
        step: step.name(),
    }
    .into()
}

// ── Visitors ──

#[derive(Debug, Clone, PartialEq)]
pub enum VisitorStep {
    ChoosingRoom,
    EnteringDetails {
        room: BookingRoom,
        occupancy: Occupancy,
    },
    Ready {
        room: BookingRoom,
        occupancy: Occupancy,
        visitor_name: String,
        purpose: String,
    },
}

impl VisitorStep {
    pub fn name(&self) -> &'static str {
        match self {
            VisitorStep::ChoosingRoom => "choosing a room",
            VisitorStep::EnteringDetails { .. } => "entering visitor details",
            VisitorStep::Ready { .. } => "ready to log the visitor",
        }
    }
}

/// Room choice → visitor details → confirmation.
#[derive(Debug, Clone)]
pub struct VisitorWizard {
    step: VisitorStep,
}

impl Default for VisitorWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitorWizard {
    pub fn new() -> Self {
        Self {
            step: VisitorStep::ChoosingRoom,
        }
    }

    pub fn step(&self) -> &VisitorStep {
        &self.step
    }

    /// Picks the room, refusing one that is already at capacity.
    pub fn choose_room(
        &mut self,
        room: BookingRoom,
        visitors: &[VisitorLog],
        catalog: &StatusCatalog,
    ) -> Result<Occupancy, EngineError> {
        if self.step != VisitorStep::ChoosingRoom {
            return Err(visitor_out_of_step("choose a room", &self.step));
        }

        let occupancy = occupancy::occupancy(&room, visitors, catalog);
        occupancy::ensure_can_admit(&room, &occupancy, 1)?;
        self.step = VisitorStep::EnteringDetails { room, occupancy };
        Ok(occupancy)
    }

    pub fn enter_details(&mut self, visitor_name: &str, purpose: &str) -> Result<(), EngineError> {
        let VisitorStep::EnteringDetails { room, occupancy } = &self.step else {
            return Err(visitor_out_of_step("enter visitor details", &self.step));
        };

        let visitor_name = visitor_name.trim();
        if visitor_name.is_empty() {
            return Err(ValidationError::MissingField("visitor name").into());
        }

        self.step = VisitorStep::Ready {
            room: room.clone(),
            occupancy: *occupancy,
            visitor_name: visitor_name.to_string(),
            purpose: purpose.trim().to_string(),
        };
        Ok(())
    }

    pub fn back(&mut self) {
        self.step = match std::mem::replace(&mut self.step, VisitorStep::ChoosingRoom) {
            VisitorStep::Ready { room, occupancy, .. } => VisitorStep::EnteringDetails { room, occupancy },
            VisitorStep::EnteringDetails { .. } | VisitorStep::ChoosingRoom => VisitorStep::ChoosingRoom,
        };
    }

    /// New visitors start Pending, checked in at `now`.
    pub fn confirm(self, catalog: &StatusCatalog, now: NaiveDateTime) -> Result<VisitorCommand, EngineError> {
        match self.step {
            VisitorStep::Ready {
                room,
                visitor_name,
                purpose,
                ..
            } => Ok(VisitorCommand {
                booking_room_id: room.id,
                visitor_name,
                purpose,
                check_in: now,
                status_id: catalog.visitor_status_id(VisitorStatus::Pending),
            }),
            other => Err(visitor_out_of_step("log the visitor", &other)),
        }
    }
}

fn visitor_out_of_step(action: &'static str, step: &VisitorStep) -> EngineError {
    ValidationError::OutOfStep {
        action,
        step: step.name(),
    }
    .into()
}
