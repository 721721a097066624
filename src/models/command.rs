use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{Money, PaymentMethod};

/// "Set booking status to X for booking B, attributed to employee E."
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusCommand {
    pub booking_id: i64,
    pub from_status_id: i64,
    pub to_status_id: i64,
    pub employee_id: i64,
    pub at: NaiveDateTime,
}

/// Amounts are deltas; the sink adds them to whatever the booking holds at
/// write time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtensionCommand {
    pub booking_id: i64,
    pub reference: String,
    pub room_numbers: Vec<String>,
    pub new_checkout: NaiveDateTime,
    pub additional_nights: u32,
    pub additional_amount: Money,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
    pub employee_id: i64,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorCommand {
    pub booking_room_id: i64,
    pub visitor_name: String,
    pub purpose: String,
    pub check_in: NaiveDateTime,
    pub status_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorStatusCommand {
    pub visitor_log_id: i64,
    pub status_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorCheckoutCommand {
    pub visitor_log_id: i64,
    pub check_out: NaiveDateTime,
    pub status_id: i64,
}
