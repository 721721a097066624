use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    EWallet,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "card" => PaymentMethod::Card,
            "e_wallet" => PaymentMethod::EWallet,
            "bank_transfer" => PaymentMethod::BankTransfer,
            _ => PaymentMethod::Cash,
        }
    }
}

/// Append-only record of a stay extension covering one or more rooms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomExtension {
    pub id: i64,
    pub booking_id: i64,
    pub reference: String,
    pub room_numbers: Vec<String>,
    pub additional_nights: u32,
    pub additional_amount: Money,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
    pub new_checkout: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl RoomExtension {
    pub fn covers(&self, room_number: &str) -> bool {
        self.room_numbers.iter().any(|r| r == room_number)
    }
}
