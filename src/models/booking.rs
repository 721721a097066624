use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{BookingStatus, Money, StatusCatalog};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomType {
    pub id: i64,
    pub name: String,
    pub nightly_price: Money,
    /// Zero means the capacity was never configured.
    #[serde(default)]
    pub capacity: u32,
}

impl RoomType {
    pub fn max_capacity(&self) -> Option<u32> {
        (self.capacity > 0).then_some(self.capacity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRoom {
    pub id: i64,
    pub booking_id: i64,
    pub room_number: String,
    pub room_type: RoomType,
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: i64,
    pub reference: String,
    pub customer_id: i64,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub status_id: i64,
    pub total_amount: Money,
    pub downpayment: Money,
    pub rooms: Vec<BookingRoom>,
}

impl Booking {
    pub fn status(&self, catalog: &StatusCatalog) -> Option<BookingStatus> {
        catalog.booking_status(self.status_id)
    }

    pub fn room(&self, room_number: &str) -> Option<&BookingRoom> {
        self.rooms.iter().find(|r| r.room_number == room_number)
    }

    pub fn is_multi_room(&self) -> bool {
        self.rooms.len() > 1
    }

    /// Record-level invariants every snapshot must satisfy.
    pub fn is_consistent(&self) -> bool {
        self.check_out > self.check_in
            && !self.total_amount.is_negative()
            && !self.downpayment.is_negative()
            && !self.rooms.is_empty()
    }
}
