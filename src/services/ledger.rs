use std::collections::HashMap;

use serde::Serialize;

use crate::errors::ConflictError;
use crate::models::{Booking, BookingRoom, Money, RoomExtension};

/// Which rooms of a booking have already been extended, and under which reference.
#[derive(Debug, Clone, Default)]
pub struct ExtensionLedger {
    extended: HashMap<String, String>,
}

/// A room as shown in the extension picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomEligibility {
    pub room_number: String,
    pub room_type: String,
    pub nightly_price: Money,
    pub eligible: bool,
    pub extension_reference: Option<String>,
}

impl ExtensionLedger {
    /// Builds the ledger from history; extensions of other bookings are ignored
    /// and the earliest extension of a room wins.
    pub fn from_extensions(booking_id: i64, extensions: &[RoomExtension]) -> Self {
        let mut ordered: Vec<&RoomExtension> = extensions
            .iter()
            .filter(|e| e.booking_id == booking_id)
            .collect();
        ordered.sort_by_key(|e| (e.created_at, e.id));

        let mut extended = HashMap::new();
        for extension in ordered {
            for room in &extension.room_numbers {
                extended
                    .entry(room.clone())
                    .or_insert_with(|| extension.reference.clone());
            }
        }

        Self { extended }
    }

    pub fn is_room_extended(&self, room_number: &str) -> bool {
        self.extended.contains_key(room_number)
    }

    pub fn extension_reference_for(&self, room_number: &str) -> Option<&str> {
        self.extended.get(room_number).map(String::as_str)
    }

    pub fn extended_count(&self) -> usize {
        self.extended.len()
    }

    pub fn eligibility(&self, booking: &Booking) -> Vec<RoomEligibility> {
        booking
            .rooms
            .iter()
            .map(|room| {
                let reference = self.extension_reference_for(&room.room_number);
                RoomEligibility {
                    room_number: room.room_number.clone(),
                    room_type: room.room_type.name.clone(),
                    nightly_price: room.room_type.nightly_price,
                    eligible: reference.is_none(),
                    extension_reference: reference.map(str::to_string),
                }
            })
            .collect()
    }

    pub fn extendable_rooms<'a>(&self, booking: &'a Booking) -> Vec<&'a BookingRoom> {
        booking
            .rooms
            .iter()
            .filter(|r| !self.is_room_extended(&r.room_number))
            .collect()
    }

    /// Rejects a selection that contains any room extended before.
    pub fn ensure_extendable<'a, I>(&self, room_numbers: I) -> Result<(), ConflictError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for room in room_numbers {
            if let Some(reference) = self.extension_reference_for(room) {
                return Err(ConflictError::RoomAlreadyExtended {
                    room_number: room.to_string(),
                    reference: reference.to_string(),
                });
            }
        }
        Ok(())
    }
}
