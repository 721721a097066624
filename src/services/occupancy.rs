use serde::Serialize;

use crate::errors::ValidationError;
use crate::models::{BookingRoom, StatusCatalog, VisitorLog};

/// Capacity picture of one booked room at the moment of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub adults: u32,
    pub children: u32,
    pub active_visitors: u32,
    pub current: u32,
    /// `None` when the room type has no capacity configured.
    pub max_capacity: Option<u32>,
    /// `None` means unbounded.
    pub remaining: Option<u32>,
    pub is_full: bool,
}

impl Occupancy {
    pub fn can_admit(&self, additional: u32) -> bool {
        match self.max_capacity {
            Some(max) => self.current.saturating_add(additional) <= max,
            None => true,
        }
    }
}

pub fn active_visitor_count(room: &BookingRoom, visitors: &[VisitorLog], catalog: &StatusCatalog) -> u32 {
    let count = visitors
        .iter()
        .filter(|v| v.booking_room_id == room.id && v.is_active(catalog))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

pub fn occupancy(room: &BookingRoom, visitors: &[VisitorLog], catalog: &StatusCatalog) -> Occupancy {
    let active_visitors = active_visitor_count(room, visitors, catalog);
    let current = room
        .adults
        .saturating_add(room.children)
        .saturating_add(active_visitors);
    let max_capacity = room.room_type.max_capacity();

    Occupancy {
        adults: room.adults,
        children: room.children,
        active_visitors,
        current,
        max_capacity,
        remaining: max_capacity.map(|max| max.saturating_sub(current)),
        is_full: max_capacity.map(|max| current >= max).unwrap_or(false),
    }
}

/// Refuses to seat `additional` more people in a room that cannot take them.
pub fn ensure_can_admit(
    room: &BookingRoom,
    occupancy: &Occupancy,
    additional: u32,
) -> Result<(), ValidationError> {
    match occupancy.max_capacity {
        Some(capacity) if !occupancy.can_admit(additional) => Err(ValidationError::RoomFull {
            room_number: room.room_number.clone(),
            occupancy: occupancy.current,
            capacity,
        }),
        _ => Ok(()),
    }
}
