//! Stay-extension pricing.
//!
//! The engine prices whatever rooms it is handed. Filtering out rooms that were
//! already extended is the ledger's job and happens before a quote is built.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::errors::ValidationError;
use crate::models::{Booking, BookingRoom, BookingStatus, Money, StatusCatalog};

const MS_PER_DAY: i64 = 86_400_000;

/// Hour of day every extended checkout is pinned to.
pub const CHECKOUT_HOUR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomCharge {
    pub room_number: String,
    pub room_type: String,
    pub nightly_price: Money,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionQuote {
    pub booking_id: i64,
    pub current_checkout: NaiveDate,
    pub new_checkout: NaiveDate,
    pub additional_nights: u32,
    pub rooms: Vec<RoomCharge>,
    pub total_additional_amount: Money,
}

/// How a payment against a quote lands on the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub payment_amount: Money,
    pub unpaid_amount: Money,
    pub new_total_amount: Money,
    pub new_downpayment: Money,
}

pub fn ensure_extendable_status(booking: &Booking, catalog: &StatusCatalog) -> Result<(), ValidationError> {
    match booking.status(catalog) {
        Some(BookingStatus::Approved | BookingStatus::CheckedIn) => Ok(()),
        Some(other) => Err(ValidationError::NotExtendable(other)),
        None => Err(ValidationError::UnknownStatus(booking.status_id)),
    }
}

/// Nights between the current checkout and midnight of the new checkout date, rounded up.
pub fn additional_nights(current_checkout: NaiveDateTime, new_checkout: NaiveDate) -> Result<u32, ValidationError> {
    if new_checkout <= current_checkout.date() {
        return Err(ValidationError::CheckoutNotAfterCurrent {
            current: current_checkout.date(),
            requested: new_checkout,
        });
    }

    let target = new_checkout.and_time(chrono::NaiveTime::MIN);
    let elapsed_ms = target.signed_duration_since(current_checkout).num_milliseconds();
    if elapsed_ms <= 0 {
        return Err(ValidationError::NoAdditionalNights);
    }

    let nights = (elapsed_ms + MS_PER_DAY - 1) / MS_PER_DAY;
    u32::try_from(nights).map_err(|_| ValidationError::AmountOverflow)
}

/// Resolves the rooms under extension. A single-room booking needs no explicit
/// selection; duplicates are dropped, keeping first occurrence order.
pub fn select_rooms<'a>(booking: &'a Booking, selected: &[String]) -> Result<Vec<&'a BookingRoom>, ValidationError> {
    if selected.is_empty() {
        return match booking.rooms.first() {
            Some(only) if !booking.is_multi_room() => Ok(vec![only]),
            _ => Err(ValidationError::NoRoomsSelected),
        };
    }

    let mut rooms: Vec<&BookingRoom> = Vec::with_capacity(selected.len());
    for number in selected {
        let room = booking
            .room(number)
            .ok_or_else(|| ValidationError::UnknownRoom(number.clone()))?;
        if !rooms.iter().any(|r| r.room_number == room.room_number) {
            rooms.push(room);
        }
    }
    Ok(rooms)
}

pub fn quote(booking: &Booking, rooms: &[&BookingRoom], new_checkout: NaiveDate) -> Result<ExtensionQuote, ValidationError> {
    if rooms.is_empty() {
        return Err(ValidationError::NoRoomsSelected);
    }

    let nights = additional_nights(booking.check_out, new_checkout)?;

    let charges = rooms
        .iter()
        .map(|room| {
            let amount = room
                .room_type
                .nightly_price
                .checked_mul(nights)
                .ok_or(ValidationError::AmountOverflow)?;
            Ok(RoomCharge {
                room_number: room.room_number.clone(),
                room_type: room.room_type.name.clone(),
                nightly_price: room.room_type.nightly_price,
                amount,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let total = charges
        .iter()
        .try_fold(0i64, |acc, c| acc.checked_add(c.amount.minor()))
        .map(Money::from_minor)
        .ok_or(ValidationError::AmountOverflow)?;

    Ok(ExtensionQuote {
        booking_id: booking.id,
        current_checkout: booking.check_out.date(),
        new_checkout,
        additional_nights: nights,
        rooms: charges,
        total_additional_amount: total,
    })
}

impl ExtensionQuote {
    /// Applies a payment of `0..=total` against this quote.
    pub fn settle(&self, booking: &Booking, payment: Money) -> Result<Settlement, ValidationError> {
        if payment.is_negative() || payment > self.total_additional_amount {
            return Err(ValidationError::PaymentOutOfRange {
                payment,
                total: self.total_additional_amount,
            });
        }

        Ok(Settlement {
            payment_amount: payment,
            unpaid_amount: self.total_additional_amount.saturating_sub(payment),
            new_total_amount: booking.total_amount.saturating_add(self.total_additional_amount),
            new_downpayment: booking.downpayment.saturating_add(payment),
        })
    }

    /// New checkout timestamp, always at noon.
    pub fn new_checkout_at(&self) -> NaiveDateTime {
        self.new_checkout
            .and_hms_opt(CHECKOUT_HOUR, 0, 0)
            .unwrap_or_else(|| self.new_checkout.and_time(chrono::NaiveTime::MIN))
    }

    pub fn room_numbers(&self) -> Vec<String> {
        self.rooms.iter().map(|r| r.room_number.clone()).collect()
    }
}

pub fn new_reference() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("EXT-{}", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomType;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn room(id: i64, number: &str, price: i64) -> BookingRoom {
        BookingRoom {
            id,
            booking_id: 1,
            room_number: number.to_string(),
            room_type: RoomType {
                id,
                name: format!("Type {number}"),
                nightly_price: Money::from_major(price),
                capacity: 2,
            },
            adults: 2,
            children: 0,
        }
    }

    fn booking(rooms: Vec<BookingRoom>) -> Booking {
        Booking {
            id: 1,
            reference: "BK-1".to_string(),
            customer_id: 1,
            check_in: ts("2025-03-08 14:00"),
            check_out: ts("2025-03-10 12:00"),
            status_id: 3,
            total_amount: Money::from_major(3000),
            downpayment: Money::from_major(3000),
            rooms,
        }
    }

    #[test]
    fn test_single_room_three_nights() {
        let b = booking(vec![room(1, "101", 1500)]);
        let rooms = select_rooms(&b, &[]).unwrap();
        let q = quote(&b, &rooms, date("2025-03-13")).unwrap();

        assert_eq!(q.additional_nights, 3);
        assert_eq!(q.total_additional_amount, Money::from_major(4500));
        assert_eq!(q.current_checkout, date("2025-03-10"));
        assert_eq!(q.new_checkout, date("2025-03-13"));
        assert_eq!(q.rooms[0].room_type, "Type 101");
    }

    #[test]
    fn test_two_rooms_breakdown() {
        let b = booking(vec![room(1, "101", 1200), room(2, "102", 1800)]);
        let rooms = select_rooms(&b, &["101".to_string(), "102".to_string()]).unwrap();
        let q = quote(&b, &rooms, date("2025-03-12")).unwrap();

        let amounts: Vec<_> = q.rooms.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![Money::from_major(2400), Money::from_major(3600)]);
        assert_eq!(q.total_additional_amount, Money::from_major(6000));
    }

    #[test]
    fn test_same_or_earlier_date_rejected() {
        let b = booking(vec![room(1, "101", 1500)]);
        let rooms = select_rooms(&b, &[]).unwrap();

        for d in ["2025-03-10", "2025-03-09"] {
            let err = quote(&b, &rooms, date(d)).unwrap_err();
            assert!(matches!(err, ValidationError::CheckoutNotAfterCurrent { .. }));
        }
    }

    #[test]
    fn test_time_of_day_ignored_for_ordering() {
        // Late checkout on the 10th still allows extending to the 11th.
        let nights = additional_nights(ts("2025-03-10 23:00"), date("2025-03-11")).unwrap();
        assert_eq!(nights, 1);

        let nights = additional_nights(ts("2025-03-10 00:00"), date("2025-03-12")).unwrap();
        assert_eq!(nights, 2);
    }

    #[test]
    fn test_multi_room_requires_selection() {
        let b = booking(vec![room(1, "101", 1200), room(2, "102", 1800)]);
        assert_eq!(select_rooms(&b, &[]).unwrap_err(), ValidationError::NoRoomsSelected);
        assert_eq!(
            quote(&b, &[], date("2025-03-12")).unwrap_err(),
            ValidationError::NoRoomsSelected
        );
    }

    #[test]
    fn test_selection_rejects_unknown_and_dedupes() {
        let b = booking(vec![room(1, "101", 1200), room(2, "102", 1800)]);
        assert_eq!(
            select_rooms(&b, &["999".to_string()]).unwrap_err(),
            ValidationError::UnknownRoom("999".to_string())
        );

        let picked = select_rooms(&b, &["102".to_string(), "102".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn test_payment_bounds() {
        let b = booking(vec![room(1, "101", 1500)]);
        let rooms = select_rooms(&b, &[]).unwrap();
        let q = quote(&b, &rooms, date("2025-03-13")).unwrap();

        assert!(q.settle(&b, Money::from_minor(-1)).is_err());
        assert!(q.settle(&b, Money::from_major(4500).saturating_add(Money::from_minor(1))).is_err());

        let none = q.settle(&b, Money::ZERO).unwrap();
        assert_eq!(none.unpaid_amount, Money::from_major(4500));

        let part = q.settle(&b, Money::from_major(1000)).unwrap();
        assert_eq!(part.unpaid_amount, Money::from_major(3500));
        assert_eq!(part.new_total_amount, Money::from_major(7500));
        assert_eq!(part.new_downpayment, Money::from_major(4000));

        let full = q.settle(&b, Money::from_major(4500)).unwrap();
        assert_eq!(full.unpaid_amount, Money::ZERO);
    }

    #[test]
    fn test_new_checkout_is_pinned_to_noon() {
        let mut b = booking(vec![room(1, "101", 1500)]);
        b.check_out = ts("2025-03-10 09:15");
        let rooms = select_rooms(&b, &[]).unwrap();
        let q = quote(&b, &rooms, date("2025-03-11")).unwrap();
        assert_eq!(q.new_checkout_at(), ts("2025-03-11 12:00"));
    }

    #[test]
    fn test_status_gate() {
        let catalog = StatusCatalog::standard();
        let mut b = booking(vec![room(1, "101", 1500)]);

        b.status_id = catalog.booking_status_id(BookingStatus::CheckedIn);
        assert!(ensure_extendable_status(&b, &catalog).is_ok());
        b.status_id = catalog.booking_status_id(BookingStatus::Approved);
        assert!(ensure_extendable_status(&b, &catalog).is_ok());
        b.status_id = catalog.booking_status_id(BookingStatus::CheckedOut);
        assert_eq!(
            ensure_extendable_status(&b, &catalog),
            Err(ValidationError::NotExtendable(BookingStatus::CheckedOut))
        );
    }

    #[test]
    fn test_reference_format() {
        let reference = new_reference();
        assert!(reference.starts_with("EXT-"));
        assert_eq!(reference.len(), 12);
        assert_ne!(reference, new_reference());
    }
}
