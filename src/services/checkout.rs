use serde::Serialize;

use crate::errors::ValidationError;
use crate::models::{Booking, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub total_amount: Money,
    pub downpayment: Money,
    pub remaining_balance: Money,
    pub can_check_out: bool,
}

/// Total owed minus downpayment, never below zero.
pub fn remaining_balance(booking: &Booking) -> Money {
    booking.total_amount.non_negative_sub(booking.downpayment)
}

pub fn can_check_out(booking: &Booking) -> bool {
    !remaining_balance(booking).is_positive()
}

pub fn ensure_settled(booking: &Booking) -> Result<(), ValidationError> {
    let remaining = remaining_balance(booking);
    if remaining.is_positive() {
        return Err(ValidationError::OutstandingBalance { remaining });
    }
    Ok(())
}

pub fn summarize(booking: &Booking) -> BalanceSummary {
    BalanceSummary {
        total_amount: booking.total_amount,
        downpayment: booking.downpayment,
        remaining_balance: remaining_balance(booking),
        can_check_out: can_check_out(booking),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn booking(total: i64, down: i64) -> Booking {
        Booking {
            id: 1,
            reference: "BK-1".to_string(),
            customer_id: 1,
            check_in: NaiveDateTime::parse_from_str("2025-03-08 14:00", "%Y-%m-%d %H:%M").unwrap(),
            check_out: NaiveDateTime::parse_from_str("2025-03-10 12:00", "%Y-%m-%d %H:%M").unwrap(),
            status_id: 3,
            total_amount: Money::from_major(total),
            downpayment: Money::from_major(down),
            rooms: vec![],
        }
    }

    #[test]
    fn test_fully_paid_booking_can_check_out() {
        let b = booking(5000, 5000);
        assert_eq!(remaining_balance(&b), Money::ZERO);
        assert!(can_check_out(&b));
        assert!(ensure_settled(&b).is_ok());
    }

    #[test]
    fn test_outstanding_balance_blocks_checkout() {
        let b = booking(5000, 3000);
        assert_eq!(remaining_balance(&b), Money::from_major(2000));
        assert!(!can_check_out(&b));
        assert_eq!(
            ensure_settled(&b),
            Err(ValidationError::OutstandingBalance {
                remaining: Money::from_major(2000)
            })
        );
    }

    #[test]
    fn test_overpayment_clamps_to_zero() {
        let b = booking(3000, 5000);
        let summary = summarize(&b);
        assert_eq!(summary.remaining_balance, Money::ZERO);
        assert!(summary.can_check_out);
    }
}
