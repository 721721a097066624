use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    ApprovalStatus, Booking, BookingRoom, ExtensionCommand, Money, PaymentMethod, RoomExtension,
    RoomType, StatusCommand, StatusScope, VisitorCheckoutCommand, VisitorCommand, VisitorLog,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("invalid timestamp: {s}"))
}

// ── Approval Statuses ──

pub fn list_approval_statuses(conn: &Connection) -> anyhow::Result<Vec<ApprovalStatus>> {
    let mut stmt = conn.prepare("SELECT id, scope, name FROM approval_statuses ORDER BY id ASC")?;

    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let scope: String = row.get(1)?;
        let name: String = row.get(2)?;
        Ok((id, scope, name))
    })?;

    let mut statuses = vec![];
    for row in rows {
        let (id, scope, name) = row?;
        let scope = StatusScope::parse(&scope)
            .with_context(|| format!("unknown status scope {scope:?} for status {id}"))?;
        statuses.push(ApprovalStatus { id, scope, name });
    }
    Ok(statuses)
}

// ── Room Types ──

pub fn create_room_type(
    conn: &Connection,
    name: &str,
    nightly_price: Money,
    capacity: u32,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO room_types (name, nightly_price, capacity) VALUES (?1, ?2, ?3)",
        params![name, nightly_price.minor(), capacity],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Bookings ──

pub struct NewBooking<'a> {
    pub reference: &'a str,
    pub customer_id: i64,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub status_id: i64,
    pub total_amount: Money,
    pub downpayment: Money,
}

pub fn create_booking(conn: &Connection, booking: &NewBooking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (reference, customer_id, check_in, check_out, status_id, total_amount, downpayment)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            booking.reference,
            booking.customer_id,
            fmt_ts(&booking.check_in),
            fmt_ts(&booking.check_out),
            booking.status_id,
            booking.total_amount.minor(),
            booking.downpayment.minor(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn add_booking_room(
    conn: &Connection,
    booking_id: i64,
    room_number: &str,
    room_type_id: i64,
    adults: u32,
    children: u32,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_rooms (booking_id, room_number, room_type_id, adults, children)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![booking_id, room_number, room_type_id, adults, children],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let row = conn
        .query_row(
            "SELECT id, reference, customer_id, check_in, check_out, status_id, total_amount, downpayment
             FROM bookings WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id, reference, customer_id, check_in, check_out, status_id, total, down)) = row else {
        return Ok(None);
    };

    Ok(Some(Booking {
        id,
        reference,
        customer_id,
        check_in: parse_ts(&check_in)?,
        check_out: parse_ts(&check_out)?,
        status_id,
        total_amount: Money::from_minor(total),
        downpayment: Money::from_minor(down),
        rooms: get_booking_rooms(conn, id)?,
    }))
}

const BOOKING_ROOM_COLUMNS: &str = "br.id, br.booking_id, br.room_number, br.adults, br.children,
     rt.id, rt.name, rt.nightly_price, rt.capacity
     FROM booking_rooms br JOIN room_types rt ON rt.id = br.room_type_id";

fn parse_booking_room_row(row: &rusqlite::Row) -> rusqlite::Result<BookingRoom> {
    Ok(BookingRoom {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        room_number: row.get(2)?,
        adults: row.get(3)?,
        children: row.get(4)?,
        room_type: RoomType {
            id: row.get(5)?,
            name: row.get(6)?,
            nightly_price: Money::from_minor(row.get(7)?),
            capacity: row.get(8)?,
        },
    })
}

pub fn get_booking_rooms(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<BookingRoom>> {
    let sql = format!("SELECT {BOOKING_ROOM_COLUMNS} WHERE br.booking_id = ?1 ORDER BY br.id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![booking_id], parse_booking_room_row)?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

pub fn get_booking_room(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingRoom>> {
    let sql = format!("SELECT {BOOKING_ROOM_COLUMNS} WHERE br.id = ?1");
    Ok(conn.query_row(&sql, params![id], parse_booking_room_row).optional()?)
}

/// Applies a status change only if the booking is still in the status it was
/// read with. A move into Checked-Out also requires the balance to be settled
/// at write time. Returns false when either check fails.
pub fn update_booking_status(conn: &Connection, cmd: &StatusCommand) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let at = fmt_ts(&cmd.at);

    let count = tx.execute(
        "UPDATE bookings SET status_id = ?1, updated_at = ?2
         WHERE id = ?3 AND status_id = ?4
           AND (downpayment >= total_amount
                OR NOT EXISTS (SELECT 1 FROM approval_statuses
                               WHERE id = ?1 AND scope = 'booking' AND name = 'Checked-Out'))",
        params![cmd.to_status_id, at, cmd.booking_id, cmd.from_status_id],
    )?;
    if count == 0 {
        return Ok(false);
    }

    tx.execute(
        "INSERT INTO booking_status_history (booking_id, from_status_id, to_status_id, employee_id, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![cmd.booking_id, cmd.from_status_id, cmd.to_status_id, cmd.employee_id, at],
    )?;
    tx.commit()?;
    Ok(true)
}

pub fn get_status_history(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<StatusCommand>> {
    let mut stmt = conn.prepare(
        "SELECT booking_id, from_status_id, to_status_id, employee_id, changed_at
         FROM booking_status_history WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut history = vec![];
    for row in rows {
        let (booking_id, from_status_id, to_status_id, employee_id, changed_at) = row?;
        history.push(StatusCommand {
            booking_id,
            from_status_id,
            to_status_id,
            employee_id,
            at: parse_ts(&changed_at)?,
        });
    }
    Ok(history)
}

// ── Extensions ──

/// Writes the extension and its rooms, then adds its charge and payment to the
/// booking, in one transaction. Checkout only ever moves later.
pub fn insert_extension(conn: &Connection, cmd: &ExtensionCommand) -> anyhow::Result<i64> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO room_extensions (reference, booking_id, additional_nights, additional_amount,
             payment_amount, payment_method, new_checkout, employee_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            cmd.reference,
            cmd.booking_id,
            cmd.additional_nights,
            cmd.additional_amount.minor(),
            cmd.payment_amount.minor(),
            cmd.payment_method.as_str(),
            fmt_ts(&cmd.new_checkout),
            cmd.employee_id,
            fmt_ts(&cmd.recorded_at),
        ],
    )
    .context("failed to record extension")?;
    let extension_id = tx.last_insert_rowid();

    for room in &cmd.room_numbers {
        tx.execute(
            "INSERT INTO room_extension_rooms (extension_id, booking_id, room_number) VALUES (?1, ?2, ?3)",
            params![extension_id, cmd.booking_id, room],
        )
        .with_context(|| format!("room {room} already has an extension on this booking"))?;
    }

    let updated = tx.execute(
        "UPDATE bookings
         SET check_out = MAX(check_out, ?1),
             total_amount = total_amount + ?2,
             downpayment = downpayment + ?3,
             updated_at = ?4
         WHERE id = ?5",
        params![
            fmt_ts(&cmd.new_checkout),
            cmd.additional_amount.minor(),
            cmd.payment_amount.minor(),
            fmt_ts(&cmd.recorded_at),
            cmd.booking_id,
        ],
    )?;
    anyhow::ensure!(updated == 1, "booking {} not found", cmd.booking_id);

    tx.commit()?;
    Ok(extension_id)
}

pub fn get_extensions_for_booking(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<RoomExtension>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, reference, additional_nights, additional_amount, payment_amount,
                payment_method, new_checkout, created_at
         FROM room_extensions WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, i64>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut extensions = vec![];
    for row in rows {
        let (id, booking_id, reference, nights, amount, paid, method, new_checkout, created_at) = row?;
        extensions.push(RoomExtension {
            id,
            booking_id,
            reference,
            room_numbers: get_extension_rooms(conn, id)?,
            additional_nights: nights,
            additional_amount: Money::from_minor(amount),
            payment_amount: Money::from_minor(paid),
            payment_method: PaymentMethod::parse(&method),
            new_checkout: parse_ts(&new_checkout)?,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(extensions)
}

fn get_extension_rooms(conn: &Connection, extension_id: i64) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT room_number FROM room_extension_rooms WHERE extension_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![extension_id], |row| row.get::<_, String>(0))?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

// ── Visitor Logs ──

pub fn insert_visitor_log(conn: &Connection, cmd: &VisitorCommand) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO visitor_logs (booking_room_id, visitor_name, purpose, check_in, status_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            cmd.booking_room_id,
            cmd.visitor_name,
            cmd.purpose,
            fmt_ts(&cmd.check_in),
            cmd.status_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_visitor_row(row: &rusqlite::Row) -> anyhow::Result<VisitorLog> {
    let check_in: String = row.get(4)?;
    let check_out: Option<String> = row.get(5)?;

    Ok(VisitorLog {
        id: row.get(0)?,
        booking_room_id: row.get(1)?,
        visitor_name: row.get(2)?,
        purpose: row.get(3)?,
        check_in: parse_ts(&check_in)?,
        check_out: check_out.as_deref().map(parse_ts).transpose()?,
        status_id: row.get(6)?,
    })
}

pub fn get_visitor_log(conn: &Connection, id: i64) -> anyhow::Result<Option<VisitorLog>> {
    let result = conn.query_row(
        "SELECT id, booking_room_id, visitor_name, purpose, check_in, check_out, status_id
         FROM visitor_logs WHERE id = ?1",
        params![id],
        |row| Ok(parse_visitor_row(row)),
    );

    match result {
        Ok(log) => Ok(Some(log?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_visitor_logs_for_room(conn: &Connection, booking_room_id: i64) -> anyhow::Result<Vec<VisitorLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_room_id, visitor_name, purpose, check_in, check_out, status_id
         FROM visitor_logs WHERE booking_room_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_room_id], |row| Ok(parse_visitor_row(row)))?;

    let mut logs = vec![];
    for row in rows {
        logs.push(row??);
    }
    Ok(logs)
}

pub fn update_visitor_status(conn: &Connection, id: i64, status_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE visitor_logs SET status_id = ?1 WHERE id = ?2",
        params![status_id, id],
    )?;
    Ok(count > 0)
}

/// Only stamps logs that are still open.
pub fn set_visitor_checkout(conn: &Connection, cmd: &VisitorCheckoutCommand) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE visitor_logs SET check_out = ?1, status_id = ?2 WHERE id = ?3 AND check_out IS NULL",
        params![fmt_ts(&cmd.check_out), cmd.status_id, cmd.visitor_log_id],
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{StatusCatalog, VisitorStatus};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn seed(conn: &Connection) -> i64 {
        let deluxe = create_room_type(conn, "Deluxe", Money::from_major(1500), 2).unwrap();
        let booking_id = create_booking(
            conn,
            &NewBooking {
                reference: "BK-100",
                customer_id: 7,
                check_in: ts("2025-03-08 14:00"),
                check_out: ts("2025-03-10 12:00"),
                status_id: 3,
                total_amount: Money::from_major(3000),
                downpayment: Money::from_major(1000),
            },
        )
        .unwrap();
        add_booking_room(conn, booking_id, "101", deluxe, 2, 0).unwrap();
        add_booking_room(conn, booking_id, "102", deluxe, 1, 1).unwrap();
        booking_id
    }

    #[test]
    fn test_catalog_loads_from_seed() {
        let conn = db::init_db(":memory:").unwrap();
        let records = list_approval_statuses(&conn).unwrap();
        let catalog = StatusCatalog::from_records(records).unwrap();
        assert_eq!(catalog.visitor_status_id(VisitorStatus::Left), 13);
    }

    #[test]
    fn test_booking_round_trip_with_rooms() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);

        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.reference, "BK-100");
        assert_eq!(booking.rooms.len(), 2);
        assert_eq!(booking.rooms[1].room_number, "102");
        assert_eq!(booking.rooms[1].room_type.nightly_price, Money::from_major(1500));
        assert!(booking.is_consistent());

        assert!(get_booking(&conn, 999).unwrap().is_none());
        assert!(get_extensions_for_booking(&conn, 999).unwrap().is_empty());
        assert!(get_visitor_logs_for_room(&conn, 999).unwrap().is_empty());
    }

    #[test]
    fn test_status_update_is_conditional_on_current_status() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);
        conn.execute("UPDATE bookings SET downpayment = total_amount WHERE id = ?1", [id])
            .unwrap();
        let cmd = StatusCommand {
            booking_id: id,
            from_status_id: 3,
            to_status_id: 4,
            employee_id: 5,
            at: ts("2025-03-10 11:00"),
        };

        assert!(update_booking_status(&conn, &cmd).unwrap());
        // Same command again: the booking is no longer in status 3.
        assert!(!update_booking_status(&conn, &cmd).unwrap());

        let history = get_status_history(&conn, id).unwrap();
        assert_eq!(history, vec![cmd]);
    }

    #[test]
    fn test_extension_writes_booking_and_blocks_second_extension() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);
        let cmd = ExtensionCommand {
            booking_id: id,
            reference: "EXT-0001".to_string(),
            room_numbers: vec!["101".to_string()],
            new_checkout: ts("2025-03-12 12:00"),
            additional_nights: 2,
            additional_amount: Money::from_major(3000),
            payment_amount: Money::from_major(1000),
            payment_method: PaymentMethod::Card,
            employee_id: 5,
            recorded_at: ts("2025-03-10 09:00"),
        };
        insert_extension(&conn, &cmd).unwrap();

        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.check_out, ts("2025-03-12 12:00"));
        assert_eq!(booking.total_amount, Money::from_major(6000));
        assert_eq!(booking.downpayment, Money::from_major(2000));

        let extensions = get_extensions_for_booking(&conn, id).unwrap();
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].room_numbers, vec!["101"]);
        assert_eq!(extensions[0].payment_method, PaymentMethod::Card);

        let again = ExtensionCommand {
            reference: "EXT-0002".to_string(),
            ..cmd
        };
        let err = insert_extension(&conn, &again).unwrap_err();
        assert!(err.to_string().contains("room 101 already has an extension"));
        // Rolled back: booking untouched, no second extension row.
        assert_eq!(get_extensions_for_booking(&conn, id).unwrap().len(), 1);
    }

    fn extension(booking_id: i64, reference: &str, room: &str, new_checkout: &str, amount: i64, paid: i64) -> ExtensionCommand {
        ExtensionCommand {
            booking_id,
            reference: reference.to_string(),
            room_numbers: vec![room.to_string()],
            new_checkout: ts(new_checkout),
            additional_nights: 1,
            additional_amount: Money::from_major(amount),
            payment_amount: Money::from_major(paid),
            payment_method: PaymentMethod::Cash,
            employee_id: 5,
            recorded_at: ts("2025-03-10 09:00"),
        }
    }

    #[test]
    fn test_extensions_from_one_snapshot_both_count() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);

        // Both built against the same 3000.00 / 1000.00 booking, landing in
        // the opposite order of their checkout dates.
        insert_extension(&conn, &extension(id, "EXT-000A", "101", "2025-03-14 12:00", 6000, 0)).unwrap();
        insert_extension(&conn, &extension(id, "EXT-000B", "102", "2025-03-12 12:00", 3000, 500)).unwrap();

        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.total_amount, Money::from_major(12000));
        assert_eq!(booking.downpayment, Money::from_major(1500));
        assert_eq!(booking.check_out, ts("2025-03-14 12:00"));
    }

    #[test]
    fn test_checkout_refused_when_balance_reopened_before_write() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);
        conn.execute("UPDATE bookings SET downpayment = total_amount WHERE id = ?1", [id])
            .unwrap();

        // Settled when read; an extension lands before the checkout is written.
        let checkout = StatusCommand {
            booking_id: id,
            from_status_id: 3,
            to_status_id: 4,
            employee_id: 5,
            at: ts("2025-03-10 11:00"),
        };
        insert_extension(&conn, &extension(id, "EXT-000C", "101", "2025-03-11 12:00", 1500, 0)).unwrap();

        assert!(!update_booking_status(&conn, &checkout).unwrap());
        let booking = get_booking(&conn, id).unwrap().unwrap();
        assert_eq!(booking.status_id, 3);
        assert!(get_status_history(&conn, id).unwrap().is_empty());

        // Other edges do not look at the balance.
        let approve = StatusCommand {
            from_status_id: 1,
            to_status_id: 2,
            ..checkout
        };
        conn.execute("UPDATE bookings SET status_id = 1 WHERE id = ?1", [id]).unwrap();
        assert!(update_booking_status(&conn, &approve).unwrap());
    }

    #[test]
    fn test_visitor_checkout_only_once() {
        let conn = db::init_db(":memory:").unwrap();
        let id = seed(&conn);
        let room = get_booking(&conn, id).unwrap().unwrap().rooms[0].id;
        let catalog = StatusCatalog::standard();

        let log_id = insert_visitor_log(
            &conn,
            &VisitorCommand {
                booking_room_id: room,
                visitor_name: "Ana".to_string(),
                purpose: "Lunch".to_string(),
                check_in: ts("2025-03-09 12:00"),
                status_id: catalog.visitor_status_id(VisitorStatus::Pending),
            },
        )
        .unwrap();

        assert!(update_visitor_status(&conn, log_id, catalog.visitor_status_id(VisitorStatus::Approved)).unwrap());

        let checkout = VisitorCheckoutCommand {
            visitor_log_id: log_id,
            check_out: ts("2025-03-09 14:00"),
            status_id: catalog.visitor_status_id(VisitorStatus::CheckedOut),
        };
        assert!(set_visitor_checkout(&conn, &checkout).unwrap());
        assert!(!set_visitor_checkout(&conn, &checkout).unwrap());

        let log = get_visitor_log(&conn, log_id).unwrap().unwrap();
        assert_eq!(log.check_out, Some(ts("2025-03-09 14:00")));
        assert!(!log.is_active(&catalog));
    }
}
