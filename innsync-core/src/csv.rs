//! CSV export.
//!
//! The format is contractual, consumed by spreadsheet imports:
//! UTF-8 with a leading BOM (so Excel detects the encoding), CRLF line
//! endings, every field double-quoted with internal quotes doubled,
//! dates as `YYYY-MM-DD`, and `nights` as a non-negative integer.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::booking::{day_format, Booking};
use crate::room::room_name;

const HEADERS: [&str; 7] = ["roomId", "roomName", "guest", "note", "start", "end", "nights"];

/// Render bookings to the CSV export format.
pub fn export_csv(bookings: &[Booking]) -> String {
    let mut lines = Vec::with_capacity(bookings.len() + 1);
    lines.push(HEADERS.map(esc).join(","));
    for b in bookings {
        let fields = [
            esc(&b.room_id),
            esc(room_name(&b.room_id)),
            esc(&b.guest),
            esc(&b.note),
            esc(&day_format(b.start)),
            esc(&day_format(b.end)),
            esc(&b.nights().to_string()),
        ];
        lines.push(fields.join(","));
    }
    format!("\u{feff}{}", lines.join("\r\n"))
}

/// Render only the bookings visible in the month containing
/// `month_start` (any booking whose range touches the month).
pub fn export_month_csv(bookings: &[Booking], month_start: NaiveDate) -> String {
    let first = first_of_month(month_start);
    let visible: Vec<Booking> = bookings
        .iter()
        .filter(|b| in_month(b, first))
        .cloned()
        .collect();
    export_csv(&visible)
}

/// True iff the booking's range touches the month beginning at `first`
/// (a first-of-month date).
pub fn in_month(booking: &Booking, first: NaiveDate) -> bool {
    booking.start < next_month(first) && booking.end > first
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// First day of the following month.
pub fn next_month(first: NaiveDate) -> NaiveDate {
    let (y, m) = (first.year(), first.month());
    if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1).unwrap_or(first)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1).unwrap_or(first)
    }
}

/// Download filename for a full export, e.g.
/// `bookings_2024-06-14_18-30.csv`.
pub fn export_filename(now: NaiveDateTime) -> String {
    format!("bookings_{}.csv", now.format("%Y-%m-%d_%H-%M"))
}

/// Download filename for a month export, e.g.
/// `bookings_2024_06_18-30.csv`.
pub fn month_export_filename(month_start: NaiveDate, now: NaiveDateTime) -> String {
    format!(
        "bookings_{}_{}.csv",
        month_start.format("%Y_%m"),
        now.format("%H-%M")
    )
}

/// Quote a field, doubling internal quotes.
fn esc(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_booking(id: &str, room_id: &str, guest: &str, note: &str) -> Booking {
        Booking {
            id: id.to_string(),
            room_id: room_id.to_string(),
            guest: guest.to_string(),
            note: note.to_string(),
            start: day(2024, 6, 1),
            end: day(2024, 6, 3),
        }
    }

    /// Minimal parser for the exact dialect we emit, used to check the
    /// export round-trips.
    fn parse_csv(csv: &str) -> Vec<Vec<String>> {
        let body = csv.strip_prefix('\u{feff}').expect("missing BOM");
        body.split("\r\n")
            .map(|line| {
                assert!(line.starts_with('"') && line.ends_with('"'));
                line[1..line.len() - 1]
                    .split("\",\"")
                    .map(|f| f.replace("\"\"", "\""))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_header_and_shape() {
        let csv = export_csv(&[make_booking("a", "r1", "Alice", "")]);
        let rows = parse_csv(&csv);
        assert_eq!(
            rows[0],
            ["roomId", "roomName", "guest", "note", "start", "end", "nights"]
        );
        assert_eq!(
            rows[1],
            ["r1", "Double Room", "Alice", "", "2024-06-01", "2024-06-03", "2"]
        );
        // No trailing newline after the last row
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_round_trip_recovers_fields() {
        let bookings = vec![
            make_booking("a", "r1", "Alice", "arriving 9pm"),
            make_booking("b", "r7", "Bob", ""),
        ];
        let rows = parse_csv(&export_csv(&bookings));
        assert_eq!(rows.len(), 3);
        for (row, b) in rows[1..].iter().zip(&bookings) {
            assert_eq!(row[0], b.room_id);
            assert_eq!(row[2], b.guest);
            assert_eq!(row[3], b.note);
            assert_eq!(row[4], day_format(b.start));
            assert_eq!(row[5], day_format(b.end));
        }
    }

    #[test]
    fn test_quotes_and_separators_escaped() {
        let booking = make_booking("a", "r2", "O\"Brien, Pat", "said \"hi\"\nback soon");
        let csv = export_csv(&[booking.clone()]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][2], booking.guest);
        assert_eq!(rows[1][3].replace('\n', "\\n"), "said \"hi\"\\nback soon");
    }

    #[test]
    fn test_unknown_room_name_empty() {
        let csv = export_csv(&[make_booking("a", "r99", "Alice", "")]);
        let rows = parse_csv(&csv);
        assert_eq!(rows[1][1], "");
    }

    #[test]
    fn test_month_export_filters_touching_bookings() {
        let mut may = make_booking("may", "r1", "May", "");
        may.start = day(2024, 5, 10);
        may.end = day(2024, 5, 12);
        let mut spanning = make_booking("span", "r2", "Span", "");
        spanning.start = day(2024, 5, 30);
        spanning.end = day(2024, 6, 2);
        let june = make_booking("june", "r3", "June", "");

        let csv = export_month_csv(&[may, spanning, june], day(2024, 6, 15));
        let rows = parse_csv(&csv);
        let guests: Vec<&str> = rows[1..].iter().map(|r| r[2].as_str()).collect();
        assert_eq!(guests, ["Span", "June"]);
    }

    #[test]
    fn test_month_boundaries_are_half_open() {
        // Checkout on the 1st does not belong to the new month
        let mut checkout_first = make_booking("a", "r1", "A", "");
        checkout_first.start = day(2024, 5, 28);
        checkout_first.end = day(2024, 6, 1);

        let csv = export_month_csv(&[checkout_first], day(2024, 6, 1));
        assert_eq!(parse_csv(&csv).len(), 1); // header only
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(first_of_month(day(2024, 6, 15)), day(2024, 6, 1));
        assert_eq!(next_month(day(2024, 6, 1)), day(2024, 7, 1));
        assert_eq!(next_month(day(2024, 12, 1)), day(2025, 1, 1));
    }

    #[test]
    fn test_filenames() {
        let now = day(2024, 6, 14).and_hms_opt(18, 30, 0).unwrap();
        assert_eq!(export_filename(now), "bookings_2024-06-14_18-30.csv");
        assert_eq!(
            month_export_filename(day(2024, 6, 1), now),
            "bookings_2024_06_18-30.csv"
        );
    }
}
