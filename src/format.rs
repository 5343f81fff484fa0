// src/format.rs
use chrono_tz::Tz;
use rust_decimal::Decimal;

use crate::models::{Direction, NewTransaction};

/// Group the integer part with `,` every three digits: `1234567.5` → `1,234,567.5`
pub fn group_thousands(value: Decimal) -> String {
    let raw = value.normalize().to_string();
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

fn direction_label(direction: &Direction) -> &str {
    match direction {
        Direction::Credit => "Nhận",
        Direction::Debit => "Chuyển",
        Direction::Other(raw) => raw,
    }
}

/// Channel message for one transaction, times shown in `tz`
pub fn transaction_message(item: &NewTransaction, tz: Tz) -> String {
    let tx = &item.transaction;
    let local = item.occurred_at.with_timezone(&tz);
    format!(
        "Thời gian: {}\nLoại: {}\nSố tiền: {}\nPhí: {}\nNội dung: {}\nNgười thụ hưởng: {}",
        local.format("%Y-%m-%d %H:%M:%S"),
        direction_label(&tx.direction),
        group_thousands(tx.transaction_amount),
        group_thousands(tx.fee_amount),
        tx.narrative,
        tx.user_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::tests::{local, tx, ZONE};
    use std::str::FromStr;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(Decimal::from(0)), "0");
        assert_eq!(group_thousands(Decimal::from(999)), "999");
        assert_eq!(group_thousands(Decimal::from(100_000)), "100,000");
        assert_eq!(group_thousands(Decimal::from(1_234_567)), "1,234,567");
        assert_eq!(group_thousands(Decimal::from(-50_000)), "-50,000");
        assert_eq!(group_thousands(Decimal::from_str("12345.50").unwrap()), "12,345.5");
    }

    #[test]
    fn message_uses_fixed_zone_and_labels() {
        let item = NewTransaction {
            transaction: tx("t1", "2024-01-28T21:11:00", Direction::Credit, 100_000),
            occurred_at: local("2024-01-28T21:11:00"),
        };

        let text = transaction_message(&item, ZONE);

        assert!(text.starts_with("Thời gian: 2024-01-28 21:11:00\n"));
        assert!(text.contains("Loại: Nhận"));
        assert!(text.contains("Số tiền: 100,000"));
        assert!(text.contains("Phí: 0"));
        assert!(text.contains("Nội dung: narrative t1"));
        assert!(text.ends_with("Người thụ hưởng: user t1"));
    }
}
