//! Payment totals shown above the admin table.

use crate::records::{PaymentRecord, Record};

/// Sums of `amountPaid`.
///
/// `displayed` follows the current filter. The regional reference totals are
/// always taken over the full, unfiltered snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub displayed: f64,
    pub east: f64,
    pub west: f64,
}

impl Totals {
    pub fn compute<'a>(
        filtered: impl IntoIterator<Item = &'a PaymentRecord>,
        all: &[PaymentRecord],
    ) -> Self {
        Self {
            displayed: sum_paid(filtered),
            east: sum_paid(all.iter().filter(|r| in_region(*r, "east"))),
            west: sum_paid(all.iter().filter(|r| in_region(*r, "west"))),
        }
    }
}

fn sum_paid<'a>(records: impl IntoIterator<Item = &'a PaymentRecord>) -> f64 {
    records.into_iter().map(|r| r.amount_paid.value()).sum()
}

fn in_region(record: &PaymentRecord, needle: &str) -> bool {
    record
        .attendee()
        .region
        .as_deref()
        .is_some_and(|region| region.to_lowercase().contains(needle))
}
