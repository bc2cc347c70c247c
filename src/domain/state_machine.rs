//! Transition rules applied to a transaction when a provider event arrives.

use bigdecimal::BigDecimal;

use super::event::{EventKind, ProviderEvent};
use super::transaction::{Transaction, TransactionStatus};

/// Computes the next state of `current` for `event`.
///
/// `raw` is always replaced with the event. A terminal status is never left, so
/// replayed or stale events cannot re-apply payment effects.
pub fn apply(event: &ProviderEvent, current: &Transaction) -> Transaction {
    let mut next = current.clone();
    next.raw = Some(event.raw.clone());

    if current.status.is_terminal() {
        return next;
    }

    if let (EventKind::ChargeSuccess, Some(minor)) = (&event.kind, &event.amount_minor) {
        next.status = TransactionStatus::Successful;
        next.amount_paid = Some(to_major_units(minor));
    }

    next
}

/// Provider amounts are reported in minor units (kobo).
pub fn to_major_units(minor: &BigDecimal) -> BigDecimal {
    (minor / BigDecimal::from(100)).with_scale(2)
}
