//! Provider notification events.

use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("malformed provider event: {0}")]
pub struct MalformedEvent(pub String);

/// Event kinds the provider is known to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    ChargeSuccess,
    ChargeDisputeCreate,
    ChargeDisputeRemind,
    ChargeDisputeResolve,
    TransferSuccess,
    TransferFailed,
    TransferReversed,
    RefundPending,
    RefundProcessed,
    RefundFailed,
    Unrecognized(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "charge.success" => EventKind::ChargeSuccess,
            "charge.dispute.create" => EventKind::ChargeDisputeCreate,
            "charge.dispute.remind" => EventKind::ChargeDisputeRemind,
            "charge.dispute.resolve" => EventKind::ChargeDisputeResolve,
            "transfer.success" => EventKind::TransferSuccess,
            "transfer.failed" => EventKind::TransferFailed,
            "transfer.reversed" => EventKind::TransferReversed,
            "refund.pending" => EventKind::RefundPending,
            "refund.processed" => EventKind::RefundProcessed,
            "refund.failed" => EventKind::RefundFailed,
            other => EventKind::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ChargeSuccess => "charge.success",
            EventKind::ChargeDisputeCreate => "charge.dispute.create",
            EventKind::ChargeDisputeRemind => "charge.dispute.remind",
            EventKind::ChargeDisputeResolve => "charge.dispute.resolve",
            EventKind::TransferSuccess => "transfer.success",
            EventKind::TransferFailed => "transfer.failed",
            EventKind::TransferReversed => "transfer.reversed",
            EventKind::RefundPending => "refund.pending",
            EventKind::RefundProcessed => "refund.processed",
            EventKind::RefundFailed => "refund.failed",
            EventKind::Unrecognized(name) => name,
        }
    }
}

/// A verified and parsed provider event.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEvent {
    pub kind: EventKind,
    pub reference: String,
    /// Amount in minor units (kobo) as reported by the provider.
    pub amount_minor: Option<BigDecimal>,
    /// Metadata attached at initialization, echoed back by the provider.
    pub metadata: Option<Value>,
    /// The full event as received.
    pub raw: Value,
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    reference: String,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

impl ProviderEvent {
    pub(crate) fn from_slice(body: &[u8]) -> Result<Self, MalformedEvent> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| MalformedEvent(e.to_string()))?;
        let envelope: Envelope =
            serde_json::from_value(raw.clone()).map_err(|e| MalformedEvent(e.to_string()))?;

        let kind = EventKind::parse(&envelope.event);
        let amount_minor = envelope
            .data
            .amount
            .as_ref()
            .map(parse_minor_units)
            .transpose()?;

        if kind == EventKind::ChargeSuccess {
            match &amount_minor {
                None => return Err(MalformedEvent("charge.success without data.amount".into())),
                Some(amount) if amount.is_zero() => {
                    return Err(MalformedEvent("charge.success with zero amount".into()))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            kind,
            reference: envelope.data.reference,
            amount_minor,
            metadata: envelope.data.metadata.and_then(decode_metadata),
            raw,
        })
    }
}

/// Accepts both `5000` and `"5000"`. Minor units are whole and never negative.
fn parse_minor_units(value: &Value) -> Result<BigDecimal, MalformedEvent> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(MalformedEvent(format!("non-numeric amount: {other}"))),
    };
    let amount = BigDecimal::from_str(&text)
        .map_err(|_| MalformedEvent(format!("non-numeric amount: {text}")))?;

    if amount < BigDecimal::zero() {
        return Err(MalformedEvent(format!("negative amount: {text}")));
    }
    if amount.with_scale(0) != amount {
        return Err(MalformedEvent(format!("fractional minor units: {text}")));
    }
    Ok(amount)
}

/// Metadata is sent to the provider as a JSON string and may come back either
/// as that string or already decoded.
fn decode_metadata(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(serde_json::from_str(&s).unwrap_or(Value::String(s))),
        other => Some(other),
    }
}
