//! Inbound message validation.
//!
//! A shared transport carries plenty of traffic that has nothing to do
//! with this protocol: other scripts, extensions, unrelated frames.
//! Rejection is therefore the frequent, non-exceptional outcome, so the
//! validator is a pure two-outcome function rather than an error path.
//! Callers receiving [`Verdict::Rejected`] simply return without acting;
//! nothing is logged at a level above debug and no state changes.

use serde_json::Value;

use super::envelope::{Envelope, MESSAGE_TYPE};
use crate::transport::Inbound;

/// How the sender origin of an inbound message is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// The reported sender origin must equal this string exactly.
    /// No wildcarding, no prefix matching.
    Exact(String),
    /// Skip the origin check. Only for transports that guarantee origin
    /// isolation out-of-band (e.g. a dedicated private channel object);
    /// callers must document why they use it.
    Any,
}

impl OriginPolicy {
    fn admits(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::Exact(expected) => origin == expected,
            OriginPolicy::Any => true,
        }
    }
}

/// Outcome of validating one inbound message.
#[derive(Debug)]
pub enum Verdict {
    /// A legitimate protocol message from an admitted origin.
    Accepted(Envelope),
    /// Foreign, malformed, or wrong-origin traffic. Discard silently.
    Rejected,
}

/// Decide whether an inbound message is a legitimate protocol message
/// from the expected peer. Pure; all rules must hold:
///
/// 1. the sender origin satisfies `policy`,
/// 2. the payload is a structured object, not a primitive,
/// 3. the object carries the protocol kind field,
/// 4. the channel tag equals [`MESSAGE_TYPE`] exactly,
/// 5. the kind is one of the fixed enumerated set.
pub fn sanitize(msg: &Inbound, policy: &OriginPolicy) -> Verdict {
    if !policy.admits(&msg.origin) {
        return Verdict::Rejected;
    }
    let obj = match msg.data.as_object() {
        Some(obj) => obj,
        None => return Verdict::Rejected,
    };
    if !obj.contains_key("framelink") {
        return Verdict::Rejected;
    }
    if obj.get("type").and_then(Value::as_str) != Some(MESSAGE_TYPE) {
        return Verdict::Rejected;
    }
    // Unknown or absent kinds fail Envelope deserialization, as do
    // mistyped fields; both fail closed here.
    match serde_json::from_value::<Envelope>(msg.data.clone()) {
        Ok(envelope) => Verdict::Accepted(envelope),
        Err(_) => Verdict::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbound(origin: &str, data: Value) -> Inbound {
        Inbound {
            origin: origin.to_string(),
            data,
        }
    }

    fn exact(origin: &str) -> OriginPolicy {
        OriginPolicy::Exact(origin.to_string())
    }

    fn valid_wire() -> Value {
        json!({ "type": MESSAGE_TYPE, "framelink": "emit", "value": {"name": "x", "data": 1} })
    }

    #[test]
    fn test_accepts_valid_message_from_expected_origin() {
        let msg = inbound("https://child.example.com", valid_wire());
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Accepted(_)
        ));
    }

    #[test]
    fn test_rejects_wrong_origin() {
        let msg = inbound("https://evil.example.com", valid_wire());
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }

    #[test]
    fn test_origin_match_is_exact_not_prefix() {
        let msg = inbound("https://child.example.com.evil.net", valid_wire());
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }

    #[test]
    fn test_skip_check_mode_admits_any_origin() {
        let msg = inbound("https://anything.example.com", valid_wire());
        assert!(matches!(sanitize(&msg, &OriginPolicy::Any), Verdict::Accepted(_)));
    }

    #[test]
    fn test_rejects_primitive_payload() {
        let msg = inbound("https://child.example.com", json!("just a string"));
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }

    #[test]
    fn test_rejects_missing_kind_field() {
        let msg = inbound(
            "https://child.example.com",
            json!({ "type": MESSAGE_TYPE, "value": 1 }),
        );
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }

    #[test]
    fn test_rejects_foreign_channel_tag() {
        let msg = inbound(
            "https://child.example.com",
            json!({ "type": "application/x-other-v2+json", "framelink": "emit" }),
        );
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let msg = inbound(
            "https://child.example.com",
            json!({ "type": MESSAGE_TYPE, "framelink": "subscribe" }),
        );
        assert!(matches!(
            sanitize(&msg, &exact("https://child.example.com")),
            Verdict::Rejected
        ));
    }
}
