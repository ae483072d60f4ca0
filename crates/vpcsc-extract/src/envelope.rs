//! # Audit Log Envelope
//!
//! Parses raw audit-log text and exposes read-only, schema-tolerant access to
//! the fields extraction strategies look at. Only two things are hard
//! failures: text that is not JSON, and a document without a `protoPayload`
//! object. Every other missing or wrongly-typed field reads as absent.

use serde_json::Value;
use vpcsc_core::ExtractError;

/// Which violation list a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationList {
    /// `metadata.ingressViolations`
    Ingress,
    /// `metadata.egressViolations`
    Egress,
    /// `metadata.accessDenialViolations`
    AccessDenial,
}

impl ViolationList {
    fn key(&self) -> &'static str {
        match self {
            Self::Ingress => "ingressViolations",
            Self::Egress => "egressViolations",
            Self::AccessDenial => "accessDenialViolations",
        }
    }
}

/// A validated audit log: the document root plus its payload object.
#[derive(Debug, Clone, Copy)]
pub struct AuditEnvelope<'a> {
    root: &'a Value,
    proto: &'a Value,
}

/// Parse raw text as JSON.
pub fn parse(raw: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(raw).map_err(|e| ExtractError::MalformedInput(format!("not JSON: {e}")))
}

impl<'a> AuditEnvelope<'a> {
    /// Wrap a parsed document, requiring a `protoPayload` object.
    pub fn new(root: &'a Value) -> Result<Self, ExtractError> {
        if !root.is_object() {
            return Err(ExtractError::MalformedInput(
                "top-level value is not an object".to_string(),
            ));
        }
        match root.get("protoPayload") {
            Some(proto) if proto.is_object() => Ok(Self { root, proto }),
            Some(_) => Err(ExtractError::MalformedInput(
                "protoPayload is not an object".to_string(),
            )),
            None => Err(ExtractError::MalformedInput(
                "missing protoPayload envelope".to_string(),
            )),
        }
    }

    /// Non-empty string at a JSON pointer below `protoPayload`.
    pub fn proto_str(&self, pointer: &str) -> Option<&'a str> {
        non_empty_str(self.proto.pointer(pointer))
    }

    /// Non-empty string at a JSON pointer below the document root.
    pub fn root_str(&self, pointer: &str) -> Option<&'a str> {
        non_empty_str(self.root.pointer(pointer))
    }

    /// Non-empty string at a JSON pointer below `protoPayload.metadata`.
    pub fn metadata_str(&self, pointer: &str) -> Option<&'a str> {
        non_empty_str(self.proto.get("metadata").and_then(|m| m.pointer(pointer)))
    }

    /// Entries of one violation list; empty when absent or not an array.
    pub fn violations(&self, list: ViolationList) -> &'a [Value] {
        self.proto
            .get("metadata")
            .and_then(|m| m.get(list.key()))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First entry of one violation list.
    pub fn first_violation(&self, list: ViolationList) -> Option<&'a Value> {
        self.violations(list).first()
    }
}

/// Non-empty string at a JSON pointer below `value`.
pub fn str_at<'v>(value: &'v Value, pointer: &str) -> Option<&'v str> {
    non_empty_str(value.pointer(pointer))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
