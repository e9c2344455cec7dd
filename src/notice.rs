//! Purpose: Define a stable, structured schema for non-fatal stderr notices.
//! Exports: `Notice`, `notice_json`, `precision_notice`.
//! Role: Shared contract helper for CLI diagnostics (non-error events).
//! Invariants: Notices are non-fatal and never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub message: String,
    pub details: Map<String, Value>,
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}

/// Integer operands whose exact sum left the 64-bit integer range come back as a float.
pub fn precision_notice(cmd: &str, time: String, operands: &[Value], sum: &Value) -> Option<Notice> {
    let all_integers = operands.iter().all(|value| value.is_i64() || value.is_u64());
    if !all_integers || !sum.is_f64() {
        return None;
    }
    let mut details = Map::new();
    details.insert("operand_count".to_string(), Value::from(operands.len()));
    details.insert("sum".to_string(), sum.clone());
    Some(Notice {
        kind: "precision".to_string(),
        time,
        cmd: cmd.to_string(),
        message: "integer sum exceeds 64-bit range; result is a float".to_string(),
        details,
    })
}
