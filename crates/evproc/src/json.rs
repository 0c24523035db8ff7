//! Ready-made predicates over JSON events.
//!
//! The engine never interprets event contents, so gating on a JSON payload
//! means writing closures like `|event: &Value| event["type"] == "..."` by
//! hand. This module packages the common shapes as constructors that close
//! over their arguments and plug straight into
//! [`when`](evproc_core::EntryBuilder::when).
//!
//! # Example
//!
//! ```rust,ignore
//! use evproc::json::{field_eq, pointer_eq};
//!
//! let entry = Entry::named("start")
//!     .when((
//!         field_eq("type", "message_created"),
//!         pointer_eq("/message/text", "/start"),
//!     ))
//!     .handler(greet);
//! ```

use serde_json::Value;

/// Matches events carrying `key` at the top level, with any value.
pub fn has_key(key: impl Into<String>) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    let key = key.into();
    move |event: &Value| event.get(&key).is_some()
}

/// Matches events whose top-level `key` equals `value`.
pub fn field_eq(
    key: impl Into<String>,
    value: impl Into<Value>,
) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    let key = key.into();
    let value = value.into();
    move |event: &Value| event.get(&key) == Some(&value)
}

/// Matches events whose value at the JSON pointer `pointer` equals `value`.
///
/// Pointers follow RFC 6901, e.g. `/message/text`.
pub fn pointer_eq(
    pointer: impl Into<String>,
    value: impl Into<Value>,
) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    let pointer = pointer.into();
    let value = value.into();
    move |event: &Value| event.pointer(&pointer) == Some(&value)
}

/// Matches events for which `check` holds on the value under `key`.
///
/// Missing keys never match.
pub fn field<F>(
    key: impl Into<String>,
    check: F,
) -> impl Fn(&Value) -> bool + Send + Sync + 'static
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let key = key.into();
    move |event: &Value| event.get(&key).is_some_and(&check)
}
