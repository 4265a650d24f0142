//! Uniform reply envelope for callers outside the library.
//!
//! `{ params, result, success, exception? }`, where `exception` is present
//! exactly when the request failed.

use crate::LinekitError;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// An error that can report a trace of where it came from.
///
/// Retrieving the trace may itself fail; the formatter then reports the
/// secondary failure's message in place of the trace.
pub trait TraceSource: fmt::Display {
    fn stack_trace(&self) -> std::result::Result<Vec<String>, Box<dyn StdError>>;
}

/// The error's own message followed by every `source()` in its chain.
impl TraceSource for LinekitError {
    fn stack_trace(&self) -> std::result::Result<Vec<String>, Box<dyn StdError>> {
        let mut frames = vec![self.to_string()];
        let mut source = self.source();
        while let Some(cause) = source {
            frames.push(cause.to_string());
            source = cause.source();
        }
        Ok(frames)
    }
}

/// Serialized untagged: an array of frames, or the retrieval failure message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trace {
    Frames(Vec<String>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub message: String,
    pub trace: Trace,
}

/// # Examples
///
/// ```rust
/// use linekit_core::{format_reply, LinekitError, TraceSource};
///
/// let ok = format_reply("params", 42, None);
/// assert!(ok.success);
///
/// let err = LinekitError::Host("record is locked".to_string());
/// let failed = format_reply("params", 0, Some(&err as &dyn TraceSource));
/// assert!(!failed.success);
/// assert_eq!(failed.exception.unwrap().message, err.to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply<P, R> {
    pub params: P,
    pub result: R,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

/// Wraps a request's params and result; `success` is false exactly when an
/// exception is supplied.
pub fn format_reply<P, R>(
    params: P,
    result: R,
    exception: Option<&dyn TraceSource>,
) -> Reply<P, R> {
    Reply {
        params,
        result,
        success: exception.is_none(),
        exception: exception.map(format_exception),
    }
}

/// Captures the message and, best effort, the trace of `exception`.
pub fn format_exception(exception: &dyn TraceSource) -> ExceptionInfo {
    let trace = match exception.stack_trace() {
        Ok(frames) => Trace::Frames(frames),
        Err(secondary) => Trace::Unavailable(secondary.to_string()),
    };
    ExceptionInfo {
        message: exception.to_string(),
        trace,
    }
}

/// Builds a reply from the outcome of a library call. A failed call carries
/// no result.
pub fn reply_from_result<P, R>(params: P, outcome: crate::Result<R>) -> Reply<P, Option<R>> {
    match outcome {
        Ok(result) => format_reply(params, Some(result), None),
        Err(e) => format_reply(params, None, Some(&e)),
    }
}
