//! Messages exchanged between the watch app and the phone bridge
//!
//! A message is a flat, ordered dictionary of integer keys to integer or
//! string values. Key 0 always carries the action; the remaining keys carry
//! parameters (outbound) or menu item titles (inbound). On the wire every
//! message is one line of JSON: an array of `[key, value]` pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

pub const SOCKET_PATH: &str = "/tmp/billmytime.sock";

/// Key holding the action tag / action code.
pub const ACTION_KEY: u32 = 0;
/// Key holding the first parameter of an outbound request.
pub const PARAM_KEY: u32 = 1;
/// Key holding the duration of a submitted entry under [`SubmitLayout::Distinct`].
pub const DURATION_KEY: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// One `key = value` entry. Serializes as a two element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair(pub u32, pub Value);

impl Pair {
    pub fn key(&self) -> u32 {
        self.0
    }

    pub fn value(&self) -> &Value {
        &self.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    pairs: Vec<Pair>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload exactly as received, duplicates and all.
    pub fn from_pairs(pairs: Vec<Pair>) -> Self {
        Self { pairs }
    }

    /// Writes `key`. A key that is already present keeps its position and
    /// takes the new value, the way the transport dictionary behaves.
    pub fn write(&mut self, key: u32, value: impl Into<Value>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|p| p.0 == key) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push(Pair(key, value)),
        }
    }

    pub fn get(&self, key: u32) -> Option<&Value> {
        self.pairs.iter().find(|p| p.0 == key).map(|p| &p.1)
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, Pair(key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match value {
                Value::Int(n) => write!(f, "{}={}", key, n)?,
                Value::Str(s) => write!(f, "{}={:?}", key, s)?,
            }
        }
        Ok(())
    }
}

/// Where the duration of a submitted entry goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitLayout {
    /// Start and duration are both written under key 1, so only the
    /// duration reaches the phone. Matches receivers built against the
    /// original watch app.
    #[default]
    Legacy,
    /// Start under key 1, duration under key 2.
    Distinct,
}

/// Requests the watch app sends to the phone bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundRequest {
    GetClients { page: i64 },
    GetProjects { page: i64 },
    GetTasks { page: i64 },
    PostTask { start_epoch: i64, duration: i64 },
    SelectClient { index: usize },
    SelectTask { index: usize },
    SelectProject { index: usize },
}

impl OutboundRequest {
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundRequest::GetClients { .. } => "getClients",
            OutboundRequest::GetProjects { .. } => "getProjects",
            OutboundRequest::GetTasks { .. } => "getTasks",
            OutboundRequest::PostTask { .. } => "postTask",
            OutboundRequest::SelectClient { .. } => "selClient",
            OutboundRequest::SelectTask { .. } => "selTask",
            OutboundRequest::SelectProject { .. } => "selProj",
        }
    }

    pub fn to_payload(&self, layout: SubmitLayout) -> Payload {
        let mut payload = Payload::new();
        payload.write(ACTION_KEY, self.tag());
        match *self {
            OutboundRequest::GetClients { page }
            | OutboundRequest::GetProjects { page }
            | OutboundRequest::GetTasks { page } => payload.write(PARAM_KEY, page),
            OutboundRequest::PostTask {
                start_epoch,
                duration,
            } => {
                payload.write(PARAM_KEY, start_epoch);
                match layout {
                    SubmitLayout::Legacy => payload.write(PARAM_KEY, duration),
                    SubmitLayout::Distinct => payload.write(DURATION_KEY, duration),
                }
            }
            OutboundRequest::SelectClient { index }
            | OutboundRequest::SelectTask { index }
            | OutboundRequest::SelectProject { index } => {
                payload.write(PARAM_KEY, index as i64)
            }
        }
        payload
    }
}

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused - is billmytime running?")]
    ConnectionRefused,
}

/// Encodes a payload as one newline-terminated JSON line.
pub fn encode_line(payload: &Payload) -> Result<Vec<u8>, ProtoError> {
    let mut line = serde_json::to_vec(payload)?;
    line.push(b'\n');
    Ok(line)
}

pub fn decode_line(line: &str) -> Result<Payload, ProtoError> {
    Ok(serde_json::from_str(line.trim())?)
}

pub async fn write_payload<W>(writer: &mut W, payload: &Payload) -> Result<(), ProtoError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_line(payload)?).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next payload, skipping blank lines. `None` at end of stream.
pub async fn read_payload<R>(reader: &mut R) -> Result<Option<Payload>, ProtoError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            return decode_line(&line).map(Some);
        }
    }
}

pub async fn connect(path: impl AsRef<Path>) -> Result<UnixStream, ProtoError> {
    UnixStream::connect(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => ProtoError::ConnectionRefused,
        _ => ProtoError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_overwrites_existing_key_in_place() {
        let mut payload = Payload::new();
        payload.write(0, "postTask");
        payload.write(1, 100);
        payload.write(1, 42);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get(1), Some(&Value::Int(42)));
        assert_eq!(payload.pairs()[1].key(), 1);
    }

    #[test]
    fn list_requests_carry_page() {
        let payload = OutboundRequest::GetTasks { page: 1 }.to_payload(SubmitLayout::Legacy);
        assert_eq!(payload.to_string(), r#"0="getTasks" 1=1"#);
    }

    #[test]
    fn legacy_submit_loses_start_epoch() {
        let request = OutboundRequest::PostTask {
            start_epoch: 1_700_000_000,
            duration: 5400,
        };
        let payload = request.to_payload(SubmitLayout::Legacy);
        assert_eq!(
            payload.pairs(),
            &[Pair(0, "postTask".into()), Pair(1, Value::Int(5400))]
        );
    }

    #[test]
    fn distinct_submit_keeps_both_values() {
        let request = OutboundRequest::PostTask {
            start_epoch: 1_700_000_000,
            duration: 5400,
        };
        let payload = request.to_payload(SubmitLayout::Distinct);
        assert_eq!(payload.get(PARAM_KEY), Some(&Value::Int(1_700_000_000)));
        assert_eq!(payload.get(DURATION_KEY), Some(&Value::Int(5400)));
    }

    #[test]
    fn selection_tags() {
        let tags: Vec<_> = [
            OutboundRequest::SelectClient { index: 0 },
            OutboundRequest::SelectTask { index: 0 },
            OutboundRequest::SelectProject { index: 0 },
        ]
        .iter()
        .map(OutboundRequest::tag)
        .collect();
        assert_eq!(tags, ["selClient", "selTask", "selProj"]);
    }

    #[test]
    fn decode_rejects_non_array() {
        assert!(matches!(
            decode_line(r#"{"0":"t"}"#),
            Err(ProtoError::Serialization(_))
        ));
    }
}
