//! Production backend over a Redis connection.
//!
//! One synchronous round trip per call; pooling and request deadlines are
//! the caller's concern. NOSCRIPT is the only error class the rest of the
//! crate treats specially, so it gets its own variant during translation.

use crate::config::CardexConfig;
use crate::store::{StoreConnection, StoreError, StoreReply};
use parking_lot::Mutex;
use std::time::Duration;

pub struct RedisStore {
    conn: Mutex<redis::Connection>,
}

impl RedisStore {
    pub fn connect(config: &CardexConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.store_url.as_str()).map_err(classify)?;
        let conn = client
            .get_connection_with_timeout(Duration::from_millis(config.connect_timeout_ms))
            .map_err(classify)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl StoreConnection for RedisStore {
    fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        redis::cmd("PING")
            .query::<String>(&mut *conn)
            .map(|_| ())
            .map_err(classify)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.lock();
        redis::cmd("GET").arg(key).query(&mut *conn).map_err(classify)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query(&mut *conn)
            .map_err(classify)
    }

    fn script_load(&self, source: &str) -> Result<String, StoreError> {
        let mut conn = self.conn.lock();
        redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(source)
            .query(&mut *conn)
            .map_err(classify)
    }

    fn evalsha(
        &self,
        handle: &str,
        keys: &[&str],
        args: &[&str],
    ) -> Result<StoreReply, StoreError> {
        let mut conn = self.conn.lock();
        let mut cmd = redis::cmd("EVALSHA");
        cmd.arg(handle).arg(keys.len());
        for key in keys {
            cmd.arg(*key);
        }
        for value in args {
            cmd.arg(*value);
        }
        let value: redis::Value = cmd.query(&mut *conn).map_err(classify)?;
        convert(value)
    }
}

fn classify(err: redis::RedisError) -> StoreError {
    if err.kind() == redis::ErrorKind::NoScriptError {
        StoreError::UnknownScript
    } else if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}

fn convert(value: redis::Value) -> Result<StoreReply, StoreError> {
    match value {
        redis::Value::Nil => Ok(StoreReply::Nil),
        redis::Value::Okay => Ok(StoreReply::Text("OK".to_string())),
        redis::Value::SimpleString(text) => Ok(StoreReply::Text(text)),
        redis::Value::BulkString(bytes) => text_from(bytes).map(StoreReply::Text),
        redis::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                redis::Value::BulkString(bytes) => text_from(bytes),
                redis::Value::SimpleString(text) => Ok(text),
                other => Err(StoreError::Protocol(format!(
                    "unexpected array element: {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(StoreReply::Values),
        other => Err(StoreError::Protocol(format!("unsupported reply: {other:?}"))),
    }
}

fn text_from(bytes: Vec<u8>) -> Result<String, StoreError> {
    String::from_utf8(bytes)
        .map_err(|_| StoreError::Protocol("reply is not valid UTF-8".to_string()))
}
