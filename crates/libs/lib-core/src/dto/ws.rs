//! # WebSocket Messages
//!
//! Frames pushed to `/ws` subscribers, tagged by `type`:
//!
//! ```text
//! {"type":"ack","message":"Message received"}
//! {"type":"wire_update","wire_id":1,"status":"processing","user_id":1,"timestamp":1700000000.25}
//! ```

use serde::{Deserialize, Serialize};

use crate::model::WireStatus;

pub const ACK_MESSAGE: &str = "Message received";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    Ack {
        message: String,
    },
    WireUpdate {
        wire_id: i64,
        status: WireStatus,
        user_id: i64,
        /// Seconds since the Unix epoch
        timestamp: f64,
    },
}

impl WsEvent {
    pub fn ack() -> Self {
        WsEvent::Ack {
            message: ACK_MESSAGE.to_string(),
        }
    }

    pub fn wire_update(wire_id: i64, status: WireStatus, user_id: i64) -> Self {
        WsEvent::WireUpdate {
            wire_id,
            status,
            user_id,
            timestamp: lib_utils::unix_timestamp_secs(lib_utils::now_utc()),
        }
    }
}
