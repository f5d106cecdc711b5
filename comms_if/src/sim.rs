//! # Simulator Interface
//!
//! The driving simulator exchanges text frames in the socket.io event format. A frame starting
//! with `42` carries an event, the event itself is a JSON array of the event name followed by its
//! payload:
//!
//! ```text
//! 42["telemetry",{"cte":"0.7598","speed":"0.4380","steering_angle":"0.0000"}]
//! 42["steer",{"steering_angle":-0.076,"throttle":0.3}]
//! ```
//!
//! A frame containing `null` in place of the payload means the simulator is being driven
//! manually, and must be answered with a `manual` event.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix of a socket.io frame carrying an event: `4` is a message, `2` an event.
pub const EVENT_PREFIX: &str = "42";

/// Name of the telemetry event sent by the simulator.
pub const TELEMETRY_EVENT: &str = "telemetry";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry sent by the simulator once per simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Telemetry {
    /// Cross track error, the signed distance between the vehicle and the centre of the lane.
    ///
    /// Units: meters
    #[serde(deserialize_with = "num_or_str")]
    pub cte: f64,

    /// Current speed of the vehicle.
    ///
    /// Units: miles/hour
    #[serde(rename = "speed", deserialize_with = "num_or_str")]
    pub speed_mph: f64,

    /// Current steering angle of the vehicle, normalised to [-1, 1].
    #[serde(deserialize_with = "num_or_str")]
    pub steering_angle: f64,
}

/// Payload of the `steer` event.
#[derive(Debug, Serialize)]
struct SteerPayload {
    steering_angle: f64,
    throttle: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A message received from the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimMsg {
    /// A new telemetry sample
    Telemetry(Telemetry),

    /// The simulator is in manual mode and has no data to send
    Manual,
}

/// A command sent to the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCmd {
    /// Restart the simulation from the start of the track
    Reset,

    /// Actuate the steering and throttle
    Steer {
        /// Steering demand, normalised to [-1, 1]
        steering_angle: f64,

        /// Throttle demand, negative values brake
        throttle: f64,
    },

    /// Acknowledge manual driving
    Manual,
}

/// Errors which can occur while decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("The frame is not a socket.io event: {0:?}")]
    NotEvent(String),

    #[error("The event contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("The event array does not start with an event name")]
    MissingEventName,

    #[error("Unknown event \"{0}\"")]
    UnknownEvent(String),

    #[error("The telemetry payload is invalid: {0}")]
    InvalidTelemetry(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMsg {
    /// Decode a frame received from the simulator.
    pub fn from_frame(frame: &str) -> Result<Self, FrameError> {
        if frame.len() <= EVENT_PREFIX.len() || !frame.starts_with(EVENT_PREFIX) {
            return Err(FrameError::NotEvent(frame.into()));
        }

        // A null payload means manual mode
        if frame.contains("null") {
            return Ok(SimMsg::Manual);
        }

        // Extract the event array, frames without one carry no data either
        let event_str = match (frame.find('['), frame.rfind(']')) {
            (Some(b1), Some(b2)) if b1 < b2 => &frame[b1..=b2],
            _ => return Ok(SimMsg::Manual),
        };

        // Only the name and the payload are used, any further elements are ignored
        let mut elements: Vec<Value> =
            serde_json::from_str(event_str).map_err(FrameError::InvalidJson)?;

        let event = match elements.first() {
            Some(Value::String(name)) => name.clone(),
            _ => return Err(FrameError::MissingEventName),
        };
        let payload = match elements.len() {
            0 | 1 => Value::Null,
            _ => elements.swap_remove(1),
        };

        match event.as_str() {
            TELEMETRY_EVENT => Ok(SimMsg::Telemetry(
                serde_json::from_value(payload).map_err(FrameError::InvalidTelemetry)?,
            )),
            _ => Err(FrameError::UnknownEvent(event)),
        }
    }
}

impl SimCmd {
    /// Encode the command as a frame to send to the simulator.
    pub fn to_frame(&self) -> String {
        let event = match self {
            SimCmd::Reset => json!(["reset", {}]),
            SimCmd::Manual => json!(["manual", {}]),
            SimCmd::Steer {
                steering_angle,
                throttle,
            } => json!([
                "steer",
                SteerPayload {
                    steering_angle: *steering_angle,
                    throttle: *throttle
                }
            ]),
        };

        format!("{}{}", EVENT_PREFIX, event)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The simulator sends its numbers as strings, accept either form.
fn num_or_str<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_telemetry() {
        let frame = r#"42["telemetry",{"cte":"0.7598","speed":"0.4380","steering_angle":"0.0000","throttle":"0.0000","image":"abc"}]"#;

        assert_eq!(
            SimMsg::from_frame(frame).unwrap(),
            SimMsg::Telemetry(Telemetry {
                cte: 0.7598,
                speed_mph: 0.4380,
                steering_angle: 0.0
            })
        );
    }

    #[test]
    fn test_decode_numeric_telemetry() {
        let frame = r#"42["telemetry",{"cte":-1.5,"speed":30,"steering_angle":0.25}]"#;

        assert_eq!(
            SimMsg::from_frame(frame).unwrap(),
            SimMsg::Telemetry(Telemetry {
                cte: -1.5,
                speed_mph: 30.0,
                steering_angle: 0.25
            })
        );
    }

    #[test]
    fn test_decode_extra_elements() {
        let frame = r#"42["telemetry",{"cte":"0.5","speed":"12","steering_angle":"0.1"},"extra",3]"#;

        assert_eq!(
            SimMsg::from_frame(frame).unwrap(),
            SimMsg::Telemetry(Telemetry {
                cte: 0.5,
                speed_mph: 12.0,
                steering_angle: 0.1
            })
        );
    }

    #[test]
    fn test_decode_missing_event_name() {
        assert!(matches!(SimMsg::from_frame("42[]"), Err(FrameError::MissingEventName)));
        assert!(matches!(SimMsg::from_frame("42[5,{}]"), Err(FrameError::MissingEventName)));
        assert!(matches!(
            SimMsg::from_frame(r#"42["telemetry"]"#),
            Err(FrameError::InvalidTelemetry(_))
        ));
    }

    #[test]
    fn test_decode_manual() {
        assert_eq!(SimMsg::from_frame(r#"42["telemetry",null]"#).unwrap(), SimMsg::Manual);
        assert_eq!(SimMsg::from_frame("42{}").unwrap(), SimMsg::Manual);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(SimMsg::from_frame("42"), Err(FrameError::NotEvent(_))));
        assert!(matches!(SimMsg::from_frame("3hello"), Err(FrameError::NotEvent(_))));
        assert!(matches!(
            SimMsg::from_frame(r#"42["reset",{}]"#),
            Err(FrameError::UnknownEvent(ref e)) if e == "reset"
        ));
        assert!(matches!(
            SimMsg::from_frame(r#"42["telemetry",{"cte":"abc","speed":"1","steering_angle":"0"}]"#),
            Err(FrameError::InvalidTelemetry(_))
        ));
        assert!(matches!(
            SimMsg::from_frame(r#"42["telemetry" {]"#),
            Err(FrameError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_encode() {
        assert_eq!(SimCmd::Reset.to_frame(), r#"42["reset",{}]"#);
        assert_eq!(SimCmd::Manual.to_frame(), r#"42["manual",{}]"#);
        assert_eq!(
            SimCmd::Steer {
                steering_angle: -0.5,
                throttle: 0.25
            }
            .to_frame(),
            r#"42["steer",{"steering_angle":-0.5,"throttle":0.25}]"#
        );
    }
}
