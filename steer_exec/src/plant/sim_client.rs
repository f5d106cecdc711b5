//! # Simulator Client
//!
//! The simulator client drives the vehicle in the driving simulator. The simulator itself speaks
//! socket.io over a websocket, which is relayed onto a ZMQ REP socket by the simulator bridge.
//! Each command sent to the bridge is answered with the next frame from the simulator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    sim::{FrameError, SimCmd, SimMsg},
};
use log::{debug, info};

use super::Plant;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The simulator client
pub struct SimClient {
    /// Request-response socket connected to the simulator bridge
    reqrep: MonitoredSocket,
}

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the simulator bridge")]
    NotConnected,

    #[error("Could not send the command to the simulator bridge: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a frame from the simulator bridge: {0}")]
    RecvError(zmq::Error),

    #[error("The simulator bridge did not respond in time")]
    Timeout,

    #[error("The simulator bridge responded with a frame which was not valid UTF-8")]
    NonUtf8Response,

    #[error("Could not decode the simulator frame: {0}")]
    FrameError(FrameError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, SimClientError> {
        // The simulator renders between frames so allow a generous recieve timeout
        let reqrep_opts = SocketOptions {
            block_on_first_connect: true,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 5000,
            send_timeout: 100,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let reqrep = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            reqrep_opts,
            &params.sim_bridge_endpoint,
        )
        .map_err(SimClientError::SocketError)?;

        info!("Connected to simulator bridge at {}", params.sim_bridge_endpoint);

        Ok(Self { reqrep })
    }
}

impl Plant for SimClient {
    type Error = SimClientError;

    fn exchange(&mut self, cmd: &SimCmd) -> Result<SimMsg, Self::Error> {
        if !self.reqrep.connected() {
            return Err(SimClientError::NotConnected);
        }

        let frame = cmd.to_frame();
        debug!("Sending frame: {}", frame);

        self.reqrep
            .send(&frame, 0)
            .map_err(SimClientError::SendError)?;

        let response = match self.reqrep.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(SimClientError::NonUtf8Response),
            Err(zmq::Error::EAGAIN) => return Err(SimClientError::Timeout),
            Err(e) => return Err(SimClientError::RecvError(e)),
        };

        SimMsg::from_frame(&response).map_err(SimClientError::FrameError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Serve the given frames over a REP socket, returning the frames recieved.
    fn bridge(ctx: zmq::Context, endpoint: &str, replies: Vec<&'static str>) -> thread::JoinHandle<Vec<String>> {
        let rep = ctx.socket(zmq::REP).unwrap();
        rep.bind(endpoint).unwrap();

        thread::spawn(move || {
            let mut recieved = Vec::new();
            for reply in replies {
                recieved.push(rep.recv_string(0).unwrap().unwrap());
                rep.send(reply, 0).unwrap();
            }
            recieved
        })
    }

    #[test]
    fn test_exchange() {
        let ctx = zmq::Context::new();
        let endpoint = "tcp://127.0.0.1:45861";
        let jh = bridge(
            ctx.clone(),
            endpoint,
            vec![
                r#"42["telemetry",{"cte":"0.7598","speed":"0.4380","steering_angle":"0.0000"}]"#,
                r#"42["manual",null]"#,
            ],
        );

        let mut client = SimClient::new(
            &ctx,
            &NetParams {
                sim_bridge_endpoint: endpoint.into(),
            },
        )
        .unwrap();

        match client.exchange(&SimCmd::Reset).unwrap() {
            SimMsg::Telemetry(t) => assert_eq!(t.cte, 0.7598),
            m => panic!("Expected telemetry, got {:?}", m),
        }
        assert_eq!(
            client
                .exchange(&SimCmd::Steer {
                    steering_angle: -0.5,
                    throttle: 0.3
                })
                .unwrap(),
            SimMsg::Manual
        );

        let recieved = jh.join().unwrap();
        assert_eq!(recieved[0], SimCmd::Reset.to_frame());
        assert!(recieved[1].starts_with(r#"42["steer""#));
    }
}
