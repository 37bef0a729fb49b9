//! # Side-channel command dispatcher
//!
//! Relay and camera commands are sent to their servers on the vehicle by a small pool of worker
//! threads, so the control loop never waits on the network. Each command is a "set absolute
//! state" command, so a command lost to a full queue or a network failure is only logged, the
//! next one corrects the state.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        mpsc::{self, Receiver, SyncSender, TrySendError},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    eqpt::{
        cam::{self, CamStateMap},
        relay::RelayCmd,
    },
    net::{self, NetParams},
};
use log::{debug, error, trace, warn};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Anything which can deliver side-channel commands.
///
/// `dispatch` must return immediately, the outcome of the command is never reported back.
pub trait CommandDispatcher: Send {
    fn dispatch(&self, cmd: SideChannelCmd);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherParams {
    /// Number of worker threads
    pub num_workers: usize,

    /// Number of commands which may wait for a worker before new ones are dropped
    pub queue_len: usize,
}

/// Dispatcher backed by a pool of worker threads sending over one-shot TCP connections.
pub struct AsyncCommandDispatcher {
    sender: Option<SyncSender<SideChannelCmd>>,
    workers: Vec<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SideChannelCmd {
    /// Set a single relay
    Relay(RelayCmd),

    /// Set every camera, always the full map
    Cameras(CamStateMap),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DispatcherParams {
    fn default() -> Self {
        Self {
            num_workers: 2,
            queue_len: 16,
        }
    }
}

impl AsyncCommandDispatcher {
    /// Start the worker pool.
    pub fn new(params: &DispatcherParams, net_params: &NetParams) -> Self {
        let (sender, receiver) = mpsc::sync_channel(params.queue_len.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let net_params = Arc::new(net_params.clone());

        let workers = (0..params.num_workers.max(1))
            .map(|id| {
                let receiver = receiver.clone();
                let net_params = net_params.clone();
                thread::spawn(move || worker_thread(id, receiver, net_params))
            })
            .collect();

        Self {
            sender: Some(sender),
            workers,
        }
    }
}

impl CommandDispatcher for AsyncCommandDispatcher {
    fn dispatch(&self, cmd: SideChannelCmd) {
        let sender = match self.sender {
            Some(ref s) => s,
            None => return,
        };

        match sender.try_send(cmd) {
            Ok(()) => (),
            Err(TrySendError::Full(cmd)) => {
                warn!("Side-channel queue is full, {:?} dropped", cmd)
            }
            Err(TrySendError::Disconnected(cmd)) => {
                error!("Side-channel workers have stopped, {:?} dropped", cmd)
            }
        }
    }
}

impl Drop for AsyncCommandDispatcher {
    /// Let the workers drain the queue, then wait for them to exit.
    fn drop(&mut self) {
        self.sender.take();

        for worker in self.workers.drain(..) {
            worker.join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn worker_thread(
    id: usize,
    receiver: Arc<Mutex<Receiver<SideChannelCmd>>>,
    net_params: Arc<NetParams>,
) {
    loop {
        // Only hold the lock while waiting, not while sending
        let cmd = match receiver.lock() {
            Ok(r) => r.recv(),
            Err(_) => break,
        };

        match cmd {
            Ok(cmd) => send(id, cmd, &net_params),
            Err(_) => break,
        }
    }

    debug!("Side-channel worker {} stopped", id);
}

fn send(id: usize, cmd: SideChannelCmd, net_params: &NetParams) {
    let (endpoint, payload) = match cmd {
        SideChannelCmd::Relay(ref relay) => {
            (&net_params.relay_endpoint, relay.to_bytes().to_vec())
        }
        SideChannelCmd::Cameras(ref states) => match cam::to_line(states) {
            Ok(line) => (&net_params.camera_endpoint, line.into_bytes()),
            Err(e) => {
                error!("Could not serialise camera states, {:?} dropped: {}", cmd, e);
                return;
            }
        },
    };

    match net::send_oneshot(endpoint, &payload, net_params.io_timeout()) {
        Ok(()) => trace!("Worker {} sent {:?} to {}", id, cmd, endpoint),
        Err(e) => error!("{:?} dropped: {}", cmd, e),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
