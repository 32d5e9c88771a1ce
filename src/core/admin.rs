//! Administrative requests serviced by the acquisition loop between ticks.
//!
//! Transports (see `streaming::admin`) forward requests over a
//! crossbeam channel; the loop executes them against the device session
//! and answers on the per-request reply channel.

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRequest {
    /// Re-seed the device filter (idle, filter init, resume)
    ResetFilter,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum AdminResponse {
    Ok,
    /// Request could not be delivered or decoded
    Error(String),
}

/// A request plus the channel its answer goes back on
#[derive(Debug)]
pub struct AdminCommand {
    pub request: AdminRequest,
    pub reply: Option<Sender<AdminResponse>>,
}

impl AdminCommand {
    /// Request whose answer nobody waits for
    pub fn fire_and_forget(request: AdminRequest) -> Self {
        Self {
            request,
            reply: None,
        }
    }

    /// Request plus the receiver its answer arrives on
    pub fn with_reply(request: AdminRequest) -> (Self, Receiver<AdminResponse>) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (
            Self {
                request,
                reply: Some(tx),
            },
            rx,
        )
    }

    pub fn respond(self, response: AdminResponse) {
        if let Some(reply) = self.reply
            && reply.send(response).is_err()
        {
            log::debug!("Admin requester went away before the reply");
        }
    }
}

pub type AdminSender = Sender<AdminCommand>;
pub type AdminReceiver = Receiver<AdminCommand>;

/// Channel between admin transports and the acquisition loop
pub fn admin_channel() -> (AdminSender, AdminReceiver) {
    crossbeam_channel::unbounded()
}
