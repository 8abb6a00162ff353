// ── Topology monitor ──
//
// A second sequencer client subscribed to System:Announce. It runs on its
// own OS thread, blocks on event input and forwards client and port
// notifications into the controller's channel. It never reads or writes
// snapshot state.

use std::thread;

use alsa::seq::{Addr, EventType, PortCap, PortSubscribe, PortType, Seq};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use amidipersist_core::TopologyEvent;

use crate::SeqError;
use crate::sequencer::c_name;

const SYSTEM_ANNOUNCE: Addr = Addr { client: 0, port: 1 };

/// Give up after this many event input failures in a row.
const MAX_CONSECUTIVE_ERRORS: u32 = 8;

/// Open the monitor client, subscribe it to announcements and start the
/// forwarding thread.
pub(crate) fn spawn(
    client_name: &str,
    tx: mpsc::Sender<TopologyEvent>,
) -> Result<thread::JoinHandle<()>, SeqError> {
    let seq = Seq::open(None, None, false).map_err(SeqError::alsa("open monitor sequencer"))?;
    seq.set_client_name(&c_name(&format!("{client_name}-monitor"))?)
        .map_err(SeqError::alsa("set monitor client name"))?;

    let port = seq
        .create_simple_port(
            &c_name(&format!("{client_name} Client Monitor"))?,
            PortCap::WRITE | PortCap::SUBS_WRITE,
            PortType::APPLICATION,
        )
        .map_err(SeqError::alsa("create monitor port"))?;
    let client = seq
        .client_id()
        .map_err(SeqError::alsa("query monitor client id"))?;

    let sub = PortSubscribe::empty().map_err(SeqError::alsa("allocate subscription"))?;
    sub.set_sender(SYSTEM_ANNOUNCE);
    sub.set_dest(Addr { client, port });
    seq.subscribe_port(&sub)
        .map_err(SeqError::alsa("subscribe to System:Announce"))?;

    debug!(client, port, "topology monitor subscribed");
    let handle = thread::Builder::new()
        .name(format!("{client_name}-monitor"))
        .spawn(move || forward_events(&seq, &tx))?;
    Ok(handle)
}

fn forward_events(seq: &Seq, tx: &mpsc::Sender<TopologyEvent>) {
    let mut input = seq.input();
    let mut failures = 0;

    loop {
        let kind = match input.event_input() {
            Ok(event) => {
                failures = 0;
                event.get_type()
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, failures, "topology event input failed");
                if failures >= MAX_CONSECUTIVE_ERRORS {
                    warn!("topology monitor giving up");
                    return;
                }
                continue;
            }
        };

        let Some(event) = topology_event(kind) else {
            trace!(?kind, "announcement ignored");
            continue;
        };
        if tx.blocking_send(event).is_err() {
            debug!("topology receiver dropped, monitor exiting");
            return;
        }
    }
}

fn topology_event(kind: EventType) -> Option<TopologyEvent> {
    let event = match kind {
        EventType::ClientStart => TopologyEvent::ClientStart,
        EventType::ClientExit => TopologyEvent::ClientExit,
        EventType::ClientChange => TopologyEvent::ClientChange,
        EventType::PortStart => TopologyEvent::PortStart,
        EventType::PortExit => TopologyEvent::PortExit,
        EventType::PortChange => TopologyEvent::PortChange,
        EventType::PortSubscribed => TopologyEvent::PortSubscribed,
        EventType::PortUnsubscribed => TopologyEvent::PortUnsubscribed,
        _ => return None,
    };
    Some(event)
}
