// ── ALSA sequencer as a device graph ──
//
// Clients, ports and subscriptions are read straight from the kernel on
// every enumeration. ALSA ids are `i32`; anything outside `u8` is reported
// as an enumeration error item rather than truncated.

use std::ffi::CString;

use alsa::seq::{
    Addr, ClientIter, PortIter, PortSubscribe, PortSubscribeIter, QuerySubsType, Seq,
};
use tracing::debug;

use amidipersist_core::{
    ClientRecord, DeviceAddress, DeviceGraph, Enumeration, PortCaps, PortRecord, ProviderError,
};

use crate::SeqError;

/// Sequencer client used for enumeration and connects.
pub struct AlsaSequencer {
    seq: Seq,
}

impl AlsaSequencer {
    /// Open the `default` sequencer in duplex mode and name the client.
    pub fn open(client_name: &str) -> Result<Self, SeqError> {
        let seq = Seq::open(None, None, false).map_err(SeqError::alsa("open sequencer"))?;
        seq.set_client_name(&c_name(client_name)?)
            .map_err(SeqError::alsa("set client name"))?;
        let client_id = seq.client_id().map_err(SeqError::alsa("query client id"))?;

        debug!(client_id, client_name, "sequencer opened");
        Ok(Self { seq })
    }
}

pub(crate) fn c_name(name: &str) -> Result<CString, SeqError> {
    CString::new(name).map_err(|_| SeqError::InvalidName {
        name: name.to_owned(),
    })
}

pub(crate) fn alsa_addr(addr: DeviceAddress) -> Addr {
    Addr {
        client: i32::from(addr.client),
        port: i32::from(addr.port),
    }
}

fn device_addr(client: i32, port: i32) -> Result<DeviceAddress, ProviderError> {
    match (u8::try_from(client), u8::try_from(port)) {
        (Ok(c), Ok(p)) => Ok(DeviceAddress::new(c, p)),
        _ => Err(ProviderError::AddressOutOfRange { client, port }),
    }
}

fn name_error(what: &'static str) -> impl Fn(alsa::Error) -> ProviderError {
    move |e| ProviderError::enumeration(what, e.to_string())
}

impl DeviceGraph for AlsaSequencer {
    fn clients(&self) -> Enumeration<'_, ClientRecord> {
        Box::new(ClientIter::new(&self.seq).map(|info| {
            let id = device_addr(info.get_client(), 0)?.client;
            let name = info.get_name().map_err(name_error("clients"))?;
            Ok(ClientRecord {
                id,
                name: name.to_owned(),
            })
        }))
    }

    fn ports(&self, client: u8) -> Enumeration<'_, PortRecord> {
        Box::new(PortIter::new(&self.seq, i32::from(client)).map(|info| {
            let id = device_addr(info.get_client(), info.get_port())?.port;
            let name = info.get_name().map_err(name_error("ports"))?;
            Ok(PortRecord {
                id,
                name: name.to_owned(),
                // PortCaps mirrors the ALSA capability bit positions.
                caps: PortCaps::from_bits_truncate(info.get_capability().bits()),
            })
        }))
    }

    fn subscribers(&self, source: DeviceAddress) -> Enumeration<'_, DeviceAddress> {
        Box::new(
            PortSubscribeIter::new(&self.seq, alsa_addr(source), QuerySubsType::READ).map(|sub| {
                let dest = sub.get_dest();
                device_addr(dest.client, dest.port)
            }),
        )
    }

    fn connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> Result<(), ProviderError> {
        let sub = PortSubscribe::empty().map_err(|e| ProviderError::rejected(e.to_string()))?;
        sub.set_sender(alsa_addr(source));
        sub.set_dest(alsa_addr(dest));
        self.seq
            .subscribe_port(&sub)
            .map_err(|e| ProviderError::rejected(e.to_string()))
    }
}
