// ── Device graph provider seam ──
//
// Everything the core needs from the device subsystem: enumerate clients,
// their ports and each port's subscribers, and issue connects. The ALSA
// binding lives in `amidipersist-seq`; `MemoryGraph` is the in-process
// implementation used by tests.

mod events;
mod memory;

pub use events::TopologyEvent;
pub use memory::MemoryGraph;

use crate::error::ProviderError;
use crate::model::DeviceAddress;

bitflags::bitflags! {
    /// Port capability bits relevant to routing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PortCaps: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const SUBS_READ = 1 << 5;
        const SUBS_WRITE = 1 << 6;

        /// Port others can subscribe from.
        const SOURCE = Self::READ.bits() | Self::SUBS_READ.bits();
        /// Port others can subscribe to.
        const SINK = Self::WRITE.bits() | Self::SUBS_WRITE.bits();
        const DUPLEX = Self::SOURCE.bits() | Self::SINK.bits();
    }
}

/// One client as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub id: u8,
    pub name: String,
}

/// One port of a client as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub id: u8,
    pub name: String,
    pub caps: PortCaps,
}

/// Provider-driven enumeration.
///
/// The iterator ending is the end-of-enumeration sentinel. An `Err` item
/// means the provider failed part-way; consumers stop that level there.
pub type Enumeration<'a, T> = Box<dyn Iterator<Item = Result<T, ProviderError>> + 'a>;

/// Read and connect access to an externally owned device graph.
pub trait DeviceGraph {
    fn clients(&self) -> Enumeration<'_, ClientRecord>;

    fn ports(&self, client: u8) -> Enumeration<'_, PortRecord>;

    /// Current subscribers of a read-capable port.
    fn subscribers(&self, source: DeviceAddress) -> Enumeration<'_, DeviceAddress>;

    fn connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> Result<(), ProviderError>;
}

impl<G: DeviceGraph + ?Sized> DeviceGraph for Box<G> {
    fn clients(&self) -> Enumeration<'_, ClientRecord> {
        (**self).clients()
    }

    fn ports(&self, client: u8) -> Enumeration<'_, PortRecord> {
        (**self).ports(client)
    }

    fn subscribers(&self, source: DeviceAddress) -> Enumeration<'_, DeviceAddress> {
        (**self).subscribers(source)
    }

    fn connect(&mut self, source: DeviceAddress, dest: DeviceAddress) -> Result<(), ProviderError> {
        (**self).connect(source, dest)
    }
}
