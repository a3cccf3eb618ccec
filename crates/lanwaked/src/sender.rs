//! UDP broadcast transport for magic packets.

use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use zerocopy::AsBytes;

use lanwake_core::{MagicPacket, WireError};
use lanwake_services::PacketSender;

/// Sends each packet from a fresh broadcast-enabled socket, so nothing is
/// held open between wakes and a send failure cannot poison later ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpPacketSender;

impl UdpPacketSender {
    fn socket() -> Result<Socket, WireError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_broadcast(true)?;
        socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;
        Ok(socket)
    }
}

impl PacketSender for UdpPacketSender {
    fn send(&self, packet: &MagicPacket, target: SocketAddrV4) -> Result<usize, WireError> {
        let bytes = packet.as_bytes();
        let sent = Self::socket()?.send_to(bytes, &target.into())?;
        if sent != bytes.len() {
            return Err(WireError::ShortSend {
                sent,
                expected: bytes.len(),
            });
        }
        tracing::trace!(%target, bytes = sent, "magic packet sent");
        Ok(sent)
    }
}
