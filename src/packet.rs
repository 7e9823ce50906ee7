//! The packet module, containing the wire format and the `Packet` type.
//! packet 模块，包含线上格式和 `Packet` 类型。
//!
//! ```text
//! offset 0    : 1 byte  - packet type (0-11)
//! offset 1    : 1 byte  - sequence number (0-255)
//! offset 2..N : payload (0..MAX_CHUNK_SIZE bytes), or a big-endian i32 for MANAGEMENT
//! ```

pub mod codec;
pub mod kind;

pub use kind::PacketType;

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;

/// Size of the packet header: one type byte and one sequence byte.
/// 包头大小：一个类型字节和一个序列号字节。
pub const HEADER_SIZE: usize = 2;

/// The largest payload a single packet may carry. Sender and receiver must
/// agree on this value.
///
/// 单个包可携带的最大载荷。发送方和接收方必须就此值达成一致。
pub const MAX_CHUNK_SIZE: usize = 1024;

/// The largest datagram the protocol produces.
/// 协议产生的最大数据报。
pub const MAX_DATAGRAM_SIZE: usize = HEADER_SIZE + MAX_CHUNK_SIZE;

/// A framed unit of transfer.
///
/// `remote_addr` is the destination for outbound packets and the source for
/// decoded inbound packets. It is not part of the wire encoding.
///
/// 一个带帧的传输单元。
///
/// `remote_addr` 对出站包是目标地址，对解码的入站包是来源地址。它不属于线上编码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    kind: PacketType,
    sequence_number: u8,
    payload: Bytes,
    remote_addr: SocketAddr,
}

impl Packet {
    /// Creates a packet with a binary payload.
    ///
    /// Fails if the payload is longer than [`MAX_CHUNK_SIZE`], or if a
    /// MANAGEMENT payload is not exactly one 4-byte integer.
    ///
    /// 创建一个带二进制载荷的包。
    ///
    /// 载荷超过 [`MAX_CHUNK_SIZE`]，或MANAGEMENT载荷不是恰好一个4字节整数时失败。
    pub fn new(
        kind: PacketType,
        sequence_number: u8,
        payload: impl Into<Bytes>,
        remote_addr: SocketAddr,
    ) -> Result<Self> {
        let payload = payload.into();
        codec::check_payload(kind, &payload)?;
        Ok(Self {
            kind,
            sequence_number,
            payload,
            remote_addr,
        })
    }

    /// Creates a packet whose payload is `text` encoded as UTF-8.
    ///
    /// 创建一个载荷为UTF-8编码文本的包。
    pub fn text(
        kind: PacketType,
        sequence_number: u8,
        text: &str,
        remote_addr: SocketAddr,
    ) -> Result<Self> {
        Self::new(
            kind,
            sequence_number,
            Bytes::copy_from_slice(text.as_bytes()),
            remote_addr,
        )
    }

    /// Creates a packet with no payload, e.g. an ACK or NAK.
    ///
    /// 创建一个无载荷的包，例如ACK或NAK。
    pub fn empty(kind: PacketType, sequence_number: u8, remote_addr: SocketAddr) -> Self {
        Self {
            kind,
            sequence_number,
            payload: Bytes::new(),
            remote_addr,
        }
    }

    /// Creates a management packet carrying a single integer.
    ///
    /// 创建一个携带单个整数的管理包。
    pub fn integer(kind: PacketType, value: i32, remote_addr: SocketAddr) -> Self {
        Self {
            kind,
            sequence_number: 0,
            payload: Bytes::copy_from_slice(&value.to_be_bytes()),
            remote_addr,
        }
    }

    pub fn kind(&self) -> PacketType {
        self.kind
    }

    pub fn sequence_number(&self) -> u8 {
        self.sequence_number
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The number of bytes this packet occupies on the wire.
    /// 此包在线上占用的字节数。
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// 将包编码到缓冲区。
    /// Encodes the packet into a buffer.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        codec::encode(self.kind, self.sequence_number, &self.payload, buf)
    }

    /// 将包编码为一个独立的字节块。
    /// Encodes the packet into a standalone byte buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// 从一个数据报解码包。
    /// Decodes a packet from a datagram received from `remote_addr`.
    pub fn decode(datagram: &[u8], remote_addr: SocketAddr) -> Result<Self> {
        let kind = codec::decode_type(datagram)?;
        let sequence_number = codec::decode_sequence(datagram)?;
        let payload = codec::decode_payload(datagram)?;
        Self::new(
            kind,
            sequence_number,
            Bytes::copy_from_slice(payload),
            remote_addr,
        )
    }

    /// Interprets the payload as a big-endian `i32`, as carried by management packets.
    ///
    /// 将载荷解释为大端序 `i32`，即管理包所携带的内容。
    pub fn payload_as_integer(&self) -> Result<i32> {
        let bytes: [u8; 4] = self
            .payload
            .as_ref()
            .try_into()
            .map_err(|_| Error::InvalidInteger {
                len: self.payload.len(),
            })?;
        Ok(i32::from_be_bytes(bytes))
    }

    /// Interprets the payload as UTF-8 text.
    ///
    /// 将载荷解释为UTF-8文本。
    pub fn payload_as_text(&self) -> Result<&str> {
        Ok(std::str::from_utf8(&self.payload)?)
    }
}
