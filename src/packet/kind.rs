//! 定义协议的所有包类型。
//! Defines all packet types of the protocol.

use std::fmt;

/// The type of a packet. The first byte on the wire.
/// 包类型，网络传输的第一个字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Positive acknowledgment of a sequence number.
    /// 对某个序列号的肯定确认。
    Ack = 0,
    /// Negative acknowledgment; the sender resends immediately.
    /// 否定确认；发送方立即重发。
    Nak = 1,
    /// Subscription request.
    /// 订阅请求。
    Subscribe = 2,
    /// A fragment of a payload.
    /// 载荷的一个分片。
    Data = 3,
    /// Unsubscribe request.
    /// 取消订阅请求。
    Unsubscribe = 4,
    /// Announces the start of a transmission.
    /// 宣告传输开始。
    TransmissionStart = 5,
    /// Acknowledges a transmission start.
    /// 确认传输开始。
    TransmissionStartAck = 6,
    /// Marks the end of the data packets.
    /// 标记数据包结束。
    End = 7,
    /// Acknowledges the end of a transmission.
    /// 确认传输结束。
    EndAck = 8,
    /// Management packet carrying a 4-byte integer.
    /// 携带4字节整数的管理包。
    Management = 9,
    /// Acknowledges a management packet.
    /// 确认管理包。
    ManagementAck = 10,
    /// Acknowledges a subscription.
    /// 确认订阅。
    SubscribeAck = 11,
}

impl PacketType {
    /// 从一个字节尝试转换成 `PacketType`。
    /// Tries to convert a byte into a `PacketType`.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PacketType::Ack),
            1 => Some(PacketType::Nak),
            2 => Some(PacketType::Subscribe),
            3 => Some(PacketType::Data),
            4 => Some(PacketType::Unsubscribe),
            5 => Some(PacketType::TransmissionStart),
            6 => Some(PacketType::TransmissionStartAck),
            7 => Some(PacketType::End),
            8 => Some(PacketType::EndAck),
            9 => Some(PacketType::Management),
            10 => Some(PacketType::ManagementAck),
            11 => Some(PacketType::SubscribeAck),
            _ => None,
        }
    }

    /// 检查该类型是否为发送窗口所关心的反馈包（ACK或NAK）。
    /// Checks if this type is window feedback (ACK or NAK).
    pub fn is_feedback(&self) -> bool {
        matches!(self, PacketType::Ack | PacketType::Nak)
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketType::Ack => "ACK",
            PacketType::Nak => "NAK",
            PacketType::Subscribe => "SUB",
            PacketType::Data => "DATA",
            PacketType::Unsubscribe => "USUB",
            PacketType::TransmissionStart => "STRT",
            PacketType::TransmissionStartAck => "STRT-ACK",
            PacketType::End => "END",
            PacketType::EndAck => "END-ACK",
            PacketType::Management => "MGMT",
            PacketType::ManagementAck => "MGMT-ACK",
            PacketType::SubscribeAck => "SUB-ACK",
        };
        write!(f, "{}", s)
    }
}
