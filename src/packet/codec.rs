//! 包头与载荷的底层编解码函数。
//! Low-level encoding and decoding of the packet header and payload.
//!
//! Every datagram is `[type, sequence, payload...]`. These functions never
//! panic on short or malformed input; they return an error instead.
//!
//! 每个数据报的格式为 `[类型, 序列号, 载荷...]`。这些函数在输入过短或格式错误时
//! 不会panic，而是返回错误。

use super::{HEADER_SIZE, MAX_CHUNK_SIZE, kind::PacketType};
use crate::error::{Error, Result};
use bytes::{Buf, BufMut};

/// Size of the integer carried by management packets.
const INTEGER_SIZE: usize = 4;

/// 将包头和载荷编码到缓冲区。
/// Encodes the header and payload into a buffer.
pub fn encode<B: BufMut>(
    kind: PacketType,
    sequence_number: u8,
    payload: &[u8],
    buf: &mut B,
) -> Result<()> {
    check_payload(kind, payload)?;
    buf.put_u8(kind as u8);
    buf.put_u8(sequence_number);
    buf.put_slice(payload);
    Ok(())
}

/// 将一个整数编码为管理包。序列号字节未使用，写为0。
/// Encodes an integer as a management packet. The sequence byte is unused and
/// written as zero.
pub fn encode_integer<B: BufMut>(kind: PacketType, value: i32, buf: &mut B) {
    buf.put_u8(kind as u8);
    buf.put_u8(0);
    buf.put_i32(value);
}

/// 检查载荷长度是否符合包类型的要求。
/// Checks the payload length against what the packet type allows.
pub(crate) fn check_payload(kind: PacketType, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_CHUNK_SIZE {
        return Err(Error::PayloadTooLarge {
            len: payload.len(),
            max: MAX_CHUNK_SIZE,
        });
    }
    if kind == PacketType::Management && payload.len() != INTEGER_SIZE {
        return Err(Error::InvalidInteger { len: payload.len() });
    }
    Ok(())
}

fn check_header(data: &[u8]) -> Result<()> {
    if data.len() < HEADER_SIZE {
        return Err(Error::Truncated { len: data.len() });
    }
    Ok(())
}

/// 解码包类型。
/// Decodes the packet type.
pub fn decode_type(data: &[u8]) -> Result<PacketType> {
    check_header(data)?;
    PacketType::from_u8(data[0]).ok_or(Error::UnknownPacketType(data[0]))
}

/// 解码序列号。
/// Decodes the sequence number.
pub fn decode_sequence(data: &[u8]) -> Result<u8> {
    check_header(data)?;
    Ok(data[1])
}

/// 返回包头之后的载荷字节。
/// Returns the payload bytes following the header.
pub fn decode_payload(data: &[u8]) -> Result<&[u8]> {
    check_header(data)?;
    Ok(&data[HEADER_SIZE..])
}

/// 将载荷解释为大端序的有符号32位整数。
/// Reinterprets the payload as a big-endian signed 32-bit integer.
pub fn decode_integer(data: &[u8]) -> Result<i32> {
    let mut payload = decode_payload(data)?;
    if payload.len() != INTEGER_SIZE {
        return Err(Error::InvalidInteger { len: payload.len() });
    }
    Ok(payload.get_i32())
}

/// 将载荷按UTF-8解码为字符串。
/// Decodes the payload as UTF-8 text.
pub fn decode_text(data: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(decode_payload(data)?)?)
}
