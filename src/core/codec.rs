//! Tokio codec adapter.
//!
//! Wraps [`StreamDecoder`] and [`PacketFrame`] in the `tokio_util` codec
//! traits so an application can put any `AsyncRead + AsyncWrite` transport
//! (a serial port, a pipe, a socket) behind `Framed`. Rejections surface as
//! stream items, never as stream errors.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::debug;

use crate::core::decoder::{DecodeEvent, StreamDecoder};
use crate::core::packet::{Packet, PacketFrame};
use crate::error::ProtocolError;

/// Framing codec for host/peripheral packets.
#[derive(Debug)]
pub struct PacketCodec {
    decoder: StreamDecoder,
}

impl PacketCodec {
    pub fn new(frame: PacketFrame) -> Self {
        Self {
            decoder: StreamDecoder::new(frame),
        }
    }

    pub fn decoder(&self) -> &StreamDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut StreamDecoder {
        &mut self.decoder
    }
}

impl Decoder for PacketCodec {
    type Item = DecodeEvent;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            self.decoder.absorb(src.split());
        }
        Ok(self.decoder.next_event())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        if self.decoder.buffered_len() > 0 {
            debug!(
                dropped = self.decoder.buffered_len(),
                state = self.decoder.state().name(),
                "Stream ended inside a frame"
            );
            self.decoder.reset();
        }
        Ok(None)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.decoder.frame().encode_into(&item, dst)
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.decoder.frame().encode_into(item, dst)
    }
}

/// Put a transport behind the packet codec.
pub fn framed<T>(io: T, frame: PacketFrame) -> Framed<T, PacketCodec>
where
    T: AsyncRead + AsyncWrite,
{
    Framed::new(io, PacketCodec::new(frame))
}
