//! # Unix Socket Transport
//!
//! ## Purpose
//!
//! Carries binary API messages between this client and the forwarding plane
//! over its local control socket, and implements `Channel` on top of it.
//!
//! ## How it works
//!
//! Every message travels in a frame made of a 16-byte header (8 reserved
//! bytes, big-endian payload length, 4 reserved bytes) followed by the
//! message itself. On connect the client sends `sockclnt_create` under its
//! fixed id and receives its client index together with the message table,
//! which maps every `name_crc` the endpoint supports to the numeric id used
//! on the wire.
//!
//! Requests carry a fresh context value; the matching reply is the next frame
//! with the expected id and the same context, anything else is skipped. A
//! dump is followed by a `control_ping` sharing the dump's context; the
//! detail records that arrive before the ping reply form the stream, the ping
//! reply ends it.
//!
//! ## Main components
//!
//! - `Connection`: the session; connect, handshake, disconnect on drop.
//! - `SocketChannel`: `Channel` implementation borrowing the connection.
//! - `DetailStream`: lazy iterator over the records of one dump.

use crate::binapi::memclnt::{
    ControlPing, ControlPingReply, SockclntCreate, SockclntCreateReply, SockclntDelete,
};
use crate::channel::{Channel, Dump, Message, MessageRef, ReplyStream, Reply, Request, check_retval};
use crate::error::{ChannelError, Error};
use crate::wire;
use bytes::{BufMut as _, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::{self, Read as _, Write as _};
use std::marker::PhantomData;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the control socket.
pub const DEFAULT_SOCKET: &str = "/run/vpp/api.sock";

/// `sockclnt_create` is sent before the message table is known.
const SOCKCLNT_CREATE_ID: u16 = 15;
const FRAME_HEADER_LEN: usize = 16;
const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Options used when establishing a `Connection`.
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    /// Name the client registers under.
    pub client_name: String,
    /// How long to wait for any single reply frame.
    pub reply_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            client_name: "vpp-client".to_string(),
            reply_timeout: Duration::from_secs(1),
        }
    }
}

/// An open session with the control endpoint.
pub struct Connection {
    stream: UnixStream,
    path: PathBuf,
    client_index: u32,
    msg_ids: HashMap<String, u16>,
    next_context: u32,
    registered: bool,
}

impl Connection {
    /// Connects to the control socket at `path` and negotiates the message
    /// table.
    pub fn connect(path: impl AsRef<Path>, options: &ConnectOptions) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let failed = |source: ChannelError| Error::ConnectionFailed {
            path: path.clone(),
            source,
        };
        let stream = UnixStream::connect(&path).map_err(|e| failed(e.into()))?;
        stream
            .set_read_timeout(Some(options.reply_timeout))
            .map_err(|e| failed(e.into()))?;
        let mut conn = Connection {
            stream,
            path: path.clone(),
            client_index: 0,
            msg_ids: HashMap::new(),
            next_context: 0,
            registered: false,
        };
        conn.handshake(&options.client_name).map_err(failed)?;
        log::info!(
            "connected to {} (client index {}, {} messages)",
            conn.path.display(),
            conn.client_index,
            conn.msg_ids.len()
        );
        Ok(conn)
    }

    /// Opens a channel on this connection. The borrow keeps at most one
    /// channel alive at a time.
    pub fn new_channel(&mut self) -> SocketChannel<'_> {
        log::debug!("channel opened on {}", self.path.display());
        SocketChannel { conn: self }
    }

    pub fn client_index(&self) -> u32 {
        self.client_index
    }

    /// Numeric id of `name_crc` in the negotiated table.
    pub fn msg_id(&self, name_crc: &str) -> Result<u16, ChannelError> {
        self.msg_ids
            .get(name_crc)
            .copied()
            .ok_or_else(|| ChannelError::UnknownMessage(name_crc.to_string()))
    }

    pub fn check_compatibility(&self, messages: &[MessageRef]) -> Result<(), Error> {
        let incompatible: Vec<String> = messages
            .iter()
            .map(MessageRef::name_crc)
            .filter(|name_crc| !self.msg_ids.contains_key(name_crc))
            .collect();
        if incompatible.is_empty() {
            Ok(())
        } else {
            Err(Error::CompatibilityMismatch { incompatible })
        }
    }

    /// Unregisters the client and closes the socket.
    pub fn disconnect(mut self) {
        self.unregister();
    }

    fn unregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        let req = SockclntDelete {
            index: self.client_index,
        };
        match self.request(&req) {
            Ok(_) => log::info!("disconnected from {}", self.path.display()),
            Err(e) => log::warn!("unregistering from {} failed: {e}", self.path.display()),
        }
    }

    fn handshake(&mut self, client_name: &str) -> Result<(), ChannelError> {
        let context = self.context();
        let mut buf = BytesMut::new();
        buf.put_u16(SOCKCLNT_CREATE_ID);
        buf.put_u32(0);
        buf.put_u32(context);
        SockclntCreate {
            name: client_name.to_string(),
        }
        .encode(&mut buf);
        self.write_frame(&buf)?;

        let mut data = self.read_frame()?;
        let (_, reply_context) = reply_header(&mut data)?;
        if reply_context != context {
            log::debug!("handshake reply context {reply_context:#x}, expected {context:#x}");
        }
        let reply = check_retval(SockclntCreateReply::decode(&mut data)?)?;
        self.client_index = reply.index;
        self.msg_ids = reply
            .message_table
            .into_iter()
            .map(|entry| (entry.name, entry.index))
            .collect();
        self.registered = true;
        Ok(())
    }

    fn context(&mut self) -> u32 {
        self.next_context = self.next_context.wrapping_add(1);
        self.next_context
    }

    fn send<M: Message>(
        &mut self,
        context: u32,
        encode: impl FnOnce(&mut BytesMut),
    ) -> Result<(), ChannelError> {
        let id = self.msg_id(&M::name_crc())?;
        let mut buf = BytesMut::new();
        buf.put_u16(id);
        buf.put_u32(self.client_index);
        buf.put_u32(context);
        encode(&mut buf);
        log::trace!("-> {} (id {id}, context {context:#x}, {} bytes)", M::NAME, buf.len());
        self.write_frame(&buf)
    }

    fn request<R: Request>(&mut self, req: &R) -> Result<R::Reply, ChannelError> {
        let reply_id = self.msg_id(&R::Reply::name_crc())?;
        let context = self.context();
        self.send::<R>(context, |buf| req.encode(buf))?;
        loop {
            let mut data = self.read_frame()?;
            let (id, ctx) = reply_header(&mut data)?;
            if id == reply_id && ctx == context {
                log::trace!("<- {} (context {ctx:#x})", R::Reply::NAME);
                return check_retval(R::Reply::decode(&mut data)?);
            }
            log::debug!(
                "skipping message id {id} context {ctx:#x} while waiting for {}",
                R::Reply::NAME
            );
        }
    }

    fn dump<D: Dump>(&mut self, req: &D) -> Result<DetailStream<'_, D::Details>, ChannelError> {
        let details_id = self.msg_id(&D::Details::name_crc())?;
        let ping_reply_id = self.msg_id(&ControlPingReply::name_crc())?;
        let context = self.context();
        self.send::<D>(context, |buf| req.encode(buf))?;
        self.send::<ControlPing>(context, |buf| ControlPing.encode(buf))?;
        Ok(DetailStream {
            conn: self,
            context,
            details_id,
            ping_reply_id,
            done: false,
            _details: PhantomData,
        })
    }

    fn write_frame(&mut self, msg: &[u8]) -> Result<(), ChannelError> {
        let mut frame = BytesMut::with_capacity(FRAME_HEADER_LEN + msg.len());
        frame.put_bytes(0, 8);
        frame.put_u32(msg.len() as u32);
        frame.put_u32(0);
        frame.put_slice(msg);
        self.stream.write_all(&frame)?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Bytes, ChannelError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.read_exact(&mut header)?;
        let len = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(ChannelError::malformed(format!("frame of {len} bytes")));
        }
        let mut data = vec![0u8; len];
        self.read_exact(&mut data)?;
        Ok(Bytes::from(data))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ChannelError> {
        self.stream.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ChannelError::Timeout,
            io::ErrorKind::UnexpectedEof => ChannelError::Closed,
            _ => ChannelError::Io(e),
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Reads the common reply header: message id and context.
fn reply_header(data: &mut Bytes) -> Result<(u16, u32), ChannelError> {
    Ok((wire::get_u16(data)?, wire::get_u32(data)?))
}

/// `Channel` over a `Connection`.
pub struct SocketChannel<'a> {
    conn: &'a mut Connection,
}

impl Channel for SocketChannel<'_> {
    fn send_request<R: Request>(&mut self, req: &R) -> Result<R::Reply, ChannelError> {
        self.conn.request(req)
    }

    fn send_multi_request<D: Dump>(
        &mut self,
        req: &D,
    ) -> Result<ReplyStream<'_, D::Details>, ChannelError> {
        Ok(Box::new(self.conn.dump(req)?))
    }

    fn check_compatibility(&self, messages: &[MessageRef]) -> Result<(), Error> {
        self.conn.check_compatibility(messages)
    }
}

impl Drop for SocketChannel<'_> {
    fn drop(&mut self) {
        log::debug!("channel closed on {}", self.conn.path.display());
    }
}

/// Detail records of one dump, ended by the control ping reply.
pub struct DetailStream<'a, D> {
    conn: &'a mut Connection,
    context: u32,
    details_id: u16,
    ping_reply_id: u16,
    done: bool,
    _details: PhantomData<D>,
}

impl<D: Reply> Iterator for DetailStream<'_, D> {
    type Item = Result<D, ChannelError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let frame = self.conn.read_frame().and_then(|mut data| {
                let (id, ctx) = reply_header(&mut data)?;
                Ok((id, ctx, data))
            });
            let (id, ctx, mut data) = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if ctx != self.context {
                log::debug!("skipping message id {id} context {ctx:#x} during {}", D::NAME);
                continue;
            }
            if id == self.ping_reply_id {
                self.done = true;
                return match ControlPingReply::decode(&mut data).and_then(check_retval) {
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                };
            }
            if id == self.details_id {
                let details = D::decode(&mut data);
                if details.is_err() {
                    self.done = true;
                }
                return Some(details);
            }
            log::debug!("skipping message id {id} during {}", D::NAME);
        }
        None
    }
}
