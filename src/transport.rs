//! Framed package transport between host and worker
//!
//! The reader half runs as its own task and feeds two channels, one for
//! successfully framed packages and one for transport errors; those are the
//! two event sources the worker loop selects over. The writer half owns the
//! outbound stream and writes one framed reply at a time.

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tracing::trace;

use crate::{
    error::TransportError,
    proto::{self, ErrorCode, Exception, Package, PackageType},
};

/// Inbound channel depth; the loop drains one package at a time anyway
const CHANNEL_DEPTH: usize = 16;

/// Spawn the reader task for the inbound package stream
///
/// The task reads framed packages until EOF or the first transport error.
/// EOF closes the package channel; an error lands on the error channel and
/// stops the task.
pub fn spawn_reader<R>(
    reader: R,
) -> (mpsc::Receiver<Package>, mpsc::Receiver<TransportError>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (pkg_tx, pkg_rx) = mpsc::channel(CHANNEL_DEPTH);
    let (err_tx, err_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut reader = reader;
        loop {
            match read_package(&mut reader).await {
                Ok(Some(package)) => {
                    if pkg_tx.send(package).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    let _ = err_tx.send(err).await;
                    break;
                }
            }
        }
    });

    (pkg_rx, err_rx)
}

/// Read one framed package; `None` at a clean EOF on the header boundary
async fn read_package<R>(reader: &mut R) -> Result<Option<Package>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; proto::HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::Io(e)),
    }

    let (length, pid, ty) = proto::parse_header(&header)?;

    let mut data = vec![0u8; length as usize];
    reader.read_exact(&mut data).await?;

    trace!("received package: pid {pid}, type {ty}, {length} bytes");

    Ok(Some(Package { pid, ty, data }))
}

/// Writes framed replies back to the host
pub struct ReplyWriter<W> {
    writer: W,
}

impl<W> ReplyWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Take ownership of the outbound stream
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Acknowledge a successful configuration update
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn conf_ok(&mut self) -> Result<(), TransportError> {
        self.write(0, PackageType::ModuleConfOk, &[]).await
    }

    /// Reject a configuration update
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn conf_err(&mut self) -> Result<(), TransportError> {
        self.write(0, PackageType::ModuleConfErr, &[]).await
    }

    /// Answer a request with success; the payload is msgpack nil
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    pub async fn response(&mut self, pid: u16) -> Result<(), TransportError> {
        self.write(pid, PackageType::ModuleRes, proto::NIL_PAYLOAD)
            .await
    }

    /// Answer a request with a typed exception
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to encode or the write fails
    pub async fn exception(
        &mut self,
        pid: u16,
        code: ErrorCode,
        message: impl Into<String> + Send,
    ) -> Result<(), TransportError> {
        let payload = Exception::new(code, message).to_vec()?;
        self.write(pid, PackageType::ModuleErr, &payload).await
    }

    async fn write(
        &mut self,
        pid: u16,
        ty: PackageType,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let length = u32::try_from(data.len())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        trace!("writing package: pid {pid}, type {}, {length} bytes", ty as u8);

        self.writer
            .write_all(&proto::encode_header(length, pid, ty))
            .await?;
        self.writer.write_all(data).await?;
        self.writer.flush().await?;

        Ok(())
    }
}
