//! The protocol loop: routes inbound packages and owns the connection slot

use tokio::{io::AsyncWrite, sync::mpsc};
use tracing::{error, info, warn};

use crate::{
    connection::Connection,
    dispatch::{self, Mailer},
    error::{Result, TransportError},
    proto::{ErrorCode, Package, PackageType},
    schema,
    transport::ReplyWriter,
};

/// The protocol loop
///
/// Owns the single connection slot: `None` until the first successful
/// configuration, then replaced wholesale by each later one. Packages are
/// handled one at a time, in arrival order; a mail send runs to completion
/// before the next package is read.
pub struct Worker<M> {
    mailer: M,
    connection: Option<Connection>,
}

impl<M> Worker<M>
where
    M: Mailer,
{
    /// Create a worker in the unconfigured state
    pub const fn new(mailer: M) -> Self {
        Self {
            mailer,
            connection: None,
        }
    }

    /// Run until the transport fails or the host closes the package stream
    ///
    /// Decode, validation, and send failures are answered with per-package
    /// replies and never stop the loop. A clean close of the package stream
    /// returns `Ok`; the first transport error is returned to the caller,
    /// and restart policy belongs to the host supervisor.
    ///
    /// # Errors
    ///
    /// Returns the transport error that ended the loop, or an I/O error
    /// from writing a reply
    pub async fn run<W>(
        mut self,
        mut packages: mpsc::Receiver<Package>,
        mut errors: mpsc::Receiver<TransportError>,
        mut replies: ReplyWriter<W>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        loop {
            tokio::select! {
                // A pending transport error must win over the package
                // channel closing, since the reader task does both at once.
                biased;

                Some(err) = errors.recv() => {
                    error!("transport failed: {err}");
                    return Err(err);
                }
                package = packages.recv() => match package {
                    Some(package) => self.handle_package(package, &mut replies).await?,
                    None => {
                        if let Ok(err) = errors.try_recv() {
                            error!("transport failed: {err}");
                            return Err(err);
                        }
                        info!("host closed the package stream");
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn handle_package<W>(
        &mut self,
        package: Package,
        replies: &mut ReplyWriter<W>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match PackageType::from_u8(package.ty) {
            Some(PackageType::ModuleConf) => self.handle_config(&package.data, replies).await,
            Some(PackageType::ModuleReq) => {
                self.handle_request(package.pid, &package.data, replies).await
            }
            _ => {
                // The host only expects answers to the two types above.
                warn!("unexpected package type: {}", package.ty);
                Ok(())
            }
        }
    }

    /// Configuration handshake
    ///
    /// Decode and validation failures are the same generic nack on the wire;
    /// the distinguishing detail only goes to the operator log. On failure
    /// the previous connection, if any, stays in effect.
    async fn handle_config<W>(&mut self, data: &[u8], replies: &mut ReplyWriter<W>) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let config = match schema::decode_config(data) {
            Ok(config) => config,
            Err(err) => {
                warn!("missing or invalid SMTP configuration: {err}");
                return replies.conf_err().await;
            }
        };

        match Connection::from_config(config) {
            Ok(connection) => {
                info!(
                    "configured SMTP server {}:{}{}",
                    connection.server,
                    connection.port,
                    if connection.credentials.is_some() {
                        " (authenticated)"
                    } else {
                        ""
                    }
                );
                self.connection = Some(connection);
                replies.conf_ok().await
            }
            Err(err) => {
                warn!("{err}");
                replies.conf_err().await
            }
        }
    }

    async fn handle_request<W>(
        &mut self,
        pid: u16,
        data: &[u8],
        replies: &mut ReplyWriter<W>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let request = match schema::decode_request(data) {
            Ok(request) => request,
            Err(err) => {
                warn!("failed to unpack SMTP request: {err}");
                return replies
                    .exception(pid, ErrorCode::BadData, "failed to unpack SMTP request")
                    .await;
            }
        };

        // The host only forwards requests after a configuration ack, but an
        // unconfigured request is still answered rather than dropped.
        let Some(connection) = &self.connection else {
            warn!("mail request before any successful configuration");
            return replies
                .exception(pid, ErrorCode::Operation, "SMTP module is not configured")
                .await;
        };

        let message = match dispatch::build_message(request) {
            Ok(message) => message,
            Err(err) => {
                return replies
                    .exception(pid, ErrorCode::BadData, err.to_string())
                    .await;
            }
        };

        match self.mailer.send(connection, &message).await {
            Ok(()) => replies.response(pid).await,
            Err(err) => {
                warn!("failed to send mail: {err}");
                replies
                    .exception(pid, ErrorCode::Operation, format!("failed to send mail: {err}"))
                    .await
            }
        }
    }
}
