//! SMTP send-mail worker speaking the ThingsDB module protocol.
//!
//! The worker is started by the host database process and exchanges framed
//! packages with it over stdin/stdout. Two inbound package types are handled:
//! a configuration update establishing the SMTP server (and optional
//! credentials), and a send-mail request. Every recognized package is
//! answered with exactly one reply; individual request failures are converted
//! into typed exception replies and never stop the loop, while a failure of
//! the transport itself terminates the process so the host supervisor can
//! restart it.
//!
//! ```text
//! host ──packages──> transport ──> worker ─┬─> connection (config slot)
//!                                          └─> dispatch ──> SMTP send
//! host <──replies─── transport <── worker
//! ```

pub mod connection;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod proto;
pub mod schema;
pub mod transport;
pub mod worker;

pub use connection::Connection;
pub use dispatch::{MailMessage, Mailer, SmtpMailer};
pub use error::{ConfigError, Result, SendError, TransportError, ValidationError};
pub use proto::{ErrorCode, Package, PackageType};
pub use worker::Worker;

/// Name the worker registers under with the host supervisor
pub const MODULE_NAME: &str = "smtp";
