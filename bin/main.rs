#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use smtp_module::{
    MODULE_NAME,
    dispatch::SmtpMailer,
    logging,
    transport::{self, ReplyWriter},
    worker::Worker,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    info!("starting module '{MODULE_NAME}'");

    let (packages, errors) = transport::spawn_reader(tokio::io::stdin());
    let replies = ReplyWriter::new(tokio::io::stdout());

    Worker::new(SmtpMailer).run(packages, errors, replies).await?;

    info!("module '{MODULE_NAME}' exiting");
    Ok(())
}
