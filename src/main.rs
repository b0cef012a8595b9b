use anyhow::Result;
use log::error;
use photo_stamp::{
    AppConfig, Workflow,
    common::errors::handle_error,
    transport::console::{self, ConsoleTransport},
    workflow::processors::setup::initialize,
};

/// The console session runs as a single chat.
const CONSOLE_CHAT: i64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().skip(1).any(|arg| arg == "--help" || arg == "-h") {
        print!("{}", console::usage());
        return Ok(());
    }

    let config = AppConfig::load()?;

    let assets = match initialize(&config) {
        Ok(assets) => assets,
        Err(err) => {
            error!("Refusing to start without a complete setup");
            return Err(handle_error(err));
        }
    };

    let transport = ConsoleTransport::new(&config.output_dir);
    let workflow = Workflow::new(transport, assets, &config);
    console::run(&workflow, CONSOLE_CHAT).await
}
