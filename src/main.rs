use notification_hub::{
    arguments::{is_help_requested, print_help},
    logger::{self, LogTag},
    run,
};

/// Main entry point for the notification hub
///
/// Serves WebSocket notification sessions until SIGINT/SIGTERM.
#[tokio::main]
async fn main() {
    // Console logging first; file output is enabled once config is loaded
    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    if let Err(e) = run::run().await {
        logger::error(LogTag::System, &format!("{:#}", e));
        logger::flush();
        std::process::exit(1);
    }

    logger::flush();
}
