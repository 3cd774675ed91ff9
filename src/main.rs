use ezyago_console::{ arguments, logger, run };
use ezyago_console::logger::LogTag;

#[tokio::main]
async fn main() {
    if arguments::is_help_requested() {
        arguments::print_help();
        return;
    }

    if let Err(e) = run::run().await {
        logger::error(LogTag::System, &format!("❌ Fatal: {:#}", e));
        std::process::exit(1);
    }
}
