// CLI modules
mod cli;
mod logging;
mod state;
mod version;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, AddNote, AddPassword, Init, List, Show, Version};

command_enum! {
    (Init, Init),
    (List, List),
    (Show, Show),
    (AddNote, AddNote),
    (AddPassword, AddPassword),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let guard = logging::init_logging(args.log_level);

    let ctx = cli::op::OpContext::new(args.remote, args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writer before exiting
    drop(guard);
    std::process::exit(code);
}
