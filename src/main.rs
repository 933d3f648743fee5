use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

use termtalk::core::config::{self, CliOverrides};
use termtalk::{server, tui};

#[derive(Parser)]
#[command(name = "termtalk", about = "Chat with a language model from the terminal")]
struct Args {
    /// Model to use (overrides config and OPENAI_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP chat endpoint instead of the terminal UI
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let serving = matches!(args.command, Some(Command::Serve { .. }));
    if serving {
        let _ = TermLogger::init(
            LevelFilter::Info,
            log_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        );
    } else if let Ok(log_file) = File::create("termtalk.log") {
        // The UI owns the terminal, so the log goes to a file in the working directory
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config()?;
    let cli = CliOverrides {
        model: args.model,
        port: match args.command {
            Some(Command::Serve { port }) => port,
            None => None,
        },
    };
    let resolved = config::resolve(&file_config, &cli);
    log::info!("termtalk starting up (model={})", resolved.model_name);

    if serving {
        server::run(resolved).await
    } else {
        tui::run(resolved)?;
        Ok(())
    }
}
