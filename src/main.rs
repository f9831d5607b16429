use anyhow::Context;
use clap::{Parser, Subcommand};
use promptme::config::Config;
use promptme::service::{Generator, ResponseService};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "promptme", version)]
#[command(about = "Ask a language model from the terminal, with cached and rate-limited replies")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "PROMPTME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive career coach: personalized advice and actionable tips for career growth
    Career,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    promptme::logging::init(&config.general.log_level);

    match cli.command {
        Command::Career => career(config).await,
    }
}

async fn career(config: Config) -> anyhow::Result<()> {
    let generator = Generator::from_config(&config).context("failed to create generator")?;
    let service = Arc::new(ResponseService::new(generator, config.llm.cache_enabled));
    let root = CancellationToken::new();

    let mut prompts = tokio::spawn(prompt_loop(service, root.clone()));

    tokio::select! {
        finished = &mut prompts => {
            finished.context("prompt loop panicked")??;
            info!("session ended");
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
        }
    }

    info!("shutting down");
    root.cancel();
    if tokio::time::timeout(config.shutdown_wait(), &mut prompts)
        .await
        .is_err()
    {
        warn!(
            wait_secs = config.general.graceful_shutdown_wait_time_sec,
            "prompt loop did not stop in time"
        );
        prompts.abort();
    }
    info!("shutdown complete");

    // A pending stdin read holds a blocking thread that would keep the runtime alive.
    std::process::exit(0);
}

async fn prompt_loop(service: Arc<ResponseService>, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Enter your prompt: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            line = lines.next_line() => line,
        };
        let prompt = match read_input(line)? {
            Input::Prompt(prompt) => prompt,
            Input::Blank => continue,
            Input::Unreadable => {
                println!("Something went wrong. Try again");
                continue;
            }
            Input::Eof => {
                println!();
                return Ok(());
            }
            Input::Exit => return Ok(()),
        };
        let prompt = prompt.as_str();

        let span = info_span!("prompt", request_id = %Uuid::new_v4(), user_prompt = %prompt);
        let result = service
            .respond(&cancel, prompt)
            .instrument(span.clone())
            .await;

        match result {
            Ok(response) => {
                println!("Coach: {}", response.text);
                println!("Response time: {:?}", response.response_time());
            }
            Err(e) if e.is_cancelled() && cancel.is_cancelled() => return Ok(()),
            Err(e) => {
                span.in_scope(|| debug!(error = %e, retryable = e.is_retryable(), "prompt failed"));
                println!("Something went wrong. Try again");
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Prompt(String),
    Blank,
    /// The line was not valid UTF-8; the reader is still usable.
    Unreadable,
    Eof,
    Exit,
}

fn read_input(line: std::io::Result<Option<String>>) -> anyhow::Result<Input> {
    match line {
        Ok(Some(line)) => match line.trim() {
            "" => Ok(Input::Blank),
            "exit" => Ok(Input::Exit),
            prompt => Ok(Input::Prompt(prompt.to_string())),
        },
        Ok(None) => Ok(Input::Eof),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            warn!(error = %e, "failed to read prompt");
            Ok(Input::Unreadable)
        }
        Err(e) => Err(e).context("failed to read prompt"),
    }
}
