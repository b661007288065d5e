use clap::error::ErrorKind;
use tokio_util::sync::CancellationToken;

use http_latency_probe::cli::Args;
use http_latency_probe::config::{FileConfig, RunConfig};
use http_latency_probe::error::UsageError;
use http_latency_probe::run_probes;
use http_latency_probe::signal::cancel_on_interrupt;

fn exit_usage(err: UsageError) -> ! {
    match err {
        UsageError::Args(e)
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            let _ = e.print();
            std::process::exit(0);
        }
        UsageError::Args(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
        other => {
            eprintln!("Error: {}", other);
            eprint!("{}", Args::usage());
            eprintln!();
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    let args = Args::try_parse_argv(std::env::args_os()).unwrap_or_else(|e| exit_usage(e));

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };
    let config = RunConfig::resolve(&args, &file_config).unwrap_or_else(|e| exit_usage(e));
    let log_level = config.get_tracing_level()?;

    // Logs go to stderr; stdout carries only the final statistics.
    let directive: tracing_subscriber::filter::Directive =
        format!("http_latency_probe={}", log_level.as_str().to_lowercase()).parse()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cancel = CancellationToken::new();

    // Ctrl+C is the only way a run ends.
    tokio::spawn(cancel_on_interrupt(tokio::signal::ctrl_c(), cancel.clone()));

    let report = run_probes(&config, cancel).await?;

    println!("--- GET {} statistics ---", config.url);
    println!("{}", report);

    Ok(())
}
