use std::process::ExitCode;

use clap::Parser;
use mtr_setup::cli::commands::display::report_failure;
use mtr_setup::cli::{Cli, CommandDispatcher, Commands};
use mtr_setup::host::HostCapabilities;
use mtr_setup::shell::{is_ci, SystemRunner};
use mtr_setup::ui::{create_ui, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `--debug` wins over `RUST_LOG`; without either only info and above is
/// logged. Logs go to stderr next to warnings.
fn init_tracing(debug: bool) {
    let filter = match debug {
        true => EnvFilter::new("mtr_setup=debug"),
        false => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mtr_setup=info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn output_mode(cli: &Cli) -> OutputMode {
    match (cli.quiet, cli.verbose) {
        (true, _) => OutputMode::Quiet,
        (false, true) => OutputMode::Verbose,
        (false, false) => OutputMode::Normal,
    }
}

/// Prompts need a person: never under CI, and not when the flags already
/// answer everything.
fn wants_prompts(cli: &Cli) -> bool {
    let answered = match &cli.command {
        Some(Commands::Install(args)) => args.non_interactive,
        Some(Commands::Uninstall(args)) => args.yes,
        _ => false,
    };
    !answered && !is_ci()
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    tracing::debug!(?cli, "parsed arguments");

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }
    let mut ui = create_ui(wants_prompts(&cli), output_mode(&cli));

    let caps = HostCapabilities::detect();
    tracing::debug!(?caps, "host capabilities");

    match CommandDispatcher::new(&SystemRunner, caps).dispatch(&cli, ui.as_mut()) {
        Ok(result) => exit_code(result.exit_code),
        Err(err) => exit_code(report_failure(ui.as_mut(), &err).exit_code),
    }
}
