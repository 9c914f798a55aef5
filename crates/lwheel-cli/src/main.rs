use std::path::PathBuf;

use atty::Stream;
use clap::{value_parser, ArgAction, Parser};
use color_eyre::{eyre::eyre, Result};
use lwheel_core::{self, CommandGroup, CommandInfo, CommandStatus, GlobalOptions, InstallRequest};
use serde_json::Value;

mod style;

use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = LwheelCli::parse();
    init_tracing(cli.trace, cli.verbose);

    let global = GlobalOptions {
        quiet: cli.quiet,
        verbose: cli.verbose,
        trace: cli.trace,
        json: cli.json,
    };
    let request = InstallRequest {
        package: cli.package.clone(),
        lib: cli.lib.clone(),
        noinstall: cli.noinstall,
        wheeldir: cli.wheeldir.clone(),
    };
    let info = command_info(&cli);

    let outcome = lwheel_core::execute(&global, &request).map_err(|err| eyre!("{err:?}"))?;
    let code = emit_output(&cli, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn command_info(cli: &LwheelCli) -> CommandInfo {
    if cli.noinstall {
        CommandInfo::new(CommandGroup::Build, "build")
    } else {
        CommandInfo::new(CommandGroup::Install, "install")
    }
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("lwheel={level},lwheel_core={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn emit_output(
    cli: &LwheelCli,
    info: CommandInfo,
    outcome: &lwheel_core::ExecutionOutcome,
) -> Result<i32> {
    let code = match outcome.status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    };

    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = lwheel_core::to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !cli.quiet {
        let message = lwheel_core::format_status_message(info, &outcome.message);
        println!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            println!("{}", style.info(&hint_line));
        }
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details.get("hint").and_then(Value::as_str)
}

#[derive(Parser, Debug)]
#[command(
    name = "lwheel",
    author,
    version,
    about = "Build the LAMMPS python module into a wheel and install it with pip.",
    long_about = "Packages the compiled LAMMPS shared library together with the lammps python \
                  sources into a binary wheel, then installs it into the active virtual \
                  environment, the system site-packages, or the user folder.",
    override_usage = "lwheel --package PATH --lib PATH [--noinstall] [--wheeldir DIR]",
    after_help = "Examples:\n  lwheel -p python/lammps -l build/liblammps.so\n  lwheel -n -p python/lammps -l build/liblammps.so -w dist\n  lwheel --json -p python/lammps -l build/liblammps.so\n"
)]
struct LwheelCli {
    #[arg(
        short,
        long,
        value_parser = value_parser!(PathBuf),
        help = "Path to the LAMMPS python package"
    )]
    package: PathBuf,
    #[arg(
        short,
        long,
        value_parser = value_parser!(PathBuf),
        help = "Path to the compiled LAMMPS shared library"
    )]
    lib: PathBuf,
    #[arg(short, long, help = "Only build the wheel; skip the pip install step")]
    noinstall: bool,
    #[arg(
        short,
        long,
        value_parser = value_parser!(PathBuf),
        help = "Existing directory where the finished wheel is stored"
    )]
    wheeldir: Option<PathBuf>,
    #[arg(short, long, help = "Suppress the result line on stdout")]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "More logging (-v debug, -vv trace)")]
    verbose: u8,
    #[arg(long, help = "Log at trace level no matter what -v says")]
    trace: bool,
    #[arg(long, help = "Print the result as a JSON envelope")]
    json: bool,
    #[arg(long, help = "Never color the output")]
    no_color: bool,
}
