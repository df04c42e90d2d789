use clap::Parser;
use lc3_sim::emulator;
use lc3_sim::errors::{ExecutionError, LoadProgramError};
use lc3_sim::hardware::io_port::TerminalIoPort;
use lc3_sim::terminal;
use log::{LevelFilter, error};
use simple_logger::SimpleLogger;
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "lc3-sim")]
#[command(version)]
#[command(about = "Runs LC-3 object images")]
struct Cli {
    /// Object image to run, started at its origin
    program: PathBuf,
    /// Further object images loaded before the run, e.g. a custom trap table
    additional: Vec<PathBuf>,
    /// Stop with an error after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
    /// More log output on stderr, repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

const fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn load(cli: &Cli) -> Result<emulator::Emulator, LoadProgramError> {
    let io = Rc::new(RefCell::new(TerminalIoPort::new()));
    let mut emu = emulator::from_program(&cli.program, io)?;
    for path in &cli.additional {
        let bytes = std::fs::read(path).map_err(|e| {
            LoadProgramError::ProgramNotReadable(format!("{}: {e}", path.display()))
        })?;
        emu.load_image(&emulator::words_from_be_bytes(&bytes)?)?;
    }
    Ok(emu)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = SimpleLogger::new()
        .with_level(level_filter(cli.verbose))
        .init()
    {
        eprintln!("Could not initialize logging: {e}");
    }

    let mut emu = match load(&cli) {
        Ok(emu) => emu,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let result = {
        let _lock = terminal::set_terminal_raw();
        match cli.max_steps {
            Some(max_steps) => emu.execute_with_limit(max_steps),
            None => emu.execute(),
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExecutionError::Interrupted) => {
            error!("{}", ExecutionError::Interrupted);
            ExitCode::from(130)
        }
        Err(e @ ExecutionError::StepLimitReached { .. }) => {
            error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[gtest]
    pub fn test_cli_program_and_additional_images() {
        let cli = Cli::try_parse_from(["lc3-sim", "main.obj", "traps.obj", "--max-steps", "5"])
            .unwrap();
        expect_that!(cli.program, eq(&PathBuf::from("main.obj")));
        expect_that!(cli.additional, eq(&vec![PathBuf::from("traps.obj")]));
        expect_that!(cli.max_steps, eq(Some(5)));
        expect_that!(cli.verbose, eq(0));
    }

    #[gtest]
    pub fn test_cli_requires_program() {
        expect_that!(Cli::try_parse_from(["lc3-sim"]).is_err(), eq(true));
        let cli = Cli::try_parse_from(["lc3-sim", "-vv", "main.obj"]).unwrap();
        expect_that!(cli.additional.is_empty(), eq(true));
        expect_that!(level_filter(cli.verbose), eq(LevelFilter::Debug));
    }
}
