// kwdcat -- command-line tool for driving a Kenwood transceiver over CAT.
//
// Usage:
//   kwdcat ports
//   kwdcat --port /dev/ttyUSB0 check
//   kwdcat --port /dev/ttyUSB0 --baud 115200 status
//   kwdcat --port COM3 freq b
//   kwdcat --port /dev/ttyUSB0 step --vfo b --down --step 5
//   kwdcat --port /dev/ttyUSB0 raw IF 37
//
// Logging goes to stderr and is controlled by RUST_LOG (default: warn);
// -v raises it to debug, -vv to trace.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use kwdcat::{Direction, Frame, Session, SessionBuilder, Vfo};
use kwdcat_transport::LineConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// kwdcat -- Kenwood CAT control from the command line.
#[derive(Parser)]
#[command(name = "kwdcat", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required for every command except `ports`.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(long, default_value_t = 57_600)]
    baud: u32,

    /// Leave DTR de-asserted after opening the port.
    #[arg(long)]
    no_dtr: bool,

    /// Leave RTS de-asserted after opening the port.
    #[arg(long)]
    no_rts: bool,

    /// Receive timeout per read, in milliseconds.
    #[arg(long, default_value_t = 500)]
    rx_timeout_ms: u64,

    /// Transmit timeout in milliseconds (0 = none).
    #[arg(long, default_value_t = 0)]
    tx_timeout_ms: u64,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports visible to the OS.
    Ports,

    #[command(flatten)]
    Rig(RigCommand),
}

/// Subcommands that talk to the radio over `--port`.
#[derive(Subcommand)]
enum RigCommand {
    /// Check that the radio answers; try to power it on if not.
    Check,

    /// Read and print the status frame (IF).
    Status,

    /// Read a VFO frequency (FA/FB).
    Freq {
        #[arg(value_enum, default_value = "a")]
        vfo: VfoArg,
    },

    /// Read frequency, mode and data flag (XI).
    Info,

    /// Read the output power setting (PC).
    Power,

    /// Step frequency up, like the microphone UP key.
    Up,

    /// Step frequency down, like the microphone DWN key.
    Down,

    /// Step a VFO by a number of increments.
    Step {
        #[arg(long, value_enum, default_value = "a")]
        vfo: VfoArg,

        /// Step downwards instead of upwards.
        #[arg(long)]
        down: bool,

        /// Number of steps (0-99).
        #[arg(long = "step", default_value_t = 1)]
        steps: u8,
    },

    /// RIT control.
    Rit {
        #[arg(value_enum)]
        action: RitAction,
    },

    /// XIT on/off.
    Xit {
        #[arg(value_enum)]
        state: OnOff,
    },

    /// Power the radio on.
    On,

    /// Power the radio off.
    Off,

    /// Send any request; print the reply if `len` > 0.
    Raw {
        /// Request text without terminator (e.g. IF, FA, MD).
        request: String,

        /// Expected reply length including the mnemonic (0 = no reply).
        #[arg(default_value_t = 0)]
        len: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VfoArg {
    A,
    B,
}

impl From<VfoArg> for Vfo {
    fn from(v: VfoArg) -> Self {
        match v {
            VfoArg::A => Vfo::A,
            VfoArg::B => Vfo::B,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RitAction {
    Up,
    Down,
    On,
    Off,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnOff {
    On,
    Off,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn line_config(cli: &Cli) -> LineConfig {
    LineConfig {
        baud_rate: cli.baud,
        dtr: !cli.no_dtr,
        rts: !cli.no_rts,
        rx_timeout: Duration::from_millis(cli.rx_timeout_ms),
        tx_timeout: Duration::from_millis(cli.tx_timeout_ms),
        ..Default::default()
    }
}

async fn open_session(cli: &Cli) -> Result<Session> {
    let Some(port) = cli.port.as_deref() else {
        bail!("--port is required for this command");
    };
    tracing::debug!(port, baud = cli.baud, "opening session");
    SessionBuilder::new()
        .serial_port(port)
        .line_config(line_config(cli))
        .build()
        .await
        .with_context(|| format!("opening {port}"))
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn print_frame(frame: &Frame) {
    match frame {
        Frame::Status(s) => {
            let mode = s
                .mode_name()
                .map(|m| m.to_string())
                .unwrap_or_else(|_| format!("? ({})", s.mode));
            println!("Frequency: {} MHz", s.frequency);
            println!("Mode:      {mode}");
            println!("RIT/XIT:   {} / {} (offset {})", on_off(s.rit_enabled()), on_off(s.xit_enabled()), s.rit_offset);
            println!("TX:        {}", on_off(s.transmitting()));
            println!("VFO:       {}", s.vfo);
            println!("Split:     {}", on_off(s.split_enabled()));
        }
        Frame::VfoFrequency(f) => println!("VFO {:?}: {} MHz", f.vfo, f.frequency),
        Frame::Info(i) => {
            let mode = i
                .mode_name()
                .map(|m| m.to_string())
                .unwrap_or_else(|_| format!("? ({})", i.mode));
            println!("Frequency: {} MHz", i.frequency);
            println!("Mode:      {mode}");
            println!("Data:      {}", on_off(i.data_mode()));
        }
        Frame::Power(p) => println!("Power: {}", p.power),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_ports() -> Result<()> {
    let ports = kwdcat_transport::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for (i, port) in ports.iter().enumerate() {
        println!("{:2}: {:20} {}", i + 1, port.name, port.description);
    }
    eprintln!("Note: some virtual ports are only listed while in use.");
    Ok(())
}

async fn run(session: &mut Session, command: &RigCommand) -> Result<()> {
    match command {
        RigCommand::Check => {
            session
                .ensure_responding()
                .await
                .context("radio check failed")?;
            println!("Radio is {}", session.state());
        }
        RigCommand::Status => print_frame(&Frame::Status(session.read_status().await?)),
        RigCommand::Freq { vfo } => {
            print_frame(&Frame::VfoFrequency(
                session.read_vfo_frequency((*vfo).into()).await?,
            ));
        }
        RigCommand::Info => print_frame(&Frame::Info(session.read_info().await?)),
        RigCommand::Power => print_frame(&Frame::Power(session.read_power().await?)),
        RigCommand::Up => session.frequency_up().await?,
        RigCommand::Down => session.frequency_down().await?,
        RigCommand::Step { vfo, down, steps } => {
            let direction = if *down { Direction::Down } else { Direction::Up };
            session.step_vfo((*vfo).into(), direction, *steps).await?;
        }
        RigCommand::Rit { action } => match action {
            RitAction::Up => session.rit_up().await?,
            RitAction::Down => session.rit_down().await?,
            RitAction::On => session.set_rit(true).await?,
            RitAction::Off => session.set_rit(false).await?,
        },
        RigCommand::Xit { state } => session.set_xit(matches!(state, OnOff::On)).await?,
        RigCommand::On => session.set_power(true).await?,
        RigCommand::Off => session.set_power(false).await?,
        RigCommand::Raw { request, len } => match session.query(request, *len).await? {
            Some(reply) => match Frame::decode(&reply) {
                Some(frame) => print_frame(&frame),
                None => println!("{reply}"),
            },
            None if *len > 0 => bail!("no valid reply to {request}"),
            None => {}
        },
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = match &cli.command {
        Command::Ports => return cmd_ports(),
        Command::Rig(command) => command,
    };

    let mut session = open_session(&cli).await?;
    let result = run(&mut session, command).await;
    session.close().await.ok();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ports_parses_without_port() {
        let cli = Cli::try_parse_from(["kwdcat", "ports"]).unwrap();
        assert!(matches!(cli.command, Command::Ports));
        assert!(cli.port.is_none());
    }

    #[test]
    fn rig_subcommands_parse_at_top_level() {
        let cli = Cli::try_parse_from([
            "kwdcat", "--port", "/dev/ttyUSB0", "step", "--vfo", "b", "--down", "--step", "5",
        ])
        .unwrap();
        match cli.command {
            Command::Rig(RigCommand::Step { vfo, down, steps }) => {
                assert!(matches!(vfo, VfoArg::B));
                assert!(down);
                assert_eq!(steps, 5);
            }
            _ => panic!("expected step"),
        }

        let cli = Cli::try_parse_from(["kwdcat", "--port", "COM3", "raw", "IF", "37"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Rig(RigCommand::Raw { ref request, len: 37 }) if request == "IF"
        ));
    }
}
