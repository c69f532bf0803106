// Command line front end: one register operation per run
//
// Usage: ax12 [--port P] [--baudrate B] [--config FILE] [--id N] <command>
// Example: ax12 --port /dev/ttyUSB0 --id 9 position 512

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ax12_control::config::{BusConfig, DEFAULT_MOTOR_ID, PROTOCOL_VERSION};
use ax12_control::motor::{Ax12, Bus, Load, SerialTransport};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "ax12", about = "Read and write AX-12 servo registers")]
struct Cli {
    /// Serial device (overrides the config file)
    #[arg(long, global = true)]
    port: Option<String>,

    /// Bus bit rate (overrides the config file)
    #[arg(long, global = true)]
    baudrate: Option<u32>,

    /// JSON bus config: {"port": ..., "baudrate": ..., "timeout_ms": ...}
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Motor id on the bus
    #[arg(long, global = true, default_value_t = DEFAULT_MOTOR_ID)]
    id: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
enum TorqueAction {
    On,
    Off,
    Status,
}

#[derive(Subcommand)]
enum Command {
    /// Print present position, or set goal position (0-1023)
    Position { value: Option<u16> },
    /// Print moving speed, or set it (0-1023)
    Speed { value: Option<u16> },
    /// Print present speed
    PresentSpeed,
    /// Enable, disable or query torque
    Torque {
        #[arg(value_enum)]
        action: TorqueAction,
    },
    /// Print torque limit, or set it (0-1023)
    TorqueLimit { value: Option<u16> },
    /// Switch the LED
    Led {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Print present load and its direction
    Load,
    /// Print internal temperature
    Temperature,
    /// Print supply voltage
    Voltage,
    /// Print whether the motor is still moving
    Moving,
    /// Read every present value
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Interactively enter goal positions; disables torque on exit
    Prompt,
}

/// Snapshot printed by `status`
#[derive(Debug, Serialize)]
struct MotorStatus {
    id: u8,
    position: u16,
    present_speed: u16,
    moving_speed: u16,
    load: Load,
    temperature: u16,
    voltage: f32,
    torque_limit: u16,
    torque_enabled: bool,
    moving: bool,
}

impl MotorStatus {
    fn read(motor: &Ax12<SerialTransport>) -> CliResult<Self> {
        Ok(Self {
            id: motor.id(),
            position: motor.get_position()?,
            present_speed: motor.get_present_speed()?,
            moving_speed: motor.get_moving_speed()?,
            load: motor.get_load()?,
            temperature: motor.get_temperature()?,
            voltage: motor.get_voltage()?,
            torque_limit: motor.get_torque_limit()?,
            torque_enabled: motor.torque_enabled()?,
            moving: motor.is_moving()?,
        })
    }
}

fn main() {
    // Setup logging (set RUST_LOG=debug to see every register exchange)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => BusConfig::from_file(path)?,
        None => BusConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(baudrate) = cli.baudrate {
        config.baudrate = baudrate;
    }

    info!(
        "Protocol {:.1} on {} at {} bps",
        PROTOCOL_VERSION, config.port, config.baudrate
    );
    let bus = Bus::connect(SerialTransport::from_config(&config), config.baudrate)?;
    let outcome = bus
        .motor(cli.id)
        .map_err(Into::into)
        .and_then(|motor| execute(&motor, cli.command));
    bus.close();
    outcome
}

fn execute(motor: &Ax12<SerialTransport>, command: Command) -> CliResult<()> {
    let id = motor.id();
    match command {
        Command::Position { value: Some(p) } => {
            motor.set_position(p)?;
            println!("Position of motor {} set to {}", id, p);
        }
        Command::Position { value: None } => {
            println!("ID:{:03}  PresPos:{:03}", id, motor.get_position()?);
        }
        Command::Speed { value: Some(s) } => {
            motor.set_moving_speed(s)?;
            println!("Moving speed of motor {} set to {}", id, s);
        }
        Command::Speed { value: None } => println!("{}", motor.get_moving_speed()?),
        Command::PresentSpeed => println!("{}", motor.get_present_speed()?),
        Command::Torque { action } => match action {
            TorqueAction::On => {
                motor.enable_torque()?;
                println!("Torque of motor {} enabled", id);
            }
            TorqueAction::Off => {
                motor.disable_torque()?;
                println!("Torque of motor {} disabled", id);
            }
            TorqueAction::Status => {
                let state = if motor.torque_enabled()? { "on" } else { "off" };
                println!("Torque {}", state);
            }
        },
        Command::TorqueLimit { value: Some(t) } => {
            motor.set_torque_limit(t)?;
            println!("Torque limit of motor {} set to {}", id, t);
        }
        Command::TorqueLimit { value: None } => println!("{}", motor.get_torque_limit()?),
        Command::Led { state: Switch::On } => {
            motor.led_on()?;
            println!("LED of motor {} on", id);
        }
        Command::Led { state: Switch::Off } => {
            motor.led_off()?;
            println!("LED of motor {} off", id);
        }
        Command::Load => {
            let load = motor.get_load()?;
            println!("{} ({:?}, raw {})", load.magnitude, load.direction, load.raw);
        }
        Command::Temperature => println!("{} C", motor.get_temperature()?),
        Command::Voltage => println!("{:.1} V", motor.get_voltage()?),
        Command::Moving => println!("{}", motor.is_moving()?),
        Command::Status { json } => {
            let status = MotorStatus::read(motor)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{:#?}", status);
            }
        }
        Command::Prompt => prompt_positions(motor)?,
    }
    Ok(())
}

fn ask(prompt: &str) -> CliResult<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Position loop: show where the motor is, move it, repeat until told to stop
fn prompt_positions(motor: &Ax12<SerialTransport>) -> CliResult<()> {
    loop {
        match motor.get_position() {
            Ok(p) => println!("ID:{:03}  PresPos:{:03}", motor.id(), p),
            Err(e) => println!("{}", e),
        }

        let Some(input) = ask("input pos: ")? else {
            break;
        };
        match input.parse::<u16>() {
            Ok(p) => match motor.set_position(p) {
                Ok(()) => println!("Position of motor {} set to {}", motor.id(), p),
                Err(e) => println!("{}", e),
            },
            Err(_) => println!("Not a position: {:?}", input),
        }

        match ask("Continue? : y/n ")? {
            Some(answer) if answer == "n" => break,
            Some(_) => {}
            None => break,
        }
    }

    motor.disable_torque()?;
    Ok(())
}
