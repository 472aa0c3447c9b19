//! ADC10 Temperature Sampler Host Simulation
//!
//! Runs the sampler against the simulated ADC10_A/REF_A register file so
//! both backends can be exercised without hardware.
//!
//! ## Usage
//!
//! ```bash
//! # Ten cycles through the direct register backend, log output
//! cargo run --features std --bin tempsense_sim
//!
//! # Driver library backend, custom calibration, 20 cycles
//! cargo run --features std --bin tempsense_sim -- --backend library --cal-low 720 --cal-high 870 --cycles 20
//!
//! # COBS telemetry frames on stdout, logs on stderr
//! cargo run --features std --bin tempsense_sim -- --frames > frames.bin
//! ```
//!
//! Set `RUST_LOG=debug` to trace the configuration sequence.

use std::io::{self, Write as _};
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType};
use log::info;

use tempsense::adapters::RegisterSnapshot;
use tempsense::{
    CalibrationPair, CobsFrameSink, DirectRegisterBackend, LibraryBackend, LogSink,
    SamplerConfig, SensorError, SimulatedAdc10, TelemetrySink, TemperatureBackend,
    TemperatureCalibration, TemperatureSampler,
};

const DEFAULT_CAL_LOW: u16 = 731;
const DEFAULT_CAL_HIGH: u16 = 879;
const DEFAULT_CYCLES: u32 = 10;
const DEFAULT_DIE_TEMPERATURE_C: f32 = 25.0;

/// Every third cycle stalls when `--stall` is given
const STALL_EVERY: u32 = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let frames = args.iter().any(|a| a == "--frames");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = SimOptions {
        cycles: arg_value(&args, "--cycles")?.unwrap_or(DEFAULT_CYCLES),
        die_temperature_c: arg_value(&args, "--temp")?.unwrap_or(DEFAULT_DIE_TEMPERATURE_C),
        stall: args.iter().any(|a| a == "--stall"),
    };

    let pair = CalibrationPair::new(
        arg_value(&args, "--cal-low")?.unwrap_or(DEFAULT_CAL_LOW),
        arg_value(&args, "--cal-high")?.unwrap_or(DEFAULT_CAL_HIGH),
    )?;
    let calibration = TemperatureCalibration::adc10(pair);

    let mut config = SamplerConfig::host();
    if let Some(interval) = arg_value(&args, "--interval-ms")? {
        config.read_interval_ms = interval;
    }

    let mut sim = SimulatedAdc10::new(calibration);
    sim.set_conversion_latency(8);
    sim.set_reference_busy_reads(3);
    sim.set_die_temperature(options.die_temperature_c);

    let mut sink: Box<dyn TelemetrySink> = if frames {
        Box::new(CobsFrameSink::new(StdoutWriter))
    } else {
        Box::new(LogSink)
    };

    let backend = arg_value::<String>(&args, "--backend")?.unwrap_or_else(|| "direct".into());
    info!("Simulating {} backend for {} cycles", backend, options.cycles);

    match backend.as_str() {
        "direct" => simulate(
            DirectRegisterBackend::new(sim),
            calibration,
            config,
            &options,
            sink.as_mut(),
        )?,
        "library" => simulate(
            LibraryBackend::new(sim),
            calibration,
            config,
            &options,
            sink.as_mut(),
        )?,
        other => return Err(format!("unknown backend '{}' (use direct or library)", other).into()),
    }

    Ok(())
}

struct SimOptions {
    cycles: u32,
    die_temperature_c: f32,
    stall: bool,
}

/// Access to the simulator behind either backend
trait SimBackend: TemperatureBackend {
    fn simulator(&mut self) -> &mut SimulatedAdc10;
    fn snapshot(&mut self) -> RegisterSnapshot;
}

impl SimBackend for DirectRegisterBackend<SimulatedAdc10> {
    fn simulator(&mut self) -> &mut SimulatedAdc10 {
        self.registers_mut()
    }

    fn snapshot(&mut self) -> RegisterSnapshot {
        DirectRegisterBackend::snapshot(self)
    }
}

impl SimBackend for LibraryBackend<SimulatedAdc10> {
    fn simulator(&mut self) -> &mut SimulatedAdc10 {
        self.registers_mut()
    }

    fn snapshot(&mut self) -> RegisterSnapshot {
        LibraryBackend::snapshot(self)
    }
}

fn simulate<B: SimBackend>(
    backend: B,
    calibration: TemperatureCalibration,
    config: SamplerConfig,
    options: &SimOptions,
    sink: &mut dyn TelemetrySink,
) -> Result<(), SensorError> {
    let mut sampler = TemperatureSampler::new(backend, StdDelay, calibration, config);
    sampler.start()?;
    info!("Registers after configure: {}", sampler.backend_mut().snapshot());

    let mut ok = 0u32;
    let mut timeouts = 0u32;

    for cycle in 0..options.cycles {
        // Slow drift around the requested die temperature
        let drift = (cycle as f32 * 0.4).sin() * 2.5;
        let stall = options.stall && cycle % STALL_EVERY == STALL_EVERY - 1;
        {
            let sim = sampler.backend_mut().simulator();
            sim.set_die_temperature(options.die_temperature_c + drift);
            sim.stall(stall);
        }

        match sampler.cycle(&mut *sink)? {
            Some(_) => ok += 1,
            None => timeouts += 1,
        }
    }

    let conversions = sampler.backend_mut().simulator().conversions();
    info!(
        "Done: {} observations, {} timeouts, {} conversions started",
        ok, timeouts, conversions
    );
    Ok(())
}

/// `DelayNs` backed by `thread::sleep`
struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// `embedded-io` writer over the process stdout
struct StdoutWriter;

impl ErrorType for StdoutWriter {
    type Error = ErrorKind;
}

impl embedded_io::Write for StdoutWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io::stdout().write(buf).map_err(|_| ErrorKind::Other)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        io::stdout().flush().map_err(|_| ErrorKind::Other)
    }
}

fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    let Some(idx) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let raw = args
        .get(idx + 1)
        .ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map(Some)
        .map_err(|_| format!("invalid value '{}' for {}", raw, flag))
}

fn print_help() {
    println!("tempsense_sim - run the ADC10 temperature sampler against a simulated MSP430");
    println!();
    println!("Options:");
    println!("  --backend <direct|library>  Register backend (default: direct)");
    println!("  --cycles <N>                Number of sample cycles (default: {})", DEFAULT_CYCLES);
    println!("  --cal-low <CODE>            30 °C calibration code (default: {})", DEFAULT_CAL_LOW);
    println!("  --cal-high <CODE>           85 °C calibration code (default: {})", DEFAULT_CAL_HIGH);
    println!("  --temp <C>                  Simulated die temperature (default: {})", DEFAULT_DIE_TEMPERATURE_C);
    println!("  --interval-ms <MS>          Delay between cycles (default: 500)");
    println!("  --frames                    Write COBS telemetry frames to stdout");
    println!("  --stall                     Stall every {}rd conversion to exercise timeouts", STALL_EVERY);
    println!("  --help                      Show this help");
}
