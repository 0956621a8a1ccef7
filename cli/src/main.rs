use clap::{Parser, Subcommand};
use hound::WavSpec;
use log::info;
use std::fs::File;
use std::path::PathBuf;

use dtmfrx_core::{
    DtmfDetector, DtmfError, DtmfGenerator, SystemClock, DEFAULT_BLOCK_SIZE, SAMPLE_RATE,
};

#[derive(Parser)]
#[command(name = "dtmfrx")]
#[command(about = "DTMF symbol detector and generator for 8 kHz audio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect DTMF digits in a WAV file
    Detect {
        /// Input WAV file (8 kHz mono)
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Minimum signal level in dBFS
        #[arg(short, long, default_value = "-50.0")]
        threshold: f32,
    },

    /// Generate a WAV file dialing a digit string
    Generate {
        /// Digits to dial (0-9, A-D, *, #)
        #[arg(value_name = "DIGITS")]
        digits: String,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        /// Tone duration per digit (ms)
        #[arg(long, default_value = "80")]
        on_ms: usize,

        /// Silence between digits (ms)
        #[arg(long, default_value = "80")]
        off_ms: usize,

        /// Pair level in dBFS
        #[arg(long, default_value = "-6.0")]
        level: f32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { input, threshold } => detect_command(&input, threshold)?,
        Commands::Generate {
            digits,
            output,
            on_ms,
            off_ms,
            level,
        } => generate_command(&digits, &output, on_ms, off_ms, level)?,
    }

    Ok(())
}

fn detect_command(input_path: &PathBuf, threshold: f32) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;

    let spec = reader.spec();
    info!(
        "read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );
    if spec.sample_rate as usize != SAMPLE_RATE || spec.channels != 1 {
        return Err(DtmfError::InvalidConfig(format!(
            "expected {SAMPLE_RATE} Hz mono input, got {} Hz / {} channels",
            spec.sample_rate, spec.channels
        ))
        .into());
    }

    // Convert to f32 in [-1.0, 1.0]
    let samples: Vec<f32> = match spec.bits_per_sample {
        16 => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?
                .into_iter()
                .map(|s| s as f32 / 32768.0)
                .collect()
        }
        32 => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        _ => {
            return Err(format!("unsupported bit depth: {}", spec.bits_per_sample).into());
        }
    };
    info!("extracted {} samples", samples.len());

    let mut detector = DtmfDetector::new(SystemClock::new(), DEFAULT_BLOCK_SIZE);
    detector.set_signal_threshold(threshold);

    let mut digits = String::new();
    for block in samples.chunks_exact(DEFAULT_BLOCK_SIZE) {
        detector.process_block(block);
        while let Some(symbol) = detector.pop_detection() {
            digits.push(symbol.to_char());
        }
    }

    if digits.is_empty() {
        println!("No DTMF symbols detected");
    } else {
        println!("{digits}");
    }
    Ok(())
}

fn generate_command(
    digits: &str,
    output_path: &PathBuf,
    on_ms: usize,
    off_ms: usize,
    level: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut generator = DtmfGenerator::new();
    generator.set_timing(on_ms, off_ms);
    generator.set_level_dbfs(level);
    let samples = generator.generate(digits)?;
    info!("generated {} samples for {} digits", samples.len(), digits.len());

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let file = File::create(output_path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in samples {
        let clamped = sample.max(-1.0).min(1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    println!(
        "Wrote {} digits to {}",
        digits.len(),
        output_path.display()
    );
    Ok(())
}
