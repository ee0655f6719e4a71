use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use servomouth::audio::{self, AudioClip, AudioOutput, CpalOutput, SilentOutput};
use servomouth::{Config, Error, Speaker};

/// servomouth - move a servo mouth in time with audio
#[derive(Parser)]
#[command(name = "servomouth", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/servomouth/config.toml)
    #[arg(short, long, env = "SERVOMOUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Don't open an audio device; animate on the clip's timing only
    #[arg(long)]
    no_audio: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Play a WAV file and animate the rig
    Speak {
        /// Path to a PCM WAV file
        path: PathBuf,
        /// Mouth angle at full loudness
        #[arg(long)]
        max_angle: Option<f32>,
        /// Envelope window length in seconds
        #[arg(long)]
        interval: Option<f64>,
    },
    /// Speak a generated sine tone
    TestTone {
        /// Tone frequency in Hz
        #[arg(short, long, default_value = "220")]
        frequency: f32,
        /// Tone length in seconds
        #[arg(short, long, default_value = "2")]
        seconds: f32,
    },
    /// Sweep the mouth servo across its range
    TestServos {
        /// Degrees per step
        #[arg(short, long, default_value = "10")]
        step: f32,
        /// Seconds to hold each step
        #[arg(short, long, default_value = "0.5")]
        pause: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,servomouth=info",
        1 => "info,servomouth=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Speak {
            path,
            max_angle,
            interval,
        } => {
            let clip = audio::read_wav(&path)?;
            let interval = interval
                .map(Duration::try_from_secs_f64)
                .transpose()?
                .unwrap_or(config.animation.update_interval);
            let max_angle = max_angle.unwrap_or(config.animation.max_angle);
            speak(&config, cli.no_audio, clip, interval, max_angle).await
        }
        Command::TestTone { frequency, seconds } => {
            let clip = sine_clip(frequency, seconds)?;
            println!("Speaking a {frequency} Hz tone for {seconds} s...");
            speak(
                &config,
                cli.no_audio,
                clip,
                config.animation.update_interval,
                config.animation.max_angle,
            )
            .await
        }
        Command::TestServos { step, pause } => {
            test_servos(&config, step, Duration::try_from_secs_f64(pause)?).await
        }
    }
}

/// Pick the audio output for this run
fn output(config: &Config, no_audio: bool) -> anyhow::Result<Arc<dyn AudioOutput>> {
    if no_audio || !config.audio.enabled {
        tracing::info!("audio disabled, animating silently");
        return Ok(Arc::new(SilentOutput));
    }
    Ok(Arc::new(CpalOutput::new()?))
}

async fn speak(
    config: &Config,
    no_audio: bool,
    clip: AudioClip,
    interval: Duration,
    max_angle: f32,
) -> anyhow::Result<()> {
    let mut speaker = Speaker::from_config(config, output(config, no_audio)?);

    let interrupt = speaker.interrupt();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.trigger();
        }
    });

    tracing::info!(
        duration_ms = clip.duration().as_millis(),
        max_angle,
        driver = ?config.servos.driver,
        "speaking"
    );

    match speaker.speak_with(Arc::new(clip), interval, max_angle).await {
        Ok(()) => {
            tracing::info!("done");
            Ok(())
        }
        Err(Error::Interrupted) => {
            tracing::info!("stopped");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Generate a sine tone at 16 kHz
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sine_clip(frequency: f32, seconds: f32) -> servomouth::Result<AudioClip> {
    const SAMPLE_RATE: u32 = 16_000;
    let num_samples = (SAMPLE_RATE as f32 * seconds.max(0.0)) as usize;
    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();
    AudioClip::from_mono(samples, SAMPLE_RATE)
}

/// Step the mouth from rest to full travel and back
async fn test_servos(config: &Config, step: f32, hold: Duration) -> anyhow::Result<()> {
    if !(step.is_finite() && step > 0.0) {
        anyhow::bail!("step must be positive");
    }

    let mut rig = config.servos.build_rig();
    let limits = rig.mouth.limits();
    println!(
        "Sweeping mouth {:.0}°..{:.0}° in {step}° steps (Ctrl-C to stop)",
        limits.min, limits.max
    );

    let mut angles = Vec::new();
    let mut angle = limits.min;
    while angle <= limits.max {
        angles.push(angle);
        angle += step;
    }
    let back: Vec<f32> = angles.iter().rev().skip(1).copied().collect();
    angles.extend(back);

    for angle in angles {
        rig.mouth.set_angle(angle);
        println!("mouth -> {angle:.1}°");

        tokio::select! {
            () = tokio::time::sleep(hold) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("stopped");
                break;
            }
        }
    }

    rig.rest();
    Ok(())
}
