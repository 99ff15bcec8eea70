//! voice_probe - render one note offline and report what came out
//!
//! Run with: cargo run --bin voice_probe -- --note 57 --route lfo_1:cutoff:0.2

mod analysis;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use tracing::info;
use voicegraph::dsp::scale::midi_to_frequency;
use voicegraph::{SynthConfig, VoiceHandler};

#[derive(Parser)]
#[command(name = "voice_probe")]
#[command(about = "Render a single voice offline and measure it", long_about = None)]
struct Args {
    /// MIDI note to play
    #[arg(short, long, default_value = "57")]
    note: f32,

    /// Velocity in [0, 1]
    #[arg(short, long, default_value = "1.0")]
    velocity: f32,

    /// Seconds the note is held before note-off
    #[arg(long, default_value = "1.0")]
    hold: f32,

    /// Longest release tail to render, in seconds
    #[arg(long, default_value = "3.0")]
    tail: f32,

    #[arg(long, default_value = "48000")]
    sample_rate: f32,

    #[arg(long, default_value = "128")]
    block_size: usize,

    /// Length of each reported level segment, in seconds
    #[arg(long, default_value = "0.1")]
    segment: f32,

    /// Set a control before playing: name=value (repeatable)
    #[arg(short, long)]
    control: Vec<String>,

    /// Connect modulation: source:destination:scale (repeatable)
    #[arg(short, long)]
    route: Vec<String>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = SynthConfig::default()
        .with_sample_rate(args.sample_rate)
        .with_max_block_size(args.block_size)
        .with_polyphony(1);
    let mut handler = VoiceHandler::new(config);

    for setting in &args.control {
        let (name, value) = setting
            .split_once('=')
            .ok_or_else(|| eyre!("control `{setting}` is not name=value"))?;
        let value: f32 = value.parse().wrap_err_with(|| format!("bad value in `{setting}`"))?;
        handler.set_control(name, value)?;
    }

    for route in &args.route {
        let parts: Vec<&str> = route.split(':').collect();
        let [source, destination, scale] = parts[..] else {
            return Err(eyre!("route `{route}` is not source:destination:scale"));
        };
        let scale: f32 = scale.parse().wrap_err_with(|| format!("bad scale in `{route}`"))?;
        let handle = handler.create_scale(scale);
        handler.try_connect_modulation(source, destination, handle)?;
    }

    let audio = render(&mut handler, &args)?;

    println!("segment   peak      rms");
    for segment in analysis::segments(&audio.samples, args.sample_rate, args.segment) {
        println!(
            "{:>6.2}s  {:>8.5}  {:>8.5}",
            segment.start_seconds, segment.peak, segment.rms
        );
    }

    let held = &audio.samples[..audio.released_at];
    match analysis::dominant_frequency(held, args.sample_rate) {
        Some(frequency) => println!(
            "dominant frequency {frequency:.1} Hz (note {} is {:.1} Hz)",
            args.note,
            midi_to_frequency(args.note)
        ),
        None => println!("held segment is silent"),
    }
    match audio.finished_at {
        Some(sample) => println!(
            "voice finished {:.3}s after note-off",
            (sample - audio.released_at) as f32 / args.sample_rate
        ),
        None => println!("voice still sounding after {:.1}s tail", args.tail),
    }

    Ok(())
}

struct Rendered {
    samples: Vec<f32>,
    released_at: usize,
    finished_at: Option<usize>,
}

fn render(handler: &mut VoiceHandler, args: &Args) -> color_eyre::Result<Rendered> {
    let block = args.block_size;
    let hold_blocks = (args.hold * args.sample_rate) as usize / block;
    let tail_blocks = (args.tail * args.sample_rate) as usize / block;
    let mut samples = Vec::with_capacity((hold_blocks + tail_blocks) * block);
    let mut buffer = vec![0.0; block];

    handler
        .voice_mut(0)
        .ok_or_else(|| eyre!("voice handler has no voices"))?
        .note_on(args.note, args.velocity);
    info!(note = args.note, velocity = args.velocity, "note on");

    for _ in 0..hold_blocks {
        render_block(handler, &mut buffer, &mut samples);
    }

    let released_at = samples.len();
    if let Some(voice) = handler.voice_mut(0) {
        voice.note_off();
    }
    info!(at = released_at, "note off");

    let mut finished_at = None;
    for _ in 0..tail_blocks {
        render_block(handler, &mut buffer, &mut samples);
        if handler.voice(0).is_some_and(|voice| voice.finished()) {
            finished_at = Some(samples.len());
            break;
        }
    }

    Ok(Rendered {
        samples,
        released_at,
        finished_at,
    })
}

fn render_block(handler: &mut VoiceHandler, buffer: &mut [f32], samples: &mut Vec<f32>) {
    handler.process(buffer.len());
    buffer.fill(0.0);
    handler.mix_into(buffer);
    samples.extend_from_slice(buffer);
}
