mod input;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use footprint_common::{AnimationSettings, ColorCodeField, EntityIndex, FrameContext};
use footprint_palette::{CategoryTally, ColorMapper};
use footprint_render_wgpu::{TRANSITION_SHADER_VERSION, WgpuContext, WgpuEngine};
use footprint_transition::{CpuEngine, MetadataEncoder, MetadataTexture, TextureLayout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "footprint-cli",
    about = "Encode building footprints and simulate color transitions"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the transition program version
    Info,
    /// Encode an entity file and report the texture layout and class counts
    Encode {
        /// JSON array of entity records
        #[arg(short, long)]
        input: PathBuf,
        /// Engine config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the transition engine offline and report convergence
    Simulate {
        /// JSON array of entity records; a synthetic city is used if absent
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Size of the synthetic city
        #[arg(long, default_value = "400")]
        synthetic: usize,
        /// Animation settings (YAML)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Engine config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "240")]
        frames: u32,
        /// Frames per second of the simulated clock
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Frame at which to switch the color field
        #[arg(long)]
        switch_at: Option<u32>,
        /// Field to switch to (YearBuilt, ZoneDist1, BldgClass; anything else fades to black)
        #[arg(long)]
        switch_to: Option<String>,
        /// Report every N frames
        #[arg(long, default_value = "20")]
        report_every: u32,
        #[arg(long, value_enum, default_value = "cpu")]
        backend: Backend,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Cpu,
    Wgpu,
}

struct Schedule {
    frames: u32,
    fps: f64,
    switch: Option<(u32, Option<ColorCodeField>)>,
    report_every: u32,
}

impl Schedule {
    fn settings_at(&self, frame: u32, base: &AnimationSettings) -> AnimationSettings {
        match self.switch {
            Some((at, field)) if frame >= at => base.with_field(field),
            _ => *base,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("footprint-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", footprint_common::crate_info());
            println!("palette: {}", footprint_palette::crate_info());
            println!("transition: {}", footprint_transition::crate_info());
            println!("render-wgpu: {}", footprint_render_wgpu::crate_info());
            println!("transition program: v{TRANSITION_SHADER_VERSION}");
        }
        Commands::Encode { input, config } => {
            let entities = input::load_entities(&input)?;
            let config = input::load_config(config.as_deref())?;
            let mut mapper = ColorMapper::with_counter(CategoryTally::new());
            let encoded = MetadataEncoder::new(config).encode(&entities, &mut mapper)?;

            println!(
                "entities={}, texture={}x{}, missing={}",
                encoded.layout.entity_count(),
                encoded.layout.side(),
                encoded.layout.side(),
                entities.iter().filter(|e| e.is_none()).count()
            );
            let tally = mapper.counter();
            println!("building classes ({} classified):", tally.total());
            for (class, count) in tally.values(ColorCodeField::BldgClass) {
                println!("  {class:<6} {count}");
            }
        }
        Commands::Simulate {
            input,
            synthetic,
            settings,
            config,
            frames,
            fps,
            switch_at,
            switch_to,
            report_every,
            backend,
        } => {
            anyhow::ensure!(fps > 0.0, "fps must be positive");
            let config = input::load_config(config.as_deref())?;
            let settings = input::load_settings(settings.as_deref())?;
            let entities = match input {
                Some(path) => input::load_entities(&path)?,
                None => input::synthetic_city(synthetic, config.center),
            };
            let switch = switch_at.map(|at| {
                let field = switch_to.as_deref().and_then(ColorCodeField::parse);
                (at, field)
            });
            let schedule = Schedule {
                frames,
                fps,
                switch,
                report_every: report_every.max(1),
            };

            match backend {
                Backend::Cpu => {
                    let mut engine = CpuEngine::new((), &entities, &settings, &config)?;
                    simulate(&schedule, &settings, |frame, s| {
                        engine.tick(frame, s);
                        Ok(mean_error(
                            engine.state_texture().texels(),
                            engine.layout(),
                            engine.metadata(),
                            s.color_code_field,
                        ))
                    })?;
                }
                Backend::Wgpu => {
                    let ctx = WgpuContext::headless_blocking().context("creating GPU device")?;
                    let mut engine = WgpuEngine::new(ctx, &entities, &settings, &config)?;
                    simulate(&schedule, &settings, |frame, s| {
                        engine.tick(frame, s);
                        let texels = engine.backend().read_state(engine.state_texture())?;
                        Ok(mean_error(
                            &texels,
                            engine.layout(),
                            engine.metadata(),
                            s.color_code_field,
                        ))
                    })?;
                }
            }
        }
    }

    Ok(())
}

/// Drive `tick` through the schedule, printing the mean per-channel distance
/// to target on report frames. `tick` returns that distance for the frame.
fn simulate(
    schedule: &Schedule,
    base: &AnimationSettings,
    mut tick: impl FnMut(FrameContext, &AnimationSettings) -> Result<f32>,
) -> Result<()> {
    println!(
        "Simulating {} frames at {} fps, field={:?}",
        schedule.frames, schedule.fps, base.color_code_field
    );
    for frame in 0..schedule.frames {
        let settings = schedule.settings_at(frame, base);
        let time = FrameContext::at(frame as f64 / schedule.fps);
        let error = tick(time, &settings)?;

        let switching = schedule.switch.is_some_and(|(at, _)| at == frame);
        if switching {
            println!("frame {frame:>5}: switched to {:?}", settings.color_code_field);
        }
        if frame % schedule.report_every == 0 || frame + 1 == schedule.frames {
            println!(
                "frame {frame:>5} t={:>7.3}s mean distance to target: {:.4}",
                time.time, error
            );
        }
    }
    Ok(())
}

/// Mean absolute per-channel distance between displayed colors and targets.
fn mean_error(
    texels: &[[u8; 4]],
    layout: &TextureLayout,
    metadata: &MetadataTexture,
    field: Option<ColorCodeField>,
) -> f32 {
    let n = layout.entity_count();
    if n == 0 {
        return 0.0;
    }
    let total: f32 = (0..n as u32)
        .map(|i| {
            let flat = layout.flat_index(EntityIndex(i), 0);
            let [r, g, b, _] = texels[flat];
            let shown = glam::Vec3::new(r as f32, g as f32, b as f32) / 255.0;
            let target = field.map_or(glam::Vec3::ZERO, |f| metadata.target_at(flat, f));
            (shown - target).abs().element_sum() / 3.0
        })
        .sum();
    total / n as f32
}
