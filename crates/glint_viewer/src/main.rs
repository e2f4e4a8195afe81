use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use glint_core::{RenderSettings, SceneDescription};
use glint_renderer::{
    build_scene, demo, export, Display, HeadlessDisplay, ProgressiveRenderer, SaveTarget,
    SceneSetup,
};
use glint_viewport::Viewport;

/// Progressive CPU path tracer.
///
/// Hold the right mouse button to look around, the middle button to pan,
/// scroll to dolly and W/A/S/D/R/F to fly. P saves the current image,
/// Escape quits.
#[derive(Parser, Debug)]
#[command(name = "glint", version, about)]
struct Args {
    /// JSON scene file to render
    #[arg(long, conflicts_with = "demo")]
    scene: Option<PathBuf>,

    /// Built-in scene to render when no scene file is given
    #[arg(long, default_value = "showcase")]
    demo: String,

    /// Worker thread count (defaults to the hardware thread count)
    #[arg(long)]
    threads: Option<usize>,

    /// Maximum bounces per camera ray
    #[arg(long)]
    max_depth: Option<i32>,

    /// Still ticks before workers stop synchronizing with the window
    #[arg(long)]
    converge_after: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Render this many ticks without a window, then save and exit
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,

    /// Image path for headless output and the P key
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl Args {
    /// Command-line flags win over the scene file.
    fn apply_to(&self, settings: &mut RenderSettings) {
        if let Some(threads) = self.threads {
            settings.worker_count = Some(threads);
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(converge_after) = self.converge_after {
            settings.converge_after = converge_after;
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    if let Some(output) = &args.output {
        export::format_for_path(output)?;
    }

    let setup = load_scene(&args)?;
    let settings = setup.settings.clone();
    if settings.width == 0 || settings.height == 0 {
        bail!("Image size must be non-zero, got {}x{}", settings.width, settings.height);
    }

    match args.headless {
        Some(ticks) => run_headless(setup, ticks, args.output),
        None => run_windowed(setup, args.output),
    }
}

fn load_scene(args: &Args) -> Result<SceneSetup> {
    match &args.scene {
        Some(path) => {
            let mut description = SceneDescription::load(path)
                .with_context(|| format!("Failed to load scene {}", path.display()))?;
            args.apply_to(&mut description.settings);
            Ok(build_scene(&description)?)
        }
        None => {
            let mut settings = RenderSettings::default();
            args.apply_to(&mut settings);
            demo::by_name(&args.demo, &settings).ok_or_else(|| {
                anyhow!(
                    "Unknown demo scene '{}' (available: {})",
                    args.demo,
                    demo::NAMES.join(", ")
                )
            })
        }
    }
}

fn run_windowed(setup: SceneSetup, output: Option<PathBuf>) -> Result<()> {
    let SceneSetup {
        world,
        camera,
        settings,
    } = setup;

    let viewport = Viewport::new("Glint", settings.width, settings.height)?;
    log::info!("Window opened at {:?}", viewport.size());

    let mut renderer = ProgressiveRenderer::new(viewport, world, camera, &settings);
    renderer.set_save_target(output.map(SaveTarget::new).unwrap_or_default());
    renderer.run()?;

    log::info!("Viewer closed");
    Ok(())
}

fn run_headless(setup: SceneSetup, ticks: u64, output: Option<PathBuf>) -> Result<()> {
    let SceneSetup {
        world,
        camera,
        settings,
    } = setup;

    let display = HeadlessDisplay::new(settings.width as usize, settings.height as usize, ticks);
    let mut renderer = ProgressiveRenderer::new(display, world, camera, &settings);
    renderer.run()?;
    log::info!("Rendered {} ticks", renderer.display().ticks());

    let snapshot = renderer.snapshot();
    let path = match output {
        Some(path) => {
            export::save(&path, &snapshot)?;
            path
        }
        None => SaveTarget::default().save(&snapshot)?,
    };
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let args = Args::parse_from([
            "glint",
            "--threads",
            "3",
            "--max-depth",
            "8",
            "--width",
            "64",
        ]);
        let mut settings = RenderSettings {
            height: 48,
            ..Default::default()
        };
        args.apply_to(&mut settings);

        assert_eq!(settings.worker_count, Some(3));
        assert_eq!(settings.max_depth, 8);
        assert_eq!((settings.width, settings.height), (64, 48));
        assert_eq!(settings.converge_after, 20, "unset flags keep the file value");
    }

    #[test]
    fn test_scene_and_demo_conflict() {
        let result = Args::try_parse_from(["glint", "--scene", "a.json", "--demo", "showcase"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_demo_is_an_error() {
        let args = Args::parse_from(["glint", "--demo", "nope"]);
        let err = load_scene(&args).err().expect("unknown demo must fail");
        assert!(err.to_string().contains("showcase"));
    }
}
