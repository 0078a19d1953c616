#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::Context as _;
    use clap::{Parser, ValueEnum};
    use keyline_core::{InteractionMode, TimelineModel, TimelineOptions};
    use keyline_ui::{TimelineApp, demo_model};

    #[derive(Debug, Clone, Copy, ValueEnum)]
    enum ModeArg {
        Selection,
        Pan,
        ViewOnly,
        Zoom,
        Locked,
    }

    impl From<ModeArg> for InteractionMode {
        fn from(mode: ModeArg) -> Self {
            match mode {
                ModeArg::Selection => InteractionMode::Selection,
                ModeArg::Pan => InteractionMode::Pan,
                ModeArg::ViewOnly => InteractionMode::NonInteractivePan,
                ModeArg::Zoom => InteractionMode::Zoom,
                ModeArg::Locked => InteractionMode::None,
            }
        }
    }

    /// Keyframe timeline editor.
    #[derive(Debug, Parser)]
    #[command(name = "keyline", version)]
    struct Args {
        /// Timeline model to open (JSON). A demo model is shown when omitted.
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Timeline options (JSON); missing fields keep their defaults
        #[arg(long = "options", value_name = "FILE")]
        options: Option<PathBuf>,

        /// Initial interaction mode
        #[arg(long = "mode", value_enum)]
        mode: Option<ModeArg>,

        /// Start with snapping disabled
        #[arg(long = "no-snap")]
        no_snap: bool,

        /// Verbosity: -v info, -vv debug, -vvv trace
        #[arg(short = 'v', action = clap::ArgAction::Count)]
        verbosity: u8,
    }

    fn load_options(args: &Args) -> anyhow::Result<TimelineOptions> {
        let mut options = match &args.options {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read options {}", path.display()))?;
                TimelineOptions::from_json(&json)?
            }
            None => TimelineOptions::default(),
        };
        if let Some(mode) = args.mode {
            options.interaction_mode = mode.into();
        }
        if args.no_snap {
            options.snap_enabled = false;
        }
        Ok(options)
    }

    fn load_model(args: &Args) -> anyhow::Result<TimelineModel> {
        let Some(path) = &args.file else {
            log::info!("No model file given, starting with the demo model");
            return Ok(demo_model()?);
        };
        let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let model = TimelineModel::from_json(&data).with_context(|| format!("Invalid model {}", path.display()))?;
        log::info!("Opened {}", path.display());
        Ok(model)
    }

    pub fn run() -> anyhow::Result<()> {
        let args = Args::parse();

        // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
        log::debug!("Command-line args: {args:?}");

        let options = load_options(&args)?;
        let model = load_model(&args)?;

        let native_options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(format!("keyline v{}", env!("CARGO_PKG_VERSION")))
                .with_inner_size([1200.0, 600.0])
                .with_drag_and_drop(true),
            ..Default::default()
        };

        eframe::run_native(
            "keyline",
            native_options,
            Box::new(move |cc| Ok(Box::new(TimelineApp::new(cc, options, model)))),
        )
        .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
