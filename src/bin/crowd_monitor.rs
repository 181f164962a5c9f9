//! crowd_monitor - count people in an image, classify the crowd, write a report
//!
//! Subcommands follow the pipeline one stage at a time:
//! inspect -> detect -> count -> classify -> report.
//! `assess` classifies a raw count and `ping` checks the provider key.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crowd_monitor::config::MonitorConfig;
use crowd_monitor::ui::{Ui, UiMode};
use crowd_monitor::{
    render, Assessment, ClassificationMode, Frame, ImageSource, Monitor, PersonCount, Provider,
    ProviderError,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Count people in an image and report on the crowd")]
struct Args {
    /// Progress output style.
    #[arg(long, value_enum, default_value_t = UiMode::Auto, global = true)]
    ui: UiMode,

    /// Print results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Classification policy: tiered (default) or legacy.
    #[arg(long, global = true)]
    mode: Option<ClassificationMode>,

    /// Detector backend: stub or tract.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// ONNX model for the tract backend.
    #[arg(long, global = true)]
    model_path: Option<PathBuf>,

    /// Detections for the stub backend, e.g. "person=4,dog=1".
    #[arg(long, global = true)]
    stub: Option<String>,

    /// Minimum detection confidence.
    #[arg(long, global = true)]
    confidence: Option<f32>,

    /// Report provider: gemini, openai or offline.
    #[arg(long, global = true)]
    provider: Option<Provider>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an image and print its size.
    Inspect { image: String },
    /// List every detected object.
    Detect { image: String },
    /// Count people and list all objects.
    Count { image: String },
    /// Detect, count and classify.
    Classify { image: String },
    /// Classify a person count directly.
    Assess {
        #[arg(allow_hyphen_values = true)]
        count: String,
    },
    /// Full pipeline with a generated report.
    Report { image: String },
    /// Send a test prompt to the configured provider.
    Ping,
}

#[derive(Serialize)]
struct ImageInfo<'a> {
    path: &'a str,
    width: u32,
    height: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = run(args);
    if let Err(err) = &result {
        if let Some(provider_err) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ProviderError>())
        {
            eprintln!("💡 {}", render::failure_hint(provider_err.kind));
        }
    }
    result
}

fn run(args: Args) -> Result<()> {
    let cfg = load_config(&args)?;
    let ui = Ui::from_env(args.ui);
    log::debug!("configuration: {:?}", cfg);

    match &args.command {
        Command::Inspect { image } => {
            let frame = load_image(&ui, image)?;
            if args.json {
                print_json(&ImageInfo {
                    path: image,
                    width: frame.width(),
                    height: frame.height(),
                })?;
            } else {
                println!("✅ Image loaded successfully: {}", image);
                println!("📏 Size: ({}, {}) pixels", frame.width(), frame.height());
            }
        }
        Command::Detect { image } | Command::Count { image } => {
            let monitor = build_monitor(&ui, &cfg)?;
            let frame = load_image(&ui, image)?;
            let stage = ui.stage("detect objects");
            let scene = monitor.survey(&frame)?;
            stage.finish_with(format!("{} objects", scene.total_objects));
            if args.json {
                print_json(&scene)?;
            } else if matches!(args.command, Command::Detect { .. }) {
                print!("{}", render::detections(&scene));
            } else {
                print!("{}", render::counts(&scene));
            }
        }
        Command::Classify { image } => {
            let assessment = assess_image(&ui, &cfg, image)?;
            if args.json {
                print_json(&assessment)?;
            } else {
                print!("{}", render::summary(&assessment));
            }
        }
        Command::Assess { count } => {
            let count: PersonCount = count.parse()?;
            let classification = cfg.mode.classify(count);
            if args.json {
                print_json(&classification)?;
            } else {
                print!("{}", render::decision(&classification));
            }
        }
        Command::Report { image } => {
            // Fail on a missing key before spending time on detection.
            let generator = cfg.report.generator()?;
            let assessment = assess_image(&ui, &cfg, image)?;
            let stage = ui.stage(&format!("generate report ({})", generator.name()));
            let report = assessment.report(generator.as_ref())?;
            stage.finish_with(report.report.model.clone());
            if args.json {
                print_json(&report)?;
            } else {
                print!("{}", render::report(&report));
            }
        }
        Command::Ping => {
            let generator = cfg.report.generator()?;
            let stage = ui.stage(&format!("ping {}", generator.name()));
            let generated = generator.generate("Say hello!")?;
            stage.finish();
            if args.json {
                print_json(&generated)?;
            } else {
                println!("✅ API key works! ({})", generated.model);
                println!("Response: {}", generated.text);
            }
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut cfg = MonitorConfig::load()?;
    if let Some(mode) = args.mode {
        cfg.mode = mode;
    }
    if let Some(backend) = &args.backend {
        cfg.detector.backend = backend.clone();
    }
    if let Some(path) = &args.model_path {
        cfg.detector.model_path = path.clone();
    }
    if let Some(script) = &args.stub {
        cfg.detector.stub_detections = script.clone();
    }
    if let Some(confidence) = args.confidence {
        cfg.detector.params.conf_threshold = confidence;
    }
    if let Some(provider) = args.provider {
        cfg.set_provider(provider);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_image(ui: &Ui, path: &str) -> Result<Frame> {
    let source = ImageSource::new(path)?;
    let stage = ui.stage(&format!("load image {}", source.location()));
    let frame = source.load()?;
    stage.finish_with(format!("{}x{}", frame.width(), frame.height()));
    Ok(frame)
}

fn build_monitor(ui: &Ui, cfg: &MonitorConfig) -> Result<Monitor> {
    let stage = ui.stage(&format!("load {} detector", cfg.detector.backend));
    if cfg.detector.backend == "stub" && cfg.detector.stub_detections.trim().is_empty() {
        log::warn!("stub detector has no scripted detections; use --stub or --backend tract");
    }
    let monitor = Monitor::from_settings(&cfg.detector, cfg.mode)?;
    monitor.warm_up().context("detector warm-up failed")?;
    stage.finish();
    Ok(monitor)
}

fn assess_image(ui: &Ui, cfg: &MonitorConfig, image: &str) -> Result<Assessment> {
    let monitor = build_monitor(ui, cfg)?;
    let frame = load_image(ui, image)?;
    let stage = ui.stage("detect and classify");
    let assessment = monitor.analyze(&frame)?;
    stage.finish_with(format!(
        "{} people, {}",
        assessment.scene.person_count,
        assessment.classification.status()
    ));
    Ok(assessment)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{}", rendered);
    Ok(())
}
