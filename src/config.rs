use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::alert::ClassificationMode;
use crate::detect::yolo::YoloParams;
use crate::report::{
    GeminiClient, OfflineGenerator, OpenAiClient, TextGenerator, UreqTransport,
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODELS, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODELS,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
    Offline,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Offline => "offline",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_var(self) -> Option<&'static str> {
        match self {
            Provider::Gemini => Some("GEMINI_API_KEY"),
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Offline => None,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_BASE_URL,
            Provider::OpenAi => DEFAULT_OPENAI_BASE_URL,
            Provider::Offline => "",
        }
    }

    fn default_models(self) -> Vec<String> {
        let models: &[&str] = match self {
            Provider::Gemini => &DEFAULT_GEMINI_MODELS,
            Provider::OpenAi => &DEFAULT_OPENAI_MODELS,
            Provider::Offline => &["template"],
        };
        models.iter().map(|m| m.to_string()).collect()
    }
}

impl std::str::FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "offline" => Ok(Provider::Offline),
            other => Err(anyhow!(
                "unknown provider '{}'; expected gemini, openai or offline",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    mode: Option<String>,
    report: Option<ReportConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ReportConfigFile {
    provider: Option<String>,
    models: Option<Vec<String>>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence: Option<f32>,
    iou: Option<f32>,
    stub_detections: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub mode: ClassificationMode,
    pub report: ReportSettings,
    pub detector: DetectorSettings,
}

#[derive(Clone)]
pub struct ReportSettings {
    pub provider: Provider,
    pub models: Vec<String>,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

// Hand-written so the API key never reaches logs.
impl std::fmt::Debug for ReportSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSettings")
            .field("provider", &self.provider)
            .field("models", &self.models)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReportSettings {
    /// Build the configured provider.
    ///
    /// Fails when a hosted provider has no API key.
    pub fn generator(&self) -> Result<Box<dyn TextGenerator>> {
        let api_key = || {
            self.api_key.clone().ok_or_else(|| {
                anyhow!(
                    "{} not found; set it in the environment or the config file",
                    self.provider.key_var().unwrap_or("API key")
                )
            })
        };
        let transport = || Arc::new(UreqTransport::new(self.timeout));
        let generator: Box<dyn TextGenerator> = match self.provider {
            Provider::Gemini => Box::new(GeminiClient::new(
                api_key()?,
                &self.base_url,
                self.models.clone(),
                transport(),
            )),
            Provider::OpenAi => Box::new(OpenAiClient::new(
                api_key()?,
                &self.base_url,
                self.models.clone(),
                transport(),
            )),
            Provider::Offline => Box::new(OfflineGenerator::new()),
        };
        Ok(generator)
    }
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: PathBuf,
    pub params: YoloParams,
    /// Script for the stub backend, `label=count` pairs.
    pub stub_detections: String,
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CROWD_MONITOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(mode) = file.mode.as_deref() {
            cfg.mode = mode.parse()?;
        }

        let report_file = file.report.unwrap_or_default();
        if let Some(provider) = report_file.provider.as_deref() {
            cfg.set_provider(provider.parse()?);
        }
        if let Some(models) = report_file.models {
            cfg.report.models = models;
        }
        if let Some(base_url) = report_file.base_url {
            cfg.report.base_url = base_url;
        }
        if report_file.api_key.is_some() {
            cfg.report.api_key = report_file.api_key;
        }
        if let Some(seconds) = report_file.timeout_secs {
            cfg.report.timeout = Duration::from_secs(seconds);
        }

        let detector_file = file.detector.unwrap_or_default();
        if let Some(backend) = detector_file.backend {
            cfg.detector.backend = backend;
        }
        if let Some(model_path) = detector_file.model_path {
            cfg.detector.model_path = model_path;
        }
        if let Some(input_size) = detector_file.input_size {
            cfg.detector.params.input_size = input_size;
        }
        if let Some(confidence) = detector_file.confidence {
            cfg.detector.params.conf_threshold = confidence;
        }
        if let Some(iou) = detector_file.iou {
            cfg.detector.params.iou_threshold = iou;
        }
        if let Some(script) = detector_file.stub_detections {
            cfg.detector.stub_detections = script;
        }
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(mode) = non_empty_env("CROWD_MONITOR_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(provider) = non_empty_env("CROWD_MONITOR_PROVIDER") {
            self.set_provider(provider.parse()?);
        }
        if let Some(models) = non_empty_env("CROWD_MONITOR_MODELS") {
            let parsed = split_csv(&models);
            if !parsed.is_empty() {
                self.report.models = parsed;
            }
        }
        if let Some(base_url) = non_empty_env("CROWD_MONITOR_BASE_URL") {
            self.report.base_url = base_url;
        }
        if let Some(timeout) = non_empty_env("CROWD_MONITOR_TIMEOUT_SECS") {
            let seconds: u64 = timeout.parse().map_err(|_| {
                anyhow!("CROWD_MONITOR_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.report.timeout = Duration::from_secs(seconds);
        }
        if let Some(var) = self.report.provider.key_var() {
            if let Some(key) = non_empty_env(var) {
                self.report.api_key = Some(key);
            }
        }
        if let Some(backend) = non_empty_env("CROWD_MONITOR_BACKEND") {
            self.detector.backend = backend;
        }
        if let Some(path) = non_empty_env("CROWD_MONITOR_MODEL_PATH") {
            self.detector.model_path = PathBuf::from(path);
        }
        if let Some(confidence) = non_empty_env("CROWD_MONITOR_CONFIDENCE") {
            self.detector.params.conf_threshold = confidence
                .parse()
                .map_err(|_| anyhow!("CROWD_MONITOR_CONFIDENCE must be a number"))?;
        }
        Ok(())
    }

    /// Switch provider, resetting models and base URL to that provider's
    /// defaults when they still hold the previous provider's defaults.
    pub fn set_provider(&mut self, provider: Provider) {
        let previous = self.report.provider;
        if previous == provider {
            return;
        }
        if self.report.models == previous.default_models() {
            self.report.models = provider.default_models();
        }
        if self.report.base_url == previous.default_base_url() {
            self.report.base_url = provider.default_base_url().to_string();
        }
        // A key for one vendor is never valid for another.
        self.report.api_key = provider.key_var().and_then(non_empty_env);
        self.report.provider = provider;
    }

    pub fn validate(&mut self) -> Result<()> {
        self.detector.backend = self.detector.backend.trim().to_lowercase();
        if !matches!(self.detector.backend.as_str(), "stub" | "tract") {
            return Err(anyhow!(
                "unknown detector backend '{}'; expected stub or tract",
                self.detector.backend
            ));
        }
        let params = &self.detector.params;
        if params.input_size == 0 || params.input_size % 32 != 0 {
            return Err(anyhow!("detector input size must be a positive multiple of 32"));
        }
        for (name, value) in [
            ("confidence", params.conf_threshold),
            ("iou", params.iou_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(anyhow!("{} threshold must be in (0, 1], got {}", name, value));
            }
        }

        if self.report.models.iter().all(|m| m.trim().is_empty()) {
            return Err(anyhow!("at least one report model must be configured"));
        }
        self.report.models.retain(|m| !m.trim().is_empty());
        if self.report.timeout.as_secs() == 0 {
            return Err(anyhow!("report timeout must be greater than zero"));
        }
        if self.report.provider != Provider::Offline {
            url::Url::parse(&self.report.base_url)
                .map_err(|e| anyhow!("invalid report base url '{}': {}", self.report.base_url, e))?;
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let provider = Provider::default();
        Self {
            mode: ClassificationMode::default(),
            report: ReportSettings {
                provider,
                models: provider.default_models(),
                base_url: provider.default_base_url().to_string(),
                api_key: None,
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            detector: DetectorSettings {
                backend: "stub".to_string(),
                model_path: PathBuf::from(DEFAULT_MODEL_PATH),
                params: YoloParams::default(),
                stub_detections: String::new(),
            },
        }
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
