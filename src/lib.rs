//! Crowd Monitor
//!
//! Counts people in a still image and turns the count into an alert.
//!
//! # Architecture
//!
//! One image flows through four stages, each behind its own module:
//!
//! 1. **Ingest** (`ingest`): load a local image into an RGB `Frame`.
//! 2. **Detect** (`detect`): run an object detector backend and collect
//!    labelled detections.
//! 3. **Classify** (`alert`): map the number of `"person"` detections onto a
//!    crowd status, alert level and recommended action. Pure and stateless.
//! 4. **Report** (`report`): ask a text-generation provider to phrase the
//!    result as a short, friendly narrative.
//!
//! # Module Structure
//!
//! - `alert`: classification policy and result types
//! - `config`: JSON config file + environment overrides
//! - `detect`: detector trait, backends, YOLO decoding
//! - `frame`: decoded frames and letterboxing
//! - `ingest`: image sources
//! - `pipeline`: `Monitor` wiring detection to classification and reports
//! - `render`: console output
//! - `report`: prompt, providers and model fallback
//! - `scene`: per-image summaries
//! - `ui`: stage progress on stderr

pub mod alert;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod scene;
pub mod ui;

pub use alert::{
    classify, classify_legacy, AlertClassification, AlertLevel, Classification,
    ClassificationMode, CrowdStatus, LegacyClassification, PersonCount,
};
pub use config::{MonitorConfig, Provider};
pub use detect::{BackendRegistry, Detection, DetectionResult, DetectorBackend, StubBackend};
pub use frame::Frame;
pub use ingest::ImageSource;
pub use pipeline::{Assessment, Monitor, SecurityReport};
pub use report::{FailureKind, Generated, ProviderError, TextGenerator};
pub use scene::{count_persons, SceneSummary};
