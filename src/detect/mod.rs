mod backend;
mod backends;
mod labels;
mod registry;
mod result;
pub mod yolo;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use labels::{class_name, COCO_CLASSES};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, DetectionResult, PERSON_LABEL};
