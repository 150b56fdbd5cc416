pub mod settings;

pub use settings::{CanvasSettings, MessageSettings, Settings};
