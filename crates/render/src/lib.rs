mod viewport;

pub use viewport::{ViewportDisplay, ViewportRenderer, ViewportShadingMode, ViewportStats};
