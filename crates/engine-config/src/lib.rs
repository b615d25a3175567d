pub mod error;
pub mod presets;
pub mod settings;
