//! Model definitions.

pub mod capabilities;
pub mod groq;

pub use capabilities::ModelCapabilities;
pub use groq::GroqModel;
