pub mod analysis;
pub mod gemini;
