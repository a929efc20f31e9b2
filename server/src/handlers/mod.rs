pub mod analysis_handlers;
pub mod gemini_handlers;
