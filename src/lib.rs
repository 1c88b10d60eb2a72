pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod image;
pub mod offline;
pub mod pipeline;
pub mod prompts;
pub mod tones;
pub mod types;
pub mod validation;

// Load env from a simple, standardized location resolution.
// This uses dotenvy::dotenv().ok() which loads .env if present and silently ignores if missing.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
