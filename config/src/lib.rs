pub mod crypto;
pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::{Settings, UploadSettings};

/// Load environment variables from .env files.
///
/// Values from ./.env (project directory) take precedence over ~/.env (home
/// directory), and both lose to variables already set in the process
/// environment. Call this before parsing CLI args so clap `env` fallbacks
/// see the values.
pub fn load_env_file() {
    // dotenv never overwrites a variable that is already set, so the file
    // with the highest precedence is loaded first.
    dotenv::dotenv().ok();

    if let Some(home) = dirs::home_dir() {
        dotenv::from_path(home.join(".env")).ok();
    }
}
