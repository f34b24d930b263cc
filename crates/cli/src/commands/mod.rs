pub mod ask;
pub mod config_cmd;
pub mod ingest;
pub mod query;
pub mod serve;

use synaxarion_config::AppConfig;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}
