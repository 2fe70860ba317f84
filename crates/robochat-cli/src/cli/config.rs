//! `robochat config`: show the effective configuration.

use robochat_infra::config::render_config;
use robochat_types::config::RobotConfig;

/// Print the configuration as TOML. The API key is never printed.
pub fn show_config(config: &RobotConfig) -> anyhow::Result<()> {
    let rendered = render_config(config)?;
    print!("{rendered}");
    if config.provider.api_key.is_some() {
        println!("# provider.api_key is set (hidden)");
    }
    Ok(())
}
