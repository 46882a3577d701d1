//! `advisor-lens init` - write the example user config

use anyhow::Result;
use console::style;

use crate::config::UserConfig;

pub fn run() -> Result<()> {
    let existed = UserConfig::user_config_path().is_some_and(|p| p.exists());
    let config_path = UserConfig::init_user_config()?;

    if existed {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }
    println!(
        "  {} Set {} or add a token to start scoring",
        style("→").dim(),
        style(crate::config::TOKEN_ENV).bold()
    );
    Ok(())
}
