//! `chorus config`: print the effective configuration.

use console::style;

use chorus_infra::config::{CONFIG_FILE, render_config};

use crate::state::AppState;

pub fn show_config(state: &AppState) -> anyhow::Result<()> {
    let rendered = render_config(&state.config)?;
    println!(
        "{}",
        style(format!(
            "# effective configuration ({})",
            state.data_dir.join(CONFIG_FILE).display()
        ))
        .dim()
    );
    println!("{rendered}");
    Ok(())
}
