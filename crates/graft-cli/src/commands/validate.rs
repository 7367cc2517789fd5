//! `graft validate`: check the config and summarize the declaration feed.

use anyhow::Result;
use graft_config::Config;

pub(crate) fn run(config: &Config) -> Result<()> {
    let declarations = config.declarations()?;
    for declaration in &declarations {
        let scripts = declaration.content_scripts.len();
        let payloads: usize = declaration
            .content_scripts
            .iter()
            .map(|cs| cs.js.len().saturating_add(cs.css.len()))
            .sum();
        println!(
            "{}: {scripts} content script(s), {payloads} payload(s)",
            declaration.extension_id
        );
    }
    println!("OK: {} extension(s)", declarations.len());
    Ok(())
}
