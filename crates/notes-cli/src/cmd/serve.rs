use anyhow::Context;
use notes_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, bind: Option<String>) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load .notes/config.yaml")?;
    for w in config.validate() {
        tracing::warn!("config: {}", w.message);
    }

    let port = port.unwrap_or(config.server.port);
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(notes_server::serve(root.to_path_buf(), config, &bind, port))
}
