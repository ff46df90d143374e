use anyhow::{Context, Result};
use mdhere::{Config, MarkdownRenderer, logging, page};
use std::fs;
use std::io::{self, Read, Write};

fn main() -> Result<()> {
    logging::init();

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    let preferences = config
        .preferences()
        .context("Failed to load preferences")?;

    let markdown = match config.input_path() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let renderer = MarkdownRenderer::new(preferences);
    let fragment = renderer
        .render(&markdown)
        .context("Failed to render markdown")?;

    let html = if config.standalone {
        page::standalone_document(&config.title, &fragment, preferences.math_enabled).into_string()
    } else {
        fragment
    };

    match &config.output {
        Some(path) => fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => io::stdout()
            .write_all(html.as_bytes())
            .context("Failed to write stdout")?,
    }

    Ok(())
}
