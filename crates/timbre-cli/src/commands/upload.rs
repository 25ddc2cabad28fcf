use std::path::Path;

use anyhow::{Context, Result};
use timbre_core::UploadedClip;
use timbre_search::{Config, SearchRequest};

use super::{build_workflow, render, SearchOptions};

/// Embed an audio file and print the catalog songs nearest to it.
pub async fn run_upload(config: &Config, file: &Path, options: SearchOptions) -> Result<()> {
    if config.model_endpoint.is_none() {
        anyhow::bail!(
            "Uploads need a model server.\n\nSet model_endpoint in the config file or TIMBRE_MODEL_ENDPOINT."
        );
    }

    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let clip = UploadedClip::new(file_name, bytes);

    let workflow = build_workflow(config, options.audio)?;
    let request = options.apply(config, SearchRequest::upload(clip));
    let resolution = workflow.run(request).await?;

    render::print_seed(&resolution);
    render::print_genres(&resolution);
    render::print_results(&resolution);

    Ok(())
}
