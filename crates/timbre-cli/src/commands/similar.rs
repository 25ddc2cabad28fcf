use anyhow::Result;
use timbre_core::model::LABEL_SEPARATOR;
use timbre_search::{Config, SearchRequest};

use super::{build_workflow, render, SearchOptions};

/// Search for neighbours of a catalog song and print them.
pub async fn run_similar(config: &Config, label: String, options: SearchOptions) -> Result<()> {
    let workflow = build_workflow(config, options.audio)?;
    let request = options.apply(config, SearchRequest::label(label.as_str()));

    let resolution = match workflow.run(request).await {
        Ok(resolution) => resolution,
        Err(e) if e.is_lookup_failure() => {
            let needle = label
                .rsplit_once(LABEL_SEPARATOR)
                .map_or(label.as_str(), |(_, name)| name);
            let suggestions = workflow.catalog().search_labels(needle);
            if !suggestions.is_empty() {
                eprintln!("Songs with similar labels:");
                for suggestion in suggestions.iter().take(10) {
                    eprintln!("  {suggestion}");
                }
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    render::print_seed(&resolution);
    render::print_results(&resolution);

    Ok(())
}
