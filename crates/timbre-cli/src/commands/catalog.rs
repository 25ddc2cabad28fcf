use anyhow::Result;
use timbre_search::Config;

use super::load_catalog;

/// Print catalog labels, optionally only those containing `filter`.
pub fn list_songs(config: &Config, filter: Option<&str>) -> Result<()> {
    let catalog = load_catalog(config)?;

    let labels = match filter {
        Some(needle) => catalog.search_labels(needle),
        None => catalog.labels(),
    };

    for label in &labels {
        println!("{label}");
    }

    if labels.is_empty() {
        println!("No songs match '{}'.", filter.unwrap_or_default());
    } else {
        log::info!("{} of {} songs", labels.len(), catalog.len());
    }

    Ok(())
}

/// Print the genre filter choices.
pub fn list_genres(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;

    println!("none");
    for genre in catalog.genres() {
        println!("{genre}");
    }

    Ok(())
}
