use timbre_core::Seed;
use timbre_search::{PlaybackStatus, Resolution};

/// Where the user can listen to a song, as a single line.
pub fn playback_line(status: &PlaybackStatus, audio_url: &str) -> String {
    match status {
        PlaybackStatus::Ready(source) => source.to_string(),
        PlaybackStatus::Unavailable(message) => format!("unavailable ({message})"),
        PlaybackStatus::NotResolved => audio_url.to_string(),
    }
}

pub fn print_seed(resolution: &Resolution) {
    match &resolution.seed {
        Seed::Catalog(record) => {
            println!("\n🎵 {} [{}]", record.display_label, record.genre);
            println!(
                "   {}",
                playback_line(&resolution.seed_playback, &record.audio_url)
            );
        }
        Seed::Upload(clip) => {
            println!("\n🎵 {} (uploaded)", clip.label());
            if resolution.seed_playback != PlaybackStatus::NotResolved {
                println!(
                    "   {}",
                    playback_line(&resolution.seed_playback, &clip.file_name)
                );
            }
        }
    }
}

pub fn print_genres(resolution: &Resolution) {
    let Some((best, rest)) = resolution.genres.split_first() else {
        println!("\n  Genre prediction unavailable.");
        return;
    };

    println!("\n  Predicted genre: {} ({:.1}%)", best.label, best.score * 100.0);
    for other in rest {
        println!("    {:<20} {:>5.1}%", other.label, other.score * 100.0);
    }
}

pub fn print_results(resolution: &Resolution) {
    let filter = resolution.genre_filter.as_deref().unwrap_or("any genre");
    println!(
        "\nSimilar songs ({filter}, limit {}):\n",
        resolution.limit
    );

    if resolution.entries.is_empty() {
        println!("  No matches.");
        return;
    }

    println!("  {:>3}  {:>6}  {:<44} {:<14} Audio", "#", "Score", "Song", "Genre");
    for entry in &resolution.entries {
        let result = &entry.result;
        println!(
            "  {:>3}  {:>6.4}  {:<44} {:<14} {}",
            result.rank,
            result.score,
            truncate(&result.record.display_label(), 44),
            truncate(&result.record.genre, 14),
            playback_line(&entry.playback, &result.record.audio_url)
        );
    }
}

/// Cut `text` to at most `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use timbre_audio::PlaybackSource;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("ééééé", 5), "ééééé");
    }

    #[test]
    fn test_playback_line() {
        let url = "https://audio.example/1.m4a";
        assert_eq!(playback_line(&PlaybackStatus::NotResolved, url), url);
        let local = PlaybackStatus::Ready(PlaybackSource::Local(PathBuf::from("/tmp/a.wav")));
        assert!(playback_line(&local, url).contains("re-encoded"));
        let failed = PlaybackStatus::Unavailable("404".to_string());
        assert_eq!(playback_line(&failed, url), "unavailable (404)");
    }
}
