use std::io::Cursor;

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use timbre_core::UploadedClip;

/// Fill an uploaded clip's title and artist from its embedded tags.
///
/// Tags are optional; a clip without readable tags is returned unchanged.
#[must_use]
pub fn tag_upload(clip: UploadedClip) -> UploadedClip {
    match read_tags(&clip.bytes) {
        Ok((title, artist)) => clip.with_tags(title, artist),
        Err(e) => {
            log::debug!("No readable tags in {}: {}", clip.file_name, e);
            clip
        }
    }
}

fn read_tags(bytes: &[u8]) -> Result<(Option<String>, Option<String>), Box<dyn std::error::Error>> {
    let tagged_file = Probe::new(Cursor::new(bytes)).guess_file_type()?.read()?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok((None, None));
    };

    Ok((
        tag.title().map(|s| s.to_string()),
        tag.artist().map(|s| s.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_bytes_leave_clip_unchanged() {
        let clip = UploadedClip::new("noise.bin", b"not an audio file".to_vec());
        let tagged = tag_upload(clip.clone());
        assert_eq!(tagged, clip);
    }
}
