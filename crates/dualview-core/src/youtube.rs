//! YouTube video references
//!
//! Accepts watch URLs, short `youtu.be` links, `/embed/` and `/v/` paths, or a
//! bare 11-character id.

use url::Url;

const ID_LEN: usize = 11;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Leading 11 id characters of `s`, if there are that many
fn leading_id(s: &str) -> Option<String> {
    let id: String = s.chars().take_while(|c| is_id_char(*c)).take(ID_LEN).collect();
    (id.len() == ID_LEN).then_some(id)
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host.ends_with(".youtube.com")
}

/// Extract the video id from an operator-supplied reference
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.len() == ID_LEN && input.chars().all(is_id_char) {
        return Some(input.to_string());
    }

    let url = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        Url::parse(&format!("https://{}", input)).ok()?
    };
    let host = url.host_str()?;

    if host == "youtu.be" || host == "www.youtu.be" {
        let segment = url.path_segments()?.next()?;
        return leading_id(segment);
    }

    if !is_youtube_host(host) {
        return None;
    }

    let mut segments = url.path_segments()?;
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .filter(|(key, _)| key == "v")
            .find_map(|(_, value)| leading_id(&value)),
        "embed" | "v" => leading_id(segments.next()?),
        _ => None,
    }
}
