use crate::filename::FileName;
use crate::state::PairingIndex;
use serde::{Deserialize, Serialize};

const TRANSCODE_MARKER: &str = "TS";
const TRANSCODED_MEDIA: &str = "mp4";
const HEIC: &str = "HEIC";

/// Which rename rule produced a verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RenameRule {
    TranscodedVideo,
    TranscodedVideoSidecar,
    HeicSidecarPlain,
    HeicSidecarSupplemental,
    PairedHeic,
    MisnamedWebp,
    MisnamedWebpSidecar,
}

/// Outcome of classifying one file name. Targets are bare file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameVerdict {
    NoMatch,
    TranscodedVideo { target: String },
    TranscodedVideoSidecar { target: String },
    HeicSidecarPlain { target: String, pairing_key: String },
    HeicSidecarSupplemental { target: String, pairing_key: String },
    PairedHeic { target: String },
    MisnamedWebp { target: String, base: String },
    MisnamedWebpSidecar { target: String },
}

impl RenameVerdict {
    pub fn is_match(&self) -> bool {
        !matches!(self, RenameVerdict::NoMatch)
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            RenameVerdict::NoMatch => None,
            RenameVerdict::TranscodedVideo { target }
            | RenameVerdict::TranscodedVideoSidecar { target }
            | RenameVerdict::HeicSidecarPlain { target, .. }
            | RenameVerdict::HeicSidecarSupplemental { target, .. }
            | RenameVerdict::PairedHeic { target }
            | RenameVerdict::MisnamedWebp { target, .. }
            | RenameVerdict::MisnamedWebpSidecar { target } => Some(target.as_str()),
        }
    }

    pub fn rule(&self) -> Option<RenameRule> {
        let rule = match self {
            RenameVerdict::NoMatch => return None,
            RenameVerdict::TranscodedVideo { .. } => RenameRule::TranscodedVideo,
            RenameVerdict::TranscodedVideoSidecar { .. } => RenameRule::TranscodedVideoSidecar,
            RenameVerdict::HeicSidecarPlain { .. } => RenameRule::HeicSidecarPlain,
            RenameVerdict::HeicSidecarSupplemental { .. } => RenameRule::HeicSidecarSupplemental,
            RenameVerdict::PairedHeic { .. } => RenameRule::PairedHeic,
            RenameVerdict::MisnamedWebp { .. } => RenameRule::MisnamedWebp,
            RenameVerdict::MisnamedWebpSidecar { .. } => RenameRule::MisnamedWebpSidecar,
        };
        Some(rule)
    }
}

/// Rules that need neither pairing state nor a type probe, in priority order.
pub fn classify_name(name: &str) -> RenameVerdict {
    let rules: [fn(&str) -> RenameVerdict; 3] = [
        classify_transcoded_video,
        classify_transcoded_sidecar,
        classify_heic_sidecar,
    ];
    rules
        .iter()
        .map(|rule| rule(name))
        .find(RenameVerdict::is_match)
        .unwrap_or(RenameVerdict::NoMatch)
}

/// `clip.TS.mp4` -> `clip.mp4`.
pub fn classify_transcoded_video(name: &str) -> RenameVerdict {
    if name.contains("json") {
        return RenameVerdict::NoMatch;
    }

    let parsed = FileName::parse(name);
    let Some(pos) = parsed
        .extensions
        .windows(2)
        .position(|pair| pair[0] == TRANSCODE_MARKER && pair[1] == TRANSCODED_MEDIA)
    else {
        return RenameVerdict::NoMatch;
    };

    let mut extensions = parsed.extensions.clone();
    extensions.remove(pos);
    RenameVerdict::TranscodedVideo {
        target: parsed.with_extensions(extensions).to_name(),
    }
}

/// `clip.TS.mp4.json` and `clip.TS.mp4.supplemental-metadata.json` -> `clip.mp4.json`.
pub fn classify_transcoded_sidecar(name: &str) -> RenameVerdict {
    if !name.contains(".TS.") || !name.contains("json") {
        return RenameVerdict::NoMatch;
    }

    let parsed = FileName::parse(name);
    let exts: Vec<&str> = parsed.extensions.iter().map(String::as_str).collect();
    let matched = match exts.as_slice() {
        [TRANSCODE_MARKER, TRANSCODED_MEDIA, "json"] => true,
        [TRANSCODE_MARKER, TRANSCODED_MEDIA, marker, "json"] => marker.contains("supplemental"),
        _ => false,
    };
    if !matched {
        return RenameVerdict::NoMatch;
    }

    let target = parsed
        .with_extensions(vec![TRANSCODED_MEDIA.to_string(), "json".to_string()])
        .to_name();
    RenameVerdict::TranscodedVideoSidecar { target }
}

/// `IMG.HEIC.json` -> `IMG.jpg.json`, `IMG.HEIC.supplemental-metadata.json` -> `IMG.jpg.json`.
pub fn classify_heic_sidecar(name: &str) -> RenameVerdict {
    if !name.ends_with(".json") || !name.contains(HEIC) {
        return RenameVerdict::NoMatch;
    }

    let parsed = FileName::parse(name);
    let Some(pairing_key) = parsed.trimmed_name() else {
        return RenameVerdict::NoMatch;
    };
    let Some(second_to_last) = parsed.second_to_last() else {
        return RenameVerdict::NoMatch;
    };

    let mut extensions = parsed.extensions.clone();
    if second_to_last.contains("supple") {
        let len = extensions.len();
        extensions.remove(len - 2);
        let len = extensions.len();
        if len < 2 || extensions[len - 2] != HEIC {
            return RenameVerdict::NoMatch;
        }
        extensions[len - 2] = "jpg".to_string();
        return RenameVerdict::HeicSidecarSupplemental {
            target: parsed.with_extensions(extensions).to_name(),
            pairing_key,
        };
    }

    if second_to_last == HEIC {
        let len = extensions.len();
        extensions[len - 2] = "jpg".to_string();
        return RenameVerdict::HeicSidecarPlain {
            target: parsed.with_extensions(extensions).to_name(),
            pairing_key,
        };
    }

    RenameVerdict::NoMatch
}

/// `IMG.HEIC` -> `IMG.jpg`, only once its sidecar was renamed.
pub fn classify_paired_heic(name: &str, pairing: &PairingIndex) -> RenameVerdict {
    let Some(stem) = name.strip_suffix(".HEIC") else {
        return RenameVerdict::NoMatch;
    };
    let Some(key) = FileName::parse(name).trimmed_name() else {
        return RenameVerdict::NoMatch;
    };
    if !pairing.has_heic(&key) {
        return RenameVerdict::NoMatch;
    }

    RenameVerdict::PairedHeic {
        target: format!("{stem}.jpg"),
    }
}

/// Cheap pre-filter deciding whether a file is worth a type probe.
pub fn is_webp_candidate(name: &str) -> bool {
    FileName::parse(name)
        .last_extension()
        .map(|ext| ext.eq_ignore_ascii_case("jpg"))
        .unwrap_or(false)
}

/// `IMG.jpg` whose content is WEBP -> `IMG.webp`.
pub fn classify_misnamed_webp(name: &str, file_type: &str) -> RenameVerdict {
    if !is_webp_candidate(name) || !file_type.contains("WEBP") {
        return RenameVerdict::NoMatch;
    }

    let parsed = FileName::parse(name);
    let mut extensions = parsed.extensions.clone();
    if let Some(last) = extensions.last_mut() {
        *last = "webp".to_string();
    }
    RenameVerdict::MisnamedWebp {
        target: parsed.with_extensions(extensions).to_name(),
        base: parsed.base,
    }
}

/// `IMG.jpg.json` -> `IMG.webp.json` when `IMG` was renamed to WEBP.
pub fn classify_webp_sidecar(name: &str, pairing: &PairingIndex) -> RenameVerdict {
    if !name.ends_with("json") {
        return RenameVerdict::NoMatch;
    }

    let parsed = FileName::parse(name);
    if !pairing.has_webp(&parsed.base) {
        return RenameVerdict::NoMatch;
    }

    let mut extensions = parsed.extensions.clone();
    let last = extensions.len().saturating_sub(1);
    let Some(jpg) = extensions[..last]
        .iter_mut()
        .find(|ext| ext.eq_ignore_ascii_case("jpg"))
    else {
        return RenameVerdict::NoMatch;
    };
    *jpg = "webp".to_string();

    RenameVerdict::MisnamedWebpSidecar {
        target: parsed.with_extensions(extensions).to_name(),
    }
}
