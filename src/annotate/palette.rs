//! Named annotation colors.

use crate::workflow::AnnotationKind;

/// Palette keys accepted in configuration
pub const PALETTE: [(&str, [u8; 3]); 8] = [
    ("red", [255, 0, 0]),
    ("blue", [0, 0, 255]),
    ("green", [0, 255, 0]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [255, 0, 255]),
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
];

pub const WHITE: [u8; 3] = [255, 255, 255];

/// Look up a palette key (case-insensitive)
pub fn lookup(name: &str) -> Option<[u8; 3]> {
    let name = name.trim();
    PALETTE
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, rgb)| *rgb)
}

/// Color used for `kind` when the configured key is unknown
pub fn default_for(kind: AnnotationKind) -> [u8; 3] {
    let key = match kind {
        AnnotationKind::Arrow | AnnotationKind::Circle | AnnotationKind::Blur => "red",
        AnnotationKind::Box | AnnotationKind::Number => "blue",
        AnnotationKind::Highlight => "yellow",
        AnnotationKind::Text => "black",
    };
    lookup(key).unwrap_or(WHITE)
}

/// Resolve a configured key, falling back to the per-kind default
pub fn resolve(name: &str, kind: AnnotationKind) -> [u8; 3] {
    lookup(name).unwrap_or_else(|| default_for(kind))
}
