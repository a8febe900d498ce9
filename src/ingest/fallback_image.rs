// src/ingest/fallback_image.rs
//! Category-keyed placeholder artwork.
//!
//! The image is a small SVG whose pattern and palette are derived from the
//! category name only, returned as a `data:` URL so the UI needs no network.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

const WIDTH: u32 = 120;
const HEIGHT: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Circuit,
    Constellation,
    Atoms,
    Shield,
    Radar,
    Chip,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Style {
    pattern: Pattern,
    primary: String,
    secondary: String,
}

fn style_for(category: &str) -> Style {
    let known = match category {
        "Military Space" => Some((Pattern::Circuit, "#00f2ff", "#0066cc")),
        "Space Industry" => Some((Pattern::Constellation, "#00ffcc", "#0099ff")),
        "Space Science" => Some((Pattern::Atoms, "#66ffcc", "#3366ff")),
        "Official Updates" => Some((Pattern::Shield, "#00ccff", "#3333cc")),
        "Defense Updates" => Some((Pattern::Radar, "#33ccff", "#0000cc")),
        "Space Technology" => Some((Pattern::Chip, "#00ffff", "#0033cc")),
        _ => None,
    };
    if let Some((pattern, primary, secondary)) = known {
        return Style {
            pattern,
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        };
    }

    // unknown categories: palette seeded from the name's digest
    let digest = hex::encode(Sha256::digest(category.as_bytes()));
    Style {
        pattern: Pattern::Cross,
        primary: format!("#{}", &digest[..6]),
        secondary: format!("#{}", &digest[6..12]),
    }
}

fn pattern_markup(pattern: Pattern, color: &str) -> String {
    let stroke = format!(r#"stroke="{color}" stroke-width="0.5" fill="none" filter="url(#glow)""#);
    let dot = |cx: u32, cy: u32, r: u32| {
        format!(r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{color}" filter="url(#glow)"/>"#)
    };
    match pattern {
        Pattern::Circuit => format!(
            r#"<path d="M10 10 H110 M10 45 H110 M10 80 H110" {stroke}/>{}{}{}"#,
            dot(30, 10, 2),
            dot(80, 45, 2),
            dot(60, 80, 2)
        ),
        Pattern::Constellation => format!(
            r#"{}{}{}<path d="M30 20 L80 40 L50 70" {stroke}/>"#,
            dot(30, 20, 1),
            dot(80, 40, 1),
            dot(50, 70, 1)
        ),
        Pattern::Atoms => format!(
            r#"<circle cx="60" cy="45" r="15" {stroke}/><ellipse cx="60" cy="45" rx="25" ry="10" {stroke}/>"#
        ),
        Pattern::Shield => {
            format!(r#"<path d="M60 10 L90 30 L80 70 L60 80 L40 70 L30 30 Z" {stroke}/>"#)
        }
        Pattern::Radar => format!(
            r#"<circle cx="60" cy="45" r="30" {stroke}/><path d="M60 45 L90 45 A30 30 0 0 0 60 15" {stroke}/>"#
        ),
        Pattern::Chip => format!(
            r#"<rect x="30" y="20" width="60" height="50" {stroke}/><path d="M30 35 H90 M30 55 H90" {stroke}/>"#
        ),
        Pattern::Cross => format!(r#"<path d="M10 10 L110 80 M110 10 L10 80" {stroke}/>"#),
    }
}

/// SVG document for `category`. Same input, same bytes.
pub fn fallback_svg(category: &str) -> String {
    let style = style_for(category);
    let body = pattern_markup(style.pattern, &style.primary);
    format!(
        concat!(
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<defs><linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%">"#,
            r#"<stop offset="0%" style="stop-color:{c1};stop-opacity:0.2"/>"#,
            r#"<stop offset="100%" style="stop-color:{c2};stop-opacity:0.1"/>"#,
            r#"</linearGradient><filter id="glow"><feGaussianBlur stdDeviation="1" result="glow"/>"#,
            r#"<feMerge><feMergeNode in="glow"/><feMergeNode in="glow"/><feMergeNode in="SourceGraphic"/></feMerge>"#,
            r#"</filter></defs><rect width="100%" height="100%" fill="url(#bg)"/>{body}</svg>"#
        ),
        w = WIDTH,
        h = HEIGHT,
        c1 = style.primary,
        c2 = style.secondary,
        body = body,
    )
}

/// `data:image/svg+xml;base64,...` URL for `category`.
pub fn fallback_image_url(category: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(fallback_svg(category).as_bytes())
    )
}
