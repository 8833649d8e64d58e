//! CSS colour string parsing
//!
//! A small, deliberately incomplete CSS colour parser covering the forms the
//! annotation JSON actually uses: hex (`#rgb`, `#rrggbb`, `#rrggbbaa`),
//! `rgb()`/`rgba()` functional notation, and the common named colours.

use image::Rgba;

/// Parses a CSS colour string into an opaque RGBA pixel
///
/// Unknown or malformed input falls back to opaque black, matching the
/// annotation schema's own default for a missing `fillColor`.
pub fn parse_color(value: &str) -> Rgba<u8> {
    let trimmed = value.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        if let Some(rgba) = parse_hex(hex) {
            return rgba;
        }
    }

    if let Some(rgba) = parse_functional(trimmed) {
        return rgba;
    }

    if let Some(rgba) = named_color(&trimmed.to_ascii_lowercase()) {
        return rgba;
    }

    Rgba([0, 0, 0, 255])
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let expand = |c: char| -> Option<u8> {
        let v = c.to_digit(16)?;
        Some((v * 16 + v) as u8)
    };

    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = expand(chars.next()?)?;
            let g = expand(chars.next()?)?;
            let b = expand(chars.next()?)?;
            Some(Rgba([r, g, b, 255]))
        }
        6 | 8 => {
            let byte_at = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            let r = byte_at(0)?;
            let g = byte_at(2)?;
            let b = byte_at(4)?;
            let a = if hex.len() == 8 { byte_at(6)? } else { 255 };
            Some(Rgba([r, g, b, a]))
        }
        _ => None,
    }
}

fn parse_functional(value: &str) -> Option<Rgba<u8>> {
    let lower = value.to_ascii_lowercase();
    let inner = if let Some(rest) = lower.strip_prefix("rgba(") {
        rest.strip_suffix(')')?
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        rest.strip_suffix(')')?
    } else {
        return None;
    };

    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
    if parts.len() < 3 {
        return None;
    }

    let channel = |s: &str| -> Option<u8> { s.parse::<f64>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8) };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = if parts.len() >= 4 {
        parts[3].parse::<f64>().ok().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8).unwrap_or(255)
    } else {
        255
    };

    Some(Rgba([r, g, b, a]))
}

fn named_color(name: &str) -> Option<Rgba<u8>> {
    let rgb = match name {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "transparent" => return Some(Rgba([0, 0, 0, 0])),
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#000"), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("#ff0000"), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("#00ff0080"), Rgba([0, 255, 0, 0x80]));
    }

    #[test]
    fn parses_functional_forms() {
        assert_eq!(parse_color("rgb(255, 0, 0)"), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("rgba(0, 0, 255, 0.5)"), Rgba([0, 0, 255, 128]));
    }

    #[test]
    fn parses_named_colors() {
        assert_eq!(parse_color("black"), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_color("white"), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn malformed_input_falls_back_to_black() {
        assert_eq!(parse_color("not-a-color"), Rgba([0, 0, 0, 255]));
    }
}
