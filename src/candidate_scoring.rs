//! URL-text heuristics used to rank image candidates.

/// Image formats recognized by URL suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatKind {
    Png,
    Jpg,
    Jpeg,
    Webp,
    Svg,
}

impl ImageFormatKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
            Self::Webp => ".webp",
            Self::Svg => ".svg",
        }
    }

    pub fn is_raster(self) -> bool {
        !matches!(self, Self::Svg)
    }

    /// Preference bonus over the raster order png, jpg, jpeg, webp; earlier entries score higher.
    fn format_bonus(self) -> i32 {
        match self {
            Self::Png => 14,
            Self::Jpg => 13,
            Self::Jpeg => 12,
            Self::Webp => 11,
            Self::Svg => 5,
        }
    }
}

pub const SUPPORTED_IMAGE_FORMATS: [ImageFormatKind; 5] = [
    ImageFormatKind::Png,
    ImageFormatKind::Jpg,
    ImageFormatKind::Jpeg,
    ImageFormatKind::Webp,
    ImageFormatKind::Svg,
];

const KEYWORD_BONUSES: [(&str, i32); 5] = [
    ("cybersecurity", 12),
    ("cyber", 10),
    ("badge", 8),
    ("merit", 6),
    ("emblem", 6),
];

const KEYWORD_PENALTIES: [(&str, i32); 7] = [
    ("fondo", -20),
    ("blanco", -10),
    ("liso", -8),
    ("background", -12),
    ("hero", -8),
    ("logo", -15),
    ("desktop@2x", -10),
];

const HOSTING_HINTS: [(&str, i32); 4] = [
    ("wp-content", 2),
    ("uploads", 2),
    ("cdn", 2),
    ("scouting.org", 1),
];

const SIZE_HINTS_DESCENDING: [u32; 7] = [2048, 1536, 1024, 768, 512, 256, 128];

/// Classifies a URL by its trailing extension, ignoring case.
pub fn image_format_for_url(url: &str) -> Option<ImageFormatKind> {
    let lowered = url.to_ascii_lowercase();
    SUPPORTED_IMAGE_FORMATS
        .iter()
        .copied()
        .find(|format| lowered.ends_with(format.extension()))
}

pub fn has_supported_image_extension(url: &str) -> bool {
    image_format_for_url(url).is_some()
}

pub fn is_raster_url(url: &str) -> bool {
    image_format_for_url(url).is_some_and(ImageFormatKind::is_raster)
}

pub fn is_vector_url(url: &str) -> bool {
    image_format_for_url(url) == Some(ImageFormatKind::Svg)
}

fn table_score(lowered: &str, table: &[(&str, i32)]) -> i32 {
    table
        .iter()
        .filter(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, weight)| *weight)
        .sum()
}

fn size_hint_bonus(lowered: &str) -> i32 {
    SIZE_HINTS_DESCENDING
        .iter()
        .find(|size| lowered.contains(size.to_string().as_str()))
        .map(|size| (size / 128) as i32)
        .unwrap_or(0)
}

/// Scores a candidate URL; higher is a stronger preference.
pub fn score_url(url: &str) -> i32 {
    let lowered = url.to_ascii_lowercase();
    let format_bonus = image_format_for_url(&lowered)
        .map(ImageFormatKind::format_bonus)
        .unwrap_or(0);
    table_score(&lowered, &KEYWORD_BONUSES)
        + table_score(&lowered, &KEYWORD_PENALTIES)
        + table_score(&lowered, &HOSTING_HINTS)
        + format_bonus
        + size_hint_bonus(&lowered)
}
