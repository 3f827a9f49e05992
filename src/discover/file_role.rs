use regex::Regex;
use std::sync::LazyLock;
use strum::{Display, EnumIter};

static RGB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pcd([0-9]{4})r\.png$").expect("static regex"));
static POSITIVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pcd([0-9]{4})cpos\.txt$").expect("static regex"));
static NEGATIVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pcd([0-9]{4})cneg\.txt$").expect("static regex"));

/// The three kinds of per-sample files in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FileRole {
    /// `pcdXXXXr.png`
    #[strum(serialize = "rgb")]
    Rgb,

    /// `pcdXXXXcpos.txt`
    #[strum(serialize = "positive")]
    Positive,

    /// `pcdXXXXcneg.txt`
    #[strum(serialize = "negative")]
    Negative,
}

impl FileRole {
    pub fn pattern(&self) -> &'static Regex {
        match self {
            FileRole::Rgb => &RGB_PATTERN,
            FileRole::Positive => &POSITIVE_PATTERN,
            FileRole::Negative => &NEGATIVE_PATTERN,
        }
    }

    /// Embedded 4-digit index if `file_name` follows this role's naming convention.
    pub fn embedded_index(&self, file_name: &str) -> Option<u32> {
        self.pattern()
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
