use serde::{Deserialize, Serialize};

use super::InvalidEnum;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(DocumentType {
    Deed => "deed",
    Mortgage => "mortgage",
    Lien => "lien",
    Judgment => "judgment",
    Release => "release",
    Unknown => "unknown",
});

impl DocumentType {
    /// The five recognised instrument categories, in scoring order.
    /// `Unknown` is deliberately absent.
    pub const CATEGORIES: [DocumentType; 5] = [
        DocumentType::Deed,
        DocumentType::Mortgage,
        DocumentType::Lien,
        DocumentType::Judgment,
        DocumentType::Release,
    ];

    pub fn is_known(&self) -> bool {
        !matches!(self, DocumentType::Unknown)
    }
}

str_enum!(ExtractionMethod {
    Text => "Text",
    Ocr => "OCR",
});

str_enum!(ClassificationMethod {
    Lexical => "lexical",
    Semantic => "semantic",
    // zero-page documents never reach a classifier
    Skipped => "skipped",
});
