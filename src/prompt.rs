//! Output languages and the prompts sent to the model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Language the model should answer (and the narrator should speak) in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish
    #[default]
    Es,
    /// English
    En,
    /// French
    Fr,
}

impl Language {
    /// All supported languages, in selector order
    pub const ALL: [Self; 3] = [Self::Es, Self::En, Self::Fr];

    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Human-readable name, in the language itself
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::Es => "español",
            Self::En => "English",
            Self::Fr => "français",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" | "espanol" => Ok(Self::Es),
            "en" | "english" => Ok(Self::En),
            "fr" | "french" | "français" | "francais" => Ok(Self::Fr),
            other => Err(Error::Config(format!("unsupported language: {other}"))),
        }
    }
}

/// Prompt asking for a brief description of the attached drawing
#[must_use]
pub const fn describe(language: Language) -> &'static str {
    match language {
        Language::Es => "Describe brevemente el contenido de este dibujo en español.",
        Language::En => "Briefly describe the content of this drawing in English.",
        Language::Fr => "Décris brièvement le contenu de ce dessin en français.",
    }
}

/// Prompt asking for a short children's story built on a prior description
///
/// The description is embedded verbatim.
#[must_use]
pub fn story(description: &str, language: Language) -> String {
    match language {
        Language::Es => format!(
            "Basándote en esta descripción: '{description}', crea una historia infantil breve \
             y entretenida en español."
        ),
        Language::En => format!(
            "Based on this description: '{description}', write a short and entertaining \
             children's story in English."
        ),
        Language::Fr => format!(
            "À partir de cette description : '{description}', écris une courte histoire \
             divertissante pour enfants en français."
        ),
    }
}
