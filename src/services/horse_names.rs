//! Horse name validation.
//!
//! Two checks live here:
//! - [`validate_horse_names`], the per-field rule used when an application is
//!   created: the Russian name may only contain Cyrillic letters, the English
//!   name only ASCII Latin letters, and at least one of them must be present.
//! - [`detect_language`], a stricter single-string classifier that rejects
//!   names mixing Cyrillic and Latin letters. It is not part of the creation
//!   path.

use unicode_script::{Script, UnicodeScript};

use crate::error::{AppError, AppResult};

/// Script a horse name is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLanguage {
    Russian,
    English,
}

impl NameLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Russian => "ru",
            Self::English => "en",
        }
    }
}

/// Why [`detect_language`] could not classify a name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    #[error("mixed latin and cyrillic characters")]
    Mixed,

    #[error("cannot detect language")]
    Undetected,
}

/// Validate the pair of horse names supplied at creation time.
///
/// Both values are trimmed. Blank values come back as `None`.
pub fn validate_horse_names(
    ru: Option<&str>,
    en: Option<&str>,
) -> AppResult<(Option<String>, Option<String>)> {
    let ru = ru.map(str::trim).filter(|s| !s.is_empty());
    let en = en.map(str::trim).filter(|s| !s.is_empty());

    if ru.is_none() && en.is_none() {
        return Err(AppError::InvalidInput(
            "At least one of horse_name_ru or horse_name_en is required".to_string(),
        ));
    }

    if let Some(name) = ru
        && !is_cyrillic(name)
    {
        return Err(AppError::InvalidInput(
            "horse_name_ru must contain only Cyrillic characters".to_string(),
        ));
    }

    if let Some(name) = en
        && !is_latin(name)
    {
        return Err(AppError::InvalidInput(
            "horse_name_en must contain only Latin characters".to_string(),
        ));
    }

    Ok((ru.map(str::to_string), en.map(str::to_string)))
}

/// Every character is a basic Cyrillic letter (А..я) or Ё/ё.
pub fn is_cyrillic(s: &str) -> bool {
    s.chars()
        .all(|c| ('А'..='я').contains(&c) || c == 'Ё' || c == 'ё')
}

/// Every character is an ASCII Latin letter.
pub fn is_latin(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Classify a name by script.
///
/// Characters are classified by their Unicode Script property. Whitespace,
/// hyphens and apostrophes are ignored, as is anything outside the Cyrillic
/// and Latin scripts. A name containing letters from both
/// scripts is rejected as [`LanguageError::Mixed`].
pub fn detect_language(s: &str) -> Result<NameLanguage, LanguageError> {
    let mut has_cyrillic = false;
    let mut has_latin = false;

    for c in s.chars() {
        if c.is_whitespace() || c == '-' || c == '\'' {
            continue;
        }
        if is_cyrillic_script(c) {
            has_cyrillic = true;
        } else if is_latin_script(c) {
            has_latin = true;
        }
        if has_cyrillic && has_latin {
            return Err(LanguageError::Mixed);
        }
    }

    if has_cyrillic {
        Ok(NameLanguage::Russian)
    } else if has_latin {
        Ok(NameLanguage::English)
    } else {
        Err(LanguageError::Undetected)
    }
}

fn is_cyrillic_script(c: char) -> bool {
    c.script() == Script::Cyrillic
}

fn is_latin_script(c: char) -> bool {
    c.script() == Script::Latin
}
