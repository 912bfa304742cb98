//! User-facing strings for the languages the engine supports.

use crate::config::language_for_locale;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strings {
    pub ok: &'static str,
    pub cancel: &'static str,
    pub detach: &'static str,
    pub cancel_confirm_title: &'static str,
    pub cancel_confirm_description: &'static str,
}

const EN: Strings = Strings {
    ok: "OK",
    cancel: "Cancel",
    detach: "Detach",
    cancel_confirm_title: "Discard changes?",
    cancel_confirm_description: "Changes made in the editor will be lost.",
};

const DA: Strings = Strings {
    ok: "OK",
    cancel: "Annuller",
    detach: "Frigør",
    cancel_confirm_title: "Kassér ændringer?",
    cancel_confirm_description: "Ændringer foretaget i editoren vil gå tabt.",
};

const DE: Strings = Strings {
    ok: "OK",
    cancel: "Abbrechen",
    detach: "Abtrennen",
    cancel_confirm_title: "Änderungen verwerfen?",
    cancel_confirm_description: "Im Editor vorgenommene Änderungen gehen verloren.",
};

const NO: Strings = Strings {
    ok: "OK",
    cancel: "Avbryt",
    detach: "Løsne",
    cancel_confirm_title: "Forkaste endringer?",
    cancel_confirm_description: "Endringer gjort i editoren vil gå tapt.",
};

/// Strings for a locale such as `da-DK`, falling back to English.
pub fn strings(locale: &str) -> &'static Strings {
    match language_for_locale(locale) {
        "da" => &DA,
        "de" => &DE,
        "no" => &NO,
        _ => &EN,
    }
}

impl Strings {
    /// Message shown before discarding changes made in the detached editor.
    pub fn cancel_confirm_message(&self) -> String {
        format!(
            "{}<br><br>{}",
            self.cancel_confirm_title, self.cancel_confirm_description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_fallback() {
        assert_eq!(strings("de-AT").cancel, "Abbrechen");
        assert_eq!(strings("fr-FR"), &EN);
        assert_eq!(
            strings("en-US").cancel_confirm_message(),
            "Discard changes?<br><br>Changes made in the editor will be lost."
        );
    }
}
