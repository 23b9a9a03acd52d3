//! Static UI strings for the supported languages. The language is chosen once
//! at startup from the process locale.

use client_core::stats::DigitGrouping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn from_locale_tag(tag: &str) -> Self {
        if tag.trim().to_ascii_lowercase().starts_with("es") {
            Self::Es
        } else {
            Self::En
        }
    }

    pub fn digit_grouping(self) -> DigitGrouping {
        match self {
            Self::En => DigitGrouping::Comma,
            Self::Es => DigitGrouping::Period,
        }
    }
}

pub fn detect_language() -> Language {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .map(|tag| Language::from_locale_tag(&tag))
        .unwrap_or_default()
}

const EN: &[(&str, &str)] = &[
    ("header-subtitle", "Transform your embroidery designs instantly."),
    ("dropzone-title", "Drag & Drop your file here"),
    ("dropzone-subtitle", "or click to browse (.pes, .dst, .jef, .exp, etc.)"),
    ("convert-label", "Convert to:"),
    ("convert-btn", "Convert File"),
    ("download-btn", "Download Converted File"),
    ("retry-btn", "Try Again"),
    ("converting-btn", "Converting..."),
    ("status-success", "Conversion successful! Ready to download."),
    (
        "color-warning",
        "Note: DST/EXP formats save stitch data perfectly, but colors may look different on your machine (it uses default palettes). This is normal!",
    ),
    ("preview-label", "Design Preview:"),
    ("stat-stitches", "Stitches"),
    ("stat-colors", "Colors"),
    ("stat-changes", "Color changes"),
    ("stat-width", "Width"),
    ("stat-height", "Height"),
    ("unit-imperial", "Show inches"),
    ("saved-to", "Saved to"),
];

const ES: &[(&str, &str)] = &[
    ("header-subtitle", "Transforma tus diseños de bordado al instante."),
    ("dropzone-title", "Arrastra y suelta tu archivo aquí"),
    ("dropzone-subtitle", "o haz clic para buscar (.pes, .dst, .jef, .exp, etc.)"),
    ("convert-label", "Convertir a:"),
    ("convert-btn", "Convertir Archivo"),
    ("download-btn", "Descargar Archivo Convertido"),
    ("retry-btn", "Intentar de Nuevo"),
    ("converting-btn", "Convirtiendo..."),
    ("status-success", "¡Conversión exitosa! Listo para descargar."),
    (
        "color-warning",
        "Nota: Los formatos DST/EXP guardan las puntadas perfectamente, pero los colores pueden verse distintos en tu máquina. ¡Es normal!",
    ),
    ("preview-label", "Vista Previa del Diseño:"),
    ("stat-stitches", "Puntadas"),
    ("stat-colors", "Colores"),
    ("stat-changes", "Cambios de color"),
    ("stat-width", "Ancho"),
    ("stat-height", "Alto"),
    ("unit-imperial", "Mostrar pulgadas"),
    ("saved-to", "Guardado en"),
];

/// Looks up `key`, falling back to English and then to the key itself.
pub fn tr(language: Language, key: &'static str) -> &'static str {
    let table = match language {
        Language::En => EN,
        Language::Es => ES,
    };
    lookup(table, key)
        .or_else(|| lookup(EN, key))
        .unwrap_or(key)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_locales_select_spanish() {
        assert_eq!(Language::from_locale_tag("es_MX.UTF-8"), Language::Es);
        assert_eq!(Language::from_locale_tag("ES"), Language::Es);
        assert_eq!(Language::from_locale_tag("en_US.UTF-8"), Language::En);
        assert_eq!(Language::from_locale_tag("C"), Language::En);
    }

    #[test]
    fn every_english_key_has_a_spanish_entry() {
        for (key, _) in EN {
            assert!(lookup(ES, key).is_some(), "missing es entry for {key}");
        }
    }

    #[test]
    fn unknown_keys_fall_back_to_the_key() {
        assert_eq!(tr(Language::Es, "convert-btn"), "Convertir Archivo");
        assert_eq!(tr(Language::Es, "no-such-key"), "no-such-key");
    }
}
