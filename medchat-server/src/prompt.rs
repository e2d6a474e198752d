//! Question categories and their fixed prompt templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marks where the user's text goes in a template.
const SLOT: &str = "{X}";

/// The value did not name any of the five question categories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown question category '{0}'")]
pub struct InvalidCategoryError(pub String);

/// Language of templates, labels and placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale '{other}', expected 'es' or 'en'")),
        }
    }
}

/// The kind of question the user is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Symptoms,
    LabResults,
    History,
    TestSuggestions,
    DiseaseInfo,
}

impl Category {
    /// All categories in selector order.
    pub const ALL: [Category; 5] = [
        Category::Symptoms,
        Category::LabResults,
        Category::History,
        Category::TestSuggestions,
        Category::DiseaseInfo,
    ];

    /// Stable identifier used by the HTTP API.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Symptoms => "symptoms",
            Category::LabResults => "lab_results",
            Category::History => "history",
            Category::TestSuggestions => "test_suggestions",
            Category::DiseaseInfo => "disease_info",
        }
    }

    /// Name shown in the category selector.
    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Es, Category::Symptoms) => "Predicción de Enfermedades Basadas en Síntomas",
            (Locale::Es, Category::LabResults) => {
                "Predicción de Enfermedades Basadas en Resultados de Laboratorio"
            }
            (Locale::Es, Category::History) => "Predicción de Enfermedades Basadas en Antecedentes",
            (Locale::Es, Category::TestSuggestions) => "Sugerencias de Pruebas",
            (Locale::Es, Category::DiseaseInfo) => {
                "Información sobre Enfermedades y Resultados del Laboratorio Estándares"
            }
            (Locale::En, Category::Symptoms) => "Symptom-based disease prediction",
            (Locale::En, Category::LabResults) => "Lab-result-based disease prediction",
            (Locale::En, Category::History) => "History-based disease prediction",
            (Locale::En, Category::TestSuggestions) => "Test suggestions",
            (Locale::En, Category::DiseaseInfo) => "Standard disease and lab information",
        }
    }

    /// Text prefilled into the input box when the category is selected.
    pub fn placeholder(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Es, Category::Symptoms) => "Paciente ingresa con síntomas de...",
            (Locale::Es, Category::LabResults) => "Los resultados de laboratorio muestran...",
            (Locale::Es, Category::History) => "El paciente tiene antecedentes de...",
            (Locale::Es, Category::TestSuggestions) => {
                "El paciente presenta los siguientes síntomas y pruebas anteriores..."
            }
            (Locale::Es, Category::DiseaseInfo) => "La enfermedad en cuestión es...",
            (Locale::En, Category::Symptoms) => "Patient presents with symptoms of...",
            (Locale::En, Category::LabResults) => "The lab results show...",
            (Locale::En, Category::History) => "The patient has a history of...",
            (Locale::En, Category::TestSuggestions) => {
                "The patient presents the following symptoms and previous tests..."
            }
            (Locale::En, Category::DiseaseInfo) => "The disease in question is...",
        }
    }

    /// The template for this category, with exactly one `{X}` slot.
    pub fn template(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, Category::Symptoms) => {
                "Given the following medical description, list the 5 most probable diseases associated with these symptoms: {X}."
            }
            (Locale::En, Category::LabResults) => {
                "These are a patient's lab results: {X}. Based on these results, what specific levels should be reviewed and what conditions might relate to them?"
            }
            (Locale::En, Category::History) => {
                "Given the patient's history and description: {X}, what are the 5 most probable diseases to consider?"
            }
            (Locale::En, Category::TestSuggestions) => {
                "Given the following patient information: {X}, what are the 5 recommended tests to confirm a diagnosis?"
            }
            (Locale::En, Category::DiseaseInfo) => {
                "For the disease {X}, provide information on typical lab result ranges and how they vary by patient condition."
            }
            (Locale::Es, Category::Symptoms) => {
                "A partir de la siguiente descripción médica, enumera las 5 enfermedades más probables que podrían estar asociadas con estos síntomas: {X}."
            }
            (Locale::Es, Category::LabResults) => {
                "Los siguientes son los resultados de laboratorio de un paciente: {X}. Basándote en estos resultados, ¿qué niveles específicos deberían ser revisados y qué condiciones podrían estar relacionadas con estos resultados?"
            }
            (Locale::Es, Category::History) => {
                "Considerando la historia médica del paciente y la descripción proporcionada: {X}, ¿cuáles son las 5 enfermedades más probables que deberían ser consideradas?"
            }
            (Locale::Es, Category::TestSuggestions) => {
                "A partir de la siguiente información sobre un paciente: {X}, ¿cuáles son las 5 recomendaciones de pruebas que se deberían realizar para confirmar un diagnóstico?"
            }
            (Locale::Es, Category::DiseaseInfo) => {
                "Para la enfermedad {X}, proporciona información sobre los niveles de resultados de laboratorio típicos y cómo estos pueden variar según la condición del paciente."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = InvalidCategoryError;

    /// Accepts the slug or the display label in any locale, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.slug() == wanted
                    || c.label(Locale::Es).to_lowercase() == wanted
                    || c.label(Locale::En).to_lowercase() == wanted
            })
            .ok_or_else(|| InvalidCategoryError(s.to_string()))
    }
}

/// Insert `user_text` into the category's template.
pub fn build_prompt(category: Category, locale: Locale, user_text: &str) -> String {
    category.template(locale).replacen(SLOT, user_text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_has_exactly_one_slot() {
        for locale in [Locale::Es, Locale::En] {
            for category in Category::ALL {
                assert_eq!(category.template(locale).matches(SLOT).count(), 1, "{category}");
            }
        }
    }

    #[test]
    fn test_suggestion_prompt_from_spanish_label() {
        let category: Category = "Sugerencias de Pruebas".parse().unwrap();
        assert_eq!(
            build_prompt(category, Locale::En, "fiebre y tos"),
            "Given the following patient information: fiebre y tos, what are the 5 recommended tests to confirm a diagnosis?"
        );
        assert_eq!(
            build_prompt(category, Locale::Es, "fiebre y tos"),
            "A partir de la siguiente información sobre un paciente: fiebre y tos, ¿cuáles son las 5 recomendaciones de pruebas que se deberían realizar para confirmar un diagnóstico?"
        );
    }

    #[test]
    fn empty_and_filled_prompts_differ_only_in_the_slot() {
        for locale in [Locale::Es, Locale::En] {
            for category in Category::ALL {
                let empty = build_prompt(category, locale, "");
                let filled = build_prompt(category, locale, "X");
                let (prefix, suffix) = category.template(locale).split_once(SLOT).unwrap();
                assert_eq!(empty, format!("{prefix}{suffix}"));
                assert_eq!(filled, format!("{prefix}X{suffix}"));
            }
        }
    }

    #[test]
    fn user_text_containing_the_slot_is_not_expanded_again() {
        let prompt = build_prompt(Category::DiseaseInfo, Locale::En, "{X}");
        assert_eq!(prompt.matches(SLOT).count(), 1);
        assert!(prompt.starts_with("For the disease {X}, provide"));
    }

    #[test]
    fn slugs_and_labels_parse() {
        for category in Category::ALL {
            assert_eq!(category.slug().parse::<Category>(), Ok(category));
            assert_eq!(category.label(Locale::Es).parse::<Category>(), Ok(category));
            assert_eq!(category.label(Locale::En).parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn labels_match_regardless_of_case_in_both_locales() {
        assert_eq!("sugerencias de pruebas".parse::<Category>(), Ok(Category::TestSuggestions));
        assert_eq!(
            "PREDICCIÓN DE ENFERMEDADES BASADAS EN SÍNTOMAS".parse::<Category>(),
            Ok(Category::Symptoms)
        );
        assert_eq!(Category::History.label(Locale::En).to_uppercase().parse::<Category>(), Ok(Category::History));
        assert_eq!("Lab_Results".parse::<Category>(), Ok(Category::LabResults));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(
            "Diagnóstico por imagen".parse::<Category>(),
            Err(InvalidCategoryError("Diagnóstico por imagen".to_string()))
        );
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }
}
