//! Tone ("wildcard") and archetype catalogs: a fixed, closed set of stylistic
//! modifiers and causal-angle templates, plus the selection and prompt-layering
//! logic around them.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;

use crate::types::{Archetype, Category, ToneVariant};

/// The five tone variants. Immutable at runtime.
pub static TONE_VARIANTS: Lazy<Vec<ToneVariant>> = Lazy::new(|| {
    vec![
        ToneVariant {
            name: "funny".into(),
            tone_instruction:
                "Use humor similar to Douglas Adams - witty, absurd, but scientifically accurate"
                    .into(),
            description: "Entertaining and humorous approach with clever wordplay".into(),
        },
        ToneVariant {
            name: "scientific".into(),
            tone_instruction:
                "Focus on quantum mechanics, biology, or physics with academic rigor".into(),
            description: "Technical and precise with scientific terminology".into(),
        },
        ToneVariant {
            name: "poetic".into(),
            tone_instruction: "Frame causality in terms of human emotion and cosmic scale".into(),
            description: "Lyrical and metaphorical with emotional resonance".into(),
        },
        ToneVariant {
            name: "childlike".into(),
            tone_instruction: "Use simple language with boundless curiosity and wonder".into(),
            description: "Simple, wonder-filled questions that spark imagination".into(),
        },
        ToneVariant {
            name: "philosophical".into(),
            tone_instruction: "Deep existential questioning about meaning and purpose".into(),
            description: "Profound questions about existence and meaning".into(),
        },
    ]
});

/// Question archetypes biasing prompt phrasing. Never validated against output.
pub static ARCHETYPES: Lazy<Vec<Archetype>> = Lazy::new(|| {
    vec![
        Archetype {
            name: "The Biological Why".into(),
            prompt_template:
                "Focus on evolutionary, biological, or physiological causality behind {input}"
                    .into(),
            category: Category::Biological,
            complexity_range: (3, 8),
        },
        Archetype {
            name: "The Physical Why".into(),
            prompt_template:
                "Explore the physics, chemistry, or mechanical principles that cause {input}"
                    .into(),
            category: Category::Physical,
            complexity_range: (4, 9),
        },
        Archetype {
            name: "The Psychological Why".into(),
            prompt_template:
                "Investigate the cognitive, emotional, or behavioral reasons behind {input}".into(),
            category: Category::Psychological,
            complexity_range: (2, 7),
        },
        Archetype {
            name: "The Social Why".into(),
            prompt_template:
                "Examine the cultural, societal, or interpersonal forces that create {input}"
                    .into(),
            category: Category::Social,
            complexity_range: (3, 8),
        },
        Archetype {
            name: "The Philosophical Why".into(),
            prompt_template: "Question the fundamental nature, purpose, or meaning of {input}"
                .into(),
            category: Category::Philosophical,
            complexity_range: (5, 10),
        },
    ]
});

/// Typical complexity band per tone, used by `by_complexity_range`.
fn complexity_band(name: &str) -> (u8, u8) {
    match name {
        "childlike" => (1, 5),
        "funny" => (2, 7),
        "scientific" => (5, 10),
        "poetic" => (3, 8),
        "philosophical" => (6, 10),
        _ => (1, 10),
    }
}

/// Tone×category pairs flagged as a poor fit. Advisory only; the generation
/// loop logs these but never blocks on them.
const INCOMPATIBLE_PAIRS: &[(&str, Category)] = &[
    ("childlike", Category::Philosophical),
    ("funny", Category::Philosophical),
];

pub fn all_tones() -> &'static [ToneVariant] {
    &TONE_VARIANTS
}

pub fn random_tone() -> ToneVariant {
    TONE_VARIANTS
        .choose(&mut rand::thread_rng())
        .expect("tone catalog is never empty")
        .clone()
}

pub fn random_archetype() -> Archetype {
    ARCHETYPES
        .choose(&mut rand::thread_rng())
        .expect("archetype catalog is never empty")
        .clone()
}

/// Look up a tone by name (case-insensitive). Unknown names fall back to a
/// random tone with a warning; this never fails.
pub fn by_name(name: &str) -> ToneVariant {
    match TONE_VARIANTS
        .iter()
        .find(|tone| tone.name.eq_ignore_ascii_case(name))
    {
        Some(tone) => tone.clone(),
        None => {
            tracing::warn!("Tone '{}' not found, using random tone", name);
            random_tone()
        }
    }
}

/// Append the tone instruction block to a prompt.
pub fn apply_to_prompt(prompt: &str, tone: &ToneVariant) -> String {
    format!(
        "{}\n\nTONE MODIFIER: {}\n\nMaintain the \"Why\" constraint while applying this tone.",
        prompt, tone.tone_instruction
    )
}

/// Optional caller-supplied user context for prompt personalization.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct UserContext {
    pub age: Option<u8>,
    pub interests: Option<Vec<String>>,
}

/// Append age-banded phrasing guidance and interests to a prompt.
pub fn inject_user_context(prompt: &str, context: Option<&UserContext>) -> String {
    let Some(context) = context else {
        return prompt.to_string();
    };

    let mut injection = String::from("\n\nUSER CONTEXT:\n");

    if let Some(age) = context.age {
        if age < 12 {
            injection.push_str("- Use simple language appropriate for children\n");
        } else if age > 65 {
            injection.push_str("- Use clear, respectful language with life experience context\n");
        } else {
            injection.push_str(&format!("- User is {} years old\n", age));
        }
    }

    if let Some(interests) = &context.interests {
        if !interests.is_empty() {
            injection.push_str(&format!("- User interests: {}\n", interests.join(", ")));
        }
    }

    format!("{}{}", prompt, injection)
}

/// Whether a tone works well with a category. Advisory only.
pub fn compatibility(tone: &ToneVariant, category: Category) -> bool {
    !INCOMPATIBLE_PAIRS
        .iter()
        .any(|(name, cat)| *name == tone.name && *cat == category)
}

/// Tones whose typical complexity band overlaps [min, max].
pub fn by_complexity_range(min: u8, max: u8) -> Vec<ToneVariant> {
    TONE_VARIANTS
        .iter()
        .filter(|tone| {
            let (band_min, band_max) = complexity_band(&tone.name);
            band_min <= max && band_max >= min
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_five_immutable_tones() {
        assert_eq!(all_tones().len(), 5);
        let first = by_name("funny");
        let second = by_name("funny");
        assert_eq!(first.name, second.name);
        assert_eq!(first.tone_instruction, second.tone_instruction);
    }

    #[test]
    fn by_name_is_case_insensitive() {
        assert_eq!(by_name("Scientific").name, "scientific");
        assert_eq!(by_name("POETIC").name, "poetic");
    }

    #[test]
    fn unknown_name_falls_back_to_catalog_member() {
        let tone = by_name("sarcastic");
        assert!(all_tones().iter().any(|t| t.name == tone.name));
    }

    #[test]
    fn apply_to_prompt_appends_tone_block() {
        let tone = by_name("funny");
        let prompt = apply_to_prompt("base prompt", &tone);
        assert!(prompt.starts_with("base prompt"));
        assert!(prompt.contains("TONE MODIFIER:"));
        assert!(prompt.contains(&tone.tone_instruction));
    }

    #[test]
    fn user_context_age_bands() {
        let child = UserContext {
            age: Some(8),
            interests: None,
        };
        let senior = UserContext {
            age: Some(70),
            interests: None,
        };
        let adult = UserContext {
            age: Some(30),
            interests: Some(vec!["astronomy".into(), "cooking".into()]),
        };

        assert!(inject_user_context("p", Some(&child)).contains("simple language"));
        assert!(inject_user_context("p", Some(&senior)).contains("life experience"));
        let adult_prompt = inject_user_context("p", Some(&adult));
        assert!(adult_prompt.contains("User is 30 years old"));
        assert!(adult_prompt.contains("astronomy, cooking"));
        assert_eq!(inject_user_context("p", None), "p");
    }

    #[test]
    fn compatibility_flags_known_exclusions() {
        let funny = by_name("funny");
        let childlike = by_name("childlike");
        let scientific = by_name("scientific");
        assert!(!compatibility(&funny, Category::Philosophical));
        assert!(!compatibility(&childlike, Category::Philosophical));
        assert!(compatibility(&scientific, Category::Philosophical));
        assert!(compatibility(&funny, Category::Biological));
    }

    #[test]
    fn complexity_filter_respects_bands() {
        // Only scientific (5-10) and philosophical (6-10) reach 9+
        let high = by_complexity_range(9, 10);
        let names: Vec<&str> = high.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["scientific", "philosophical"]);

        // Everyone overlaps the full range
        assert_eq!(by_complexity_range(1, 10).len(), 5);
    }
}
