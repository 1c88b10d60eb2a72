use curious_mind::tones;
use curious_mind::types::Category;

#[test]
fn by_name_is_idempotent_for_known_names() {
    for name in ["funny", "scientific", "poetic", "childlike", "philosophical"] {
        let first = tones::by_name(name);
        let second = tones::by_name(name);
        assert_eq!(first.name, second.name);
        assert_eq!(first.tone_instruction, second.tone_instruction);
        assert_eq!(first.description, second.description);
    }
}

#[test]
fn unknown_name_never_panics_and_yields_catalog_member() {
    for bogus in ["sarcastic", "", "FUNNY GUY", "🦀"] {
        let tone = tones::by_name(bogus);
        assert!(
            tones::all_tones().iter().any(|t| t.name == tone.name),
            "fallback for '{}' must come from the catalog",
            bogus
        );
    }
}

#[test]
fn random_tone_always_comes_from_catalog() {
    for _ in 0..50 {
        let tone = tones::random_tone();
        assert!(tones::all_tones().iter().any(|t| t.name == tone.name));
    }
}

#[test]
fn archetype_templates_carry_input_placeholder() {
    for archetype in tones::ARCHETYPES.iter() {
        assert!(
            archetype.prompt_template.contains("{input}"),
            "archetype '{}' is missing its placeholder",
            archetype.name
        );
        let (min, max) = archetype.complexity_range;
        assert!(min >= 1 && max <= 10 && min <= max);
    }
}

#[test]
fn compatibility_matrix_is_advisory_exclusions_only() {
    let incompatible: Vec<(&str, Category)> = tones::all_tones()
        .iter()
        .flat_map(|tone| {
            Category::VALIDATED
                .iter()
                .filter(|category| !tones::compatibility(tone, **category))
                .map(|category| (tone.name.as_str(), *category))
                .collect::<Vec<_>>()
        })
        .collect();

    assert_eq!(
        incompatible,
        vec![
            ("funny", Category::Philosophical),
            ("childlike", Category::Philosophical),
        ]
    );
}

#[test]
fn complexity_filter_matches_tone_bands() {
    let simple = tones::by_complexity_range(1, 2);
    let names: Vec<&str> = simple.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["funny", "childlike"]);

    assert!(tones::by_complexity_range(1, 10).len() == 5);
}
