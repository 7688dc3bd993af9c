//! Property tests for resolution invariants.

use proptest::prelude::*;
use std::sync::Arc;
use verb_resolver::plugin::{Plugin, VerbPlugin};
use verb_resolver::{PluginManager, PluginRegistry};

fn fixture() -> PluginManager {
    let mut registry = PluginRegistry::new();
    let plugins: Vec<Arc<dyn Plugin>> = vec![
        Arc::new(
            VerbPlugin::new("file", "File operations")
                .with_priority(10)
                .with_verbs(["ls", "find", "copy", "move"])
                .with_alias("list", "ls")
                .with_alias("mv", "move"),
        ),
        Arc::new(
            VerbPlugin::new("text", "Text operations")
                .with_priority(5)
                .with_verbs(["grep", "sed", "cat"])
                .with_alias("find", "grep")
                .with_alias("search", "grep"),
        ),
        Arc::new(
            VerbPlugin::new("net", "Network operations")
                .with_priority(5)
                .with_verbs(["ping", "curl", "download"]),
        ),
    ];
    for plugin in plugins {
        registry.register(plugin).unwrap();
    }
    PluginManager::new(registry)
}

fn apply_case(verb: &str, mask: &[bool]) -> String {
    verb.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #[test]
    fn lowering_threshold_never_loses_matches(
        input in "[a-z_]{1,10}",
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let mut manager = fixture();

        manager.set_fuzzy_threshold(high).unwrap();
        let strict = manager.get_plugin_for_verb(&input).is_some();

        manager.set_fuzzy_threshold(low).unwrap();
        let loose = manager.get_plugin_for_verb(&input).is_some();

        prop_assert!(!strict || loose, "{} matched at {} but not at {}", input, high, low);
    }

    #[test]
    fn exact_resolution_ignores_case(
        index in 0usize..12,
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let manager = fixture();
        let verbs: Vec<String> = manager.get_all_verbs().keys().cloned().collect();
        let verb = &verbs[index % verbs.len()];

        let expected = manager.get_plugin_for_verb(verb).map(|p| p.name().to_string());
        let cased = manager
            .get_plugin_for_verb(&apply_case(verb, &mask))
            .map(|p| p.name().to_string());

        prop_assert!(expected.is_some());
        prop_assert_eq!(expected, cased);
    }

    #[test]
    fn resolution_is_total(input in "\\PC{0,12}") {
        let manager = fixture();
        let first = manager.get_plugin_for_verb(&input).map(|p| p.name().to_string());
        let second = manager.get_plugin_for_verb(&input).map(|p| p.name().to_string());
        prop_assert_eq!(first, second);
    }
}
