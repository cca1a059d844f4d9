use crate::client::{BROKEN, TagMask};
use serde::Deserialize;

/// Static placement rule, matched once when a window is first managed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: TagMask,
    #[serde(default)]
    pub is_floating: bool,
    #[serde(default = "unconstrained_monitor")]
    pub monitor: i32,
}

fn unconstrained_monitor() -> i32 {
    -1
}

impl Rule {
    pub fn matches(&self, identity: &WindowIdentity) -> bool {
        let matches_field = |pattern: &Option<String>, value: &str| {
            pattern
                .as_deref()
                .is_none_or(|pattern| value.contains(pattern))
        };

        matches_field(&self.title, &identity.title)
            && matches_field(&self.class, &identity.class)
            && matches_field(&self.instance, &identity.instance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowIdentity {
    pub class: String,
    pub instance: String,
    pub title: String,
}

impl WindowIdentity {
    pub fn new(class_hint: Option<(String, String)>, title: &str) -> Self {
        let (instance, class) =
            class_hint.unwrap_or_else(|| (BROKEN.to_string(), BROKEN.to_string()));
        Self {
            class,
            instance,
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub tags: TagMask,
    pub is_floating: bool,
    pub monitor: Option<usize>,
}

/// Tags accumulate across every matching rule, while floating and monitor
/// are overwritten by each match so the last matching rule decides them.
/// A monitor index that does not exist leaves the previous choice alone.
pub fn apply_rules(rules: &[Rule], identity: &WindowIdentity, monitor_count: usize) -> RuleOutcome {
    let mut outcome = RuleOutcome {
        tags: 0,
        is_floating: false,
        monitor: None,
    };

    for rule in rules.iter().filter(|rule| rule.matches(identity)) {
        outcome.is_floating = rule.is_floating;
        outcome.tags |= rule.tags;
        if let Ok(index) = usize::try_from(rule.monitor) {
            if index < monitor_count {
                outcome.monitor = Some(index);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rule(class: Option<&str>, title: Option<&str>, tags: TagMask, floating: bool, monitor: i32) -> Rule {
        Rule {
            class: class.map(String::from),
            instance: None,
            title: title.map(String::from),
            tags,
            is_floating: floating,
            monitor,
        }
    }

    fn identity(class: &str, instance: &str, title: &str) -> WindowIdentity {
        WindowIdentity {
            class: class.to_string(),
            instance: instance.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn no_match_leaves_defaults() {
        let rules = vec![rule(Some("Gimp"), None, 0, true, -1)];
        let outcome = apply_rules(&rules, &identity("st-256color", "st", "zsh"), 1);
        assert_eq!(
            outcome,
            RuleOutcome {
                tags: 0,
                is_floating: false,
                monitor: None
            }
        );
    }

    #[test]
    fn matchers_are_substrings() {
        let rules = vec![rule(Some("fox"), Some("Mozilla"), 1 << 8, false, -1)];
        let outcome = apply_rules(&rules, &identity("Firefox", "Navigator", "Mozilla Firefox"), 1);
        assert_eq!(outcome.tags, 1 << 8);
    }

    // Tags are OR-ed together while floating and monitor follow the last
    // matching rule, even when that rule turns floating back off.
    #[test]
    fn tags_accumulate_but_last_match_wins_for_float_and_monitor() {
        let rules = vec![
            rule(Some("Gimp"), None, 1 << 1, true, 1),
            rule(None, Some("Gimp"), 1 << 3, false, 0),
            rule(Some("Gimp"), None, 0, false, -1),
        ];
        let outcome = apply_rules(&rules, &identity("Gimp", "gimp", "GNU Gimp"), 2);
        assert_eq!(outcome.tags, (1 << 1) | (1 << 3));
        assert!(!outcome.is_floating);
        assert_eq!(outcome.monitor, Some(0));
    }

    #[test]
    fn missing_monitor_index_is_ignored() {
        let rules = vec![rule(None, None, 0, true, 5)];
        let outcome = apply_rules(&rules, &identity("a", "b", "c"), 2);
        assert_eq!(outcome.monitor, None);
        assert!(outcome.is_floating);
    }

    #[test]
    fn missing_class_hint_is_broken() {
        let id = WindowIdentity::new(None, "title");
        assert_eq!(id.class, "broken");
        assert_eq!(id.instance, "broken");
        let rules = vec![rule(Some("broken"), None, 4, false, -1)];
        assert_eq!(apply_rules(&rules, &id, 1).tags, 4);
    }
}
