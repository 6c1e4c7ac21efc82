use quiz_core::model::{Topic, TopicError};

/// Topics offered on the landing screen, with their descriptions.
pub const PRESET_TOPICS: [(&str, &str); 5] = [
    ("Wellness", "Health & well-being practices"),
    ("Tech Trends", "Latest in technology"),
    ("Nutrition", "Food & dietary science"),
    ("Fitness", "Exercise & body health"),
    ("Mental Health", "Psychological wellness"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicCardVm {
    /// 1-based, as typed by the user.
    pub number: usize,
    pub name: &'static str,
    pub description: &'static str,
}

#[must_use]
pub fn topic_catalog() -> Vec<TopicCardVm> {
    PRESET_TOPICS
        .iter()
        .enumerate()
        .map(|(i, &(name, description))| TopicCardVm {
            number: i + 1,
            name,
            description,
        })
        .collect()
}

/// Turn user input into a topic.
///
/// A catalog number or a preset name (any case) picks the preset; anything else is
/// taken as a free-form topic.
///
/// # Errors
///
/// Returns `TopicError::Empty` for blank input.
pub fn resolve_topic(input: &str) -> Result<Topic, TopicError> {
    let input = input.trim();
    let numbered = input
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|i| PRESET_TOPICS.get(i));
    if let Some(&(name, _)) = numbered {
        return Topic::new(name);
    }
    let preset = PRESET_TOPICS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(input))
        .map(|&(name, _)| name);
    Topic::new(preset.unwrap_or(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_presets_in_order() {
        let catalog = topic_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog[0].number, 1);
        assert_eq!(catalog[0].name, "Wellness");
        assert_eq!(catalog[3].name, "Fitness");
        assert_eq!(catalog[3].description, "Exercise & body health");
    }

    #[test]
    fn resolves_numbers_names_and_free_form() {
        assert_eq!(resolve_topic("4").unwrap().as_str(), "Fitness");
        assert_eq!(resolve_topic(" tech trends ").unwrap().as_str(), "Tech Trends");
        assert_eq!(resolve_topic("Rust lifetimes").unwrap().as_str(), "Rust lifetimes");
        assert_eq!(resolve_topic("9").unwrap().as_str(), "9");
        assert_eq!(resolve_topic("0").unwrap().as_str(), "0");
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(matches!(resolve_topic("   "), Err(TopicError::Empty)));
    }
}
