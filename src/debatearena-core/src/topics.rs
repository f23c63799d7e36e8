//! Suggested debate topics and the topic input they pre-fill.

/// Stock topics offered to the user.
pub fn default_topics() -> Vec<String> {
    [
        "Is artificial intelligence a threat to society?",
        "Should social media platforms be regulated to prevent misinformation?",
        "Should electric cars be prioritized over gasoline vehicles?",
        "Should all people have the right to own guns?",
        "Animal testing should be banned.",
        "Standardized testing should be abolished.",
        "Sexual education should be mandatory in schools.",
        "Sexual orientation is determined at birth.",
        "Are we living in a simulation, and what is the nature of reality?",
        "If God is all-powerful and all-good, why does evil exist?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone)]
pub struct TopicSuggestions {
    topics: Vec<String>,
}

impl TopicSuggestions {
    pub fn new(topics: Vec<String>) -> Self {
        Self { topics }
    }

    pub fn all(&self) -> &[String] {
        &self.topics
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }
}

impl Default for TopicSuggestions {
    fn default() -> Self {
        Self::new(default_topics())
    }
}

/// The draft topic.
///
/// Picking a suggestion locks the text against direct editing; any edit
/// releases the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicInput {
    text: String,
    locked: bool,
}

impl TopicInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn pick_suggestion(&mut self, topic: impl Into<String>) {
        self.text = topic.into();
        self.locked = true;
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.locked = false;
    }

    /// Hand out the current text and clear the input.
    pub fn take(&mut self) -> String {
        self.locked = false;
        std::mem::take(&mut self.text)
    }
}
