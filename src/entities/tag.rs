//! Tag entity

use super::truncate_chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
}

impl Tag {
    pub const MAX_NAME_LEN: usize = 100;

    /// Create a tag, cutting the name down to [`Tag::MAX_NAME_LEN`] characters
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: Self::normalize_name(name),
        }
    }

    /// The name a tag is stored and looked up under
    pub fn normalize_name(name: &str) -> String {
        truncate_chars(name, Self::MAX_NAME_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_tag_names_are_truncated() {
        let long = "x".repeat(140);
        let tag = Tag::new(&long);
        assert_eq!(tag.name.chars().count(), 100);
        assert_eq!(Tag::normalize_name(&long), tag.name);
    }
}
