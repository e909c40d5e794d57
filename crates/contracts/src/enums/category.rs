use serde::{Deserialize, Serialize};

/// Article categories; each one is a partition of the article tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Cocina,
    Deporte,
    Electricidad,
    Electronica,
    Jardineria,
}

impl Category {
    /// Document id of the category partition in the store.
    /// These are data, not code: the accented spellings are the exact
    /// ids existing documents live under.
    pub fn doc_id(&self) -> &'static str {
        match self {
            Category::Cocina => "Cocina",
            Category::Deporte => "Deporte",
            Category::Electricidad => "Electricidad",
            Category::Electronica => "Electrónica",
            Category::Jardineria => "Jardinería",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        self.doc_id()
    }

    /// All categories
    pub fn all() -> Vec<Category> {
        vec![
            Category::Cocina,
            Category::Deporte,
            Category::Electricidad,
            Category::Electronica,
            Category::Jardineria,
        ]
    }

    /// Parse user input: tolerates missing accents and any casing,
    /// besides the exact doc ids.
    pub fn from_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cocina" => Some(Category::Cocina),
            "deporte" => Some(Category::Deporte),
            "electricidad" => Some(Category::Electricidad),
            "electronica" | "electrónica" => Some(Category::Electronica),
            "jardineria" | "jardinería" => Some(Category::Jardineria),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.doc_id())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.doc_id().to_string()
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Category::from_input(&s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_tolerates_accents_and_case() {
        assert_eq!(Category::from_input("electronica"), Some(Category::Electronica));
        assert_eq!(Category::from_input("Electrónica"), Some(Category::Electronica));
        assert_eq!(Category::from_input("JARDINERIA"), Some(Category::Jardineria));
        assert_eq!(Category::from_input(" cocina "), Some(Category::Cocina));
        assert_eq!(Category::from_input("muebles"), None);
    }

    #[test]
    fn test_serde_round_trip_uses_doc_id() {
        let json = serde_json::to_string(&Category::Jardineria).unwrap();
        assert_eq!(json, "\"Jardinería\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::Jardineria);
    }

    #[test]
    fn test_all_covers_every_partition() {
        assert_eq!(Category::all().len(), 5);
    }
}
