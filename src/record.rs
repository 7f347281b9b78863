use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One cell from a decoded tabular row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Number(f64),
    Text(String),
    Empty,
}

impl Field {
    pub fn is_empty(&self) -> bool {
        match self {
            Field::Empty => true,
            Field::Text(text) => text.trim().is_empty(),
            Field::Number(_) => false,
        }
    }

    /// Trimmed text content, only for genuinely textual non-empty cells.
    pub fn text(&self) -> Option<&str> {
        match self {
            Field::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Display form of any cell. Whole numbers render without a fraction.
    pub fn display(&self) -> String {
        match self {
            Field::Empty => String::new(),
            Field::Text(text) => text.trim().to_string(),
            Field::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                }
            }
        }
    }
}

/// One spreadsheet row as an ordered column-label → value mapping.
///
/// Iteration order is the column declaration order of the source file;
/// the detection heuristics rely on it for their fallback scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Field>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: Field) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values joined with spaces, for treating a whole row as free text.
    pub fn values_joined(&self) -> String {
        let parts: Vec<String> = self
            .0
            .values()
            .filter(|field| !field.is_empty())
            .map(Field::display)
            .collect();
        parts.join(" ")
    }
}

impl FromIterator<(String, Field)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Field)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut record = Record::new();
        record.insert("Zeta".into(), Field::Text("a".into()));
        record.insert("Alpha".into(), Field::Number(1.0));
        record.insert("Mid".into(), Field::Empty);
        let keys: Vec<&String> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn joined_values_skip_empties() {
        let mut record = Record::new();
        record.insert("A".into(), Field::Text("Boru".into()));
        record.insert("B".into(), Field::Empty);
        record.insert("C".into(), Field::Number(5.0));
        assert_eq!(record.values_joined(), "Boru 5");
    }
}
