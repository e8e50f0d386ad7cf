use serde_json::{Map, Value};

/// Attribute name to value pairs, unique by name, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSet {
    pairs: Vec<(String, String)>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update; an existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Read a stored JSON object; non-string values are kept in their JSON form.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::new();
        };
        object
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(text) => text.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .pairs
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        Value::Object(object)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

/// What a message prefill did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefillOutcome {
    Filled,
    /// The field already had content.
    KeptExisting,
    NothingRemembered,
    /// The write was rejected by the host element.
    Failed,
}

/// What an attribute prefill did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePrefill {
    NothingRemembered,
    Applied {
        /// Rows written with a remembered pair.
        filled: usize,
        /// Rounds of add-row clicks performed before filling.
        growth_rounds: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_name_keeps_first_position_and_last_value() {
        let set: AttributeSet = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn json_preserves_order() {
        let set: AttributeSet = [("zeta", "1"), ("alpha", "2")].into_iter().collect();
        let restored = AttributeSet::from_json(&set.to_json());
        assert_eq!(restored, set);
        assert_eq!(restored.iter().next(), Some(("zeta", "1")));
    }

    #[test]
    fn non_object_json_is_empty() {
        assert!(AttributeSet::from_json(&json!("text")).is_empty());
        assert!(AttributeSet::from_json(&Value::Null).is_empty());
    }

    #[test]
    fn non_string_values_are_stringified() {
        let set = AttributeSet::from_json(&json!({ "n": 5, "flag": true }));
        assert_eq!(set.get("n"), Some("5"));
        assert_eq!(set.get("flag"), Some("true"));
    }
}
