use crate::objects::Object;
use indexmap::IndexMap;

/// Insertion-ordered PDF dictionary. Setting an existing key overwrites the value
/// in place, keeping the key's original position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: IndexMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(|obj| {
            if let Object::Dictionary(dict) = obj {
                Some(dict)
            } else {
                None
            }
        })
    }

    /// Value of the `/Type` entry.
    pub fn get_type(&self) -> Option<&str> {
        self.get("Type").and_then(|obj| obj.as_name())
    }

    /// Returns the inline dictionary stored under `key`, inserting an empty one when
    /// the key is absent or holds something else.
    pub fn get_or_insert_dict(&mut self, key: &str) -> &mut Dictionary {
        let slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Object::Dictionary(Dictionary::new()));
        if !matches!(slot, Object::Dictionary(_)) {
            *slot = Object::Dictionary(Dictionary::new());
        }
        match slot {
            Object::Dictionary(dict) => dict,
            _ => unreachable!("slot was just replaced with a dictionary"),
        }
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}
