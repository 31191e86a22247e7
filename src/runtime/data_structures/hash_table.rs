use crate::runtime::data_structures::{
    shared_ptr,
    value::{format_indent, format_indent_dec, format_indent_inc, quoted, DeepClone, Value},
    SharedPtr,
};
use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

/// The value to value hash table behind the `{}` words.  Keys and values are both full script
/// values, so tables can nest freely and anything hashable can act as a key.
#[derive(Clone, Eq, Debug)]
pub struct HashTable {
    entries: HashMap<Value, Value>,
}

/// Hash tables are always handled by reference from script code.
pub type HashTablePtr = SharedPtr<HashTable>;

/// Structural equality over the full entry set.  Potentially expensive for big tables.
impl PartialEq for HashTable {
    fn eq(&self, other: &HashTable) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }

        self.entries
            .iter()
            .all(|(key, value)| other.entries.get(key) == Some(value))
    }
}

/// Hash tables have no inherent entry order, so ordering compares sorted key lists and then the
/// corresponding values.  Deterministic, if expensive.
impl PartialOrd for HashTable {
    fn partial_cmp(&self, other: &HashTable) -> Option<Ordering> {
        if self.entries.len() != other.entries.len() {
            return self.entries.len().partial_cmp(&other.entries.len());
        }

        let mut our_keys: Vec<&Value> = self.entries.keys().collect();
        let mut their_keys: Vec<&Value> = other.entries.keys().collect();

        our_keys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        their_keys.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        for (ours, theirs) in our_keys.iter().zip(their_keys.iter()) {
            match ours.partial_cmp(theirs) {
                Some(Ordering::Equal) => {
                    let comparison =
                        self.entries.get(*ours).partial_cmp(&other.entries.get(*theirs));

                    if comparison != Some(Ordering::Equal) {
                        return comparison;
                    }
                }

                unequal => return unequal,
            }
        }

        Some(Ordering::Equal)
    }
}

/// An order independent structural hash, each entry's hash is combined with a mixing constant and
/// folded in with a commutative operation.
impl Hash for HashTable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut folded: u64 = 0;

        for (key, value) in &self.entries {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();

            key.hash(&mut entry_hasher);
            0x9e3779b9u32.hash(&mut entry_hasher);
            value.hash(&mut entry_hasher);

            folded = folded.wrapping_add(entry_hasher.finish());
        }

        folded.hash(state);
        self.entries.len().hash(state);
    }
}

impl DeepClone for HashTable {
    fn deep_clone(&self) -> Value {
        let mut entries = HashMap::with_capacity(self.entries.len());

        for (key, value) in &self.entries {
            entries.insert(key.deep_clone(), value.deep_clone());
        }

        Value::HashTable(shared_ptr(HashTable { entries }))
    }
}

impl DeepClone for HashTablePtr {
    fn deep_clone(&self) -> Value {
        use crate::runtime::data_structures::SharedLock;

        self.locked().deep_clone()
    }
}

/// Print the table one entry per line with nested indentation, deep tables stay readable.
impl Display for HashTable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "{{")?;

        format_indent_inc();

        for (index, (key, value)) in self.entries.iter().enumerate() {
            writeln!(
                f,
                "{:indent$}{} -> {}{}",
                "",
                quoted(key),
                quoted(value),
                if index < self.entries.len() - 1 { "," } else { "" },
                indent = format_indent()
            )?;
        }

        format_indent_dec();

        write!(f, "{:indent$}}}", "", indent = format_indent())
    }
}

impl HashTable {
    pub fn new() -> HashTablePtr {
        shared_ptr(HashTable {
            entries: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite.  An existing key keeps its original key value.
    pub fn insert(&mut self, key: Value, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    /// Merge deep copies of another table's entries into this one, overwriting shared keys.
    pub fn extend(&mut self, other: &HashTable) {
        for (key, value) in &other.entries {
            self.entries.insert(key.deep_clone(), value.deep_clone());
        }
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, Value, Value> {
        self.entries.iter()
    }
}
