use crate::runtime::data_structures::{
    shared_ptr,
    value::{quoted, DeepClone, Value},
    SharedPtr,
};
use std::{
    cmp::Ordering,
    collections::VecDeque,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

/// The size flexible array container behind the `[]` words.  Supports random access, insertion
/// and removal at arbitrary indices, resizing, and cheap pushes and pops at both ends.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Array {
    items: VecDeque<Value>,
}

/// Arrays are always handled by reference from script code.
pub type ArrayPtr = SharedPtr<Array>;

impl PartialOrd for Array {
    fn partial_cmp(&self, other: &Array) -> Option<Ordering> {
        self.items.partial_cmp(&other.items)
    }
}

/// Structural hash, folded with a mixing constant between elements so that element boundaries
/// matter.
impl Hash for Array {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for item in &self.items {
            item.hash(state);
            0x9e3779b9u32.hash(state);
        }
    }
}

impl DeepClone for Array {
    fn deep_clone(&self) -> Value {
        let items = self.items.iter().map(|item| item.deep_clone()).collect();
        Value::Array(shared_ptr(Array { items }))
    }
}

impl DeepClone for ArrayPtr {
    fn deep_clone(&self) -> Value {
        use crate::runtime::data_structures::SharedLock;

        self.locked().deep_clone()
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[ ")?;

        for (index, item) in self.items.iter().enumerate() {
            let separator = if index < self.items.len() - 1 { ", " } else { " " };

            write!(f, "{}{}", quoted(item), separator)?;
        }

        write!(f, "]")
    }
}

impl Array {
    /// Create an array of the given size populated with None values.
    pub fn new(size: usize) -> ArrayPtr {
        let items = VecDeque::from(vec![Value::None; size]);
        shared_ptr(Array { items })
    }

    /// Wrap an existing vector of values.
    pub fn from_vec(values: Vec<Value>) -> ArrayPtr {
        shared_ptr(Array {
            items: VecDeque::from(values),
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    /// Grow or shrink the array.  New slots are filled with None.
    pub fn resize(&mut self, new_size: usize) {
        self.items.resize(new_size, Value::None);
    }

    /// Insert at an index, shifting later items toward the back.
    pub fn insert(&mut self, index: usize, value: Value) {
        self.items.insert(index, value);
    }

    /// Remove the item at an index, shifting later items toward the front.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        self.items.remove(index)
    }

    pub fn push_front(&mut self, value: Value) {
        self.items.push_front(value);
    }

    pub fn pop_front(&mut self) -> Option<Value> {
        self.items.pop_front()
    }

    pub fn push_back(&mut self, value: Value) {
        self.items.push_back(value);
    }

    pub fn pop_back(&mut self) -> Option<Value> {
        self.items.pop_back()
    }

    /// Append deep copies of another array's items onto this one.
    pub fn extend(&mut self, other: &Array) {
        self.items.extend(other.items.iter().map(|item| item.deep_clone()));
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Value> {
        self.items.iter()
    }
}
