use crate::{
    lang::{
        code::{ByteCode, pretty_print_code},
        tokenizer::{NumberKind, Token},
    },
    runtime::{
        data_structures::{
            array::ArrayPtr,
            byte_buffer::ByteBufferPtr,
            data_object::DataObjectPtr,
            hash_table::HashTablePtr,
            SharedLock,
        },
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use std::{
    cell::RefCell,
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// The tagged value type for everything a script can touch.  Simple variants hold their data
/// inline while the containers are held by reference through shared pointers, so copies of a
/// container value alias the same underlying data until deep_clone is asked for.
#[derive(Clone, Debug)]
pub enum Value {
    /// No value at all.  Freshly defined variables and resized array slots hold this.
    None,

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit IEEE-754 float.
    Float(f64),

    Bool(bool),

    String(String),

    /// Identifier of an interpreter sub-thread, as returned by thread.new.
    ThreadId(u64),

    /// A script defined structure instance.
    Structure(DataObjectPtr),

    /// A flexible array of values.
    Array(ArrayPtr),

    /// A value to value hash table.
    HashTable(HashTablePtr),

    /// A buffer of raw binary data.
    ByteBuffer(ByteBufferPtr),

    /// A source token, as handed out by the compile time words.
    Token(Token),

    /// A compiled block of byte-code.
    Code(ByteCode),
}

impl Default for Value {
    fn default() -> Value {
        Value::None
    }
}

/// Conversion of Rust values into script values.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Deep copy for values and the containers they reference.  A plain clone of a container value
/// only copies the reference, this trait replicates the reachable data itself.  Cycles through
/// containers are not supported.
pub trait DeepClone {
    fn deep_clone(&self) -> Value;
}

impl DeepClone for Value {
    fn deep_clone(&self) -> Value {
        match self {
            Value::Structure(data) => data.deep_clone(),
            Value::Array(array) => array.deep_clone(),
            Value::HashTable(table) => table.deep_clone(),
            Value::ByteBuffer(buffer) => buffer.deep_clone(),

            // Everything else copies by value.
            _ => self.clone(),
        }
    }
}

/// Generate the variant test, the ToValue/From conversions, and the checked accessor for one
/// payload carrying variant.
macro_rules! value_variant {
    ($data_type:ty, $variant:ident, $is_name:ident, $as_name:ident) => {
        impl Value {
            #[doc = concat!("Is this value the ", stringify!($variant), " variant?")]
            pub fn $is_name(&self) -> bool {
                matches!(self, Value::$variant(_))
            }

            #[doc = concat!("Borrow the value as ",
                            stringify!($data_type),
                            ", or raise a type error.")]
            pub fn $as_name(&self, interpreter: &dyn Interpreter) -> error::Result<&$data_type> {
                match self {
                    Value::$variant(contained) => Ok(contained),
                    _ => script_error(
                        interpreter,
                        format!("Value {} is not a {}.", self, stringify!($variant)),
                    ),
                }
            }
        }

        impl ToValue for $data_type {
            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }

        impl From<$data_type> for Value {
            fn from(original: $data_type) -> Value {
                original.to_value()
            }
        }
    };
}

value_variant!(i64, Int, is_int, as_int);
value_variant!(f64, Float, is_float, as_float);
value_variant!(bool, Bool, is_bool, as_bool);
value_variant!(String, String, is_string, as_string);
value_variant!(DataObjectPtr, Structure, is_structure, as_structure);
value_variant!(ArrayPtr, Array, is_array, as_array);
value_variant!(HashTablePtr, HashTable, is_hash_table, as_hash_table);
value_variant!(ByteBufferPtr, ByteBuffer, is_byte_buffer, as_byte_buffer);
value_variant!(Token, Token, is_token, as_token);
value_variant!(ByteCode, Code, is_code, as_code);

impl ToValue for NumberKind {
    fn to_value(&self) -> Value {
        match self {
            NumberKind::Int(value) => Value::Int(*value),
            NumberKind::Float(value) => Value::Float(*value),
        }
    }
}

/// Indices and sizes convert through i64, the only integer width the value system has.
impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for &String {
    fn to_value(&self) -> Value {
        Value::String((*self).clone())
    }
}

/// Convert a Rust vector of convertible items into an array value.
impl<T> From<&Vec<T>> for Value
where
    T: ToValue,
{
    fn from(items: &Vec<T>) -> Value {
        let values: Vec<Value> = items.iter().map(|item| item.to_value()).collect();
        Value::Array(crate::runtime::data_structures::array::Array::from_vec(values))
    }
}

impl<T> From<Vec<T>> for Value
where
    T: ToValue,
{
    fn from(items: Vec<T>) -> Value {
        Value::from(&items)
    }
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_thread_id(&self) -> bool {
        matches!(self, Value::ThreadId(_))
    }

    /// Can the value take part in numeric coercion?  None coerces to zero, bools to 0/1, and
    /// number tokens to their numeric payload.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::None
                | Value::Int(_)
                | Value::Float(_)
                | Value::Bool(_)
                | Value::Token(Token::Number(_, _))
        )
    }

    /// Can the value be converted to text without structural formatting?
    pub fn is_stringable(&self) -> bool {
        matches!(
            self,
            Value::None
                | Value::Int(_)
                | Value::Float(_)
                | Value::String(_)
                | Value::Token(Token::String(_, _))
                | Value::Token(Token::Word(_, _))
        )
    }

    pub fn either_is_string(a: &Value, b: &Value) -> bool {
        a.is_string() || b.is_string()
    }

    pub fn either_is_float(a: &Value, b: &Value) -> bool {
        a.is_float() || b.is_float()
    }

    pub fn either_is_int(a: &Value, b: &Value) -> bool {
        a.is_int() || b.is_int()
    }

    pub fn either_is_numeric(a: &Value, b: &Value) -> bool {
        a.is_numeric() || b.is_numeric()
    }

    pub fn both_are_numeric(a: &Value, b: &Value) -> bool {
        a.is_numeric() && b.is_numeric()
    }

    /// Coerce to text.  Only valid for stringable values, everything else panics, callers are
    /// expected to check is_stringable first or use the checked stack pops.
    pub fn get_string_val(&self) -> String {
        match self {
            Value::None => String::new(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::String(value) => value.clone(),
            Value::Token(Token::String(_, text)) => text.clone(),
            Value::Token(Token::Word(_, word)) => word.clone(),
            _ => panic!("Value is not convertible to a string."),
        }
    }

    /// Coerce to a boolean.  Numbers are true when non-zero, strings when non-empty, containers
    /// are always true.
    pub fn get_bool_val(&self) -> bool {
        match self {
            Value::None => false,
            Value::Int(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Bool(value) => *value,
            Value::String(value) => !value.is_empty(),
            _ => true,
        }
    }

    /// Coerce to an integer.  Only valid for numeric values.
    pub fn get_int_val(&self) -> i64 {
        match self {
            Value::None => 0,
            Value::Int(value) => *value,
            Value::Float(value) => *value as i64,
            Value::Bool(value) => *value as i64,
            Value::Token(Token::Number(_, NumberKind::Int(value))) => *value,
            Value::Token(Token::Number(_, NumberKind::Float(value))) => *value as i64,
            _ => panic!("Value is not convertible to an int."),
        }
    }

    /// Coerce to a float.  Only valid for numeric values.
    pub fn get_float_val(&self) -> f64 {
        match self {
            Value::None => 0.0,
            Value::Int(value) => *value as f64,
            Value::Float(value) => *value,
            Value::Bool(value) => (*value as i64) as f64,
            Value::Token(Token::Number(_, NumberKind::Int(value))) => *value as f64,
            Value::Token(Token::Number(_, NumberKind::Float(value))) => *value,
            _ => panic!("Value is not convertible to a float."),
        }
    }

    /// A stable per-variant index, the first key of the value ordering.
    fn variant_index(&self) -> usize {
        match self {
            Value::None => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Bool(_) => 3,
            Value::String(_) => 4,
            Value::ThreadId(_) => 5,
            Value::Structure(_) => 6,
            Value::Array(_) => 7,
            Value::HashTable(_) => 8,
            Value::ByteBuffer(_) => 9,
            Value::Token(_) => 10,
            Value::Code(_) => 11,
        }
    }

    /// Escape a string the way it would be written in source code, quotes included.  Used when
    /// printing stack contents and container members so string boundaries stay visible.
    pub fn stringify(text: &str) -> String {
        let mut result = String::with_capacity(text.len() + 2);

        result.push('"');

        for character in text.chars() {
            match character {
                '"' => result.push_str("\\\""),
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                '\\' => result.push_str("\\\\"),
                _ => result.push(character),
            }
        }

        result.push('"');
        result
    }
}

/// Equality follows the language's coercion rules.  Numeric values compare by promotion, so
/// `1 1.0 =` holds.  Stringable values compare textually.  Containers compare structurally and
/// deeply, with identical references short-circuiting, which also keeps a container comparable
/// against itself without double locking.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if self.is_none() && other.is_none() {
            return true;
        }

        if Value::both_are_numeric(self, other) {
            return if Value::either_is_float(self, other) {
                self.get_float_val() == other.get_float_val()
            } else {
                self.get_int_val() == other.get_int_val()
            };
        }

        if self.is_stringable() && other.is_stringable() {
            return self.get_string_val() == other.get_string_val();
        }

        match (self, other) {
            (Value::ThreadId(a), Value::ThreadId(b)) => a == b,

            (Value::Structure(a), Value::Structure(b)) => {
                Arc::ptr_eq(a, b) || *a.locked() == *b.locked()
            }

            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || *a.locked() == *b.locked(),

            (Value::HashTable(a), Value::HashTable(b)) => {
                Arc::ptr_eq(a, b) || *a.locked() == *b.locked()
            }

            (Value::ByteBuffer(a), Value::ByteBuffer(b)) => {
                Arc::ptr_eq(a, b) || *a.locked() == *b.locked()
            }

            (Value::Token(a), Value::Token(b)) => a == b,
            (Value::Code(a), Value::Code(b)) => a == b,

            _ => false,
        }
    }
}

/// The Eq contract is technically violated by float payloads.  The trade-off is accepted so that
/// values can key hash tables, user documentation warns against float keys.
impl Eq for Value {}

/// A deterministic total order: numeric values order by promoted comparison with floats compared
/// by total_cmp, (so NaN has a fixed position,) otherwise variant index first and payload second.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        if Value::both_are_numeric(self, other) {
            return if Value::either_is_float(self, other) {
                Some(self.get_float_val().total_cmp(&other.get_float_val()))
            } else {
                self.get_int_val().partial_cmp(&other.get_int_val())
            };
        }

        let by_variant = self.variant_index().cmp(&other.variant_index());

        if by_variant != Ordering::Equal {
            return Some(by_variant);
        }

        match (self, other) {
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::ThreadId(a), Value::ThreadId(b)) => a.partial_cmp(b),

            (Value::Structure(a), Value::Structure(b)) => {
                if Arc::ptr_eq(a, b) {
                    Some(Ordering::Equal)
                } else {
                    a.locked().partial_cmp(&b.locked())
                }
            }

            (Value::Array(a), Value::Array(b)) => {
                if Arc::ptr_eq(a, b) {
                    Some(Ordering::Equal)
                } else {
                    a.locked().partial_cmp(&b.locked())
                }
            }

            (Value::HashTable(a), Value::HashTable(b)) => {
                if Arc::ptr_eq(a, b) {
                    Some(Ordering::Equal)
                } else {
                    a.locked().partial_cmp(&b.locked())
                }
            }

            (Value::ByteBuffer(a), Value::ByteBuffer(b)) => {
                if Arc::ptr_eq(a, b) {
                    Some(Ordering::Equal)
                } else {
                    a.locked().partial_cmp(&b.locked())
                }
            }

            (Value::Token(a), Value::Token(b)) => a.partial_cmp(b),
            (Value::Code(a), Value::Code(b)) => a.partial_cmp(b),

            _ => Some(Ordering::Equal),
        }
    }
}

/// Hashing is structural and kept consistent with equality.  All numeric values that can compare
/// equal hash through the same path, integral floats hash as their integer value.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::None => 0i64.hash(state),
            Value::Int(value) => value.hash(state),

            Value::Float(value) => {
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value <= i64::MAX as f64 {
                    (*value as i64).hash(state);
                } else {
                    value.to_bits().hash(state);
                }
            }

            Value::Bool(value) => (*value as i64).hash(state),
            Value::String(value) => value.hash(state),
            Value::ThreadId(value) => value.hash(state),
            Value::Structure(value) => value.locked().hash(state),
            Value::Array(value) => value.locked().hash(state),
            Value::HashTable(value) => value.locked().hash(state),
            Value::ByteBuffer(value) => value.locked().hash(state),
            Value::Token(value) => value.hash(state),
            Value::Code(value) => value.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "none"),
            Value::Int(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::ThreadId(value) => write!(f, "thread-{}", value),
            Value::Structure(value) => write!(f, "{}", value.locked()),
            Value::Array(value) => write!(f, "{}", value.locked()),
            Value::HashTable(value) => write!(f, "{}", value.locked()),
            Value::ByteBuffer(value) => write!(f, "{}", value.locked()),
            Value::Token(value) => write!(f, "{}", value),
            Value::Code(value) => write!(f, "{}", pretty_print_code(value)),
        }
    }
}

thread_local! {
    /// Current indentation depth for pretty printing nested structures and hash tables.  Kept per
    /// thread so sub-thread interpreters can print concurrently without interfering.
    static FORMAT_INDENT: RefCell<usize> = const { RefCell::new(0) };
}

/// The current structural printing indent, in spaces.
pub fn format_indent() -> usize {
    FORMAT_INDENT.with(|indent| *indent.borrow())
}

pub fn format_indent_inc() {
    FORMAT_INDENT.with(|indent| *indent.borrow_mut() += 4);
}

pub fn format_indent_dec() {
    FORMAT_INDENT.with(|indent| {
        let mut indent = indent.borrow_mut();
        *indent = indent.saturating_sub(4);
    });
}

/// Render a value for structural printing, strings get quoted and escaped while everything else
/// prints normally.
pub fn quoted(value: &Value) -> String {
    if value.is_string() {
        Value::stringify(&value.get_string_val())
    } else {
        value.to_string()
    }
}
