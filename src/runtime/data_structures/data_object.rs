use crate::{
    lang::source::SourceLocation,
    runtime::{
        data_structures::{
            contextual_list::ContextualList,
            dictionary::{WordKind, WordMode, WordVisibility},
            shared_ptr,
            value::{
                format_indent, format_indent_dec, format_indent_inc, quoted, DeepClone, ToValue,
                Value,
            },
            SharedLock, SharedPtr,
        },
        error::{self, script_error},
        interpreter::Interpreter,
    },
};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// The blueprint of a script defined structure: its name, its field names in declaration order,
/// and a default value for each field.  Definitions are immutable once registered, so they are
/// shared by plain Arc with no lock.
#[derive(PartialEq, Eq, Debug)]
pub struct DataObjectDefinition {
    name: String,
    field_names: Vec<String>,
    defaults: Vec<Value>,
    visibility: WordVisibility,
}

pub type DataObjectDefinitionPtr = Arc<DataObjectDefinition>;

/// The scoped list of structure definitions known to an interpreter.
pub type DataDefinitionList = ContextualList<DataObjectDefinitionPtr>;

impl Display for DataObjectDefinition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "# {}", self.name)?;

        for field in &self.field_names {
            write!(f, " {}", field)?;
        }

        write!(f, " ;")
    }
}

impl DataObjectDefinition {
    /// Create a definition and register it in the interpreter's definition list.
    pub fn new(
        interpreter: &mut dyn Interpreter,
        name: String,
        field_names: Vec<String>,
        defaults: Vec<Value>,
        is_hidden: bool,
    ) -> DataObjectDefinitionPtr {
        let definition = Arc::new(DataObjectDefinition {
            name,
            field_names,
            defaults,
            visibility: if is_hidden {
                WordVisibility::Hidden
            } else {
                WordVisibility::Visible
            },
        });

        interpreter.add_structure_definition(definition.clone());

        definition
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn field_names(&self) -> &Vec<String> {
        &self.field_names
    }

    pub fn defaults(&self) -> &Vec<Value> {
        &self.defaults
    }

    pub fn visibility(&self) -> &WordVisibility {
        &self.visibility
    }

    /// Find a field's index by name.
    pub fn field_index(&self, field_name: &str) -> Option<usize> {
        self.field_names.iter().position(|name| name == field_name)
    }

    /// Register the family of words that give scripts access to a structure definition.
    ///
    /// For a definition `# point x y ;` the words created are:
    ///
    ///    point.new      create an instance with the field defaults
    ///    point.x        push the field's index
    ///    point.x!       ( value struct -- )      write the field
    ///    point.x@       ( struct -- value )      read the field
    ///    point.x!!      ( value var-index -- )   write through a variable holding the struct
    ///    point.x@@      ( var-index -- value )   read through a variable holding the struct
    ///
    /// and the same for y.
    pub fn register_access_words(
        interpreter: &mut dyn Interpreter,
        definition: DataObjectDefinitionPtr,
        location: Option<SourceLocation>,
    ) {
        let location = location.unwrap_or_else(|| crate::location_here!());
        let struct_name = definition.name.clone();
        let visibility = definition.visibility.clone();

        let creation_definition = definition.clone();

        interpreter.add_word(
            location.path().clone(),
            location.line(),
            location.column(),
            format!("{}.new", struct_name),
            Arc::new(move |interpreter: &mut dyn Interpreter| {
                let new_struct = DataObject::new(&creation_definition);

                interpreter.push(new_struct.to_value());
                Ok(())
            }),
            format!("Create a new instance of the structure {}.", struct_name),
            format!(" -- {}", struct_name),
            WordMode::Normal,
            visibility.clone(),
            WordKind::Native,
        );

        for (index, field_name) in definition.field_names.iter().enumerate() {
            let index_word = format!("{}.{}", struct_name, field_name);
            let writer_word = format!("{}.{}!", struct_name, field_name);
            let reader_word = format!("{}.{}@", struct_name, field_name);
            let var_writer_word = format!("{}.{}!!", struct_name, field_name);
            let var_reader_word = format!("{}.{}@@", struct_name, field_name);

            interpreter.add_word(
                location.path().clone(),
                location.line(),
                location.column(),
                index_word,
                Arc::new(move |interpreter: &mut dyn Interpreter| {
                    interpreter.push(index.to_value());
                    Ok(())
                }),
                String::new(),
                format!(" -- {}-index", field_name),
                WordMode::Normal,
                visibility.clone(),
                WordKind::Native,
            );

            interpreter.add_word(
                location.path().clone(),
                location.line(),
                location.column(),
                writer_word,
                Arc::new(move |interpreter: &mut dyn Interpreter| {
                    let data = interpreter.pop_as_structure()?;
                    let value = interpreter.pop()?;

                    let result = data.locked().write_field(interpreter, index, value);
                    result
                }),
                format!("Write to the structure {} field {}.", struct_name, field_name),
                "value struct -- ".to_string(),
                WordMode::Normal,
                visibility.clone(),
                WordKind::Native,
            );

            interpreter.add_word(
                location.path().clone(),
                location.line(),
                location.column(),
                reader_word,
                Arc::new(move |interpreter: &mut dyn Interpreter| {
                    let data = interpreter.pop_as_structure()?;
                    let value = data.locked().read_field(interpreter, index)?;

                    interpreter.push(value);
                    Ok(())
                }),
                format!("Read from the structure {} field {}.", struct_name, field_name),
                "struct -- value".to_string(),
                WordMode::Normal,
                visibility.clone(),
                WordKind::Native,
            );

            interpreter.add_word(
                location.path().clone(),
                location.line(),
                location.column(),
                var_writer_word,
                Arc::new(move |interpreter: &mut dyn Interpreter| {
                    let data = pop_structure_variable(interpreter)?;
                    let value = interpreter.pop()?;

                    let result = data.locked().write_field(interpreter, index, value);
                    result
                }),
                format!(
                    "Write to the field {} of a structure held in a variable.",
                    field_name
                ),
                "value struct-var -- ".to_string(),
                WordMode::Normal,
                visibility.clone(),
                WordKind::Native,
            );

            interpreter.add_word(
                location.path().clone(),
                location.line(),
                location.column(),
                var_reader_word,
                Arc::new(move |interpreter: &mut dyn Interpreter| {
                    let data = pop_structure_variable(interpreter)?;
                    let value = data.locked().read_field(interpreter, index)?;

                    interpreter.push(value);
                    Ok(())
                }),
                format!(
                    "Read the field {} of a structure held in a variable.",
                    field_name
                ),
                "struct-var -- value".to_string(),
                WordMode::Normal,
                visibility.clone(),
                WordKind::Native,
            );
        }
    }
}

/// Pop a variable index from the stack and fetch the structure held in that variable.
fn pop_structure_variable(interpreter: &mut dyn Interpreter) -> error::Result<DataObjectPtr> {
    let var_index = interpreter.pop_as_usize()?;

    if var_index >= interpreter.variables().len() {
        return script_error(
            interpreter,
            format!(
                "Variable index {} is out of range of the variable list, {}.",
                var_index,
                interpreter.variables().len()
            ),
        );
    }

    let value = interpreter.variables()[var_index].clone();

    Ok(value.as_structure(interpreter)?.clone())
}

/// A live structure instance: a shared reference to its definition and the field values, stored
/// parallel to the definition's field name list.
#[derive(Clone, Debug)]
pub struct DataObject {
    pub definition: DataObjectDefinitionPtr,
    pub fields: Vec<Value>,
}

pub type DataObjectPtr = SharedPtr<DataObject>;

/// Structures are equal when they have the same definition name and structurally equal fields.
impl PartialEq for DataObject {
    fn eq(&self, other: &DataObject) -> bool {
        self.definition.name == other.definition.name && self.fields == other.fields
    }
}

impl Eq for DataObject {}

impl PartialOrd for DataObject {
    fn partial_cmp(&self, other: &DataObject) -> Option<Ordering> {
        match self.definition.name.partial_cmp(&other.definition.name) {
            Some(Ordering::Equal) => self.fields.partial_cmp(&other.fields),
            unequal => unequal,
        }
    }
}

/// Hash the definition name and fold in the field hashes, consistent with equality.
impl Hash for DataObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.definition.name.hash(state);

        for field in &self.fields {
            field.hash(state);
            0x9e3779b9u32.hash(state);
        }
    }
}

impl DeepClone for DataObject {
    fn deep_clone(&self) -> Value {
        let fields = self.fields.iter().map(|field| field.deep_clone()).collect();

        Value::Structure(shared_ptr(DataObject {
            definition: self.definition.clone(),
            fields,
        }))
    }
}

impl DeepClone for DataObjectPtr {
    fn deep_clone(&self) -> Value {
        self.locked().deep_clone()
    }
}

/// Print the structure with one field per line, preserving the definition's field order.
impl Display for DataObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "# {}", self.definition.name)?;

        format_indent_inc();

        for (index, field) in self.fields.iter().enumerate() {
            writeln!(
                f,
                "{:indent$}{} -> {}{}",
                "",
                self.definition.field_names[index],
                quoted(field),
                if index < self.fields.len() - 1 { "," } else { "" },
                indent = format_indent()
            )?;
        }

        format_indent_dec();

        write!(f, "{:indent$};", "", indent = format_indent())
    }
}

impl DataObject {
    /// Create an instance with every field deep copied from the definition's defaults, so
    /// instances never alias their defaults or each other.
    pub fn new(definition: &DataObjectDefinitionPtr) -> DataObjectPtr {
        let fields = definition
            .defaults
            .iter()
            .map(|default| default.deep_clone())
            .collect();

        shared_ptr(DataObject {
            definition: definition.clone(),
            fields,
        })
    }

    /// Read a field by index, range checked.
    pub fn read_field(
        &self,
        interpreter: &dyn Interpreter,
        index: usize,
    ) -> error::Result<Value> {
        if index >= self.fields.len() {
            return script_error(
                interpreter,
                format!(
                    "Field index {} is out of range for the structure {}.",
                    index, self.definition.name
                ),
            );
        }

        Ok(self.fields[index].clone())
    }

    /// Write a field by index, range checked.
    pub fn write_field(
        &mut self,
        interpreter: &dyn Interpreter,
        index: usize,
        value: Value,
    ) -> error::Result<()> {
        if index >= self.fields.len() {
            return script_error(
                interpreter,
                format!(
                    "Field index {} is out of range for the structure {}.",
                    index, self.definition.name
                ),
            );
        }

        self.fields[index] = value;
        Ok(())
    }
}
