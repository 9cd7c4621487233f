//! Extracted declaration records.
//!
//! Every file pass produces a [`ClassArena`]: a flat list of [`ClassRecord`]s
//! where nesting is expressed through [`ClassId`] links instead of owned
//! subtrees. The resolver only ever needs flat iteration, so records from
//! many files are merged by appending arenas.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Declared visibility, collapsed to the three levels every language shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    /// Parse a visibility keyword. `internal` maps to public.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" | "internal" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How one type refers to another.
///
/// Variant order is alphabetical so derived ordering matches the serialized
/// names when edges are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Structural use through a field, parameter or return type.
    Depended,
    /// Base class (or base interface of an interface).
    Extended,
    /// Interface realization.
    Implemented,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Depended => "depended",
            Self::Extended => "extended",
            Self::Implemented => "implemented",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference from a class to another type, named as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub target: String,
    pub kind: RelationKind,
}

/// Keyword a type was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Struct,
    Interface,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFlags {
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_interface: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFlags {
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_const: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub has_noexcept: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableFlags {
    pub is_static: bool,
    pub is_const: bool,
}

/// Whether a method record is an ordinary method or a special member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    #[default]
    Method,
    Constructor,
    Destructor,
}

/// One parameter of a method, type as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub type_name: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    pub name: String,
    pub kind: MethodKind,
    /// Absent for constructors, destructors and Kotlin functions without a
    /// declared return type.
    pub return_type: Option<String>,
    pub params: Vec<Param>,
    pub access: Access,
    pub flags: MethodFlags,
    pub generic_params: Vec<String>,
}

impl MethodRecord {
    /// Parameter types in declaration order.
    pub fn param_types(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.type_name.as_str())
    }

    /// One-line rendering used for graph nodes: `public static run(int, Foo): void`.
    pub fn signature(&self) -> String {
        let mut out = String::from(self.access.keyword());
        out.push(' ');
        if self.flags.is_static {
            out.push_str("static ");
        }
        out.push_str(&self.name);
        out.push('(');
        out.push_str(&self.param_types().collect::<Vec<_>>().join(", "));
        out.push(')');
        if let Some(ret) = &self.return_type {
            out.push_str(": ");
            out.push_str(ret);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRecord {
    pub name: String,
    /// Type as written, including pointer, reference and array markers.
    pub declared_type: String,
    /// Innermost contained type for containers and pointers, empty otherwise.
    pub target_type: String,
    pub access: Access,
    pub flags: VariableFlags,
}

impl VariableRecord {
    /// One-line rendering used for graph nodes: `private static int count`.
    pub fn signature(&self) -> String {
        let mut out = String::from(self.access.keyword());
        out.push(' ');
        if self.flags.is_static {
            out.push_str("static ");
        }
        // inferred Kotlin property types are left empty
        if !self.declared_type.is_empty() {
            out.push_str(&self.declared_type);
            out.push(' ');
        }
        out.push_str(&self.name);
        out
    }
}

/// Index of a record inside its [`ClassArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

/// One declared class, struct, interface or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    /// Simple identifier, never empty.
    pub name: String,
    /// Enclosing package or namespace; for nested types, the qualified name
    /// of the enclosing type.
    pub package: String,
    pub language: Language,
    pub kind: ClassKind,
    pub generic_params: Vec<String>,
    pub flags: ClassFlags,
    pub access: Access,
    pub relations: Vec<Relation>,
    pub methods: Vec<MethodRecord>,
    pub fields: Vec<VariableRecord>,
    pub parent: Option<ClassId>,
    pub nested: Vec<ClassId>,
    /// Imports of the declaring file, as written after the import keyword.
    pub imports: Vec<String>,
    pub file: PathBuf,
    pub line_start: usize,
    pub line_end: usize,
}

impl ClassRecord {
    pub fn new(name: impl Into<String>, package: impl Into<String>, language: Language) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            language,
            kind: ClassKind::Class,
            generic_params: Vec::new(),
            flags: ClassFlags::default(),
            access: Access::Public,
            relations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            parent: None,
            nested: Vec::new(),
            imports: Vec::new(),
            file: PathBuf::new(),
            line_start: 0,
            line_end: 0,
        }
    }

    /// Package plus simple name, joined with the language's separator.
    pub fn qualified_name(&self) -> String {
        self.language.qualify(&self.package, &self.name)
    }

    pub fn has_relation_to(&self, target: &str) -> bool {
        self.relations.iter().any(|r| r.target == target)
    }

    /// Record an inheritance relation, ignoring exact repeats.
    pub fn add_relation(&mut self, target: impl Into<String>, kind: RelationKind) {
        let target = target.into();
        if target.is_empty()
            || self
                .relations
                .iter()
                .any(|r| r.target == target && r.kind == kind)
        {
            return;
        }
        self.relations.push(Relation { target, kind });
    }

    /// Record a `Depended` relation unless the target is already related in any way.
    pub fn add_dependency(&mut self, target: impl Into<String>) {
        let target = target.into();
        if target.is_empty() || target == self.name || self.has_relation_to(&target) {
            return;
        }
        self.relations.push(Relation {
            target,
            kind: RelationKind::Depended,
        });
    }

    pub fn lines_of_code(&self) -> Option<usize> {
        (self.line_start > 0 && self.line_end >= self.line_start)
            .then(|| self.line_end - self.line_start + 1)
    }
}

/// Flat storage for every record of one or more files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassArena {
    records: Vec<ClassRecord>,
}

impl ClassArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record and return its id.
    pub fn push(&mut self, record: ClassRecord) -> ClassId {
        let id = ClassId(self.records.len());
        self.records.push(record);
        id
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassRecord> {
        self.records.get(id.0)
    }

    pub fn get_mut(&mut self, id: ClassId) -> Option<&mut ClassRecord> {
        self.records.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ClassRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &ClassRecord)> {
        self.records.iter().enumerate().map(|(i, r)| (ClassId(i), r))
    }

    /// Records not declared inside another record.
    pub fn roots(&self) -> impl Iterator<Item = (ClassId, &ClassRecord)> {
        self.iter().filter(|(_, r)| r.parent.is_none())
    }

    /// Direct children of a record.
    pub fn children(&self, id: ClassId) -> impl Iterator<Item = &ClassRecord> {
        self.get(id)
            .map(|r| r.nested.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// Move every record of `other` into this arena, shifting its ids.
    pub fn append(&mut self, other: ClassArena) {
        let offset = self.records.len();
        self.records.extend(other.records.into_iter().map(|mut r| {
            r.parent = r.parent.map(|p| ClassId(p.0 + offset));
            for child in &mut r.nested {
                child.0 += offset;
            }
            r
        }));
    }

    pub fn into_records(self) -> Vec<ClassRecord> {
        self.records
    }
}

impl FromIterator<ClassArena> for ClassArena {
    fn from_iter<I: IntoIterator<Item = ClassArena>>(iter: I) -> Self {
        let mut merged = ClassArena::new();
        for arena in iter {
            merged.append(arena);
        }
        merged
    }
}
