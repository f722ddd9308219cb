//! file: core/src/types.rs
//! description: the primitive type registry.
//!
//! Maps every primitive kind of the surface language to the standard
//! library class it lowers to and to the way a value of that kind is
//! constructed in the generated Perl. The registry is built once per
//! `Compiler` and handed out by reference; nothing here is mutable after
//! construction.

use std::fmt;

use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Integer,
    Boolean,
    Array,
    Map,
    Hash,
    Scalar,
}

/// Outcome of checking whether a value of one kind may flow into a slot of
/// another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compat {
    Exact,
    /// String/Integer/Boolean into Scalar; the value is unwrapped with
    /// `valueOf()`.
    CastScalar,
    Incompatible,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 7] = [
        PrimitiveKind::String,
        PrimitiveKind::Integer,
        PrimitiveKind::Boolean,
        PrimitiveKind::Array,
        PrimitiveKind::Map,
        PrimitiveKind::Hash,
        PrimitiveKind::Scalar,
    ];

    fn index(self) -> usize {
        match self {
            PrimitiveKind::String => 0,
            PrimitiveKind::Integer => 1,
            PrimitiveKind::Boolean => 2,
            PrimitiveKind::Array => 3,
            PrimitiveKind::Map => 4,
            PrimitiveKind::Hash => 5,
            PrimitiveKind::Scalar => 6,
        }
    }

    /// Kinds carrying an element template.
    pub fn is_container(self) -> bool {
        matches!(self, PrimitiveKind::Array | PrimitiveKind::Map)
    }

    pub fn casts_to_scalar(self) -> bool {
        matches!(
            self,
            PrimitiveKind::String | PrimitiveKind::Integer | PrimitiveKind::Boolean
        )
    }

    /// Kinds allowed as the element template of an Array or Map.
    pub fn is_template(self) -> bool {
        self.casts_to_scalar() || self == PrimitiveKind::Scalar
    }

    /// Can a value of kind `source` be stored in a slot of kind `self`?
    pub fn accepts(self, source: PrimitiveKind) -> Compat {
        if self == source {
            Compat::Exact
        } else if self == PrimitiveKind::Scalar && source.casts_to_scalar() {
            Compat::CastScalar
        } else {
            Compat::Incompatible
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Array => "array",
            PrimitiveKind::Map => "map",
            PrimitiveKind::Hash => "hash",
            PrimitiveKind::Scalar => "scalar",
        };
        write!(f, "{}", s)
    }
}

/// How a value node of a kind is built in the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constructor {
    /// `Class->new(...)` on a standard library class.
    Object,
    /// A bare Perl value (scalar or hash reference).
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub kind: PrimitiveKind,
    /// Registry key, e.g. `integer`.
    pub key: &'static str,
    /// Spelling in source files, e.g. `Int`.
    pub surface: &'static str,
    /// Target class, e.g. `stdlib::integer`.
    pub class: &'static str,
    pub constructor: Constructor,
}

const STANDARD_ENTRIES: [TypeEntry; 7] = [
    TypeEntry {
        kind: PrimitiveKind::String,
        key: "string",
        surface: "String",
        class: "stdlib::string",
        constructor: Constructor::Object,
    },
    TypeEntry {
        kind: PrimitiveKind::Integer,
        key: "integer",
        surface: "Int",
        class: "stdlib::integer",
        constructor: Constructor::Object,
    },
    TypeEntry {
        kind: PrimitiveKind::Boolean,
        key: "boolean",
        surface: "Boolean",
        class: "stdlib::boolean",
        constructor: Constructor::Object,
    },
    TypeEntry {
        kind: PrimitiveKind::Array,
        key: "array",
        surface: "Array",
        class: "stdlib::array",
        constructor: Constructor::Object,
    },
    TypeEntry {
        kind: PrimitiveKind::Map,
        key: "map",
        surface: "Map",
        class: "stdlib::hashmap",
        constructor: Constructor::Object,
    },
    TypeEntry {
        kind: PrimitiveKind::Hash,
        key: "hash",
        surface: "Hash",
        class: "hash",
        constructor: Constructor::Native,
    },
    TypeEntry {
        kind: PrimitiveKind::Scalar,
        key: "scalar",
        surface: "Scalar",
        class: "scalar",
        constructor: Constructor::Native,
    },
];

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    entries: [TypeEntry; 7],
}

impl TypeRegistry {
    pub fn standard() -> Self {
        TypeRegistry {
            entries: STANDARD_ENTRIES,
        }
    }

    pub fn entry(&self, kind: PrimitiveKind) -> &TypeEntry {
        &self.entries[kind.index()]
    }

    pub fn class_of(&self, kind: PrimitiveKind) -> &'static str {
        self.entry(kind).class
    }

    /// Look a kind up by registry key (`integer`) or surface name (`Int`).
    pub fn lookup(&self, name: &str) -> CompileResult<&TypeEntry> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.key == name || e.surface == name)
            .or_else(|| match name {
                "Bool" | "bool" => Some(self.entry(PrimitiveKind::Boolean)),
                "Integer" | "int" => Some(self.entry(PrimitiveKind::Integer)),
                _ => None,
            })
            .ok_or_else(|| CompileError::unknown_type(name, "sealang.types.lookup"))
    }

    /// Look up an element template for `Array<T>` / `Map<T>`.
    pub fn lookup_template(&self, name: &str) -> CompileResult<PrimitiveKind> {
        let entry = self.lookup(name)?;
        if !entry.kind.is_template() {
            return Err(CompileError::unknown_type(
                &format!("{} (not allowed as an element template)", name.trim()),
                "sealang.types.lookup_template",
            ));
        }
        Ok(entry.kind)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::standard()
    }
}
