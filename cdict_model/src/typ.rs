// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! C types of the symbol dictionary, and the struct/union descriptors they refer to.

use crate::bind::{ArgReader, Bindable, Unbound};
use crate::dictionary::Ref;
use crate::error::{Domain, ModelError};
use crate::file::CFile;
use crate::record::{Id, TaggedRecord};
use crate::registry::VariantRegistry;
use lazy_static::lazy_static;
use std::fmt;

/// Spellings of the analyzer's integer kind codes.
const INT_SPELLINGS: &[(&str, &str)] = &[
    ("ichar", "char"),
    ("ischar", "signed char"),
    ("iuchar", "unsigned char"),
    ("ibool", "bool"),
    ("iint", "int"),
    ("iuint", "unsigned int"),
    ("ishort", "short"),
    ("iushort", "unsigned short"),
    ("ilong", "long"),
    ("iulong", "unsigned long"),
    ("ilonglong", "long long"),
    ("iulonglong", "unsigned long long"),
];

/// Spellings of the analyzer's float kind codes. `fdouble` is kept as written.
const FLOAT_SPELLINGS: &[(&str, &str)] =
    &[("fdouble", "fdouble"), ("float", "float"), ("flongdouble", "long double")];

/// Type tags that are recognized but not modelled yet.
const PLACEHOLDER_TAGS: &[&str] = &["tarray", "tenum", "tbuiltin-va-list", "tbuiltinvaargs"];

fn spelling<'a>(table: &[(&str, &'a str)], code: &'a str) -> &'a str {
    table.iter().find(|(key, _)| *key == code).map_or(code, |(_, text)| *text)
}

/// The variant of a type record, known from its tag alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHead {
    Void,
    Pointer,
    Comp,
    Int,
    Float,
    Named,
    Function,
    Unknown(String),
}

impl fmt::Display for TypeHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHead::Void => write!(f, "void type"),
            TypeHead::Pointer => write!(f, "pointer type"),
            TypeHead::Comp => write!(f, "composite type"),
            TypeHead::Int => write!(f, "integer type"),
            TypeHead::Float => write!(f, "float type"),
            TypeHead::Named => write!(f, "named type"),
            TypeHead::Function => write!(f, "function type"),
            TypeHead::Unknown(kind) => write!(f, "{kind} type"),
        }
    }
}

fn unknown_type(record: TaggedRecord) -> Unbound<TypeHead> {
    let kind = record.tag_key().unwrap_or_default().to_string();
    Unbound::new(record, TypeHead::Unknown(kind))
}

lazy_static! {
    static ref TYPE_REGISTRY: VariantRegistry<TypeHead> = {
        let mut registry = VariantRegistry::new(Domain::Type, unknown_type);
        registry
            .register("tvoid", |record| Unbound::new(record, TypeHead::Void))
            .register("tptr", |record| Unbound::new(record, TypeHead::Pointer))
            .register("tcomp", |record| Unbound::new(record, TypeHead::Comp))
            .register("tint", |record| Unbound::new(record, TypeHead::Int))
            .register("tfloat", |record| Unbound::new(record, TypeHead::Float))
            .register("tnamed", |record| Unbound::new(record, TypeHead::Named))
            .register("tfun", |record| Unbound::new(record, TypeHead::Function));
        for tag in PLACEHOLDER_TAGS.iter().copied() {
            registry.register(tag, unknown_type);
        }
        registry
    };
}

/// Constructs the unbound type described by `record`.
pub fn build_type(record: TaggedRecord) -> Result<Unbound<TypeHead>, ModelError> {
    TYPE_REGISTRY.build(record)
}

/// A C type.
///
/// References to other types are [Ref]s into the type dictionary of the same unit and are
/// only followed when rendering, through [display_type].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    /// `void`
    Void,
    /// `target *`
    Pointer { target: Ref<CType> },
    /// A struct or union, by compinfo key.
    Comp { compinfo: Ref<CompInfo> },
    /// An integer type by kind code, e.g. `iint`.
    Int { ikind: String },
    /// A floating point type by kind code, e.g. `fdouble`.
    Float { fkind: String },
    /// A typedef name.
    Named { name: String },
    /// `return_type (args)`. Prototype-less functions have no argument list.
    Function { return_type: Ref<CType>, args: Option<Ref<FunArgs>> },
    /// Any type tag that is not modelled, e.g. `tarray`.
    Unknown { kind: String },
}

impl Bindable for CType {
    type Head = TypeHead;
    const DOMAIN: Domain = Domain::Type;

    fn bind(head: &TypeHead, args: ArgReader<'_>) -> Result<Self, ModelError> {
        let typ = match head {
            TypeHead::Void => CType::Void,
            TypeHead::Pointer => CType::Pointer { target: args.typ(0)? },
            TypeHead::Comp => CType::Comp { compinfo: args.compinfo(0)? },
            TypeHead::Int => CType::Int { ikind: args.tag(1)? },
            TypeHead::Float => CType::Float { fkind: args.tag(1)? },
            TypeHead::Named => CType::Named { name: args.tag(1)? },
            TypeHead::Function => {
                let funargs = if args.args().len() > 1 { Some(args.funargs(1)?) } else { None };
                CType::Function { return_type: args.typ(0)?, args: funargs }
            }
            TypeHead::Unknown(kind) => CType::Unknown { kind: kind.clone() },
        };
        Ok(typ)
    }
}

impl CType {
    fn render(&self, file: &CFile, visiting: &mut Vec<Id>, out: &mut String) {
        match self {
            CType::Void => out.push_str("void"),
            CType::Pointer { target } => {
                out.push('(');
                render_ref(*target, file, visiting, out);
                out.push_str(" *)");
            }
            CType::Comp { compinfo } => match file.get_struct(compinfo.id()) {
                Ok(compinfo) => out.push_str(&compinfo.to_string()),
                Err(_) => out.push_str(&format!("<missing struct #{}>", compinfo.id())),
            },
            CType::Int { ikind } => {
                out.push_str(&format!("({})", spelling(INT_SPELLINGS, ikind)))
            }
            CType::Float { fkind } => {
                out.push_str(&format!("({})", spelling(FLOAT_SPELLINGS, fkind)))
            }
            CType::Named { name } => out.push_str(name),
            CType::Function { return_type, args } => {
                out.push('(');
                if let Some(args) = args {
                    match file.get_funargs(args.id()) {
                        Ok(args) => args.render(file, visiting, out),
                        Err(_) => out.push_str(&format!("<missing funargs #{}>", args.id())),
                    }
                }
                out.push_str("):");
                render_ref(*return_type, file, visiting, out);
            }
            CType::Unknown { kind } => out.push_str(&format!("-{kind}-")),
        }
    }
}

fn render_ref(target: Ref<CType>, file: &CFile, visiting: &mut Vec<Id>, out: &mut String) {
    let id = target.id();
    if visiting.contains(&id) {
        out.push_str(&format!("<cycle #{id}>"));
        return;
    }
    match file.get_type(id) {
        Ok(typ) => {
            visiting.push(id);
            typ.render(file, visiting, out);
            visiting.pop();
        }
        Err(_) => out.push_str(&format!("<missing type #{id}>")),
    }
}

/// Renders the type `id` of `file`. This is the canonical text of a type.
///
/// Composite types are rendered by name, so recursive structures are finite. A
/// pointer chain that leads back to a type already being rendered, `id` included, is
/// cut as `<cycle #id>`. A reference to a type that failed to bind renders as
/// `<missing type #id>`.
pub fn display_type(file: &CFile, id: Id) -> String {
    let mut out = String::new();
    render_ref(Ref::new(id), file, &mut Vec::new(), &mut out);
    out
}

/// The only variant of a function argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunArgsHead;

impl fmt::Display for FunArgsHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "argument list")
    }
}

/// The argument types of a function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunArgs {
    types: Vec<Ref<CType>>,
}

impl Bindable for FunArgs {
    type Head = FunArgsHead;
    const DOMAIN: Domain = Domain::Funargs;

    fn bind(_head: &FunArgsHead, args: ArgReader<'_>) -> Result<Self, ModelError> {
        let types = (0..args.args().len())
            .map(|position| args.typ(position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FunArgs { types })
    }
}

impl FunArgs {
    pub fn types(&self) -> &[Ref<CType>] {
        &self.types
    }

    pub fn display(&self, file: &CFile) -> String {
        let mut out = String::new();
        self.render(file, &mut Vec::new(), &mut out);
        out
    }

    fn render(&self, file: &CFile, visiting: &mut Vec<Id>, out: &mut String) {
        for (position, typ) in self.types.iter().enumerate() {
            if position > 0 {
                out.push_str(", ");
            }
            render_ref(*typ, file, visiting, out);
        }
    }
}

/// A member of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub typ: Ref<CType>,
}

/// A struct or union descriptor, keyed by its compinfo key.
///
/// Descriptors are complete once construction ends: their fields are attached from the
/// field table before anything is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompInfo {
    key: Id,
    name: String,
    is_struct: bool,
    fields: Vec<FieldInfo>,
}

impl CompInfo {
    /// Reads a compinfo row: tags `[name]`, args `[key, is_struct]`.
    pub fn from_record(record: &TaggedRecord) -> Result<Self, ModelError> {
        let domain = Domain::Struct;
        let name = record.tag_key().ok_or(ModelError::EmptyTag { domain, id: record.id })?;
        let arg = |position: usize| {
            record.args.get(position).copied().ok_or(ModelError::MissingArgument {
                domain,
                id: record.id,
                position,
            })
        };
        Ok(CompInfo { key: arg(0)?, name: name.to_string(), is_struct: arg(1)? == 1, fields: vec![] })
    }

    pub fn key(&self) -> Id {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_struct(&self) -> bool {
        self.is_struct
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub(crate) fn add_field(&mut self, field: FieldInfo) {
        self.fields.push(field);
    }
}

impl fmt::Display for CompInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_struct { "struct" } else { "union" };
        write!(f, "{keyword} {}({})", self.name, self.key)
    }
}
