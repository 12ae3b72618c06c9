// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Proof obligation predicates: the verification conditions the analyzer attaches to
//! program points.

use crate::bind::{ArgReader, Bindable, Unbound};
use crate::dictionary::Ref;
use crate::error::{Domain, ModelError};
use crate::file::CFile;
use crate::record::{Id, TaggedRecord};
use crate::registry::VariantRegistry;
use crate::term::{Expression, LValue};
use crate::typ::{CType, display_type};
use lazy_static::lazy_static;
use std::fmt;
use std::str::FromStr;
use strum::{EnumMessage, IntoEnumIterator};
use strum_macros::{AsRefStr, EnumIter, EnumMessage, EnumString, IntoStaticStr};

/// The kind of a predicate, selected by its tag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,
    EnumIter,
    EnumMessage,
    EnumString,
    IntoStaticStr
)]
pub enum PredicateKind {
    #[strum(serialize = "ab", message = "Allocation Base")]
    AllocationBase,
    #[strum(serialize = "c", message = "Cast")]
    Cast,
    #[strum(serialize = "cb", message = "Common Base")]
    CommonBase,
    #[strum(serialize = "cbt", message = "Common Base Type")]
    CommonBaseType,
    #[strum(serialize = "csu", message = "Signed To Unsigned Cast")]
    SignedToUnsignedCast,
    #[strum(serialize = "cus", message = "Unsigned To Signed Cast")]
    UnsignedToSignedCast,
    #[strum(serialize = "ft", message = "Format String")]
    FormatString,
    #[strum(serialize = "gm", message = "Global Mem")]
    GlobalMem,
    #[strum(serialize = "i", message = "Initialized")]
    Initialized,
    #[strum(serialize = "ilb", message = "Index Lower Bound")]
    IndexLowerBound,
    #[strum(serialize = "io", message = "Int Overflow")]
    IntOverflow,
    #[strum(serialize = "ir", message = "Initialized Range")]
    InitializedRange,
    #[strum(serialize = "iu", message = "Int Underflow")]
    IntUnderflow,
    #[strum(serialize = "iub", message = "Index Upper Bound")]
    IndexUpperBound,
    #[strum(serialize = "lb", message = "Lower Bound")]
    LowerBound,
    #[strum(serialize = "nn", message = "Not Null")]
    NotNull,
    #[strum(serialize = "nneg", message = "Non Negative")]
    NonNegative,
    #[strum(serialize = "no", message = "No Overlap")]
    NoOverlap,
    #[strum(serialize = "nt", message = "Null Terminated")]
    NullTerminated,
    #[strum(serialize = "null", message = "Null")]
    Null,
    #[strum(serialize = "pc", message = "Pointer Cast")]
    PointerCast,
    #[strum(serialize = "plb", message = "Ptr Lower Bound")]
    PtrLowerBound,
    #[strum(serialize = "pre", message = "Predicate")]
    Predicate,
    #[strum(serialize = "pub", message = "Ptr Upper Bound")]
    PtrUpperBound,
    #[strum(serialize = "pubd", message = "Ptr Upper Bound Deref")]
    PtrUpperBoundDeref,
    #[strum(serialize = "tao", message = "Type At Offset")]
    TypeAtOffset,
    #[strum(serialize = "ub", message = "Upper Bound")]
    UpperBound,
    #[strum(serialize = "vc", message = "Value Constraint")]
    ValueConstraint,
    #[strum(serialize = "vm", message = "Valid Mem")]
    ValidMem,
    #[strum(serialize = "w", message = "Width Overflow")]
    WidthOverflow,
    #[strum(serialize = "z", message = "Not Zero")]
    NotZero,
    /// Any tag not listed above.
    #[strum(serialize = "unknown", message = "Unknown")]
    Unknown,
}

impl PredicateKind {
    /// The human readable name, e.g. `Not Null`.
    pub fn label(&self) -> &'static str {
        self.get_message().unwrap_or("Unknown")
    }

    /// The tag that selects this kind, e.g. `nn`.
    pub fn tag(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What is known about a predicate record before binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateHead {
    pub kind: PredicateKind,
    /// The tag as written, kept for unknown kinds.
    pub tag: String,
}

impl fmt::Display for PredicateHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PredicateKind::Unknown => write!(f, "-{}- predicate", self.tag),
            kind => write!(f, "{kind} predicate"),
        }
    }
}

fn predicate_head(record: TaggedRecord) -> Unbound<PredicateHead> {
    let tag = record.tag_key().unwrap_or_default().to_string();
    let kind = PredicateKind::from_str(&tag).unwrap_or(PredicateKind::Unknown);
    Unbound::new(record, PredicateHead { kind, tag })
}

fn unknown_predicate(record: TaggedRecord) -> Unbound<PredicateHead> {
    let tag = record.tag_key().unwrap_or_default().to_string();
    Unbound::new(record, PredicateHead { kind: PredicateKind::Unknown, tag })
}

lazy_static! {
    static ref PREDICATE_REGISTRY: VariantRegistry<PredicateHead> = {
        let mut registry = VariantRegistry::new(Domain::Predicate, unknown_predicate);
        for kind in PredicateKind::iter().filter(|kind| *kind != PredicateKind::Unknown) {
            registry.register(kind.tag(), predicate_head);
        }
        registry
    };
}

/// Constructs the unbound predicate described by `record`.
pub fn build_predicate(record: TaggedRecord) -> Result<Unbound<PredicateHead>, ModelError> {
    PREDICATE_REGISTRY.build(record)
}

/// The operands of a predicate. Several kinds share a body layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateBody {
    Expression { exp: Ref<Expression> },
    TypeAndExpression { typ: Ref<CType>, exp: Ref<Expression> },
    Cast { from: Ref<CType>, to: Ref<CType>, exp: Ref<Expression> },
    IntKindCast { exp: Ref<Expression>, from_kind: String, to_kind: String },
    Initialized { lval: Ref<LValue> },
    InitializedRange { exp: Ref<Expression>, len: Ref<Expression> },
    IntOverflow { binop: String, ikind: String, exp1: Ref<Expression>, exp2: Ref<Expression> },
    WidthOverflow { kind: String, exp: Ref<Expression> },
    PointerBound { binop: String, typ: Ref<CType>, exp1: Ref<Expression>, exp2: Ref<Expression> },
    TwoExpressions { exp1: Ref<Expression>, exp2: Ref<Expression> },
    Unknown { tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    id: Id,
    kind: PredicateKind,
    body: PredicateBody,
}

impl Bindable for Predicate {
    type Head = PredicateHead;
    const DOMAIN: Domain = Domain::Predicate;

    fn bind(head: &PredicateHead, args: ArgReader<'_>) -> Result<Self, ModelError> {
        use PredicateKind::*;
        let body = match head.kind {
            NotNull | Null | ValidMem | GlobalMem | AllocationBase | IndexLowerBound
            | IndexUpperBound | NotZero | NullTerminated | NonNegative | FormatString
            | ValueConstraint | Predicate => PredicateBody::Expression { exp: args.expression(0)? },
            TypeAtOffset | LowerBound | UpperBound => {
                PredicateBody::TypeAndExpression { typ: args.typ(0)?, exp: args.expression(1)? }
            }
            Cast | PointerCast => PredicateBody::Cast {
                from: args.typ(0)?,
                to: args.typ(1)?,
                exp: args.expression(2)?,
            },
            SignedToUnsignedCast | UnsignedToSignedCast => PredicateBody::IntKindCast {
                exp: args.expression(0)?,
                from_kind: args.tag(1)?,
                to_kind: args.tag(2)?,
            },
            Initialized => PredicateBody::Initialized { lval: args.lvalue(0)? },
            InitializedRange => {
                PredicateBody::InitializedRange { exp: args.expression(0)?, len: args.expression(1)? }
            }
            IntOverflow | IntUnderflow => PredicateBody::IntOverflow {
                binop: args.tag(1)?,
                ikind: args.tag(2)?,
                exp1: args.expression(0)?,
                exp2: args.expression(1)?,
            },
            WidthOverflow => {
                PredicateBody::WidthOverflow { kind: args.tag(1)?, exp: args.expression(0)? }
            }
            PtrLowerBound | PtrUpperBound | PtrUpperBoundDeref => PredicateBody::PointerBound {
                binop: args.tag(1)?,
                typ: args.typ(0)?,
                exp1: args.expression(1)?,
                exp2: args.expression(2)?,
            },
            CommonBase | CommonBaseType | NoOverlap => {
                PredicateBody::TwoExpressions { exp1: args.expression(0)?, exp2: args.expression(1)? }
            }
            Unknown => PredicateBody::Unknown { tag: head.tag.clone() },
        };
        Ok(Self { id: args.id(), kind: head.kind, body })
    }
}

/// Infix spellings of the analyzer's binary operators.
const BINOPS: &[(&str, &str)] = &[
    ("plus", "+"),
    ("minus", "-"),
    ("plusa", "+"),
    ("pluspi", "+"),
    ("minusa", "-"),
    ("minuspi", "-"),
    ("minuspp", "-"),
    ("mult", "*"),
    ("div", "/"),
    ("mod", "%"),
    ("shiftlt", "<<"),
    ("shiftrt", ">>"),
    ("lt", "<"),
    ("gt", ">"),
    ("le", "<="),
    ("ge", ">="),
    ("eq", "=="),
    ("ne", "!="),
    ("band", "&"),
    ("bxor", "^"),
    ("bor", "|"),
    ("land", "&&"),
    ("lor", "||"),
];

fn render_binop(op: &str, left: &str, right: &str) -> String {
    if op == "indexpi" {
        return format!("{left}[{right}]");
    }
    match BINOPS.iter().find(|(name, _)| *name == op) {
        Some((_, symbol)) => format!("{left} {symbol} {right}"),
        None => format!("{op}({left}, {right})"),
    }
}

impl Predicate {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn body(&self) -> &PredicateBody {
        &self.body
    }

    /// The operands of this predicate, resolved in `file`.
    pub fn express(&self, file: &CFile) -> String {
        let exp = |exp: &Ref<Expression>| match file.get_expression(exp.id()) {
            Ok(exp) => exp.to_string(),
            Err(error) => format!("<{error}>"),
        };
        let typ = |typ: &Ref<CType>| display_type(file, typ.id());
        match &self.body {
            PredicateBody::Expression { exp: e } => exp(e),
            PredicateBody::TypeAndExpression { typ: t, exp: e } => format!("{}, {}", typ(t), exp(e)),
            PredicateBody::Cast { from, to, exp: e } => {
                format!("{},from:{},to:{}", exp(e), typ(from), typ(to))
            }
            PredicateBody::IntKindCast { exp: e, from_kind, to_kind } => {
                format!("{},from:{from_kind},to:{to_kind}", exp(e))
            }
            PredicateBody::Initialized { lval } => match file.get_lvalue(lval.id()) {
                Ok(lval) => lval.to_string(),
                Err(error) => format!("<{error}>"),
            },
            PredicateBody::InitializedRange { exp: e, len } => {
                format!("{}, len:{}", exp(e), exp(len))
            }
            PredicateBody::IntOverflow { binop, ikind, exp1, exp2 } => {
                format!("{}, ikind:{ikind}", render_binop(binop, &exp(exp1), &exp(exp2)))
            }
            PredicateBody::WidthOverflow { kind, exp: e } => format!("{}, kind:{kind}", exp(e)),
            PredicateBody::PointerBound { binop, typ: t, exp1, exp2 } => {
                format!("{}, typ:{}", render_binop(binop, &exp(exp1), &exp(exp2)), typ(t))
            }
            PredicateBody::TwoExpressions { exp1, exp2 } => format!("{}, {}", exp(exp1), exp(exp2)),
            PredicateBody::Unknown { tag } => format!("-{tag}-"),
        }
    }

    /// The canonical text: the kind label, then the operands on an indented line.
    pub fn display(&self, file: &CFile) -> String {
        format!("{}\n\t{}", self.kind.label(), self.express(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindOrder;
    use crate::fixtures::UnitBuilder;

    fn unit() -> UnitBuilder {
        UnitBuilder::new("main.c")
            .typ(1, "tint,iint", "")
            .typ(2, "tptr", "1")
            .expression(1, "lval", "1")
            .expression(2, "const", "4")
            .lval(1, "var,p", "")
    }

    #[test]
    fn check_not_null() {
        let file = unit().predicate(1, "nn", "1").build();
        let predicate = file.get_predicate(1).unwrap();
        assert_eq!(predicate.kind(), PredicateKind::NotNull);
        assert_eq!(predicate.display(&file), "Not Null\n\tlval(1)");
    }

    #[test]
    fn check_sign_casts_stay_distinct() {
        let file = unit().predicate(1, "csu,iint,iuint", "1").predicate(2, "cus,iuint,iint", "1").build();
        let csu = file.get_predicate(1).unwrap();
        let cus = file.get_predicate(2).unwrap();
        assert_eq!(csu.kind(), PredicateKind::SignedToUnsignedCast);
        assert_eq!(cus.kind(), PredicateKind::UnsignedToSignedCast);
        assert_ne!(csu.display(&file), cus.display(&file));
        assert_eq!(csu.display(&file), "Signed To Unsigned Cast\n\tlval(1),from:iint,to:iuint");
    }

    #[test]
    fn check_operand_layouts() {
        let file = unit()
            .predicate(1, "io,plusa,iint", "1,2")
            .predicate(2, "pub,indexpi", "2,1,2")
            .predicate(3, "c", "1,2,1")
            .predicate(4, "i", "1")
            .predicate(5, "ir", "1,2")
            .predicate(6, "w,iint", "2")
            .predicate(7, "cb", "1,2")
            .predicate(8, "iu,xor,iint", "1,2")
            .predicate(9, "lb", "2,1")
            .build();
        let express = |id| file.get_predicate(id).unwrap().express(&file);
        assert_eq!(express(1), "lval(1) + const(4), ikind:iint");
        assert_eq!(express(2), "lval(1)[const(4)], typ:((int) *)");
        assert_eq!(express(3), "lval(1),from:(int),to:((int) *)");
        assert_eq!(express(4), "var:p");
        assert_eq!(express(5), "lval(1), len:const(4)");
        assert_eq!(express(6), "const(4), kind:iint");
        assert_eq!(express(7), "lval(1), const(4)");
        assert_eq!(express(8), "xor(lval(1), const(4)), ikind:iint");
        assert_eq!(express(9), "((int) *), lval(1)");
    }

    #[test]
    fn check_binop_spellings() {
        let file = unit()
            .predicate(1, "io,plus,iint", "1,2")
            .predicate(2, "iu,minus,iuint", "1,2")
            .predicate(3, "io,shiftlt,iint", "1,2")
            .build();
        let express = |id| file.get_predicate(id).unwrap().express(&file);
        assert_eq!(express(1), "lval(1) + const(4), ikind:iint");
        assert_eq!(express(2), "lval(1) - const(4), ikind:iuint");
        assert_eq!(express(3), "lval(1) << const(4), ikind:iint");
    }

    #[test]
    fn check_blank_tag_is_missing() {
        let (file, errors) = unit().predicate(1, "io,,iint", "1,2").build_with_errors();
        assert!(file.get_predicate(1).is_err());
        assert_eq!(errors.messages_for("main_prd.json"), vec![
            "predicate #1: no tag token at position 1 (Int Overflow predicate)",
        ]);
    }

    #[test]
    fn check_unknown_kind() {
        let file = unit().predicate(1, "zz", "1").build();
        let predicate = file.get_predicate(1).unwrap();
        assert_eq!(predicate.kind(), PredicateKind::Unknown);
        assert_eq!(predicate.display(&file), "Unknown\n\t-zz-");
    }

    #[test]
    fn check_missing_operand() {
        let (file, errors) = unit().predicate(1, "nn", "9").predicate(2, "w", "1").build_with_errors();
        assert!(file.get_predicate(1).is_err());
        assert!(file.get_predicate(2).is_err());
        assert_eq!(errors.messages_for("main_prd.json"), vec![
            "missing expression #9 (Not Null predicate)",
            "predicate #2: no tag token at position 1 (Width Overflow predicate)",
        ]);
    }

    #[test]
    fn check_bind_order_does_not_matter() {
        let build = |order| {
            let file = unit()
                .predicate(1, "nn", "1")
                .predicate(2, "tao", "2,2")
                .predicate(3, "no", "2,1")
                .predicate(4, "pre", "7")
                .order(order)
                .build_with_errors()
                .0;
            let predicates = file.predicates().unwrap();
            predicates.iter().map(|(_, p)| p.display(&file)).collect::<Vec<_>>()
        };
        let declaration = build(BindOrder::Declaration);
        assert_eq!(declaration.len(), 3);
        assert_eq!(build(BindOrder::Reversed), declaration);
        assert_eq!(build(BindOrder::Parallel), declaration);
    }

    #[test]
    fn check_kind_tags() {
        assert_eq!(PredicateKind::from_str("pubd").unwrap(), PredicateKind::PtrUpperBoundDeref);
        assert_eq!(PredicateKind::NotZero.tag(), "z");
        assert_eq!(PredicateKind::NotZero.to_string(), "Not Zero");
        assert!(PREDICATE_REGISTRY.is_registered("cbt"));
        assert!(!PREDICATE_REGISTRY.is_registered("unknown"));
    }
}
