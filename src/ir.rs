// Language-neutral type model. No raw wire-format types here; everything
// downstream of resolution operates on these.

use serde::Serialize;

/// Shape of a declaration or field, independent of any target syntax.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ty {
    /// Scalar or named type. The tag is either a canonical primitive name
    /// (`int64`, `float32`, `bool`, `string`, ...) or an opaque custom type
    /// name that passes through conversion untouched.
    Prim(String),
    /// Nullable/pointer wrapper. Never directly wraps another Optional.
    Optional(Box<Ty>),
    Array(Box<Ty>),
    Map { key: Box<Ty>, value: Box<Ty> },
    Struct { fields: Vec<Field>, exact: bool },
    /// Inline struct with no declared shape; the closest analog is an open,
    /// untyped object.
    Anon,
    /// Zero-method interface: no static constraint.
    Any,
    /// Designated date/time scalar, rendered distinctly per target.
    Time,
}

impl Ty {
    /// Wrap `inner` as optional, collapsing doubled wrappers.
    pub fn optional(inner: Ty) -> Ty {
        match inner {
            Ty::Optional(_) => inner,
            other => Ty::Optional(Box::new(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Display name: from the structured-data tag when present, else the
    /// declared field name.
    pub name: String,
    pub ty: Ty,
    /// Comment emitted above the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Comment emitted beside the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// When present, replaces `ty` entirely at render time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_ty: Option<Override>,
}

/// Explicit per-field type override extracted from the field's tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    pub tag: String,
    pub optional: bool,
}

/// A fully resolved top-level declaration: embedded fields are already merged
/// into the body and ignored declarations never make it this far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub body: Ty,
}
