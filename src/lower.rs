use thiserror::Error;

use crate::decl::RawType;
use crate::ir::Ty;

/// Identifier classified as the designated date/time scalar.
pub const TEMPORAL_TYPE: &str = "time.Time";

/// A construct with no structural analog in any target. The caller skips the
/// field or declaration and records a diagnostic; nothing malformed reaches
/// the type model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a supported type: {0}")]
pub struct Unsupported(pub String);

/// Classify a raw type descriptor into exactly one model variant.
///
/// Inline structs have no declared shape at this level and classify as
/// anonymous objects; named struct bodies are materialized by the resolver
/// instead of passing through here.
pub fn lower_type(raw: &RawType) -> Result<Ty, Unsupported> {
    match raw {
        RawType::Ident { name } if name == TEMPORAL_TYPE => Ok(Ty::Time),
        RawType::Ident { name } => Ok(Ty::Prim(name.clone())),
        RawType::Pointer { elem } => Ok(Ty::optional(lower_type(elem)?)),
        RawType::Array { elem } => Ok(Ty::Array(Box::new(lower_type(elem)?))),
        RawType::Map { key, value } => Ok(Ty::Map {
            key: Box::new(lower_type(key)?),
            value: Box::new(lower_type(value)?),
        }),
        RawType::Struct { .. } => Ok(Ty::Anon),
        RawType::Interface { methods: 0 } => Ok(Ty::Any),
        RawType::Interface { .. } => Err(Unsupported("interface with methods".to_string())),
        RawType::Func => Err(Unsupported("function type".to_string())),
        RawType::Chan => Err(Unsupported("channel type".to_string())),
    }
}
