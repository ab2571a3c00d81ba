//! Per-target conversion tables and fixed syntax tokens.
//!
//! The table owns every tag-to-token decision, including how a target buckets
//! numeric families; the renderer only asks. Lookups match the whole tag, so
//! a custom type whose name merely contains a primitive name passes through
//! untouched.

use crate::diag::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// Union-based optionality (`?T`), open vs exact object types.
    Flow,
    /// Field-marker optionality (`name?:`), open object types only.
    Typescript,
    /// `Maybe` wrapper, records without structural subtyping.
    Elm,
}

impl Lang {
    pub fn all() -> &'static [Lang] {
        &[Lang::Flow, Lang::Typescript, Lang::Elm]
    }

    pub const fn table(self) -> &'static Table {
        match self {
            Lang::Flow => &FLOW,
            Lang::Typescript => &TYPESCRIPT,
            Lang::Elm => &ELM,
        }
    }

    /// File prologue. Deterministic: no timestamps, no environment.
    pub const fn header(self) -> &'static str {
        match self {
            Lang::Flow => "// @flow\n// Generated by typeshift. DO NOT EDIT.\n",
            Lang::Typescript => "// Generated by typeshift. DO NOT EDIT.\n",
            Lang::Elm => {
                "module Models exposing (..)\n\n{-| Generated by typeshift. DO NOT EDIT. -}\n\nimport Dict exposing (Dict)\nimport Json.Decode as Decode\nimport Time\n"
            }
        }
    }

    pub const fn comment_leader(self) -> &'static str {
        match self {
            Lang::Flow | Lang::Typescript => "//",
            Lang::Elm => "--",
        }
    }
}

impl std::str::FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "flow" => Ok(Lang::Flow),
            "ts" | "typescript" => Ok(Lang::Typescript),
            "elm" => Ok(Lang::Elm),
            other => Err(Error::UnknownLang(other.to_string())),
        }
    }
}

/// Static tag-to-token mapping for one target.
#[derive(Debug)]
pub struct Table {
    /// Canonical primitive tags. Tags absent here are opaque custom type
    /// names and pass through verbatim.
    pub prims: &'static [(&'static str, &'static str)],
    /// Token for the no-static-constraint type.
    pub any_: &'static str,
    /// Token for an anonymous inline object.
    pub anon: &'static str,
    /// Token for the designated date/time scalar.
    pub time: &'static str,
}

impl Table {
    /// Whole-tag lookup; unknown tags pass through as custom type names.
    pub fn prim<'a>(&self, tag: &'a str) -> &'a str {
        self.prims
            .iter()
            .find(|(from, _)| *from == tag)
            .map_or(tag, |(_, to)| *to)
    }
}

/// Flow and TypeScript agree on primitives: one numeric bucket, `boolean`.
const ECMA_PRIMS: &[(&'static str, &'static str)] = &[
    ("int64", "number"),
    ("int32", "number"),
    ("int16", "number"),
    ("int8", "number"),
    ("int", "number"),
    ("uint64", "number"),
    ("uint32", "number"),
    ("uint16", "number"),
    ("uint8", "number"),
    ("uint", "number"),
    ("byte", "number"),
    ("rune", "number"),
    ("float32", "number"),
    ("float64", "number"),
    ("complex64", "number"),
    ("complex128", "number"),
    ("bool", "boolean"),
];

pub static FLOW: Table = Table {
    prims: ECMA_PRIMS,
    any_: "any",
    anon: "Object",
    time: "Date",
};

pub static TYPESCRIPT: Table = Table {
    prims: ECMA_PRIMS,
    any_: "any",
    anon: "Object",
    time: "Date",
};

pub static ELM: Table = Table {
    prims: &[
        ("string", "String"),
        ("int64", "Int"),
        ("int32", "Int"),
        ("int16", "Int"),
        ("int8", "Int"),
        ("int", "Int"),
        ("uint64", "Int"),
        ("uint32", "Int"),
        ("uint16", "Int"),
        ("uint8", "Int"),
        ("uint", "Int"),
        ("byte", "Int"),
        ("rune", "Int"),
        ("float32", "Float"),
        ("float64", "Float"),
        ("complex64", "Float"),
        ("complex128", "Float"),
        ("bool", "Bool"),
    ],
    any_: "Decode.Value",
    anon: "Decode.Value",
    time: "Time.Posix",
};
