//! Raw declaration wire format.
//!
//! The source-parsing stage lives upstream of this tool; it hands us modules
//! of already-structured declarations as JSON. This module owns that contract:
//! the serde model, loading with JSON-path error context, and the struct-tag
//! string conventions (`json:"..."` display names and omission,
//! `typeshift:"Type,flag"` overrides).

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::diag::Error;

/// Tag key carrying a per-field type override.
pub const OVERRIDE_TAG: &str = "typeshift";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One module's worth of raw declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct RawModule {
    pub module: String,
    pub declarations: Vec<RawDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDecl {
    pub name: String,
    /// Top comment attached above the declaration.
    #[serde(default)]
    pub doc: Option<String>,
    /// Closed/exact structural marker, honored by targets that have one.
    #[serde(default)]
    pub strict: bool,
    /// Drop this declaration from the resolved set entirely.
    #[serde(default)]
    pub ignore: bool,
    pub body: RawType,
}

/// Type descriptor as produced by the upstream parser. Structured enough to
/// classify, including the constructs classification must reject.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawType {
    Ident {
        /// Local (`Person`) or qualified (`pkg.Person`) type name, or a
        /// canonical primitive tag.
        name: String,
    },
    Pointer {
        elem: Box<RawType>,
    },
    Array {
        elem: Box<RawType>,
    },
    Map {
        key: Box<RawType>,
        value: Box<RawType>,
    },
    /// Named declarations carry fields and embedded references; in a field
    /// position this is an anonymous inline struct and both lists stay empty.
    Struct {
        #[serde(default)]
        fields: Vec<RawField>,
        #[serde(default)]
        embedded: Vec<String>,
    },
    Interface {
        #[serde(default)]
        methods: u32,
    },
    Func,
    Chan,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: RawType,
    /// Raw structured-data tag string, e.g. `json:"id" typeshift:"UUID,true"`.
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// Read and parse one module file. Any failure here is fatal for the run.
pub fn load_module(path: &Path) -> Result<RawModule, Error> {
    let source = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_str_with_path(&source).map_err(|reason| Error::Parse {
        path: path.display().to_string(),
        reason,
    })
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path}: {}", err.into_inner())
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TAG STRING CONVENTIONS
// ————————————————————————————————————————————————————————————————————————————

/// Extract the value of `key:"..."` from a raw tag string. Tags follow the
/// conventional space-separated `key:"value"` layout; a malformed tail simply
/// stops the scan.
pub fn get_tag(tags: &str, key: &str) -> Option<String> {
    let mut rest = tags.trim();
    while !rest.is_empty() {
        let colon = rest.find(":\"")?;
        let (k, after) = rest.split_at(colon);
        let after = &after[2..];
        let end = after.find('"')?;
        let (value, tail) = after.split_at(end);
        if k.trim() == key {
            return Some(value.to_string());
        }
        rest = tail[1..].trim_start();
    }
    None
}

/// Display name for a field: the first segment of its `json` tag when present,
/// else the declared name. `None` means the tag omits the field entirely.
pub fn display_name(declared: &str, tags: Option<&str>) -> Option<String> {
    let Some(tags) = tags else {
        return Some(declared.to_string());
    };
    match get_tag(tags, "json") {
        None => Some(declared.to_string()),
        Some(value) => match value.split(',').next().unwrap_or("") {
            "-" => None,
            "" => Some(declared.to_string()),
            name => Some(name.to_string()),
        },
    }
}

/// Override annotation parsed out of the field tag. When the optionality flag
/// is not a bool the override still applies with `optional = false`, and the
/// offending text is kept for the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOverride {
    pub tag: String,
    pub optional: bool,
    pub malformed: Option<String>,
}

pub fn parse_override(tags: Option<&str>) -> Option<ParsedOverride> {
    let value = get_tag(tags?, OVERRIDE_TAG)?;
    let mut parts = value.splitn(2, ',');
    let tag = parts.next().unwrap_or("").trim();
    if tag.is_empty() {
        return None;
    }
    match parts.next() {
        None => Some(ParsedOverride {
            tag: tag.to_string(),
            optional: false,
            malformed: None,
        }),
        Some(flag) => match flag.trim().parse::<bool>() {
            Ok(optional) => Some(ParsedOverride {
                tag: tag.to_string(),
                optional,
                malformed: None,
            }),
            Err(_) => Some(ParsedOverride {
                tag: tag.to_string(),
                optional: false,
                malformed: Some(flag.trim().to_string()),
            }),
        },
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_tag_picks_the_right_key() {
        let tags = r#"json:"map_string_to_int" typeshift:"OverrideMap,false""#;
        assert_eq!(get_tag(tags, "json").as_deref(), Some("map_string_to_int"));
        assert_eq!(
            get_tag(tags, "typeshift").as_deref(),
            Some("OverrideMap,false")
        );
        assert_eq!(get_tag(tags, "xml"), None);
    }

    #[test]
    fn get_tag_skips_unrelated_keys_with_awkward_values() {
        let tags = r#"gorm:"column:name;index" json:"name""#;
        assert_eq!(get_tag(tags, "json").as_deref(), Some("name"));
    }

    #[test]
    fn display_name_prefers_tag_then_declared() {
        assert_eq!(display_name("ID", None).as_deref(), Some("ID"));
        assert_eq!(
            display_name("ID", Some(r#"json:"id""#)).as_deref(),
            Some("id")
        );
        assert_eq!(
            display_name("ID", Some(r#"json:"id,omitempty""#)).as_deref(),
            Some("id")
        );
        // tag present but no json key, or an empty name: fall back
        assert_eq!(
            display_name("ID", Some(r#"db:"id""#)).as_deref(),
            Some("ID")
        );
        assert_eq!(display_name("ID", Some(r#"json:"""#)).as_deref(), Some("ID"));
    }

    #[test]
    fn display_name_omission() {
        assert_eq!(display_name("Secret", Some(r#"json:"-""#)), None);
    }

    #[test]
    fn override_two_segment_form() {
        let po = parse_override(Some(r#"typeshift:"CustomType,true""#)).unwrap();
        assert_eq!(po.tag, "CustomType");
        assert!(po.optional);
        assert_eq!(po.malformed, None);
    }

    #[test]
    fn override_one_segment_form_is_not_optional() {
        let po = parse_override(Some(r#"typeshift:"CustomType""#)).unwrap();
        assert_eq!(po.tag, "CustomType");
        assert!(!po.optional);
        assert_eq!(po.malformed, None);
    }

    #[test]
    fn override_malformed_flag_falls_back_to_false() {
        let po = parse_override(Some(r#"typeshift:"CustomType,yes""#)).unwrap();
        assert_eq!(po.tag, "CustomType");
        assert!(!po.optional);
        assert_eq!(po.malformed.as_deref(), Some("yes"));
    }

    #[test]
    fn override_absent() {
        assert_eq!(parse_override(None), None);
        assert_eq!(parse_override(Some(r#"json:"id""#)), None);
        assert_eq!(parse_override(Some(r#"typeshift:"""#)), None);
    }

    #[test]
    fn demo_module_parses() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/models.json");
        let module = load_module(&path).unwrap();
        assert_eq!(module.module, "models");
        assert!(module.declarations.iter().any(|d| d.name == "Maps"));
    }
}
