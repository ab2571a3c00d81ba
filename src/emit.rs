//! Multi-target rendering of resolved declarations.
//!
//! `render_decl` is a pure recursive walk over the type model: the conversion
//! table supplies tokens, this module supplies structure (optionality form,
//! compact vs generic arrays, map templates, struct braces, comments,
//! quoting). The emitter drives it over a whole declaration set in name order
//! so equal inputs always produce byte-identical output.

pub mod quote;
pub mod syntax;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diag::Error;
use crate::ir::{Declaration, Field, Ty};

pub use syntax::Lang;

/// A rendered type that is a single bare identifier (dots allowed). These may
/// use the terse array suffix form and need no parentheses as Elm arguments.
static SIMPLE_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-zA-Z0-9_.]+$").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// RENDERER
// ————————————————————————————————————————————————————————————————————————————

/// Render one declaration, including its top comment.
pub fn render_decl(decl: &Declaration, lang: Lang) -> String {
    let mut out = String::new();
    if let Some(doc) = &decl.doc {
        push_doc(&mut out, lang.comment_leader(), "", doc);
    }
    match lang {
        Lang::Flow | Lang::Typescript => {
            out.push_str(&format!(
                "export type {} = {}",
                decl.name,
                render_ty(&decl.body, lang)
            ));
        }
        Lang::Elm => match &decl.body {
            Ty::Struct { fields, .. } => {
                out.push_str(&format!("type alias {} =\n", decl.name));
                push_record_elm(&mut out, fields);
            }
            other => {
                out.push_str(&format!(
                    "type alias {} = {}",
                    decl.name,
                    render_ty(other, lang)
                ));
            }
        },
    }
    out
}

/// Render a type expression. Top-of-field optionality is the field renderer's
/// business; here an Optional always takes the wrapping form.
pub fn render_ty(ty: &Ty, lang: Lang) -> String {
    match ty {
        Ty::Prim(tag) => lang.table().prim(tag).to_string(),
        Ty::Any => lang.table().any_.to_string(),
        Ty::Anon => lang.table().anon.to_string(),
        Ty::Time => lang.table().time.to_string(),
        Ty::Optional(inner) => {
            let inner = render_ty(inner, lang);
            match lang {
                Lang::Flow => format!("?{inner}"),
                Lang::Typescript => format!("{inner} | undefined"),
                Lang::Elm => format!("Maybe {}", elm_arg(inner)),
            }
        }
        Ty::Array(elem) => {
            let elem = render_ty(elem, lang);
            match lang {
                Lang::Flow | Lang::Typescript => {
                    if SIMPLE_IDENT.is_match(&elem) {
                        format!("{elem}[]")
                    } else {
                        format!("Array<{elem}>")
                    }
                }
                Lang::Elm => format!("List {}", elm_arg(elem)),
            }
        }
        Ty::Map { key, value } => {
            let key = render_ty(key, lang);
            let value = render_ty(value, lang);
            match lang {
                Lang::Flow | Lang::Typescript => format!("{{ [key: {key}]: {value} }}"),
                Lang::Elm => format!("Dict {} {}", elm_arg(key), elm_arg(value)),
            }
        }
        Ty::Struct { fields, exact } => match lang {
            Lang::Flow | Lang::Typescript => render_struct_ecma(fields, *exact, lang),
            Lang::Elm => render_record_inline_elm(fields),
        },
    }
}

/// Effective type of a field after applying any override annotation.
fn effective_ty(f: &Field) -> Cow<'_, Ty> {
    match &f.override_ty {
        None => Cow::Borrowed(&f.ty),
        Some(o) => {
            let base = Ty::Prim(o.tag.clone());
            Cow::Owned(if o.optional {
                Ty::Optional(Box::new(base))
            } else {
                base
            })
        }
    }
}

fn render_struct_ecma(fields: &[Field], exact: bool, lang: Lang) -> String {
    // Flow distinguishes exact objects; the other targets render both the same.
    let (open, close) = if exact && lang == Lang::Flow {
        ("{|", "|}")
    } else {
        ("{", "}")
    };
    if fields.is_empty() {
        return format!("{open}{close}");
    }
    let mut out = String::from(open);
    out.push('\n');
    for f in fields {
        push_field_ecma(&mut out, f, lang);
    }
    out.push_str(close);
    out
}

fn push_field_ecma(out: &mut String, f: &Field, lang: Lang) {
    if let Some(doc) = &f.doc {
        push_doc(out, "//", "\t", doc);
    }
    let ty = effective_ty(f);
    let name = quote::property(&f.name);
    match (lang, &*ty) {
        // One representation only: the field marker subsumes the union form
        // at the top of a field's type.
        (Lang::Typescript, Ty::Optional(inner)) => {
            out.push_str(&format!("\t{name}?: {},", render_ty(inner, lang)));
        }
        _ => {
            out.push_str(&format!("\t{name}: {},", render_ty(&ty, lang)));
        }
    }
    if let Some(comment) = &f.comment {
        out.push_str(&format!(" // {comment}"));
    }
    out.push('\n');
}

fn push_record_elm(out: &mut String, fields: &[Field]) {
    if fields.is_empty() {
        out.push_str("    {}");
        return;
    }
    for (i, f) in fields.iter().enumerate() {
        if let Some(doc) = &f.doc {
            push_doc(out, "--", "    ", doc);
        }
        let lead = if i == 0 { '{' } else { ',' };
        let ty = effective_ty(f);
        out.push_str(&format!("    {lead} {} : {}", f.name, render_ty(&ty, Lang::Elm)));
        if let Some(comment) = &f.comment {
            out.push_str(&format!(" -- {comment}"));
        }
        out.push('\n');
    }
    out.push_str("    }");
}

fn render_record_inline_elm(fields: &[Field]) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let parts: Vec<String> = fields
        .iter()
        .map(|f| {
            let ty = effective_ty(f);
            format!("{} : {}", f.name, render_ty(&ty, Lang::Elm))
        })
        .collect();
    format!("{{ {} }}", parts.join(", "))
}

/// Parenthesize compound type arguments: `List (Maybe String)`.
fn elm_arg(text: String) -> String {
    if SIMPLE_IDENT.is_match(&text) {
        text
    } else {
        format!("({text})")
    }
}

fn push_doc(out: &mut String, leader: &str, indent: &str, doc: &str) {
    for line in doc.lines() {
        if line.is_empty() {
            out.push_str(&format!("{indent}{leader}\n"));
        } else {
            out.push_str(&format!("{indent}{leader} {line}\n"));
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMITTER
// ————————————————————————————————————————————————————————————————————————————

/// Write the language header and every declaration, blank-line separated, in
/// name order. Returns the emitted declaration count. The first write failure
/// aborts the run; nothing past it is flushed.
pub fn emit_all<W: io::Write>(
    decls: &BTreeMap<String, Declaration>,
    lang: Lang,
    out: &mut W,
) -> Result<usize, Error> {
    out.write_all(lang.header().as_bytes())?;
    let mut count = 0;
    for decl in decls.values() {
        out.write_all(b"\n")?;
        out.write_all(render_decl(decl, lang).as_bytes())?;
        out.write_all(b"\n")?;
        count += 1;
    }
    Ok(count)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Override;

    fn prim(tag: &str) -> Ty {
        Ty::Prim(tag.to_string())
    }

    fn opt(inner: Ty) -> Ty {
        Ty::Optional(Box::new(inner))
    }

    fn arr(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    fn map(key: Ty, value: Ty) -> Ty {
        Ty::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    fn field(name: &str, ty: Ty) -> Field {
        Field {
            name: name.to_string(),
            ty,
            doc: None,
            comment: None,
            override_ty: None,
        }
    }

    fn decl(name: &str, doc: &str, body: Ty) -> Declaration {
        Declaration {
            name: name.to_string(),
            doc: if doc.is_empty() {
                None
            } else {
                Some(doc.to_string())
            },
            body,
        }
    }

    #[test]
    fn every_primitive_tag_renders_its_table_token() {
        for lang in Lang::all() {
            for (from, to) in lang.table().prims {
                assert_eq!(render_ty(&prim(from), *lang), *to);
            }
        }
        // whole-identifier substitution only
        assert_eq!(render_ty(&prim("boolshit"), Lang::Flow), "boolshit");
        assert_eq!(render_ty(&prim("CustomType"), Lang::Elm), "CustomType");
    }

    #[test]
    fn flow_struct_of_maps_renders_in_field_order() {
        let d = decl(
            "Maps",
            "... Comment",
            Ty::Struct {
                fields: vec![
                    Field {
                        comment: Some("I am a map of strings and ints".to_string()),
                        ..field(
                            "map_string_map",
                            map(prim("string"), map(prim("string"), prim("string"))),
                        )
                    },
                    Field {
                        comment: Some("I am a map of strings to a slice of ints".to_string()),
                        ..field("map_string_ints", map(prim("string"), arr(prim("int"))))
                    },
                ],
                exact: false,
            },
        );
        let expected = "// ... Comment\n\
                        export type Maps = {\n\
                        \tmap_string_map: { [key: string]: { [key: string]: string } }, // I am a map of strings and ints\n\
                        \tmap_string_ints: { [key: string]: number[] }, // I am a map of strings to a slice of ints\n\
                        }";
        assert_eq!(render_decl(&d, Lang::Flow), expected);
    }

    #[test]
    fn flow_array_of_map_uses_the_generic_form() {
        let d = decl("Locations", "", arr(map(prim("int"), opt(prim("string")))));
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type Locations = Array<{ [key: number]: ?string }>"
        );
    }

    #[test]
    fn flow_array_of_bare_identifiers_uses_the_suffix_form() {
        let d = decl("CustomTypeArray", "", arr(prim("CustomType")));
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type CustomTypeArray = CustomType[]"
        );
        let d = decl("Counts", "", arr(prim("int")));
        assert_eq!(render_decl(&d, Lang::Flow), "export type Counts = number[]");
    }

    #[test]
    fn flow_scalar_aliases() {
        let d = decl("AliasToInt", "... Comment", prim("int"));
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "// ... Comment\nexport type AliasToInt = number"
        );
        let d = decl("TimeToDate", "", Ty::Time);
        assert_eq!(render_decl(&d, Lang::Flow), "export type TimeToDate = Date");
    }

    #[test]
    fn exact_structs_only_differ_on_flow() {
        let body = Ty::Struct {
            fields: vec![field("id", prim("int64"))],
            exact: true,
        };
        let open_body = Ty::Struct {
            fields: vec![field("id", prim("int64"))],
            exact: false,
        };
        let d = decl("Locked", "", body);
        let d_open = decl("Locked", "", open_body);
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type Locked = {|\n\tid: number,\n|}"
        );
        assert_eq!(
            render_decl(&d_open, Lang::Flow),
            "export type Locked = {\n\tid: number,\n}"
        );
        // no distinction on targets without exact types
        assert_eq!(
            render_decl(&d, Lang::Typescript),
            render_decl(&d_open, Lang::Typescript)
        );
        assert_eq!(render_decl(&d, Lang::Elm), render_decl(&d_open, Lang::Elm));
    }

    #[test]
    fn typescript_marks_optionality_at_the_field_only() {
        let d = decl(
            "Account",
            "",
            Ty::Struct {
                fields: vec![
                    field("name", opt(prim("string"))),
                    field("tags", arr(opt(prim("string")))),
                ],
                exact: false,
            },
        );
        let expected = "export type Account = {\n\
                        \tname?: string,\n\
                        \ttags: Array<string | undefined>,\n\
                        }";
        assert_eq!(render_decl(&d, Lang::Typescript), expected);
    }

    #[test]
    fn flow_keeps_the_wrapper_form_at_the_field() {
        let d = decl(
            "Account",
            "",
            Ty::Struct {
                fields: vec![field("name", opt(prim("string")))],
                exact: false,
            },
        );
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type Account = {\n\tname: ?string,\n}"
        );
    }

    #[test]
    fn overrides_replace_the_inferred_type_entirely() {
        let d = decl(
            "Msg",
            "",
            Ty::Struct {
                fields: vec![Field {
                    override_ty: Some(Override {
                        tag: "Envelope".to_string(),
                        optional: true,
                    }),
                    ..field("payload", map(prim("string"), prim("int")))
                }],
                exact: false,
            },
        );
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type Msg = {\n\tpayload: ?Envelope,\n}"
        );
        assert_eq!(
            render_decl(&d, Lang::Typescript),
            "export type Msg = {\n\tpayload?: Envelope,\n}"
        );
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Msg =\n    { payload : Maybe Envelope\n    }"
        );
    }

    #[test]
    fn awkward_display_names_are_quoted_on_ecma_targets() {
        let d = decl(
            "Odd",
            "",
            Ty::Struct {
                fields: vec![
                    field("kebab-case", prim("string")),
                    field("class", prim("int")),
                    field("$ok", prim("bool")),
                ],
                exact: false,
            },
        );
        let expected = "export type Odd = {\n\
                        \t\"kebab-case\": string,\n\
                        \t\"class\": number,\n\
                        \t$ok: boolean,\n\
                        }";
        assert_eq!(render_decl(&d, Lang::Flow), expected);
    }

    #[test]
    fn any_and_anonymous_objects_use_their_table_entries() {
        let d = decl(
            "Outgoing",
            "",
            Ty::Struct {
                fields: vec![field("payload", Ty::Any), field("person", Ty::Anon)],
                exact: false,
            },
        );
        assert_eq!(
            render_decl(&d, Lang::Typescript),
            "export type Outgoing = {\n\tpayload: any,\n\tperson: Object,\n}"
        );
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Outgoing =\n    { payload : Decode.Value\n    , person : Decode.Value\n    }"
        );
    }

    #[test]
    fn elm_record_layout() {
        let d = decl(
            "Person",
            "",
            Ty::Struct {
                fields: vec![
                    Field {
                        comment: Some("display name".to_string()),
                        ..field("name", prim("string"))
                    },
                    field("age", prim("int")),
                ],
                exact: false,
            },
        );
        let expected = "type alias Person =\n\
                        \x20   { name : String -- display name\n\
                        \x20   , age : Int\n\
                        \x20   }";
        assert_eq!(render_decl(&d, Lang::Elm), expected);
    }

    #[test]
    fn elm_parenthesizes_compound_arguments() {
        let d = decl("Names", "", arr(opt(prim("string"))));
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Names = List (Maybe String)"
        );
        let d = decl("Index", "", map(prim("string"), arr(prim("int"))));
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Index = Dict String (List Int)"
        );
        // dotted names are still simple
        let d = decl("Stamps", "", arr(Ty::Time));
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Stamps = List Time.Posix"
        );
    }

    #[test]
    fn doc_comments_prefix_every_line() {
        let d = decl("A", "line one\nline two", prim("int"));
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "// line one\n// line two\nexport type A = number"
        );
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "-- line one\n-- line two\ntype alias A = Int"
        );
    }

    #[test]
    fn field_doc_comments_sit_above_the_field() {
        let d = decl(
            "Row",
            "",
            Ty::Struct {
                fields: vec![Field {
                    doc: Some("primary key".to_string()),
                    ..field("id", prim("int64"))
                }],
                exact: false,
            },
        );
        assert_eq!(
            render_decl(&d, Lang::Flow),
            "export type Row = {\n\t// primary key\n\tid: number,\n}"
        );
        assert_eq!(
            render_decl(&d, Lang::Elm),
            "type alias Row =\n    -- primary key\n    { id : Int\n    }"
        );
    }

    #[test]
    fn emission_is_name_sorted_and_deterministic() {
        let mut decls = BTreeMap::new();
        decls.insert("B".to_string(), decl("B", "", prim("bool")));
        decls.insert("A".to_string(), decl("A", "", prim("int")));

        let mut buf = Vec::new();
        let count = emit_all(&decls, Lang::Flow, &mut buf).unwrap();
        assert_eq!(count, 2);
        let expected = "// @flow\n// Generated by typeshift. DO NOT EDIT.\n\
                        \nexport type A = number\n\
                        \nexport type B = boolean\n";
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), expected);

        let mut again = Vec::new();
        emit_all(&decls, Lang::Flow, &mut again).unwrap();
        assert_eq!(buf, again);
    }

    #[test]
    fn write_failure_aborts_emission() {
        struct FailAfter {
            left: usize,
        }
        impl io::Write for FailAfter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                if self.left == 0 {
                    return Err(io::Error::other("stream full"));
                }
                let n = buf.len().min(self.left);
                self.left -= n;
                Ok(n)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut decls = BTreeMap::new();
        decls.insert("A".to_string(), decl("A", "", prim("int")));
        let mut w = FailAfter { left: 10 };
        assert!(emit_all(&decls, Lang::Flow, &mut w).is_err());
    }
}
