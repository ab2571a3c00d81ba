//! Embedding flattener: raw modules in, fully resolved declarations out.
//!
//! Works in two passes over a build-once symbol table instead of re-reading
//! anything per lookup:
//! - classify every declaration body and materialize its own fields;
//! - link embedded references, appending each embedding's resolved fields in
//!   declared order (own fields always come first).
//!
//! Flattening is memoized per (module, name), so resolving the same
//! declaration twice can never duplicate merged fields. Cycles are cut at the
//! embedding that closes them, duplicate display names keep their first
//! occurrence, and every degraded path leaves a diagnostic instead of
//! aborting the run.

use std::collections::BTreeMap;

use indexmap::IndexSet;

use crate::decl::{self, RawDecl, RawField, RawModule, RawType};
use crate::diag::{DiagKind, Diagnostic};
use crate::ir::{Declaration, Field, Override, Ty};
use crate::lower;

/// Lookup capability for `module.Name` embedded references.
pub trait ModuleLookup {
    /// Raw declarations of `module`, or `None` when the module is unknown.
    fn module(&self, name: &str) -> Option<&[RawDecl]>;
}

/// In-memory module set backing cross-module embedding lookups.
#[derive(Debug, Default)]
pub struct ModuleSet {
    modules: BTreeMap<String, Vec<RawDecl>>,
}

impl ModuleSet {
    pub fn insert(&mut self, module: RawModule) {
        self.modules.insert(module.module, module.declarations);
    }
}

impl ModuleLookup for ModuleSet {
    fn module(&self, name: &str) -> Option<&[RawDecl]> {
        self.modules.get(name).map(Vec::as_slice)
    }
}

/// Output of a resolver run. The declaration map is keyed (and therefore
/// iterated) by name, which is the emitter's output order.
#[derive(Debug)]
pub struct Resolved {
    pub decls: BTreeMap<String, Declaration>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve the primary module against `lookup`, consuming the raw set once.
pub fn resolve(primary: &RawModule, lookup: &dyn ModuleLookup) -> Resolved {
    let mut r = Resolver {
        lookup,
        diags: Vec::new(),
        done: BTreeMap::new(),
        in_progress: Vec::new(),
    };

    let mut decls = BTreeMap::new();
    for d in &primary.declarations {
        if d.ignore {
            continue;
        }
        let body = match &d.body {
            RawType::Struct { .. } => Ty::Struct {
                fields: r.flatten(&primary.module, d, &primary.declarations),
                exact: d.strict,
            },
            other => match lower::lower_type(other) {
                Ok(ty) => ty,
                Err(err) => {
                    r.diags
                        .push(Diagnostic::decl(&d.name, DiagKind::Unsupported(err.0)));
                    continue;
                }
            },
        };
        decls.insert(
            d.name.clone(),
            Declaration {
                name: d.name.clone(),
                doc: d.doc.clone(),
                body,
            },
        );
    }

    Resolved {
        decls,
        diagnostics: r.diags,
    }
}

struct Resolver<'a> {
    lookup: &'a dyn ModuleLookup,
    diags: Vec<Diagnostic>,
    /// Flattened field lists memoized by (module, name).
    done: BTreeMap<(String, String), Vec<Field>>,
    /// Flattening stack, for cutting embedding cycles.
    in_progress: Vec<(String, String)>,
}

impl Resolver<'_> {
    /// Fully flattened field list for a struct declaration: own fields first,
    /// then each embedding's fields in declared order.
    fn flatten(&mut self, module: &str, decl: &RawDecl, module_decls: &[RawDecl]) -> Vec<Field> {
        let key = (module.to_string(), decl.name.clone());
        if let Some(cached) = self.done.get(&key) {
            return cached.clone();
        }
        let RawType::Struct {
            fields: raw_fields,
            embedded,
        } = &decl.body
        else {
            return Vec::new();
        };
        self.in_progress.push(key.clone());

        let mut fields: Vec<Field> = Vec::new();
        let mut seen: IndexSet<String> = IndexSet::new();

        for rf in raw_fields {
            if let Some(f) = self.materialize(&decl.name, rf) {
                if seen.insert(f.name.clone()) {
                    fields.push(f);
                } else {
                    self.diags.push(Diagnostic::field(
                        &decl.name,
                        &f.name,
                        DiagKind::DuplicateField(f.name.clone()),
                    ));
                }
            }
        }

        for reference in embedded {
            let reference = reference.trim();
            match reference.split_once('.') {
                None => self.embed_local(
                    &mut fields,
                    &mut seen,
                    decl,
                    module,
                    module_decls,
                    reference,
                ),
                Some((ext_module, name)) => {
                    self.embed_external(&mut fields, &mut seen, decl, ext_module, name);
                }
            }
        }

        self.in_progress.pop();
        self.done.insert(key, fields.clone());
        fields
    }

    fn embed_local(
        &mut self,
        fields: &mut Vec<Field>,
        seen: &mut IndexSet<String>,
        host: &RawDecl,
        module: &str,
        module_decls: &[RawDecl],
        name: &str,
    ) {
        let Some(target) = module_decls.iter().find(|d| !d.ignore && d.name == name) else {
            self.diags.push(Diagnostic::decl(
                &host.name,
                DiagKind::UnresolvedEmbedding(name.to_string()),
            ));
            return;
        };
        self.embed(fields, seen, host, module, target, module_decls, name);
    }

    fn embed_external(
        &mut self,
        fields: &mut Vec<Field>,
        seen: &mut IndexSet<String>,
        host: &RawDecl,
        module: &str,
        name: &str,
    ) {
        let lookup = self.lookup;
        let Some(decls) = lookup.module(module) else {
            self.diags.push(Diagnostic::decl(
                &host.name,
                DiagKind::UnknownModule(module.to_string()),
            ));
            return;
        };
        let label = format!("{module}.{name}");
        let Some(target) = decls.iter().find(|d| !d.ignore && d.name == name) else {
            self.diags.push(Diagnostic::decl(
                &host.name,
                DiagKind::UnresolvedEmbedding(label),
            ));
            return;
        };
        self.embed(fields, seen, host, module, target, decls, &label);
    }

    #[allow(clippy::too_many_arguments)]
    fn embed(
        &mut self,
        fields: &mut Vec<Field>,
        seen: &mut IndexSet<String>,
        host: &RawDecl,
        module: &str,
        target: &RawDecl,
        module_decls: &[RawDecl],
        label: &str,
    ) {
        if !matches!(target.body, RawType::Struct { .. }) {
            self.diags.push(Diagnostic::decl(
                &host.name,
                DiagKind::NonStructEmbedding(label.to_string()),
            ));
            return;
        }
        let key = (module.to_string(), target.name.clone());
        if self.in_progress.contains(&key) {
            self.diags.push(Diagnostic::decl(
                &host.name,
                DiagKind::EmbeddingCycle(label.to_string()),
            ));
            return;
        }
        for f in self.flatten(module, target, module_decls) {
            if seen.insert(f.name.clone()) {
                fields.push(f);
            } else {
                self.diags.push(Diagnostic::field(
                    &host.name,
                    &f.name,
                    DiagKind::DuplicateField(f.name.clone()),
                ));
            }
        }
    }

    /// Build one resolved field, or `None` when the field is omitted by its
    /// tag or carries an unsupported type.
    fn materialize(&mut self, decl_name: &str, rf: &RawField) -> Option<Field> {
        let name = decl::display_name(&rf.name, rf.tag.as_deref())?;
        let ty = match lower::lower_type(&rf.ty) {
            Ok(ty) => ty,
            Err(err) => {
                self.diags.push(Diagnostic::field(
                    decl_name,
                    &rf.name,
                    DiagKind::Unsupported(err.0),
                ));
                return None;
            }
        };
        let override_ty = decl::parse_override(rf.tag.as_deref()).map(|po| {
            if let Some(bad) = po.malformed {
                self.diags.push(Diagnostic::field(
                    decl_name,
                    &name,
                    DiagKind::MalformedOverride(bad),
                ));
            }
            Override {
                tag: po.tag,
                optional: po.optional,
            }
        });
        Some(Field {
            name,
            ty,
            doc: rf.doc.clone(),
            comment: rf.comment.clone(),
            override_ty,
        })
    }
}
