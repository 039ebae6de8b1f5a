//! Method sets and the error contract
//!
//! Follows Go's selector rules: methods and fields are looked up breadth
//! first through embedded fields, the shallowest depth wins, two candidates
//! at the same depth cancel each other, and a field blocks deeper methods of
//! the same name. Pointer-receiver methods only belong to the method set when
//! the value is reached through a pointer.

use std::collections::{BTreeMap, HashSet};

use crate::types::{BasicKind, InterfaceMethod, Method, NamedRef, Signature, Type, Unit};

/// Embedding levels explored before the search gives up
const MAX_EMBED_DEPTH: usize = 32;

/// A method reachable on a type, with the embedding depth it was found at
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub signature: Signature,
    pub depth: usize,
}

impl Unit {
    /// The Go method set of `ty`, sorted by name
    pub fn method_set(&self, ty: &Type) -> Vec<Selection> {
        let (base, indirect) = match ty {
            Type::Pointer(elem) => (elem.as_ref(), true),
            other => (other, false),
        };
        if self.is_interface(base) {
            // Pointers to interfaces have no methods
            if indirect {
                return Vec::new();
            }
            return self
                .interface_methods(base)
                .into_iter()
                .map(|m| Selection {
                    name: m.name,
                    signature: m.signature,
                    depth: 0,
                })
                .collect();
        }
        if indirect && matches!(base, Type::Pointer(_)) {
            return Vec::new();
        }
        self.promoted_methods(base, indirect)
    }

    /// `ty` has `Error() string` in its method set
    pub fn implements_error(&self, ty: &Type) -> bool {
        self.method_set(ty)
            .iter()
            .any(|s| s.name == "Error" && is_error_signature(&s.signature))
    }

    /// `ty` or `*ty` implements the error contract
    pub fn satisfies_error_contract(&self, ty: &Type) -> bool {
        self.implements_error(ty) || self.implements_error(&Type::pointer(ty.clone()))
    }

    /// Flattened methods of an interface type, embedded interfaces included
    pub fn interface_methods(&self, ty: &Type) -> Vec<InterfaceMethod> {
        let mut out = Vec::new();
        self.collect_interface(ty, 0, &mut out);
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    fn collect_interface(&self, ty: &Type, depth: usize, out: &mut Vec<InterfaceMethod>) {
        if depth > MAX_EMBED_DEPTH {
            return;
        }
        if let Type::Interface(iface) = self.underlying(ty) {
            for method in iface.methods {
                if !out.iter().any(|m| m.name == method.name) {
                    out.push(method);
                }
            }
            for embed in &iface.embeds {
                self.collect_interface(embed, depth + 1, out);
            }
        }
    }

    fn promoted_methods(&self, root: &Type, indirect: bool) -> Vec<Selection> {
        let mut selected = Vec::new();
        let mut decided: HashSet<String> = HashSet::new();
        let mut seen: HashSet<NamedRef> = HashSet::new();
        let mut level = vec![(root.clone(), indirect)];

        for depth in 0..MAX_EMBED_DEPTH {
            // A named type already expanded at a shallower depth adds nothing
            level.retain(|(ty, _)| match ty {
                Type::Named(named) => !seen.contains(named),
                _ => true,
            });
            if level.is_empty() {
                break;
            }

            // None marks a field, Some a method
            let mut candidates: BTreeMap<String, Vec<Option<Signature>>> = BTreeMap::new();
            let mut next = Vec::new();

            for (ty, indirect) in &level {
                if let Type::Named(NamedRef::Decl { id, args }) = ty {
                    for method in &self.decl(*id).methods {
                        if method.pointer_receiver && !indirect {
                            continue;
                        }
                        candidates
                            .entry(method.name.clone())
                            .or_default()
                            .push(Some(method.signature.substitute(*id, args)));
                    }
                }
                match self.underlying(ty) {
                    Type::Struct(st) => {
                        for field in st.fields {
                            candidates.entry(field.name.clone()).or_default().push(None);
                            if field.embedded {
                                match field.ty {
                                    Type::Pointer(elem) => next.push((*elem, true)),
                                    other => next.push((other, *indirect)),
                                }
                            }
                        }
                    }
                    Type::Interface(_) => {
                        for method in self.interface_methods(ty) {
                            candidates
                                .entry(method.name)
                                .or_default()
                                .push(Some(method.signature));
                        }
                    }
                    _ => {}
                }
            }

            for (name, found) in candidates {
                if !decided.insert(name.clone()) {
                    continue;
                }
                if let [Some(signature)] = found.as_slice() {
                    selected.push(Selection {
                        name,
                        signature: signature.clone(),
                        depth,
                    });
                }
            }

            for (ty, _) in &level {
                if let Type::Named(named) = ty {
                    seen.insert(named.clone());
                }
            }
            level = next;
        }

        selected.sort_by(|a, b| a.name.cmp(&b.name));
        selected
    }
}

/// `Error()` with no parameters and exactly one `string` result
fn is_error_signature(sig: &Signature) -> bool {
    sig.params.is_empty()
        && !sig.variadic
        && matches!(sig.results.as_slice(), [r] if r.ty == Type::Basic(BasicKind::String))
}

/// The `Unwrap` method declared directly on the type, with either receiver
///
/// Promoted methods are ignored: a type embedding a wrapper that already has
/// `Unwrap` still needs its own.
pub fn find_accessor(methods: &[Method]) -> Option<&Method> {
    methods.iter().find(|m| m.name == "Unwrap")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::unit_from_source;

    fn names(unit: &Unit, ty: &Type) -> Vec<String> {
        unit.method_set(ty).into_iter().map(|s| s.name).collect()
    }

    fn named(unit: &Unit, name: &str) -> Type {
        let id = unit.lookup(name).expect("declared type");
        unit.declared_type(id)
    }

    #[test]
    fn test_pointer_receiver_methods_need_pointer() {
        let unit = unit_from_source(
            "package p\n\
             type E struct{ msg string }\n\
             func (e *E) Error() string { return e.msg }\n",
        );
        let e = named(&unit, "E");
        assert!(!unit.implements_error(&e));
        assert!(unit.implements_error(&Type::pointer(e.clone())));
        assert!(unit.satisfies_error_contract(&e));
    }

    #[test]
    fn test_promotion_through_embedded_value() {
        let unit = unit_from_source(
            "package p\n\
             type Inner struct{}\n\
             func (Inner) Error() string { return \"\" }\n\
             func (*Inner) Detail() string { return \"\" }\n\
             type Outer struct{ Inner }\n",
        );
        let outer = named(&unit, "Outer");
        assert_eq!(names(&unit, &outer), vec!["Error"]);
        assert_eq!(names(&unit, &Type::pointer(outer)), vec!["Detail", "Error"]);
    }

    #[test]
    fn test_promotion_through_embedded_pointer() {
        let unit = unit_from_source(
            "package p\n\
             type Inner struct{}\n\
             func (*Inner) Error() string { return \"\" }\n\
             type Outer struct{ *Inner }\n",
        );
        assert!(unit.implements_error(&named(&unit, "Outer")));
    }

    #[test]
    fn test_same_depth_collision_cancels() {
        let unit = unit_from_source(
            "package p\n\
             type A struct{}\n\
             func (A) Error() string { return \"a\" }\n\
             type B struct{}\n\
             func (B) Error() string { return \"b\" }\n\
             type Both struct{ A; B }\n",
        );
        assert!(!unit.satisfies_error_contract(&named(&unit, "Both")));
    }

    #[test]
    fn test_shallower_method_wins() {
        let unit = unit_from_source(
            "package p\n\
             type A struct{}\n\
             func (A) Error() int { return 0 }\n\
             type Mid struct{ A }\n\
             type Outer struct{ Mid }\n\
             func (Outer) Error() string { return \"\" }\n",
        );
        let set = unit.method_set(&named(&unit, "Outer"));
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].depth, 0);
        assert!(unit.implements_error(&named(&unit, "Outer")));
        assert!(!unit.implements_error(&named(&unit, "Mid")));
    }

    #[test]
    fn test_field_blocks_deeper_method() {
        let unit = unit_from_source(
            "package p\n\
             type Inner struct{}\n\
             func (Inner) Error() string { return \"\" }\n\
             type Mid struct{ Inner }\n\
             type Outer struct{\n\
                 Mid\n\
                 Error string\n\
             }\n",
        );
        assert!(unit.implements_error(&named(&unit, "Mid")));
        assert!(!unit.satisfies_error_contract(&named(&unit, "Outer")));
    }

    #[test]
    fn test_embedded_error_interface_promotes() {
        let unit = unit_from_source("package p\ntype Wrapped struct{ error }\n");
        assert!(unit.implements_error(&named(&unit, "Wrapped")));
    }

    #[test]
    fn test_error_signature_must_match_exactly() {
        let unit = unit_from_source(
            "package p\n\
             type Variadic struct{}\n\
             func (Variadic) Error(args ...int) string { return \"\" }\n\
             type TwoResults struct{}\n\
             func (TwoResults) Error() (string, bool) { return \"\", false }\n",
        );
        assert!(!unit.satisfies_error_contract(&named(&unit, "Variadic")));
        assert!(!unit.satisfies_error_contract(&named(&unit, "TwoResults")));
    }

    #[test]
    fn test_interfaces_and_type_params() {
        let unit = unit_from_source(
            "package p\n\
             type Causer interface{ error; Cause() error }\n\
             type Box[T error] struct{ v T }\n",
        );
        let causer = named(&unit, "Causer");
        assert_eq!(names(&unit, &causer), vec!["Cause", "Error"]);
        assert!(unit.method_set(&Type::pointer(causer)).is_empty());

        let boxed = unit.lookup("Box").expect("Box");
        let param = Type::Param {
            decl: boxed,
            index: 0,
            name: "T".into(),
        };
        assert!(unit.implements_error(&param));
    }

    #[test]
    fn test_self_embedding_terminates() {
        let unit = unit_from_source("package p\ntype Loop struct{ *Loop }\n");
        assert!(!unit.satisfies_error_contract(&named(&unit, "Loop")));
    }

    #[test]
    fn test_find_accessor_ignores_promoted() {
        let unit = unit_from_source(
            "package p\n\
             type A struct{ error }\n\
             func (a *A) Unwrap() error { return a.error }\n\
             type B struct{ A }\n",
        );
        let a = unit.decl(unit.lookup("A").expect("A"));
        let b = unit.decl(unit.lookup("B").expect("B"));
        let accessor = find_accessor(&a.methods).expect("declared accessor");
        assert!(accessor.pointer_receiver);
        assert!(find_accessor(&b.methods).is_none());
    }
}
