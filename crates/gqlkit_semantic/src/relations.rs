//! Relations between types: possible types, subtyping and overlap.

use crate::schema::{Schema, TypeDef, TypeRef};

impl Schema {
    /// Object types an abstract type can resolve to, in schema order.
    /// An object type's only possible type is itself.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.types.get(name) {
            Some(TypeDef::Union(u)) => u
                .members
                .iter()
                .filter(|m| matches!(self.types.get(m.as_str()), Some(TypeDef::Object(_))))
                .map(String::as_str)
                .collect(),
            Some(TypeDef::Interface(_)) => self
                .types
                .values()
                .filter_map(|ty| match ty {
                    TypeDef::Object(o) if o.implements.iter().any(|i| i == name) => {
                        Some(o.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(TypeDef::Object(o)) => vec![o.name.as_str()],
            _ => Vec::new(),
        }
    }

    /// Returns true if `object` is one of `abstract_type`'s possible types.
    pub fn is_possible_type(&self, abstract_type: &str, object: &str) -> bool {
        self.possible_types(abstract_type).contains(&object)
    }

    /// Returns true if `maybe_sub` is a member of the union `abstract_type`
    /// or implements the interface `abstract_type`.
    pub fn is_sub_type(&self, abstract_type: &str, maybe_sub: &str) -> bool {
        match self.types.get(abstract_type) {
            Some(TypeDef::Union(u)) => u.members.iter().any(|m| m == maybe_sub),
            Some(TypeDef::Interface(_)) => self
                .types
                .get(maybe_sub)
                .is_some_and(|ty| ty.interfaces().iter().any(|i| i == abstract_type)),
            _ => false,
        }
    }

    /// Returns true if a value of `maybe_sub` is always valid where
    /// `super_type` is expected.
    pub fn is_type_sub_type_of(&self, maybe_sub: &TypeRef, super_type: &TypeRef) -> bool {
        match (maybe_sub, super_type) {
            (TypeRef::NonNull(sub), TypeRef::NonNull(sup)) => self.is_type_sub_type_of(sub, sup),
            (TypeRef::NonNull(sub), sup) => self.is_type_sub_type_of(sub, sup),
            (_, TypeRef::NonNull(_)) => false,
            (TypeRef::List(sub), TypeRef::List(sup)) => self.is_type_sub_type_of(sub, sup),
            (_, TypeRef::List(_)) | (TypeRef::List(_), _) => false,
            (TypeRef::Named(sub), TypeRef::Named(sup)) => {
                sub == sup
                    || (self.types.get(sup).is_some_and(TypeDef::is_abstract)
                        && self.is_sub_type(sup, sub))
            }
        }
    }

    /// Returns true if some object type could satisfy both `a` and `b`.
    /// Both names must refer to composite types.
    pub fn do_types_overlap(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let a_abstract = self.types.get(a).is_some_and(TypeDef::is_abstract);
        let b_abstract = self.types.get(b).is_some_and(TypeDef::is_abstract);
        match (a_abstract, b_abstract) {
            (true, true) => {
                let b_types = self.possible_types(b);
                self.possible_types(a).iter().any(|t| b_types.contains(t))
            }
            (true, false) => self.is_possible_type(a, b),
            (false, true) => self.is_possible_type(b, a),
            (false, false) => false,
        }
    }
}
