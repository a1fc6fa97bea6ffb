//! Shared state for one validation run.

use std::cell::{Ref, RefCell};

use gqlkit_core::Diagnostic;
use gqlkit_syntax::ast::{
    Document, FragmentDefinition, FragmentSpread, Name, OperationDefinition, Selection,
    SelectionSet, Value,
};
use gqlkit_syntax::{walk_node, Node, VisitAction, Visitor};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use crate::schema::{Schema, TypeRef};
use crate::type_info::{TypeInfo, TypeInfoVisitor};

/// A variable referenced somewhere in a document, with the input type
/// expected at that position.
#[derive(Debug, Clone)]
pub struct VariableUsage<'a> {
    pub name: &'a Name,
    pub ty: Option<TypeRef>,
    /// The variable is an argument's whole value and that argument has a
    /// default.
    pub has_location_default: bool,
}

/// What rules see while visiting: the schema, the document, the current
/// type context and an error sink.
pub struct ValidationContext<'a> {
    schema: &'a Schema,
    document: &'a Document,
    type_info: &'a RefCell<TypeInfo>,
    fragments: IndexMap<&'a str, &'a FragmentDefinition>,
    errors: RefCell<Vec<Diagnostic>>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(schema: &'a Schema, document: &'a Document, type_info: &'a RefCell<TypeInfo>) -> Self {
        let mut fragments = IndexMap::new();
        for fragment in document.fragments() {
            fragments.entry(fragment.name.as_str()).or_insert(fragment);
        }
        Self {
            schema,
            document,
            type_info,
            fragments,
            errors: RefCell::new(Vec::new()),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// Type context at the node currently being visited.
    pub fn type_info(&self) -> Ref<'_, TypeInfo> {
        self.type_info.borrow()
    }

    pub fn report(&self, error: Diagnostic) {
        self.errors.borrow_mut().push(error);
    }

    /// Removes and returns the errors reported so far.
    pub fn take_errors(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    /// The first fragment definition with `name`.
    pub fn fragment(&self, name: &str) -> Option<&'a FragmentDefinition> {
        self.fragments.get(name).copied()
    }

    /// Fragment spreads directly inside `selection_set`, including those
    /// nested in fields and inline fragments but not inside other fragments.
    pub fn fragment_spreads(&self, selection_set: &'a SelectionSet) -> Vec<&'a FragmentSpread> {
        let mut spreads = Vec::new();
        let mut pending = vec![selection_set];
        while let Some(set) = pending.pop() {
            for selection in &set.selections {
                match selection {
                    Selection::FragmentSpread(spread) => spreads.push(spread),
                    Selection::InlineFragment(fragment) => pending.push(&fragment.selection_set),
                    Selection::Field(field) => pending.extend(field.selection_set.as_ref()),
                }
            }
        }
        spreads
    }

    /// Every known fragment reachable from `operation`, each listed once.
    pub fn recursively_referenced_fragments(
        &self,
        operation: &'a OperationDefinition,
    ) -> Vec<&'a FragmentDefinition> {
        let mut fragments = Vec::new();
        let mut collected = FxHashSet::default();
        let mut pending = vec![&operation.selection_set];
        while let Some(set) = pending.pop() {
            for spread in self.fragment_spreads(set) {
                if !collected.insert(spread.name.as_str()) {
                    continue;
                }
                if let Some(fragment) = self.fragment(spread.name.as_str()) {
                    fragments.push(fragment);
                    pending.push(&fragment.selection_set);
                }
            }
        }
        fragments
    }

    /// Variables used inside `node` (an operation or fragment definition),
    /// in document order. Variable definitions themselves are not usages.
    pub fn variable_usages(&self, node: Node<'a>) -> Vec<VariableUsage<'a>> {
        let type_info = RefCell::new(TypeInfo::new());
        let collector = UsageCollector {
            type_info: &type_info,
            argument_value: None,
            usages: Vec::new(),
        };
        let mut visitor = TypeInfoVisitor::new(self.schema, &type_info, collector);
        walk_node(&mut visitor, node);
        visitor.into_inner().usages
    }

    /// Variables used by `operation` and by every fragment it reaches.
    pub fn recursive_variable_usages(
        &self,
        operation: &'a OperationDefinition,
    ) -> Vec<VariableUsage<'a>> {
        let mut usages = self.variable_usages(Node::OperationDefinition(operation));
        for fragment in self.recursively_referenced_fragments(operation) {
            usages.extend(self.variable_usages(Node::FragmentDefinition(fragment)));
        }
        usages
    }
}

struct UsageCollector<'a, 't> {
    type_info: &'t RefCell<TypeInfo>,
    argument_value: Option<&'a Value>,
    usages: Vec<VariableUsage<'a>>,
}

impl<'a> Visitor<'a> for UsageCollector<'a, '_> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::VariableDefinition(_) => return VisitAction::Skip,
            Node::Argument(arg) => self.argument_value = Some(&arg.value),
            Node::Value(value) => {
                let Value::Variable(name) = value else {
                    return VisitAction::Continue;
                };
                let type_info = self.type_info.borrow();
                let is_argument_value = self
                    .argument_value
                    .is_some_and(|arg_value| std::ptr::eq(arg_value, value));
                self.usages.push(VariableUsage {
                    name,
                    ty: type_info.input_type().cloned(),
                    has_location_default: is_argument_value
                        && type_info
                            .argument()
                            .is_some_and(|arg| arg.default_value.is_some()),
                });
            }
            _ => {}
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::Argument(_) = node {
            self.argument_value = None;
        }
        VisitAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_schema, BuildSchemaOptions};
    use gqlkit_syntax::parse;

    fn schema() -> Schema {
        let doc = parse(
            "type Query { user(id: ID!, limit: Int = 10): User }
             type User { friends(first: Int): [User] name: String }",
        )
        .unwrap();
        build_schema(&doc, BuildSchemaOptions::default()).unwrap()
    }

    #[test]
    fn test_recursive_fragments_and_variables() {
        let schema = schema();
        let doc = parse(
            "query Q($id: ID!, $first: Int, $limit: Int) {
                user(id: $id, limit: $limit) { ...A }
             }
             fragment A on User { friends(first: $first) { ...B } }
             fragment B on User { name ...A }",
        )
        .unwrap();
        let type_info = RefCell::new(TypeInfo::new());
        let context = ValidationContext::new(&schema, &doc, &type_info);
        let operation = doc.operations().next().unwrap();

        let fragments: Vec<_> = context
            .recursively_referenced_fragments(operation)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(fragments, ["A", "B"]);

        let usages: Vec<_> = context
            .recursive_variable_usages(operation)
            .into_iter()
            .map(|u| {
                (
                    u.name.as_str(),
                    u.ty.map(|t| t.to_string()),
                    u.has_location_default,
                )
            })
            .collect();
        assert_eq!(
            usages,
            [
                ("id", Some("ID!".to_string()), false),
                ("limit", Some("Int".to_string()), true),
                ("first", Some("Int".to_string()), false),
            ]
        );
    }
}
