use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, Span};
use gqlkit_syntax::{Definition, Directive, DirectiveLocation, Document, Node, OperationType, VisitAction, Visitor};
use rustc_hash::FxHashMap;

use crate::validation::ValidationContext;

/// Directive definitions declared in the document itself, with their
/// locations and repeatability.
fn document_directives(document: &Document) -> FxHashMap<&str, (&[DirectiveLocation], bool)> {
    document
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Directive(d) => Some((d.name.as_str(), (d.locations.as_slice(), d.repeatable))),
            _ => None,
        })
        .collect()
}

/// Where a directive on `node` is placed. `parent` is the location of the
/// enclosing node, used to tell arguments from input fields.
fn directive_location(node: Node<'_>, parent: Option<DirectiveLocation>) -> Option<DirectiveLocation> {
    let location = match node {
        Node::OperationDefinition(op) => match op.operation {
            OperationType::Query => DirectiveLocation::Query,
            OperationType::Mutation => DirectiveLocation::Mutation,
            OperationType::Subscription => DirectiveLocation::Subscription,
        },
        Node::Field(_) => DirectiveLocation::Field,
        Node::FragmentSpread(_) => DirectiveLocation::FragmentSpread,
        Node::InlineFragment(_) => DirectiveLocation::InlineFragment,
        Node::FragmentDefinition(_) => DirectiveLocation::FragmentDefinition,
        Node::VariableDefinition(_) => DirectiveLocation::VariableDefinition,
        Node::SchemaDefinition(_) => DirectiveLocation::Schema,
        Node::ScalarTypeDefinition(_) => DirectiveLocation::Scalar,
        Node::ObjectTypeDefinition(_) => DirectiveLocation::Object,
        Node::FieldDefinition(_) => DirectiveLocation::FieldDefinition,
        Node::InterfaceTypeDefinition(_) => DirectiveLocation::Interface,
        Node::UnionTypeDefinition(_) => DirectiveLocation::Union,
        Node::EnumTypeDefinition(_) => DirectiveLocation::Enum,
        Node::EnumValueDefinition(_) => DirectiveLocation::EnumValue,
        Node::InputObjectTypeDefinition(_) => DirectiveLocation::InputObject,
        Node::InputValueDefinition(_) if parent == Some(DirectiveLocation::InputObject) => {
            DirectiveLocation::InputFieldDefinition
        }
        Node::InputValueDefinition(_) => DirectiveLocation::ArgumentDefinition,
        _ => return None,
    };
    Some(location)
}

/// Directives attached to `node`, if it can carry any.
fn node_directives(node: Node<'_>) -> Option<&[Directive]> {
    let directives = match node {
        Node::OperationDefinition(n) => &n.directives,
        Node::VariableDefinition(n) => &n.directives,
        Node::Field(n) => &n.directives,
        Node::FragmentSpread(n) => &n.directives,
        Node::InlineFragment(n) => &n.directives,
        Node::FragmentDefinition(n) => &n.directives,
        Node::SchemaDefinition(n) => &n.directives,
        Node::ScalarTypeDefinition(n) => &n.directives,
        Node::ObjectTypeDefinition(n) => &n.directives,
        Node::InterfaceTypeDefinition(n) => &n.directives,
        Node::UnionTypeDefinition(n) => &n.directives,
        Node::EnumTypeDefinition(n) => &n.directives,
        Node::EnumValueDefinition(n) => &n.directives,
        Node::InputObjectTypeDefinition(n) => &n.directives,
        Node::FieldDefinition(n) => &n.directives,
        Node::InputValueDefinition(n) => &n.directives,
        _ => return None,
    };
    Some(directives)
}

struct KnownDirectives<'a> {
    context: &'a ValidationContext<'a>,
    defined: FxHashMap<&'a str, (&'a [DirectiveLocation], bool)>,
    /// Location of each enclosing node that can carry directives.
    locations: Vec<DirectiveLocation>,
}

impl<'a> KnownDirectives<'a> {
    fn check(&self, directive: &Directive) {
        let name = directive.name.as_str();
        let locations = match self.context.schema().directive(name) {
            Some(def) => def.locations.as_slice(),
            None => match self.defined.get(name) {
                Some(&(locations, _)) => locations,
                None => {
                    self.context.report(
                        Diagnostic::error(codes::KNOWN_DIRECTIVES, format!("Unknown directive \"@{name}\"."))
                            .with_span(directive.span),
                    );
                    return;
                }
            },
        };
        if let Some(current) = self.locations.last() {
            if !locations.contains(current) {
                self.context.report(
                    Diagnostic::error(
                        codes::KNOWN_DIRECTIVES,
                        format!("Directive \"@{name}\" may not be used on {}.", current.as_str()),
                    )
                    .with_span(directive.span),
                );
            }
        }
    }
}

impl<'a> Visitor<'a> for KnownDirectives<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(document) => self.defined = document_directives(document),
            Node::Directive(directive) => self.check(directive),
            _ => {
                if let Some(location) = directive_location(node, self.locations.last().copied()) {
                    self.locations.push(location);
                }
            }
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        if directive_location(node, None).is_some() {
            self.locations.pop();
        }
        VisitAction::Continue
    }
}

/// Directives must be defined and used only where their definition allows.
pub fn known_directives<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(KnownDirectives {
        context,
        defined: FxHashMap::default(),
        locations: Vec::new(),
    })
}

struct UniqueDirectivesPerLocation<'a> {
    context: &'a ValidationContext<'a>,
    defined: FxHashMap<&'a str, (&'a [DirectiveLocation], bool)>,
}

impl UniqueDirectivesPerLocation<'_> {
    fn is_unique(&self, name: &str) -> bool {
        match self.context.schema().directive(name) {
            Some(def) => !def.repeatable,
            None => self.defined.get(name).is_some_and(|(_, repeatable)| !repeatable),
        }
    }
}

impl<'a> Visitor<'a> for UniqueDirectivesPerLocation<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::Document(document) = node {
            self.defined = document_directives(document);
            return VisitAction::Continue;
        }
        let Some(directives) = node_directives(node) else {
            return VisitAction::Continue;
        };
        let mut seen: FxHashMap<&str, Span> = FxHashMap::default();
        for directive in directives {
            let name = directive.name.as_str();
            if !self.is_unique(name) {
                continue;
            }
            if let Some(first) = seen.get(name) {
                self.context.report(
                    Diagnostic::error(
                        codes::UNIQUE_DIRECTIVES_PER_LOCATION,
                        format!("The directive \"@{name}\" can only be used once at this location."),
                    )
                    .with_spans([*first, directive.span]),
                );
            } else {
                seen.insert(name, directive.span);
            }
        }
        VisitAction::Continue
    }
}

/// Non-repeatable directives may appear at most once per node.
pub fn unique_directives_per_location<'a>(
    context: &'a ValidationContext<'a>,
) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(UniqueDirectivesPerLocation {
        context,
        defined: FxHashMap::default(),
    })
}
