//! Depth-first AST traversal.
//!
//! [`walk`] calls [`Visitor::enter`] before a node's children and
//! [`Visitor::leave`] after them. Children are visited in source order
//! (for a field: arguments, directives, then the selection set). Names are
//! plain data and are not visited as nodes.
//!
//! [`walk_mut`] is the editing counterpart: a [`VisitorMut`] receives
//! mutable references and may overwrite a node in place, after which the
//! walk continues into the new node's children.

use crate::ast::*;
use gqlkit_core::Span;

/// What the traversal should do after `enter` or `leave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitAction {
    #[default]
    Continue,
    /// Do not visit this node's children, and do not call `leave` for it.
    /// Ignored when returned from `leave`.
    Skip,
    /// Abort the whole traversal.
    Stop,
}

/// A borrowed reference to any visitable node.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Document),
    OperationDefinition(&'a OperationDefinition),
    VariableDefinition(&'a VariableDefinition),
    SelectionSet(&'a SelectionSet),
    Field(&'a Field),
    FragmentSpread(&'a FragmentSpread),
    InlineFragment(&'a InlineFragment),
    FragmentDefinition(&'a FragmentDefinition),
    Argument(&'a Argument),
    Directive(&'a Directive),
    Value(&'a Value),
    ObjectField(&'a ObjectField),
    Type(&'a Type),
    SchemaDefinition(&'a SchemaDefinition),
    OperationTypeDefinition(&'a OperationTypeDefinition),
    ScalarTypeDefinition(&'a ScalarTypeDefinition),
    ObjectTypeDefinition(&'a ObjectTypeDefinition),
    InterfaceTypeDefinition(&'a InterfaceTypeDefinition),
    UnionTypeDefinition(&'a UnionTypeDefinition),
    EnumTypeDefinition(&'a EnumTypeDefinition),
    EnumValueDefinition(&'a EnumValueDefinition),
    InputObjectTypeDefinition(&'a InputObjectTypeDefinition),
    FieldDefinition(&'a FieldDefinition),
    InputValueDefinition(&'a InputValueDefinition),
    DirectiveDefinition(&'a DirectiveDefinition),
}

impl<'a> Node<'a> {
    /// Source span of the node.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Document(n) => n.span,
            Self::OperationDefinition(n) => n.span,
            Self::VariableDefinition(n) => n.span,
            Self::SelectionSet(n) => n.span,
            Self::Field(n) => n.span,
            Self::FragmentSpread(n) => n.span,
            Self::InlineFragment(n) => n.span,
            Self::FragmentDefinition(n) => n.span,
            Self::Argument(n) => n.span,
            Self::Directive(n) => n.span,
            Self::Value(n) => n.span(),
            Self::ObjectField(n) => n.span,
            Self::Type(n) => n.span(),
            Self::SchemaDefinition(n) => n.span,
            Self::OperationTypeDefinition(n) => n.span,
            Self::ScalarTypeDefinition(n) => n.span,
            Self::ObjectTypeDefinition(n) => n.span,
            Self::InterfaceTypeDefinition(n) => n.span,
            Self::UnionTypeDefinition(n) => n.span,
            Self::EnumTypeDefinition(n) => n.span,
            Self::EnumValueDefinition(n) => n.span,
            Self::InputObjectTypeDefinition(n) => n.span,
            Self::FieldDefinition(n) => n.span,
            Self::InputValueDefinition(n) => n.span,
            Self::DirectiveDefinition(n) => n.span,
        }
    }

    /// Kind name, e.g. `"Field"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document(_) => "Document",
            Self::OperationDefinition(_) => "OperationDefinition",
            Self::VariableDefinition(_) => "VariableDefinition",
            Self::SelectionSet(_) => "SelectionSet",
            Self::Field(_) => "Field",
            Self::FragmentSpread(_) => "FragmentSpread",
            Self::InlineFragment(_) => "InlineFragment",
            Self::FragmentDefinition(_) => "FragmentDefinition",
            Self::Argument(_) => "Argument",
            Self::Directive(_) => "Directive",
            Self::Value(_) => "Value",
            Self::ObjectField(_) => "ObjectField",
            Self::Type(_) => "Type",
            Self::SchemaDefinition(_) => "SchemaDefinition",
            Self::OperationTypeDefinition(_) => "OperationTypeDefinition",
            Self::ScalarTypeDefinition(_) => "ScalarTypeDefinition",
            Self::ObjectTypeDefinition(_) => "ObjectTypeDefinition",
            Self::InterfaceTypeDefinition(_) => "InterfaceTypeDefinition",
            Self::UnionTypeDefinition(_) => "UnionTypeDefinition",
            Self::EnumTypeDefinition(_) => "EnumTypeDefinition",
            Self::EnumValueDefinition(_) => "EnumValueDefinition",
            Self::InputObjectTypeDefinition(_) => "InputObjectTypeDefinition",
            Self::FieldDefinition(_) => "FieldDefinition",
            Self::InputValueDefinition(_) => "InputValueDefinition",
            Self::DirectiveDefinition(_) => "DirectiveDefinition",
        }
    }

    fn from_definition(def: &'a Definition) -> Self {
        match def {
            Definition::Operation(n) => Self::OperationDefinition(n),
            Definition::Fragment(n) => Self::FragmentDefinition(n),
            Definition::Schema(n) => Self::SchemaDefinition(n),
            Definition::Directive(n) => Self::DirectiveDefinition(n),
            Definition::Type(TypeDefinition::Scalar(n)) => Self::ScalarTypeDefinition(n),
            Definition::Type(TypeDefinition::Object(n)) => Self::ObjectTypeDefinition(n),
            Definition::Type(TypeDefinition::Interface(n)) => Self::InterfaceTypeDefinition(n),
            Definition::Type(TypeDefinition::Union(n)) => Self::UnionTypeDefinition(n),
            Definition::Type(TypeDefinition::Enum(n)) => Self::EnumTypeDefinition(n),
            Definition::Type(TypeDefinition::InputObject(n)) => Self::InputObjectTypeDefinition(n),
        }
    }

    fn from_selection(selection: &'a Selection) -> Self {
        match selection {
            Selection::Field(n) => Self::Field(n),
            Selection::FragmentSpread(n) => Self::FragmentSpread(n),
            Selection::InlineFragment(n) => Self::InlineFragment(n),
        }
    }
}

/// A read-only visitor.
pub trait Visitor<'a> {
    fn enter(&mut self, _node: Node<'a>) -> VisitAction {
        VisitAction::Continue
    }

    fn leave(&mut self, _node: Node<'a>) -> VisitAction {
        VisitAction::Continue
    }
}

impl<'a, V: Visitor<'a> + ?Sized> Visitor<'a> for Box<V> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        (**self).enter(node)
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        (**self).leave(node)
    }
}

/// Walks `document` with `visitor`. Returns false if the walk was stopped.
pub fn walk<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, document: &'a Document) -> bool {
    walk_node(visitor, Node::Document(document))
}

/// Walks the subtree rooted at `node`. Returns false if the walk was stopped.
pub fn walk_node<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, node: Node<'a>) -> bool {
    match visitor.enter(node) {
        VisitAction::Stop => return false,
        VisitAction::Skip => return true,
        VisitAction::Continue => {}
    }
    if !walk_children(visitor, node) {
        return false;
    }
    visitor.leave(node) != VisitAction::Stop
}

fn walk_all<'a, V, I>(visitor: &mut V, nodes: I) -> bool
where
    V: Visitor<'a> + ?Sized,
    I: IntoIterator<Item = Node<'a>>,
{
    nodes.into_iter().all(|node| walk_node(visitor, node))
}

fn directives<'a>(directives: &'a [Directive]) -> impl Iterator<Item = Node<'a>> {
    directives.iter().map(Node::Directive)
}

fn arguments<'a>(arguments: &'a [Argument]) -> impl Iterator<Item = Node<'a>> {
    arguments.iter().map(Node::Argument)
}

fn input_values<'a>(values: &'a [InputValueDefinition]) -> impl Iterator<Item = Node<'a>> {
    values.iter().map(Node::InputValueDefinition)
}

fn walk_children<'a, V: Visitor<'a> + ?Sized>(v: &mut V, node: Node<'a>) -> bool {
    match node {
        Node::Document(doc) => walk_all(v, doc.definitions.iter().map(Node::from_definition)),
        Node::OperationDefinition(op) => {
            walk_all(v, op.variable_definitions.iter().map(Node::VariableDefinition))
                && walk_all(v, directives(&op.directives))
                && walk_node(v, Node::SelectionSet(&op.selection_set))
        }
        Node::VariableDefinition(var) => {
            walk_node(v, Node::Type(&var.ty))
                && walk_all(v, var.default_value.iter().map(Node::Value))
                && walk_all(v, directives(&var.directives))
        }
        Node::SelectionSet(set) => walk_all(v, set.selections.iter().map(Node::from_selection)),
        Node::Field(field) => {
            walk_all(v, arguments(&field.arguments))
                && walk_all(v, directives(&field.directives))
                && walk_all(v, field.selection_set.iter().map(Node::SelectionSet))
        }
        Node::FragmentSpread(spread) => walk_all(v, directives(&spread.directives)),
        Node::InlineFragment(frag) => {
            walk_all(v, directives(&frag.directives))
                && walk_node(v, Node::SelectionSet(&frag.selection_set))
        }
        Node::FragmentDefinition(frag) => {
            walk_all(v, directives(&frag.directives))
                && walk_node(v, Node::SelectionSet(&frag.selection_set))
        }
        Node::Argument(arg) => walk_node(v, Node::Value(&arg.value)),
        Node::Directive(dir) => walk_all(v, arguments(&dir.arguments)),
        Node::Value(Value::List(items, _)) => walk_all(v, items.iter().map(Node::Value)),
        Node::Value(Value::Object(fields, _)) => walk_all(v, fields.iter().map(Node::ObjectField)),
        Node::Value(_) => true,
        Node::ObjectField(field) => walk_node(v, Node::Value(&field.value)),
        Node::Type(Type::List(inner, _) | Type::NonNull(inner, _)) => walk_node(v, Node::Type(inner)),
        Node::Type(Type::Named(_)) => true,
        Node::SchemaDefinition(schema) => {
            walk_all(v, directives(&schema.directives))
                && walk_all(
                    v,
                    schema
                        .operation_types
                        .iter()
                        .map(Node::OperationTypeDefinition),
                )
        }
        Node::OperationTypeDefinition(_) => true,
        Node::ScalarTypeDefinition(def) => walk_all(v, directives(&def.directives)),
        Node::ObjectTypeDefinition(def) => {
            walk_all(v, directives(&def.directives))
                && walk_all(v, def.fields.iter().map(Node::FieldDefinition))
        }
        Node::InterfaceTypeDefinition(def) => {
            walk_all(v, directives(&def.directives))
                && walk_all(v, def.fields.iter().map(Node::FieldDefinition))
        }
        Node::UnionTypeDefinition(def) => walk_all(v, directives(&def.directives)),
        Node::EnumTypeDefinition(def) => {
            walk_all(v, directives(&def.directives))
                && walk_all(v, def.values.iter().map(Node::EnumValueDefinition))
        }
        Node::EnumValueDefinition(def) => walk_all(v, directives(&def.directives)),
        Node::InputObjectTypeDefinition(def) => {
            walk_all(v, directives(&def.directives)) && walk_all(v, input_values(&def.fields))
        }
        Node::FieldDefinition(def) => {
            walk_all(v, input_values(&def.arguments))
                && walk_node(v, Node::Type(&def.ty))
                && walk_all(v, directives(&def.directives))
        }
        Node::InputValueDefinition(def) => {
            walk_node(v, Node::Type(&def.ty))
                && walk_all(v, def.default_value.iter().map(Node::Value))
                && walk_all(v, directives(&def.directives))
        }
        Node::DirectiveDefinition(def) => walk_all(v, input_values(&def.arguments)),
    }
}

// ---------------------------------------------------------------------------
// Parallel visitor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipState {
    Active,
    /// Skipping until `leave` at this depth.
    SkipUntil(usize),
    Stopped,
}

/// Runs several visitors over a single traversal.
///
/// Each visitor sees `enter` in registration order. A visitor that returns
/// [`VisitAction::Skip`] or [`VisitAction::Stop`] only affects itself; its
/// siblings keep visiting.
pub struct ParallelVisitor<'a> {
    visitors: Vec<Box<dyn Visitor<'a> + 'a>>,
    states: Vec<SkipState>,
    depth: usize,
}

impl<'a> ParallelVisitor<'a> {
    #[must_use]
    pub fn new(visitors: Vec<Box<dyn Visitor<'a> + 'a>>) -> Self {
        let states = vec![SkipState::Active; visitors.len()];
        Self {
            visitors,
            states,
            depth: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl<'a> Visitor<'a> for ParallelVisitor<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        for (visitor, state) in self.visitors.iter_mut().zip(self.states.iter_mut()) {
            if *state != SkipState::Active {
                continue;
            }
            match visitor.enter(node) {
                VisitAction::Continue => {}
                VisitAction::Skip => *state = SkipState::SkipUntil(self.depth),
                VisitAction::Stop => *state = SkipState::Stopped,
            }
        }
        self.depth += 1;
        if self.states.iter().all(|s| *s == SkipState::Stopped) {
            return VisitAction::Stop;
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        self.depth -= 1;
        for (visitor, state) in self.visitors.iter_mut().zip(self.states.iter_mut()) {
            match *state {
                SkipState::Active => {
                    if visitor.leave(node) == VisitAction::Stop {
                        *state = SkipState::Stopped;
                    }
                }
                SkipState::SkipUntil(depth) if depth == self.depth => *state = SkipState::Active,
                _ => {}
            }
        }
        if self.states.iter().all(|s| *s == SkipState::Stopped) {
            return VisitAction::Stop;
        }
        VisitAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Editing visitor
// ---------------------------------------------------------------------------

/// A mutable reference to an executable node.
///
/// Type-system definitions are exposed whole as [`NodeMut::TypeSystemDefinition`]
/// and are not descended into.
#[derive(Debug)]
pub enum NodeMut<'n> {
    OperationDefinition(&'n mut OperationDefinition),
    VariableDefinition(&'n mut VariableDefinition),
    SelectionSet(&'n mut SelectionSet),
    Selection(&'n mut Selection),
    FragmentDefinition(&'n mut FragmentDefinition),
    Argument(&'n mut Argument),
    Directive(&'n mut Directive),
    Value(&'n mut Value),
    TypeSystemDefinition(&'n mut Definition),
}

/// An editing visitor. Overwriting the referenced node replaces it.
pub trait VisitorMut {
    fn enter_mut(&mut self, _node: NodeMut<'_>) -> VisitAction {
        VisitAction::Continue
    }

    fn leave_mut(&mut self, _node: NodeMut<'_>) -> VisitAction {
        VisitAction::Continue
    }
}

/// Walks and edits `document`. Returns false if the walk was stopped.
pub fn walk_mut<V: VisitorMut + ?Sized>(visitor: &mut V, document: &mut Document) -> bool {
    document
        .definitions
        .iter_mut()
        .all(|def| walk_definition_mut(visitor, def))
}

macro_rules! enter_leave_mut {
    ($visitor:expr, $variant:ident, $node:expr, $children:block) => {{
        match $visitor.enter_mut(NodeMut::$variant(&mut *$node)) {
            VisitAction::Stop => return false,
            VisitAction::Skip => return true,
            VisitAction::Continue => {}
        }
        if !$children {
            return false;
        }
        $visitor.leave_mut(NodeMut::$variant($node)) != VisitAction::Stop
    }};
}

fn walk_definition_mut<V: VisitorMut + ?Sized>(v: &mut V, def: &mut Definition) -> bool {
    match def {
        Definition::Operation(op) => enter_leave_mut!(v, OperationDefinition, op, {
            op.variable_definitions
                .iter_mut()
                .all(|var| walk_variable_definition_mut(v, var))
                && walk_directives_mut(v, &mut op.directives)
                && walk_selection_set_mut(v, &mut op.selection_set)
        }),
        Definition::Fragment(frag) => enter_leave_mut!(v, FragmentDefinition, frag, {
            walk_directives_mut(v, &mut frag.directives)
                && walk_selection_set_mut(v, &mut frag.selection_set)
        }),
        _ => enter_leave_mut!(v, TypeSystemDefinition, def, { true }),
    }
}

fn walk_variable_definition_mut<V: VisitorMut + ?Sized>(
    v: &mut V,
    var: &mut VariableDefinition,
) -> bool {
    enter_leave_mut!(v, VariableDefinition, var, {
        var.default_value
            .iter_mut()
            .all(|value| walk_value_mut(v, value))
            && walk_directives_mut(v, &mut var.directives)
    })
}

fn walk_selection_set_mut<V: VisitorMut + ?Sized>(v: &mut V, set: &mut SelectionSet) -> bool {
    enter_leave_mut!(v, SelectionSet, set, {
        set.selections
            .iter_mut()
            .all(|selection| walk_selection_mut(v, selection))
    })
}

fn walk_selection_mut<V: VisitorMut + ?Sized>(v: &mut V, selection: &mut Selection) -> bool {
    enter_leave_mut!(v, Selection, selection, {
        match selection {
            Selection::Field(field) => {
                field
                    .arguments
                    .iter_mut()
                    .all(|arg| walk_argument_mut(v, arg))
                    && walk_directives_mut(v, &mut field.directives)
                    && field
                        .selection_set
                        .iter_mut()
                        .all(|set| walk_selection_set_mut(v, set))
            }
            Selection::FragmentSpread(spread) => walk_directives_mut(v, &mut spread.directives),
            Selection::InlineFragment(frag) => {
                walk_directives_mut(v, &mut frag.directives)
                    && walk_selection_set_mut(v, &mut frag.selection_set)
            }
        }
    })
}

fn walk_directives_mut<V: VisitorMut + ?Sized>(v: &mut V, directives: &mut [Directive]) -> bool {
    directives.iter_mut().all(|dir| {
        enter_leave_mut!(v, Directive, dir, {
            dir.arguments.iter_mut().all(|arg| walk_argument_mut(v, arg))
        })
    })
}

fn walk_argument_mut<V: VisitorMut + ?Sized>(v: &mut V, arg: &mut Argument) -> bool {
    enter_leave_mut!(v, Argument, arg, { walk_value_mut(v, &mut arg.value) })
}

fn walk_value_mut<V: VisitorMut + ?Sized>(v: &mut V, value: &mut Value) -> bool {
    enter_leave_mut!(v, Value, value, {
        match value {
            Value::List(items, _) => items.iter_mut().all(|item| walk_value_mut(v, item)),
            Value::Object(fields, _) => fields
                .iter_mut()
                .all(|field| walk_value_mut(v, &mut field.value)),
            _ => true,
        }
    })
}
