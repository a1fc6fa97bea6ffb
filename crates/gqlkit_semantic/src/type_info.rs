//! Type context tracking during a document walk.
//!
//! [`TypeInfo`] keeps stacks of the output type, parent composite type,
//! field definition and input type at the current position.
//! [`TypeInfoVisitor`] keeps a shared `TypeInfo` in step with a walk and
//! delegates to an inner visitor, so that visitor can ask "what type am I
//! inside of" at any node.

use std::cell::RefCell;

use gqlkit_syntax::{ast, Node, VisitAction, Visitor};

use crate::schema::{DirectiveDef, FieldDef, InputValueDef, Schema, TypeDef, TypeRef};

/// Type context at the current position of a walk.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    type_stack: Vec<Option<TypeRef>>,
    parent_type_stack: Vec<Option<String>>,
    input_type_stack: Vec<Option<TypeRef>>,
    field_def_stack: Vec<Option<FieldDef>>,
    directive: Option<DirectiveDef>,
    argument: Option<InputValueDef>,
}

impl TypeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output type of the current field, fragment or operation.
    pub fn output_type(&self) -> Option<&TypeRef> {
        self.type_stack.last().and_then(Option::as_ref)
    }

    /// Composite type whose selection set is being visited.
    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type_stack.last().and_then(Option::as_deref)
    }

    /// Expected type of the value being visited.
    pub fn input_type(&self) -> Option<&TypeRef> {
        self.input_type_stack.last().and_then(Option::as_ref)
    }

    /// Expected type of the list or object enclosing the current value.
    pub fn parent_input_type(&self) -> Option<&TypeRef> {
        self.input_type_stack.iter().rev().nth(1).and_then(Option::as_ref)
    }

    pub fn field_def(&self) -> Option<&FieldDef> {
        self.field_def_stack.last().and_then(Option::as_ref)
    }

    pub fn directive(&self) -> Option<&DirectiveDef> {
        self.directive.as_ref()
    }

    pub fn argument(&self) -> Option<&InputValueDef> {
        self.argument.as_ref()
    }

    /// Updates the stacks on entering `node`.
    pub fn enter(&mut self, schema: &Schema, node: Node<'_>) {
        match node {
            Node::SelectionSet(_) => {
                let parent = self
                    .output_type()
                    .and_then(|ty| schema.named_type(ty))
                    .filter(|ty| ty.is_composite())
                    .map(|ty| ty.name().to_string());
                self.parent_type_stack.push(parent);
            }
            Node::Field(field) => {
                let def = self
                    .parent_type()
                    .and_then(|parent| schema.field_def(parent, &field.name.value))
                    .cloned();
                self.type_stack.push(def.as_ref().map(|d| d.ty.clone()));
                self.field_def_stack.push(def);
            }
            Node::Directive(directive) => {
                self.directive = schema.directive(&directive.name.value).cloned();
            }
            Node::OperationDefinition(op) => {
                let root = match schema.root_type(op.operation) {
                    Some(TypeDef::Object(o)) => Some(TypeRef::named(o.name.clone())),
                    _ => None,
                };
                self.type_stack.push(root);
            }
            Node::InlineFragment(fragment) => {
                let ty = match &fragment.type_condition {
                    Some(condition) => output_type(schema, &condition.value),
                    None => self
                        .output_type()
                        .and_then(|ty| output_type(schema, ty.named_type())),
                };
                self.type_stack.push(ty);
            }
            Node::FragmentDefinition(fragment) => {
                self.type_stack
                    .push(output_type(schema, &fragment.type_condition.value));
            }
            Node::VariableDefinition(var) => {
                let ty = TypeRef::from_ast(&var.ty);
                let is_input = schema.named_type(&ty).is_some_and(TypeDef::is_input_type);
                self.input_type_stack.push(is_input.then_some(ty));
            }
            Node::Argument(arg) => {
                let definitions = match (&self.directive, self.field_def()) {
                    (Some(directive), _) => Some(&directive.arguments),
                    (None, Some(field)) => Some(&field.arguments),
                    (None, None) => None,
                };
                let def = definitions
                    .and_then(|args| args.get(&arg.name.value))
                    .cloned();
                self.input_type_stack.push(def.as_ref().map(|d| d.ty.clone()));
                self.argument = def;
            }
            Node::Value(ast::Value::List(..)) => {
                let item = self
                    .input_type()
                    .map(|ty| ty.list_item().unwrap_or(ty.nullable()).clone());
                self.input_type_stack.push(item);
            }
            Node::ObjectField(field) => {
                let ty = match self.input_type().and_then(|ty| schema.named_type(ty)) {
                    Some(TypeDef::InputObject(input)) => {
                        input.fields.get(&field.name.value).map(|f| f.ty.clone())
                    }
                    _ => None,
                };
                self.input_type_stack.push(ty);
            }
            _ => {}
        }
    }

    /// Restores the stacks on leaving `node`.
    pub fn leave(&mut self, node: Node<'_>) {
        match node {
            Node::SelectionSet(_) => {
                self.parent_type_stack.pop();
            }
            Node::Field(_) => {
                self.field_def_stack.pop();
                self.type_stack.pop();
            }
            Node::Directive(_) => self.directive = None,
            Node::OperationDefinition(_) | Node::InlineFragment(_) | Node::FragmentDefinition(_) => {
                self.type_stack.pop();
            }
            Node::VariableDefinition(_) | Node::Value(ast::Value::List(..)) | Node::ObjectField(_) => {
                self.input_type_stack.pop();
            }
            Node::Argument(_) => {
                self.argument = None;
                self.input_type_stack.pop();
            }
            _ => {}
        }
    }
}

fn output_type(schema: &Schema, name: &str) -> Option<TypeRef> {
    schema
        .get_type(name)
        .filter(|ty| ty.is_output_type())
        .map(|ty| TypeRef::named(ty.name()))
}

/// Keeps a [`TypeInfo`] in step with a walk around an inner visitor.
///
/// The type info is updated before the inner visitor's `enter` and after
/// its `leave`. If the inner visitor skips a node, the node is left
/// immediately.
pub struct TypeInfoVisitor<'t, V> {
    schema: &'t Schema,
    type_info: &'t RefCell<TypeInfo>,
    visitor: V,
}

impl<'t, V> TypeInfoVisitor<'t, V> {
    pub fn new(schema: &'t Schema, type_info: &'t RefCell<TypeInfo>, visitor: V) -> Self {
        Self {
            schema,
            type_info,
            visitor,
        }
    }

    pub fn into_inner(self) -> V {
        self.visitor
    }
}

impl<'a, V: Visitor<'a>> Visitor<'a> for TypeInfoVisitor<'_, V> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        self.type_info.borrow_mut().enter(self.schema, node);
        let action = self.visitor.enter(node);
        if action == VisitAction::Skip {
            self.type_info.borrow_mut().leave(node);
        }
        action
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        let action = self.visitor.leave(node);
        self.type_info.borrow_mut().leave(node);
        action
    }
}
