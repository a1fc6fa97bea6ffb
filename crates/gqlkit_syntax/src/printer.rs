//! Canonical GraphQL text output for ASTs.

use std::fmt::Write as _;

use crate::ast::*;

/// Printing options.
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Number of spaces per indentation level.
    pub indent_size: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self { indent_size: 2 }
    }
}

/// Prints a document with default options.
#[must_use]
pub fn print(document: &Document) -> String {
    print_with_options(document, PrintOptions::default())
}

/// Prints a document with the given options.
#[must_use]
pub fn print_with_options(document: &Document, options: PrintOptions) -> String {
    Printer::new(options).print_document(document)
}

/// Prints a single value literal, e.g. for error messages.
#[must_use]
pub fn print_value(value: &Value) -> String {
    let mut printer = Printer::new(PrintOptions::default());
    printer.value(value);
    printer.output
}

/// AST printer.
pub struct Printer {
    options: PrintOptions,
    output: String,
    indent: usize,
}

impl Printer {
    #[must_use]
    pub fn new(options: PrintOptions) -> Self {
        Self {
            options,
            output: String::new(),
            indent: 0,
        }
    }

    /// Prints a document. Definitions are separated by a blank line.
    pub fn print_document(mut self, document: &Document) -> String {
        for (i, def) in document.definitions.iter().enumerate() {
            if i > 0 {
                self.output.push_str("\n\n");
            }
            self.definition(def);
        }
        if !document.definitions.is_empty() {
            self.output.push('\n');
        }
        self.output
    }

    fn push_indent(&mut self) {
        let width = self.indent * self.options.indent_size;
        self.output.extend(std::iter::repeat(' ').take(width));
    }

    fn newline(&mut self) {
        self.output.push('\n');
        self.push_indent();
    }

    fn definition(&mut self, def: &Definition) {
        match def {
            Definition::Operation(op) => self.operation(op),
            Definition::Fragment(frag) => self.fragment_definition(frag),
            Definition::Schema(schema) => self.schema(schema),
            Definition::Type(ty) => self.type_definition(ty),
            Definition::Directive(dir) => self.directive_definition(dir),
        }
    }

    fn operation(&mut self, op: &OperationDefinition) {
        let shorthand = op.operation == OperationType::Query
            && op.name.is_none()
            && op.variable_definitions.is_empty()
            && op.directives.is_empty();
        if !shorthand {
            self.output.push_str(op.operation.as_str());
            if let Some(name) = &op.name {
                self.output.push(' ');
                self.output.push_str(name.as_str());
            }
            if !op.variable_definitions.is_empty() {
                if op.name.is_none() {
                    self.output.push(' ');
                }
                self.output.push('(');
                for (i, var) in op.variable_definitions.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.variable_definition(var);
                }
                self.output.push(')');
            }
            self.directives(&op.directives);
            self.output.push(' ');
        }
        self.selection_set(&op.selection_set);
    }

    fn variable_definition(&mut self, var: &VariableDefinition) {
        self.output.push('$');
        self.output.push_str(var.variable.as_str());
        self.output.push_str(": ");
        self.ty(&var.ty);
        if let Some(default) = &var.default_value {
            self.output.push_str(" = ");
            self.value(default);
        }
        self.directives(&var.directives);
    }

    fn fragment_definition(&mut self, frag: &FragmentDefinition) {
        let _ = write!(
            self.output,
            "fragment {} on {}",
            frag.name, frag.type_condition
        );
        self.directives(&frag.directives);
        self.output.push(' ');
        self.selection_set(&frag.selection_set);
    }

    fn selection_set(&mut self, set: &SelectionSet) {
        self.output.push('{');
        self.indent += 1;
        for selection in &set.selections {
            self.newline();
            self.selection(selection);
        }
        self.indent -= 1;
        self.newline();
        self.output.push('}');
    }

    fn selection(&mut self, selection: &Selection) {
        match selection {
            Selection::Field(field) => {
                if let Some(alias) = &field.alias {
                    self.output.push_str(alias.as_str());
                    self.output.push_str(": ");
                }
                self.output.push_str(field.name.as_str());
                self.arguments(&field.arguments);
                self.directives(&field.directives);
                if let Some(set) = &field.selection_set {
                    self.output.push(' ');
                    self.selection_set(set);
                }
            }
            Selection::FragmentSpread(spread) => {
                self.output.push_str("...");
                self.output.push_str(spread.name.as_str());
                self.directives(&spread.directives);
            }
            Selection::InlineFragment(frag) => {
                self.output.push_str("...");
                if let Some(ty) = &frag.type_condition {
                    self.output.push_str(" on ");
                    self.output.push_str(ty.as_str());
                }
                self.directives(&frag.directives);
                self.output.push(' ');
                self.selection_set(&frag.selection_set);
            }
        }
    }

    fn arguments(&mut self, arguments: &[Argument]) {
        if arguments.is_empty() {
            return;
        }
        self.output.push('(');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.output.push_str(arg.name.as_str());
            self.output.push_str(": ");
            self.value(&arg.value);
        }
        self.output.push(')');
    }

    fn directives(&mut self, directives: &[Directive]) {
        for directive in directives {
            self.output.push_str(" @");
            self.output.push_str(directive.name.as_str());
            self.arguments(&directive.arguments);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Variable(name) => {
                self.output.push('$');
                self.output.push_str(name.as_str());
            }
            Value::Int(raw, _) | Value::Float(raw, _) => self.output.push_str(raw),
            Value::String(s) => self.string(&s.value, s.block),
            Value::Boolean(b, _) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Null(_) => self.output.push_str("null"),
            Value::Enum(name) => self.output.push_str(name.as_str()),
            Value::List(items, _) => {
                self.output.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.value(item);
                }
                self.output.push(']');
            }
            Value::Object(fields, _) => {
                self.output.push('{');
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.output.push_str(field.name.as_str());
                    self.output.push_str(": ");
                    self.value(&field.value);
                }
                self.output.push('}');
            }
        }
    }

    fn ty(&mut self, ty: &Type) {
        let _ = write!(self.output, "{ty}");
    }

    fn string(&mut self, value: &str, prefer_block: bool) {
        if prefer_block && is_printable_as_block_string(value) {
            self.output.push_str("\"\"\"");
            for line in value.split('\n') {
                self.newline();
                self.output.push_str(&line.replace("\"\"\"", "\\\"\"\""));
            }
            self.newline();
            self.output.push_str("\"\"\"");
        } else {
            escape_string(&mut self.output, value);
        }
    }

    fn description(&mut self, description: Option<&StringValue>) {
        if let Some(desc) = description {
            self.string(&desc.value, desc.block);
            self.newline();
        }
    }

    // Type system -----------------------------------------------------------

    fn schema(&mut self, schema: &SchemaDefinition) {
        self.description(schema.description.as_ref());
        self.output.push_str("schema");
        self.directives(&schema.directives);
        self.output.push_str(" {");
        self.indent += 1;
        for op in &schema.operation_types {
            self.newline();
            let _ = write!(self.output, "{}: {}", op.operation, op.type_name);
        }
        self.indent -= 1;
        self.newline();
        self.output.push('}');
    }

    fn type_definition(&mut self, def: &TypeDefinition) {
        self.description(def.description());
        match def {
            TypeDefinition::Scalar(s) => {
                let _ = write!(self.output, "scalar {}", s.name);
                self.directives(&s.directives);
            }
            TypeDefinition::Object(o) => {
                let _ = write!(self.output, "type {}", o.name);
                self.implements(&o.interfaces);
                self.directives(&o.directives);
                self.field_definitions(&o.fields);
            }
            TypeDefinition::Interface(i) => {
                let _ = write!(self.output, "interface {}", i.name);
                self.implements(&i.interfaces);
                self.directives(&i.directives);
                self.field_definitions(&i.fields);
            }
            TypeDefinition::Union(u) => {
                let _ = write!(self.output, "union {}", u.name);
                self.directives(&u.directives);
                if !u.members.is_empty() {
                    self.output.push_str(" = ");
                    self.output.push_str(&join_names(&u.members, " | "));
                }
            }
            TypeDefinition::Enum(e) => {
                let _ = write!(self.output, "enum {}", e.name);
                self.directives(&e.directives);
                if !e.values.is_empty() {
                    self.output.push_str(" {");
                    self.indent += 1;
                    for value in &e.values {
                        self.newline();
                        self.description(value.description.as_ref());
                        self.output.push_str(value.name.as_str());
                        self.directives(&value.directives);
                    }
                    self.indent -= 1;
                    self.newline();
                    self.output.push('}');
                }
            }
            TypeDefinition::InputObject(i) => {
                let _ = write!(self.output, "input {}", i.name);
                self.directives(&i.directives);
                if !i.fields.is_empty() {
                    self.output.push_str(" {");
                    self.indent += 1;
                    for field in &i.fields {
                        self.newline();
                        self.input_value_definition(field);
                    }
                    self.indent -= 1;
                    self.newline();
                    self.output.push('}');
                }
            }
        }
    }

    fn implements(&mut self, interfaces: &[Name]) {
        if !interfaces.is_empty() {
            self.output.push_str(" implements ");
            self.output.push_str(&join_names(interfaces, " & "));
        }
    }

    fn field_definitions(&mut self, fields: &[FieldDefinition]) {
        if fields.is_empty() {
            return;
        }
        self.output.push_str(" {");
        self.indent += 1;
        for field in fields {
            self.newline();
            self.description(field.description.as_ref());
            self.output.push_str(field.name.as_str());
            self.argument_definitions(&field.arguments);
            self.output.push_str(": ");
            self.ty(&field.ty);
            self.directives(&field.directives);
        }
        self.indent -= 1;
        self.newline();
        self.output.push('}');
    }

    fn argument_definitions(&mut self, arguments: &[InputValueDefinition]) {
        if arguments.is_empty() {
            return;
        }
        self.output.push('(');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.input_value_definition(arg);
        }
        self.output.push(')');
    }

    fn input_value_definition(&mut self, def: &InputValueDefinition) {
        if let Some(desc) = &def.description {
            // Inline descriptions are always printed as plain strings.
            escape_string(&mut self.output, &desc.value);
            self.output.push(' ');
        }
        self.output.push_str(def.name.as_str());
        self.output.push_str(": ");
        self.ty(&def.ty);
        if let Some(default) = &def.default_value {
            self.output.push_str(" = ");
            self.value(default);
        }
        self.directives(&def.directives);
    }

    fn directive_definition(&mut self, def: &DirectiveDefinition) {
        self.description(def.description.as_ref());
        let _ = write!(self.output, "directive @{}", def.name);
        self.argument_definitions(&def.arguments);
        if def.repeatable {
            self.output.push_str(" repeatable");
        }
        self.output.push_str(" on ");
        let locations: Vec<_> = def.locations.iter().map(|l| l.as_str()).collect();
        self.output.push_str(&locations.join(" | "));
    }
}

fn join_names(names: &[Name], separator: &str) -> String {
    names
        .iter()
        .map(Name::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Writes `value` as a double-quoted string literal.
fn escape_string(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// A value survives a block-string round trip when its first line starts
/// with a non-blank character, its last line is not blank, and it holds no
/// characters that need escaping.
fn is_printable_as_block_string(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if first == ' ' || first == '\t' || first == '\n' {
        return false;
    }
    if value
        .chars()
        .any(|c| c == '\r' || ((c as u32) < 0x20 && c != '\n' && c != '\t'))
    {
        return false;
    }
    value
        .rsplit('\n')
        .next()
        .is_some_and(|last| last.chars().any(|c| c != ' ' && c != '\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use insta::assert_snapshot;

    fn reprint(source: &str) -> String {
        print(&parse(source).unwrap())
    }

    #[test]
    fn test_print_query() {
        assert_snapshot!(
            reprint("query Q($id: ID! = \"1\", $f: [Int!]) @live { user(id: $id) { ...F  ... on Admin @skip(if: false) { level } friends(first: 10, filter: {name: \"x\", tags: [A, B]}) { name } } }"),
            @r###"
        query Q($id: ID! = "1", $f: [Int!]) @live {
          user(id: $id) {
            ...F
            ... on Admin @skip(if: false) {
              level
            }
            friends(first: 10, filter: {name: "x", tags: [A, B]}) {
              name
            }
          }
        }
        "###
        );
    }

    #[test]
    fn test_print_shorthand_and_fragment() {
        assert_eq!(
            reprint("{a} fragment F on T {b}"),
            "{\n  a\n}\n\nfragment F on T {\n  b\n}\n"
        );
    }

    #[test]
    fn test_print_type_system() {
        assert_snapshot!(
            reprint(r#"
            schema { query: Q }
            """
            The query root.
              Indented line.
            """
            type Q implements Node & Named @key(fields: "id") {
              "the id" id: ID!
              search(term: String = "x", "limit" first: Int): [Result]
            }
            union Result = A | B
            enum Color { RED "green" GREEN @deprecated }
            input In { a: Int = 1 }
            scalar Date
            directive @key(fields: String!) repeatable on OBJECT | INTERFACE
            "#),
            @r###"
        schema {
          query: Q
        }

        """
        The query root.
          Indented line.
        """
        type Q implements Node & Named @key(fields: "id") {
          "the id"
          id: ID!
          search(term: String = "x", "limit" first: Int): [Result]
        }

        union Result = A | B

        enum Color {
          RED
          "green"
          GREEN @deprecated
        }

        input In {
          a: Int = 1
        }

        scalar Date

        directive @key(fields: String!) repeatable on OBJECT | INTERFACE
        "###
        );
    }

    #[test]
    fn test_print_string_escapes() {
        let value = crate::parser::parse_value(r#""a\"b\\c\nd\u0001""#).unwrap();
        assert_eq!(print_value(&value), r#""a\"b\\c\nd\u0001""#);
    }

    #[test]
    fn test_block_string_fallback() {
        let value = crate::parser::parse_value("\"\"\"  leading space\"\"\"").unwrap();
        assert_eq!(print_value(&value), "\"  leading space\"");
    }

    #[test]
    fn test_round_trip_corpus() {
        let corpus = [
            "{ a }",
            "query { a: b(c: 1.5e-3, d: -0) @include(if: $x) }",
            "mutation M($v: [[String]!] = [[\"a\"]]) { set(v: $v) { ok } }",
            "subscription S { events { ... on Created { id } ... { at } } }",
            "query Q { ...F } fragment F on Q @dir(a: {b: [1, 2, {c: null}]}) { x }",
            "type T { \"\"\"multi\n  line\"\"\" f(a: Int = 1 @d): [T!]! }",
            "\"desc \\\"quoted\\\"\" scalar S @specifiedBy(url: \"u\")",
            "interface I implements J { f: Int }\ninput In { a: Int = 1, b: [String!] = [\"\"] }",
            "enum E { A B }\nunion U = A | B\ndirective @d(x: Int) on FIELD | QUERY",
            "schema @s { query: Q mutation: M subscription: S }",
            "{ s(v: \"\"\"\n   keep \"\"\\\"\"\" escaped\n\"\"\") }",
        ];
        for source in corpus {
            let printed = reprint(source);
            let reprinted = reprint(&printed);
            assert_eq!(printed, reprinted, "round trip failed for {source:?}");
        }
    }
}
