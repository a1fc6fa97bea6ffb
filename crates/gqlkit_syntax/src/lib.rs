//! Syntax layer for gqlkit.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization
//! - `block_string`: Block string dedenting
//! - `ast`: Abstract syntax tree types
//! - `parser`: Recursive descent parser
//! - `visitor`: Enter/leave traversal, parallel and editing visitors
//! - `printer`: AST to GraphQL text

pub mod ast;
pub mod block_string;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod visitor;

pub use ast::*;
pub use error::SyntaxError;
pub use lexer::Lexer;
pub use parser::{
    parse, parse_const_value, parse_source, parse_type, parse_value, parse_with_options,
    ParseOptions,
};
pub use printer::{print, print_value, PrintOptions, Printer};
pub use token::{DirectiveLocation, Token, TokenKind};
pub use visitor::{
    walk, walk_mut, walk_node, Node, NodeMut, ParallelVisitor, VisitAction, Visitor, VisitorMut,
};
