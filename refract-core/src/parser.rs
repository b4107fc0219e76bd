//! Recursive-descent parser producing the arena syntax tree.
//!
//! The grammar is the GLSL subset the transform engine handles:
//! declarations with storage qualifiers, functions, structs, the statement
//! forms, and the full expression precedence ladder down to postfix
//! call/index/field chains.

use log::trace;

use crate::bail_parse;
use crate::error::Result;
use crate::lexer::Token;
use crate::tree::{NodeId, SyntaxTree, Tag};

/// Operator sets per binary precedence level, loosest binding first.
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["^^"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &["<", ">", "<=", ">="],
    &["<<", ">>"],
    &["+", "-"],
    &["*", "/", "%"],
];

const ASSIGNMENT_OPS: &[&str] = &["=", "+=", "-=", "*=", "/="];
const PRECISION_QUALIFIERS: &[&str] = &["highp", "mediump", "lowp"];
const PARAMETER_QUALIFIERS: &[&str] = &["in", "out", "inout"];

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    tree: SyntaxTree,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            tree: SyntaxTree::new(),
        }
    }

    pub fn parse(&mut self) -> Result<SyntaxTree> {
        let root = self.tree.add(Tag::Root, None);
        self.tree.set_root(root);
        while !self.is_at_end() {
            let decl = self.parse_external_declaration()?;
            self.tree.attach(root, decl);
        }
        Ok(std::mem::take(&mut self.tree))
    }

    // ---- token plumbing ---------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.current + n)
    }

    fn advance(&mut self) -> Option<&Token> {
        if self.current < self.tokens.len() {
            self.current += 1;
            self.tokens.get(self.current - 1)
        } else {
            None
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.match_token(&token) {
            Ok(())
        } else {
            bail_parse!("Expected {:?}, found {:?}", token, self.peek())
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.peek().cloned() {
            Some(Token::Identifier(name)) => {
                self.current += 1;
                Ok(name)
            }
            other => bail_parse!("Expected identifier, found {:?}", other),
        }
    }

    fn check_identifier(&self, text: &str) -> bool {
        matches!(self.peek(), Some(Token::Identifier(name)) if name == text)
    }

    fn peek_operator(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Operator(op)) => Some(op.as_str()),
            _ => None,
        }
    }

    fn match_operator_of(&mut self, ops: &[&str]) -> Option<String> {
        let op = self.peek_operator()?;
        if ops.contains(&op) {
            let op = op.to_string();
            self.current += 1;
            Some(op)
        } else {
            None
        }
    }

    /// Skip `highp`/`mediump`/`lowp` when another identifier (the actual
    /// type name) follows.
    fn skip_precision_qualifier(&mut self) {
        if let Some(Token::Identifier(name)) = self.peek() {
            if PRECISION_QUALIFIERS.contains(&name.as_str())
                && matches!(self.peek_ahead(1), Some(Token::Identifier(_)))
            {
                self.current += 1;
            }
        }
    }

    // ---- external declarations --------------------------------------------

    fn parse_external_declaration(&mut self) -> Result<NodeId> {
        trace!("parse_external_declaration: next = {:?}", self.peek());
        match self.peek() {
            Some(Token::Precision) => self.parse_precision(),
            Some(Token::Struct) => self.parse_struct(),
            _ => self.parse_declaration_or_function(),
        }
    }

    fn parse_precision(&mut self) -> Result<NodeId> {
        self.expect(Token::Precision)?;
        let mut words = Vec::new();
        while !self.check(&Token::Semicolon) {
            match self.advance().cloned() {
                Some(Token::Identifier(word)) => words.push(word),
                other => bail_parse!("Unexpected token in precision declaration: {:?}", other),
            }
        }
        self.expect(Token::Semicolon)?;
        Ok(self.tree.add(Tag::Precision, Some(words.join(" "))))
    }

    fn parse_struct(&mut self) -> Result<NodeId> {
        self.expect(Token::Struct)?;
        let name = self.expect_identifier()?;
        let node = self.tree.add(Tag::StructDefinition, Some(name));
        self.expect(Token::LeftBrace)?;
        while !self.check(&Token::RightBrace) {
            let member = self.parse_field_declaration()?;
            self.tree.attach(node, member);
        }
        self.expect(Token::RightBrace)?;
        self.expect(Token::Semicolon)?;
        Ok(node)
    }

    fn parse_field_declaration(&mut self) -> Result<NodeId> {
        self.skip_precision_qualifier();
        let type_name = self.expect_identifier()?;
        let node = self.tree.add(Tag::FieldDeclaration, None);
        let type_node = self.tree.add(Tag::TypeSpecifier, Some(type_name));
        self.tree.attach(node, type_node);
        loop {
            let field = self.expect_identifier()?;
            let declarator = self.tree.add(Tag::Declarator, None);
            let ident = self.tree.add(Tag::Identifier, Some(field));
            self.tree.attach(declarator, ident);
            self.tree.attach(node, declarator);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::Semicolon)?;
        Ok(node)
    }

    fn parse_qualifier(&mut self) -> Option<String> {
        let qualifier = match self.peek() {
            Some(Token::Uniform) => "uniform",
            Some(Token::Attribute) => "attribute",
            Some(Token::Varying) => "varying",
            Some(Token::Const) => "const",
            _ => return None,
        };
        self.current += 1;
        Some(qualifier.to_string())
    }

    fn parse_declaration_or_function(&mut self) -> Result<NodeId> {
        let qualifier = self.parse_qualifier();
        self.skip_precision_qualifier();
        let type_name = self.expect_identifier()?;
        let name = self.expect_identifier()?;
        if self.check(&Token::LeftParen) {
            if qualifier.is_some() {
                bail_parse!("Storage qualifier on function '{}'", name);
            }
            self.parse_function(type_name, name)
        } else {
            self.parse_declaration_rest(qualifier, type_name, name)
        }
    }

    fn parse_function(&mut self, return_type: String, name: String) -> Result<NodeId> {
        trace!("parse_function: {} {}", return_type, name);
        let node = self.tree.add(Tag::FunctionDefinition, Some(return_type));
        let ident = self.tree.add(Tag::Identifier, Some(name));
        self.tree.attach(node, ident);

        let params = self.tree.add(Tag::ParameterList, None);
        self.tree.attach(node, params);
        self.expect(Token::LeftParen)?;
        if !self.check(&Token::RightParen) {
            // `f(void)` declares no parameters
            if self.check_identifier("void") && self.peek_ahead(1) == Some(&Token::RightParen) {
                self.current += 1;
            } else {
                loop {
                    let param = self.parse_parameter()?;
                    self.tree.attach(params, param);
                    if !self.match_token(&Token::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(Token::RightParen)?;

        let body = self.parse_block()?;
        self.tree.attach(node, body);
        Ok(node)
    }

    fn parse_parameter(&mut self) -> Result<NodeId> {
        if let Some(Token::Identifier(name)) = self.peek() {
            if PARAMETER_QUALIFIERS.contains(&name.as_str())
                && matches!(self.peek_ahead(1), Some(Token::Identifier(_)))
            {
                self.current += 1;
            }
        }
        self.skip_precision_qualifier();
        let type_name = self.expect_identifier()?;
        let name = self.expect_identifier()?;
        let param = self.tree.add(Tag::Parameter, Some(type_name));
        let ident = self.tree.add(Tag::Identifier, Some(name));
        self.tree.attach(param, ident);
        Ok(param)
    }

    fn parse_declaration_rest(
        &mut self,
        qualifier: Option<String>,
        type_name: String,
        first_name: String,
    ) -> Result<NodeId> {
        let node = self.tree.add(Tag::Declaration, qualifier);
        let type_node = self.tree.add(Tag::TypeSpecifier, Some(type_name));
        self.tree.attach(node, type_node);

        let mut name = first_name;
        loop {
            let declarator = self.tree.add(Tag::Declarator, None);
            let ident = self.tree.add(Tag::Identifier, Some(name.clone()));
            self.tree.attach(declarator, ident);
            if self.match_operator_of(&["="]).is_some() {
                let init = self.parse_assignment()?;
                self.tree.attach(declarator, init);
            }
            self.tree.attach(node, declarator);
            if !self.match_token(&Token::Comma) {
                break;
            }
            name = self.expect_identifier()?;
        }
        self.expect(Token::Semicolon)?;
        Ok(node)
    }

    // ---- statements -------------------------------------------------------

    fn parse_block(&mut self) -> Result<NodeId> {
        self.expect(Token::LeftBrace)?;
        let body = self.tree.add(Tag::Body, None);
        while !self.check(&Token::RightBrace) {
            let statement = self.parse_statement()?;
            self.tree.attach(body, statement);
        }
        self.expect(Token::RightBrace)?;
        Ok(body)
    }

    /// Branch bodies normalize to a Body node whether braced or a single
    /// statement.
    fn parse_branch_body(&mut self) -> Result<NodeId> {
        if self.check(&Token::LeftBrace) {
            self.parse_block()
        } else {
            let body = self.tree.add(Tag::Body, None);
            let statement = self.parse_statement()?;
            self.tree.attach(body, statement);
            Ok(body)
        }
    }

    fn parse_statement(&mut self) -> Result<NodeId> {
        trace!("parse_statement: next = {:?}", self.peek());
        match self.peek() {
            Some(Token::LeftBrace) => self.parse_block(),
            Some(Token::If) => self.parse_if(),
            Some(Token::For) => self.parse_for(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::Struct) => self.parse_struct(),
            Some(Token::Break) => {
                self.current += 1;
                self.expect(Token::Semicolon)?;
                Ok(self.tree.add(Tag::BreakStatement, None))
            }
            Some(Token::Continue) => {
                self.current += 1;
                self.expect(Token::Semicolon)?;
                Ok(self.tree.add(Tag::ContinueStatement, None))
            }
            Some(Token::Discard) => {
                self.current += 1;
                self.expect(Token::Semicolon)?;
                Ok(self.tree.add(Tag::DiscardStatement, None))
            }
            _ if self.starts_declaration() => self.parse_local_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    fn starts_declaration(&self) -> bool {
        match self.peek() {
            Some(Token::Uniform | Token::Attribute | Token::Varying | Token::Const) => true,
            Some(Token::Identifier(_)) => {
                matches!(self.peek_ahead(1), Some(Token::Identifier(_)))
            }
            _ => false,
        }
    }

    fn parse_local_declaration(&mut self) -> Result<NodeId> {
        let qualifier = self.parse_qualifier();
        self.skip_precision_qualifier();
        let type_name = self.expect_identifier()?;
        let name = self.expect_identifier()?;
        self.parse_declaration_rest(qualifier, type_name, name)
    }

    fn parse_expression_statement(&mut self) -> Result<NodeId> {
        let expr = self.parse_expression()?;
        self.expect(Token::Semicolon)?;
        let node = self.tree.add(Tag::ExpressionStatement, None);
        self.tree.attach(node, expr);
        Ok(node)
    }

    fn parse_if(&mut self) -> Result<NodeId> {
        self.expect(Token::If)?;
        self.expect(Token::LeftParen)?;
        let cond = self.parse_expression()?;
        self.expect(Token::RightParen)?;
        let node = self.tree.add(Tag::IfStatement, None);
        self.tree.attach(node, cond);
        let then_body = self.parse_branch_body()?;
        self.tree.attach(node, then_body);
        if self.match_token(&Token::Else) {
            let else_body = self.parse_branch_body()?;
            self.tree.attach(node, else_body);
        }
        Ok(node)
    }

    fn parse_for(&mut self) -> Result<NodeId> {
        self.expect(Token::For)?;
        self.expect(Token::LeftParen)?;
        let node = self.tree.add(Tag::ForStatement, None);

        let init = if self.match_token(&Token::Semicolon) {
            self.tree.add_untagged()
        } else if self.starts_declaration() {
            self.parse_local_declaration()?
        } else {
            self.parse_expression_statement()?
        };
        self.tree.attach(node, init);

        let cond = if self.check(&Token::Semicolon) {
            self.tree.add_untagged()
        } else {
            self.parse_expression()?
        };
        self.expect(Token::Semicolon)?;
        self.tree.attach(node, cond);

        let iter = if self.check(&Token::RightParen) {
            self.tree.add_untagged()
        } else {
            self.parse_expression()?
        };
        self.expect(Token::RightParen)?;
        self.tree.attach(node, iter);

        let body = self.parse_branch_body()?;
        self.tree.attach(node, body);
        Ok(node)
    }

    fn parse_while(&mut self) -> Result<NodeId> {
        self.expect(Token::While)?;
        self.expect(Token::LeftParen)?;
        let cond = self.parse_expression()?;
        self.expect(Token::RightParen)?;
        let node = self.tree.add(Tag::WhileStatement, None);
        self.tree.attach(node, cond);
        let body = self.parse_branch_body()?;
        self.tree.attach(node, body);
        Ok(node)
    }

    fn parse_return(&mut self) -> Result<NodeId> {
        self.expect(Token::Return)?;
        let node = self.tree.add(Tag::ReturnStatement, None);
        if !self.check(&Token::Semicolon) {
            let value = self.parse_expression()?;
            self.tree.attach(node, value);
        }
        self.expect(Token::Semicolon)?;
        Ok(node)
    }

    // ---- expressions ------------------------------------------------------

    fn parse_expression(&mut self) -> Result<NodeId> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<NodeId> {
        let left = self.parse_conditional()?;
        if let Some(op) = self.match_operator_of(ASSIGNMENT_OPS) {
            let right = self.parse_assignment()?;
            let node = self.tree.add(Tag::AssignmentExpr, Some(op));
            self.tree.attach(node, left);
            self.tree.attach(node, right);
            return Ok(node);
        }
        Ok(left)
    }

    fn parse_conditional(&mut self) -> Result<NodeId> {
        let cond = self.parse_binary(0)?;
        if self.match_token(&Token::Question) {
            let then = self.parse_assignment()?;
            self.expect(Token::Colon)?;
            let alt = self.parse_assignment()?;
            let node = self.tree.add(Tag::ConditionalExpr, None);
            self.tree.attach(node, cond);
            self.tree.attach(node, then);
            self.tree.attach(node, alt);
            return Ok(node);
        }
        Ok(cond)
    }

    fn parse_binary(&mut self, level: usize) -> Result<NodeId> {
        if level >= BINARY_LEVELS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.match_operator_of(BINARY_LEVELS[level]) {
            let right = self.parse_binary(level + 1)?;
            let node = self.tree.add(Tag::BinaryExpr, Some(op));
            self.tree.attach(node, left);
            self.tree.attach(node, right);
            left = node;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        if let Some(op) = self.match_operator_of(&["+", "-", "!", "~", "++", "--"]) {
            let operand = self.parse_unary()?;
            let node = self.tree.add(Tag::UnaryExpr, Some(op));
            self.tree.attach(node, operand);
            return Ok(node);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<NodeId> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_token(&Token::LeftParen) {
                let call = self.tree.add(Tag::CallExpr, None);
                self.tree.attach(call, expr);
                if !self.check(&Token::RightParen) {
                    loop {
                        let arg = self.parse_assignment()?;
                        self.tree.attach(call, arg);
                        if !self.match_token(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Token::RightParen)?;
                expr = call;
            } else if self.match_token(&Token::LeftBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RightBracket)?;
                let node = self.tree.add(Tag::IndexAccess, None);
                self.tree.attach(node, expr);
                self.tree.attach(node, index);
                expr = node;
            } else if self.match_token(&Token::Dot) {
                let property = self.expect_identifier()?;
                let node = self.tree.add(Tag::FieldSelection, Some(property));
                self.tree.attach(node, expr);
                expr = node;
            } else if let Some(op) = self.match_operator_of(&["++", "--"]) {
                let node = self.tree.add(Tag::PostfixExpr, Some(op));
                self.tree.attach(node, expr);
                expr = node;
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        match self.peek().cloned() {
            Some(Token::IntConstant(text)) => {
                self.current += 1;
                Ok(self.tree.add(Tag::IntConstant, Some(text)))
            }
            Some(Token::FloatConstant(text)) => {
                self.current += 1;
                Ok(self.tree.add(Tag::FloatConstant, Some(text)))
            }
            Some(Token::True) => {
                self.current += 1;
                Ok(self.tree.add(Tag::BoolConstant, Some("true".to_string())))
            }
            Some(Token::False) => {
                self.current += 1;
                Ok(self.tree.add(Tag::BoolConstant, Some("false".to_string())))
            }
            Some(Token::Identifier(name)) => {
                self.current += 1;
                Ok(self.tree.add(Tag::Identifier, Some(name)))
            }
            Some(Token::LeftParen) => {
                self.current += 1;
                let inner = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                let node = self.tree.add(Tag::Grouping, None);
                self.tree.attach(node, inner);
                Ok(node)
            }
            other => bail_parse!("Unexpected token in expression: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> SyntaxTree {
        let tokens = tokenize(source).expect("tokenize failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn only_child(tree: &SyntaxTree, id: NodeId) -> NodeId {
        assert_eq!(tree.children(id).len(), 1);
        tree.children(id)[0]
    }

    #[test]
    fn test_function_shape() {
        let tree = parse_source("float f(float x, vec2 v) { return x; }");
        let root = tree.root().unwrap();
        let func = only_child(&tree, root);
        assert_eq!(tree.tag(func), Some(Tag::FunctionDefinition));
        assert_eq!(tree.text(func), Some("float"));

        let children = tree.children(func);
        assert_eq!(tree.tag(children[0]), Some(Tag::Identifier));
        assert_eq!(tree.text(children[0]), Some("f"));
        assert_eq!(tree.tag(children[1]), Some(Tag::ParameterList));
        assert_eq!(tree.children(children[1]).len(), 2);
        assert_eq!(tree.tag(children[2]), Some(Tag::Body));
    }

    #[test]
    fn test_void_parameter_list_is_empty() {
        let tree = parse_source("void main(void) {}");
        let func = only_child(&tree, tree.root().unwrap());
        let params = tree.children(func)[1];
        assert!(tree.children(params).is_empty());
    }

    #[test]
    fn test_qualified_declaration_carries_the_qualifier() {
        let tree = parse_source("uniform mediump vec2 u_resolution;");
        let decl = only_child(&tree, tree.root().unwrap());
        assert_eq!(tree.tag(decl), Some(Tag::Declaration));
        assert_eq!(tree.text(decl), Some("uniform"));
        let type_node = tree.children(decl)[0];
        assert_eq!(tree.text(type_node), Some("vec2"));
    }

    #[test]
    fn test_multi_declarator_declaration() {
        let tree = parse_source("void f() { float a = 1.0, b; }");
        let func = only_child(&tree, tree.root().unwrap());
        let body = tree.children(func)[2];
        let decl = only_child(&tree, body);
        // type specifier + two declarators
        assert_eq!(tree.children(decl).len(), 3);
        let first = tree.children(decl)[1];
        assert_eq!(tree.children(first).len(), 2); // identifier + initializer
        let second = tree.children(decl)[2];
        assert_eq!(tree.children(second).len(), 1);
    }

    #[test]
    fn test_precedence_multiplication_binds_tighter() {
        let tree = parse_source("void f() { g = a + b * c; }");
        let func = only_child(&tree, tree.root().unwrap());
        let statement = only_child(&tree, tree.children(func)[2]);
        let assign = only_child(&tree, statement);
        assert_eq!(tree.tag(assign), Some(Tag::AssignmentExpr));
        let add = tree.children(assign)[1];
        assert_eq!(tree.tag(add), Some(Tag::BinaryExpr));
        assert_eq!(tree.text(add), Some("+"));
        let mul = tree.children(add)[1];
        assert_eq!(tree.text(mul), Some("*"));
    }

    #[test]
    fn test_postfix_chain_swizzle_of_call() {
        let tree = parse_source("void f() { g = h(v).xy; }");
        let func = only_child(&tree, tree.root().unwrap());
        let statement = only_child(&tree, tree.children(func)[2]);
        let assign = only_child(&tree, statement);
        let field = tree.children(assign)[1];
        assert_eq!(tree.tag(field), Some(Tag::FieldSelection));
        assert_eq!(tree.text(field), Some("xy"));
        let call = only_child(&tree, field);
        assert_eq!(tree.tag(call), Some(Tag::CallExpr));
    }

    #[test]
    fn test_struct_definition_shape() {
        let tree = parse_source("struct Light { float intensity; vec3 color; };");
        let st = only_child(&tree, tree.root().unwrap());
        assert_eq!(tree.tag(st), Some(Tag::StructDefinition));
        assert_eq!(tree.text(st), Some("Light"));
        assert_eq!(tree.children(st).len(), 2);
        for &member in tree.children(st) {
            assert_eq!(tree.tag(member), Some(Tag::FieldDeclaration));
        }
    }

    #[test]
    fn test_if_else_and_empty_else() {
        let tree = parse_source("void f() { if (a) { b = 1.0; } else { } }");
        let func = only_child(&tree, tree.root().unwrap());
        let if_node = only_child(&tree, tree.children(func)[2]);
        assert_eq!(tree.tag(if_node), Some(Tag::IfStatement));
        assert_eq!(tree.children(if_node).len(), 3);
        let else_body = tree.children(if_node)[2];
        assert!(tree.children(else_body).is_empty());
    }

    #[test]
    fn test_for_statement_with_declaration_init() {
        let tree = parse_source("void f() { for (int i = 0; i < 4; i++) { g += i; } }");
        let func = only_child(&tree, tree.root().unwrap());
        let for_node = only_child(&tree, tree.children(func)[2]);
        assert_eq!(tree.tag(for_node), Some(Tag::ForStatement));
        let children = tree.children(for_node);
        assert_eq!(tree.tag(children[0]), Some(Tag::Declaration));
        assert_eq!(tree.tag(children[1]), Some(Tag::BinaryExpr));
        assert_eq!(tree.tag(children[2]), Some(Tag::PostfixExpr));
        assert_eq!(tree.tag(children[3]), Some(Tag::Body));
    }

    #[test]
    fn test_for_with_empty_slots_uses_untagged_nodes() {
        let tree = parse_source("void f() { for (;;) { break; } }");
        let func = only_child(&tree, tree.root().unwrap());
        let for_node = only_child(&tree, tree.children(func)[2]);
        let children = tree.children(for_node);
        assert_eq!(tree.tag(children[0]), None);
        assert_eq!(tree.tag(children[1]), None);
        assert_eq!(tree.tag(children[2]), None);
    }

    #[test]
    fn test_parent_links_are_set() {
        let tree = parse_source("void f() { return; }");
        let root = tree.root().unwrap();
        let func = only_child(&tree, root);
        assert_eq!(tree.node(func).parent, Some(root));
    }

    #[test]
    fn test_parse_error_on_garbage() {
        let tokens = tokenize("float f(").unwrap();
        assert!(Parser::new(tokens).parse().is_err());
    }
}
