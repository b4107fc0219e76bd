//! Arena-backed syntax tree shared between the parser and the transform engine.
//!
//! Nodes carry a kind tag, an optional literal payload, ordered children, and
//! a back-reference to their parent. Every node gets a stable integer id at
//! construction time so the descriptor cache can key on node identity rather
//! than structural equality.

/// Unique identifier for syntax nodes within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of syntax node kinds produced by the parser.
///
/// A node may still lack a tag (`SyntaxNode::tag == None`) when it was
/// structurally derived from another node rather than parsed; the transform
/// engine treats such nodes as producing an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Root,
    Precision,
    StructDefinition,
    FieldDeclaration,
    FunctionDefinition,
    ParameterList,
    Parameter,
    Body,
    Declaration,
    TypeSpecifier,
    Declarator,
    Identifier,
    IntConstant,
    FloatConstant,
    BoolConstant,
    BinaryExpr,
    AssignmentExpr,
    UnaryExpr,
    PostfixExpr,
    ConditionalExpr,
    CallExpr,
    FieldSelection,
    IndexAccess,
    Grouping,
    ExpressionStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    DiscardStatement,
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub tag: Option<Tag>,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Arena of syntax nodes with a designated root.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        SyntaxTree {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Create a detached node with a kind tag and optional payload.
    pub fn add(&mut self, tag: Tag, text: Option<String>) -> NodeId {
        self.push(SyntaxNode {
            tag: Some(tag),
            text,
            children: Vec::new(),
            parent: None,
        })
    }

    /// Create a node without an own kind tag (structurally derived nodes).
    pub fn add_untagged(&mut self) -> NodeId {
        self.push(SyntaxNode {
            tag: None,
            text: None,
            children: Vec::new(),
            parent: None,
        })
    }

    fn push(&mut self, node: SyntaxNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append `child` to `parent`'s ordered child list and link it back.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        self.nodes[id.index()].tag
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].text.as_deref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.nodes[id.index()].children.get(n).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_sequential() {
        let mut tree = SyntaxTree::new();
        let a = tree.add(Tag::Root, None);
        let b = tree.add(Tag::Identifier, Some("x".to_string()));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(tree.text(b), Some("x"));
    }

    #[test]
    fn test_attach_links_parent_and_child() {
        let mut tree = SyntaxTree::new();
        let root = tree.add(Tag::Root, None);
        let child = tree.add(Tag::Identifier, Some("y".to_string()));
        tree.attach(root, child);

        assert_eq!(tree.children(root), &[child]);
        assert_eq!(tree.node(child).parent, Some(root));
    }

    #[test]
    fn test_untagged_node_has_no_kind() {
        let mut tree = SyntaxTree::new();
        let id = tree.add_untagged();
        assert_eq!(tree.tag(id), None);
    }
}
