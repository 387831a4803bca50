//! The parse-tree interface between the external parser and the analysers.
//!
//! The real grammar parsers live outside this crate; all the analysers need
//! is a tree of statement-like nodes with parent links, so that is all this
//! type provides. Nodes are arena-allocated and appear in document order.

use serde::{Deserialize, Serialize};

/// Index of a node within its [`ParseTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The statement-like node kinds the analysers care about.
///
/// A parser is free to flatten everything else; the analysers only look at
/// these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic tree root.
    Root,
    /// `MODULE name`
    Module { name: String },
    /// `PROGRAM name`
    Program { name: String },
    /// `SUBROUTINE name`
    Subroutine { name: String },
    /// `FUNCTION name`
    Function { name: String },
    /// `USE module`. `openmp_sentinel` marks a use behind a `!$` sentinel,
    /// which only takes effect when the build enables OpenMP.
    Use {
        module: String,
        openmp_sentinel: bool,
    },
    /// A call or named external reference.
    Call { name: String },
    /// A `BIND(C)` variable declaration: defines a symbol visible to C.
    BindDecl { name: String },
    /// A C `#include` directive.
    Include { path: String, system: bool },
    /// A source comment, retained for the legacy `DEPENDS ON:` convention.
    Comment { text: String },
}

impl NodeKind {
    /// Is this node a program unit (a scope that can own procedures)?
    #[must_use]
    pub fn is_program_unit(&self) -> bool {
        matches!(
            self,
            Self::Module { .. } | Self::Program { .. } | Self::Subroutine { .. } | Self::Function { .. }
        )
    }

    /// Is this node a procedure definition?
    #[must_use]
    pub fn is_procedure(&self) -> bool {
        matches!(self, Self::Subroutine { .. } | Self::Function { .. })
    }

    /// The defined or referenced name, if this kind carries one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Module { name }
            | Self::Program { name }
            | Self::Subroutine { name }
            | Self::Function { name }
            | Self::Call { name }
            | Self::BindDecl { name } => Some(name),
            Self::Use { module, .. } => Some(module),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed source file, as produced by a [`crate::SourceParser`].
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    /// An empty tree containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The synthetic root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a node under `parent`, returning its id.
    ///
    /// # Panics
    /// Panics if `parent` is not a node of this tree.
    pub fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// The kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    /// The parent of a node, `None` for the root.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// All node ids in document order, root included.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// Walk parent links from `node` (exclusive) towards the root, returning
    /// the nearest ancestor whose kind satisfies `matches`, or `None` if the
    /// root is reached first.
    pub fn find_ancestor(
        &self,
        node: NodeId,
        matches: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if matches(self.kind(id)) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// All ancestors of `node` (exclusive), nearest first. Used to test
    /// whether a call site lies inside a given scope.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), |id| self.parent(*id))
    }

    /// A file with no compilable content: nothing but the root and comments.
    #[must_use]
    pub fn is_empty_source(&self) -> bool {
        self.nodes
            .iter()
            .all(|n| matches!(n.kind, NodeKind::Root | NodeKind::Comment { .. }))
    }
}
