//! Field-sensitive error tree for one aggregate object
//!
//! Nodes live in an arena and refer to each other by index: a parent owns
//! its children through `fields`, a child refers back to its parent through
//! the non-owning `parent` index. Array dimensions are not represented; every
//! element of an array shares the node of its element type.

use crate::shared::ir::{InputInfo, Module, StructTypeId, Type, ValueInfo};
use crate::shared::models::{AffineForm, RangeError};

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One step of an access path, in root-to-leaf order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIndex {
    Const(u64),
    /// Non-constant index; only acceptable for array dimensions
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructNodeKind {
    Aggregate {
        ty: StructTypeId,
        fields: Vec<Option<NodeId>>,
    },
    Leaf(RangeError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructNode {
    pub parent: Option<NodeId>,
    pub kind: StructNodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructErrorTree {
    nodes: Vec<StructNode>,
}

impl StructErrorTree {
    /// Empty tree for an object of struct type `ty`
    pub fn new(module: &Module, ty: StructTypeId) -> Self {
        let width = module.struct_type(ty).map_or(0, |s| s.fields.len());
        Self {
            nodes: vec![StructNode {
                parent: None,
                kind: StructNodeKind::Aggregate {
                    ty,
                    fields: vec![None; width],
                },
            }],
        }
    }

    /// Tree pre-populated from a per-field annotation
    pub fn from_info(module: &Module, ty: StructTypeId, fields: &[Option<ValueInfo>]) -> Self {
        let mut tree = Self::new(module, ty);
        tree.seed_node(module, NodeId(0), fields);
        tree
    }

    fn seed_node(&mut self, module: &Module, node: NodeId, infos: &[Option<ValueInfo>]) {
        let Some(st) = self.struct_of(node).and_then(|ty| module.struct_type(ty)) else {
            return;
        };
        for (idx, info) in infos.iter().enumerate() {
            let (Some(info), Some(field_ty)) = (info, st.fields.get(idx)) else {
                continue;
            };
            let elem = strip_arrays(field_ty);
            match (info, elem) {
                (ValueInfo::Scalar(scalar), _) => {
                    self.push_child(node, idx, StructNodeKind::Leaf(leaf_from_info(scalar)));
                }
                (ValueInfo::Struct(nested), Type::Struct(sid)) => {
                    let width = module.struct_type(*sid).map_or(0, |s| s.fields.len());
                    let kind = StructNodeKind::Aggregate {
                        ty: *sid,
                        fields: vec![None; width],
                    };
                    if let Some(child) = self.push_child(node, idx, kind) {
                        self.seed_node(module, child, nested);
                    }
                }
                (ValueInfo::Struct(_), _) => {}
            }
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&StructNode> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn struct_of(&self, id: NodeId) -> Option<StructTypeId> {
        match &self.node(id)?.kind {
            StructNodeKind::Aggregate { ty, .. } => Some(*ty),
            StructNodeKind::Leaf(_) => None,
        }
    }

    fn push_child(&mut self, parent: NodeId, field: usize, kind: StructNodeKind) -> Option<NodeId> {
        let id = NodeId(self.nodes.len() as u32);
        match &mut self.nodes.get_mut(parent.index())?.kind {
            StructNodeKind::Aggregate { fields, .. } => {
                *fields.get_mut(field)? = Some(id);
            }
            StructNodeKind::Leaf(_) => return None,
        }
        self.nodes.push(StructNode {
            parent: Some(parent),
            kind,
        });
        Some(id)
    }

    /// Walk `path` from the root, creating missing nodes.
    ///
    /// Returns the leaf reached, or `None` when the path stops at an
    /// aggregate, selects a field with a non-constant index, or is out of
    /// bounds.
    fn locate_or_create(&mut self, module: &Module, path: &[PathIndex]) -> Option<NodeId> {
        let mut node = self.root();
        let mut steps = path.iter();
        loop {
            let (ty, existing) = match &self.node(node)?.kind {
                StructNodeKind::Leaf(_) => return Some(node),
                StructNodeKind::Aggregate { ty, fields } => {
                    let field = match steps.next()? {
                        PathIndex::Const(i) => *i as usize,
                        PathIndex::Dynamic => return None,
                    };
                    (*ty, (field, fields.get(field).copied()?))
                }
            };
            let (field, child) = existing;

            let field_ty = module.struct_type(ty)?.fields.get(field)?;
            let mut elem = field_ty;
            while let Type::Array(inner, _) = elem {
                // Array dimensions are discarded
                steps.next();
                elem = inner;
            }

            node = match child {
                Some(c) => c,
                None => {
                    let kind = match elem {
                        Type::Struct(sid) => StructNodeKind::Aggregate {
                            ty: *sid,
                            fields: vec![None; module.struct_type(*sid).map_or(0, |s| s.fields.len())],
                        },
                        _ => StructNodeKind::Leaf(RangeError::default()),
                    };
                    self.push_child(node, field, kind)?
                }
            };
        }
    }

    /// Write the leaf at `path`, building intermediate nodes as needed
    pub fn set(&mut self, module: &Module, path: &[PathIndex], value: RangeError) -> bool {
        match self.locate_or_create(module, path) {
            Some(leaf) => match &mut self.nodes[leaf.index()].kind {
                StructNodeKind::Leaf(slot) => {
                    *slot = value;
                    true
                }
                StructNodeKind::Aggregate { .. } => false,
            },
            None => false,
        }
    }

    /// Read the leaf at `path`
    pub fn get(&self, module: &Module, path: &[PathIndex]) -> Option<&RangeError> {
        let leaf = self.find(module, path)?;
        match &self.node(leaf)?.kind {
            StructNodeKind::Leaf(re) => Some(re),
            StructNodeKind::Aggregate { .. } => None,
        }
    }

    fn find(&self, module: &Module, path: &[PathIndex]) -> Option<NodeId> {
        let mut node = self.root();
        let mut steps = path.iter();
        loop {
            match &self.node(node)?.kind {
                StructNodeKind::Leaf(_) => return Some(node),
                StructNodeKind::Aggregate { ty, fields } => {
                    let field = match steps.next()? {
                        PathIndex::Const(i) => *i as usize,
                        PathIndex::Dynamic => return None,
                    };
                    let mut elem = module.struct_type(*ty)?.fields.get(field)?;
                    while let Type::Array(inner, _) = elem {
                        steps.next();
                        elem = inner;
                    }
                    node = (*fields.get(field)?)?;
                }
            }
        }
    }

    /// Set every recorded leaf error to zero, keeping ranges
    pub fn zero_errors(&mut self) {
        for node in &mut self.nodes {
            if let StructNodeKind::Leaf(re) = &mut node.kind {
                if re.error.is_some() {
                    re.error = Some(AffineForm::zero());
                }
            }
        }
    }

    /// Every leaf with its error data, in arena order
    pub fn leaves(&self) -> impl Iterator<Item = &RangeError> + '_ {
        self.nodes.iter().filter_map(|n| match &n.kind {
            StructNodeKind::Leaf(re) => Some(re),
            StructNodeKind::Aggregate { .. } => None,
        })
    }
}

fn strip_arrays(ty: &Type) -> &Type {
    let mut ty = ty;
    while let Type::Array(inner, _) = ty {
        ty = inner;
    }
    ty
}

fn leaf_from_info(info: &InputInfo) -> RangeError {
    let range = info.interval().unwrap_or_default();
    let error = info
        .initial_error
        .map(|e| AffineForm::with_error(0.0, e));
    RangeError::new(range, error)
}
