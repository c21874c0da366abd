// crates/formation-core/src/core/node.rs
// ============================================================================
// Module: Formation Node Declarations
// Description: Immutable declarations for fields, field lists, and forms.
// Purpose: Describe the dependency-graph nodes the engine validates.
// Dependencies: crate::core::{identifiers, record}, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! A node declaration is immutable structure: identifier, display name,
//! dependency set, optional ignore predicate, optional validator, optional
//! auxiliary fetcher, and a kind-specific payload. The kind is a tagged union
//! over `Field`, `List`, and `Form`; behavior differences are matched on the
//! kind rather than dispatched dynamically. Mutable per-node bookkeeping
//! (revision, in-flight flags) lives in the record store, never here.
//! Invariants:
//! - Field and list values live in the record at the declared path.
//! - A form's effective dependency set is its declared extras plus children.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::ColumnId;
use crate::core::identifiers::NodeId;
use crate::core::record::Record;
use crate::core::record::RecordPath;
use crate::interfaces::AuxFetcher;
use crate::interfaces::CellRule;
use crate::interfaces::IgnorePredicate;
use crate::interfaces::Validator;

// ============================================================================
// SECTION: Kind Payloads
// ============================================================================

/// Declaration payload for a scalar field.
///
/// # Invariants
/// - `path` addresses the field's value slot in the record.
#[derive(Clone)]
pub struct FieldSpec {
    /// Default value written into fresh records.
    pub default: Value,
    /// Record path of the value slot.
    pub path: RecordPath,
}

/// Per-column declaration within a field list.
#[derive(Clone)]
pub struct ColumnSpec {
    /// Default cell value for new rows.
    default: Value,
    /// Optional synchronous rule applied to every row's cell.
    rule: Option<Arc<dyn CellRule>>,
}

impl ColumnSpec {
    /// Creates a column with the given default cell value.
    #[must_use]
    pub const fn new(default: Value) -> Self {
        Self {
            default,
            rule: None,
        }
    }

    /// Attaches a synchronous cell rule to the column.
    #[must_use]
    pub fn with_rule(mut self, rule: impl CellRule + 'static) -> Self {
        self.rule = Some(Arc::new(rule));
        self
    }

    /// Returns the default cell value.
    #[must_use]
    pub const fn default_value(&self) -> &Value {
        &self.default
    }

    /// Returns the cell rule, if declared.
    #[must_use]
    pub fn rule(&self) -> Option<&Arc<dyn CellRule>> {
        self.rule.as_ref()
    }
}

/// Declaration payload for a field list.
///
/// # Invariants
/// - `path` addresses the row array in the record.
/// - The list default is a single row of column defaults.
#[derive(Clone)]
pub struct ListSpec {
    /// Column declarations keyed by column identifier.
    columns: BTreeMap<ColumnId, ColumnSpec>,
    /// Record path of the row array.
    path: RecordPath,
}

impl ListSpec {
    /// Returns the column declarations.
    #[must_use]
    pub const fn columns(&self) -> &BTreeMap<ColumnId, ColumnSpec> {
        &self.columns
    }

    /// Builds one row of column defaults.
    #[must_use]
    pub fn default_row(&self) -> Value {
        let mut row = Map::new();
        for (column, spec) in &self.columns {
            row.insert(column.as_str().to_string(), spec.default_value().clone());
        }
        Value::Object(row)
    }

    /// Builds the list default: a single row of column defaults.
    #[must_use]
    pub fn default_value(&self) -> Value {
        Value::Array(vec![self.default_row()])
    }
}

/// Declaration payload for a form.
///
/// # Invariants
/// - `children` keeps declaration order; order has no semantic meaning
///   beyond iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSpec {
    /// Direct child node identifiers in declaration order.
    pub children: Vec<NodeId>,
}

/// Kind-specific declaration payload.
#[derive(Clone)]
pub enum NodeKind {
    /// Scalar field holding one configuration value.
    Field(FieldSpec),
    /// Field whose value is an ordered list of homogeneous rows.
    List(ListSpec),
    /// Composite node aggregating child nodes.
    Form(FormSpec),
}

// ============================================================================
// SECTION: Node Declaration
// ============================================================================

/// Immutable node declaration participating in the dependency graph.
///
/// # Invariants
/// - `name` defaults to the identifier and is the key under which a form
///   projects this node's data.
/// - `dependencies` holds only explicitly declared extras; form children are
///   added by the registry when computing effective dependencies.
#[derive(Clone)]
pub struct NodeSpec {
    /// Node identifier.
    id: NodeId,
    /// Display and grouping key.
    name: String,
    /// Explicitly declared dependency identifiers.
    dependencies: BTreeSet<NodeId>,
    /// Optional predicate that suspends validation for matching records.
    ignore_when: Option<IgnorePredicate>,
    /// Optional validator.
    validator: Option<Arc<dyn Validator>>,
    /// Optional auxiliary data fetcher.
    aux_fetcher: Option<Arc<dyn AuxFetcher>>,
    /// Kind-specific payload.
    kind: NodeKind,
}

impl NodeSpec {
    /// Creates a declaration with the given identifier and kind.
    fn with_kind(id: NodeId, kind: NodeKind) -> Self {
        let name = id.as_str().to_string();
        Self {
            id,
            name,
            dependencies: BTreeSet::new(),
            ignore_when: None,
            validator: None,
            aux_fetcher: None,
            kind,
        }
    }

    /// Declares a scalar field whose value lives at its identifier.
    #[must_use]
    pub fn field(id: impl Into<NodeId>, default: Value) -> Self {
        let id = id.into();
        let path = RecordPath::from_id(&id);
        Self::with_kind(id, NodeKind::Field(FieldSpec { default, path }))
    }

    /// Declares a scalar field whose value lives at an explicit path.
    #[must_use]
    pub fn field_at(id: impl Into<NodeId>, path: RecordPath, default: Value) -> Self {
        Self::with_kind(id.into(), NodeKind::Field(FieldSpec { default, path }))
    }

    /// Declares a field list whose rows live at its identifier.
    #[must_use]
    pub fn list(
        id: impl Into<NodeId>,
        columns: impl IntoIterator<Item = (ColumnId, ColumnSpec)>,
    ) -> Self {
        let id = id.into();
        let path = RecordPath::from_id(&id);
        Self::with_kind(
            id,
            NodeKind::List(ListSpec {
                columns: columns.into_iter().collect(),
                path,
            }),
        )
    }

    /// Declares a form aggregating the given children.
    #[must_use]
    pub fn form(id: impl Into<NodeId>, children: impl IntoIterator<Item = NodeId>) -> Self {
        Self::with_kind(
            id.into(),
            NodeKind::Form(FormSpec {
                children: children.into_iter().collect(),
            }),
        )
    }

    /// Overrides the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares an extra dependency.
    #[must_use]
    pub fn with_dependency(mut self, id: impl Into<NodeId>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// Declares extra dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.dependencies.extend(ids);
        self
    }

    /// Attaches a validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Attaches an ignore predicate.
    #[must_use]
    pub fn with_ignore_when(
        mut self,
        predicate: impl Fn(&Record) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.ignore_when = Some(Arc::new(predicate));
        self
    }

    /// Attaches an auxiliary data fetcher.
    #[must_use]
    pub fn with_aux_fetcher(mut self, fetcher: impl AuxFetcher + 'static) -> Self {
        self.aux_fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Returns the node identifier.
    #[must_use]
    pub const fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the explicitly declared dependencies.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<NodeId> {
        &self.dependencies
    }

    /// Returns the kind payload.
    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the validator, if declared.
    #[must_use]
    pub fn validator(&self) -> Option<&Arc<dyn Validator>> {
        self.validator.as_ref()
    }

    /// Returns the auxiliary fetcher, if declared.
    #[must_use]
    pub fn aux_fetcher(&self) -> Option<&Arc<dyn AuxFetcher>> {
        self.aux_fetcher.as_ref()
    }

    /// Evaluates the ignore predicate against the current record.
    #[must_use]
    pub fn is_ignored(&self, record: &Record) -> bool {
        self.ignore_when
            .as_ref()
            .is_some_and(|predicate| predicate(record))
    }

    /// Returns the record path of the value slot, if the kind has one.
    #[must_use]
    pub const fn value_path(&self) -> Option<&RecordPath> {
        match &self.kind {
            NodeKind::Field(field) => Some(&field.path),
            NodeKind::List(list) => Some(&list.path),
            NodeKind::Form(_) => None,
        }
    }

    /// Returns the default value written into fresh records, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Field(field) => Some(field.default.clone()),
            NodeKind::List(list) => Some(list.default_value()),
            NodeKind::Form(_) => None,
        }
    }

    /// Returns the direct children for forms, or an empty slice.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Form(form) => &form.children,
            NodeKind::Field(_) | NodeKind::List(_) => &[],
        }
    }
}
