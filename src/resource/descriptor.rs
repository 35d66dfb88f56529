//! Resource and relation descriptors supplied by the ORM layer

use convert_case::{Case, Casing};

/// Key used by a hasOne relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HasOneKey {
    /// This entity holds the related entity's id
    Local(String),
    /// The related entity holds this entity's id (requires an index)
    Foreign(String),
}

/// Relation kind with its key field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// This entity holds the related entity's id in `local_key`
    BelongsTo { local_key: String },
    /// Related entities reference this entity's id in `foreign_key`
    HasMany { foreign_key: String },
    /// Single related entity, keyed either way
    HasOne(HasOneKey),
}

impl RelationKind {
    /// Returns the relation type name as used by ORM definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::BelongsTo { .. } => "belongsTo",
            RelationKind::HasMany { .. } => "hasMany",
            RelationKind::HasOne(_) => "hasOne",
        }
    }

    /// Foreign key on the related table, if the relation is resolved through one
    pub fn foreign_key(&self) -> Option<&str> {
        match self {
            RelationKind::HasMany { foreign_key }
            | RelationKind::HasOne(HasOneKey::Foreign(foreign_key)) => Some(foreign_key),
            _ => None,
        }
    }

    /// Local key on this entity, if the relation is resolved through one
    pub fn local_key(&self) -> Option<&str> {
        match self {
            RelationKind::BelongsTo { local_key }
            | RelationKind::HasOne(HasOneKey::Local(local_key)) => Some(local_key),
            _ => None,
        }
    }
}

/// One association of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Name of the related resource
    pub related: String,
    /// Field the merged data is attached under
    pub local_field: String,
    /// Relation kind and key
    pub kind: RelationKind,
}

impl RelationDescriptor {
    pub fn belongs_to(
        related: impl Into<String>,
        local_field: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            related: related.into(),
            local_field: local_field.into(),
            kind: RelationKind::BelongsTo {
                local_key: local_key.into(),
            },
        }
    }

    pub fn has_many(
        related: impl Into<String>,
        local_field: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            related: related.into(),
            local_field: local_field.into(),
            kind: RelationKind::HasMany {
                foreign_key: foreign_key.into(),
            },
        }
    }

    pub fn has_one_by_local_key(
        related: impl Into<String>,
        local_field: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            related: related.into(),
            local_field: local_field.into(),
            kind: RelationKind::HasOne(HasOneKey::Local(local_key.into())),
        }
    }

    pub fn has_one_by_foreign_key(
        related: impl Into<String>,
        local_field: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            related: related.into(),
            local_field: local_field.into(),
            kind: RelationKind::HasOne(HasOneKey::Foreign(foreign_key.into())),
        }
    }

    /// Returns true if a `with` entry names this relation, either by the
    /// related resource name or by the local field.
    pub fn is_named(&self, name: &str) -> bool {
        self.related == name || self.local_field == name
    }
}

/// Resource definition: name, table, relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    pub table: String,
    pub relations: Vec<RelationDescriptor>,
}

impl ResourceDescriptor {
    /// Creates a descriptor whose table is the snake_case form of `name`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = name.to_case(Case::Snake);
        Self {
            name,
            table,
            relations: Vec::new(),
        }
    }

    /// Overrides the table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Appends a relation
    pub fn with_relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Relations requested by a `with` list, in declaration order
    pub fn requested_relations<'a>(
        &'a self,
        with: &'a [String],
    ) -> impl Iterator<Item = &'a RelationDescriptor> + 'a {
        self.relations
            .iter()
            .filter(move |rel| with.iter().any(|name| rel.is_named(name)))
    }
}
