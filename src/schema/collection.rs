/// What to do with a record whose relation target was not cloned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTarget {
    /// Keep the record, store an empty reference.
    Clear,
    /// Do not create the record at all.
    SkipRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// `id`, `created`, `updated`: never copied.
    System,
    Plain,
    /// Foreign key into another collection.
    Relation {
        target: &'static str,
        on_missing: MissingTarget,
    },
    /// Tie to the root record. Always points at the new root.
    Root { target: &'static str },
    /// Self-referential parent within the same collection.
    Parent,
    /// Opaque JSON payload (`config` on field definitions, `value` on entries).
    Payload,
    /// Upload file name; the bytes travel as a blob.
    File,
    /// Cached rendering output, cleared on clone and omitted from exports.
    Artifact,
    /// Tenant-specific value supplied by the clone request.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub role: FieldRole,
}

impl FieldDef {
    pub const fn system(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::System,
        }
    }

    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Plain,
        }
    }

    pub const fn relation(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Relation {
                target,
                on_missing: MissingTarget::Clear,
            },
        }
    }

    pub const fn required(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Relation {
                target,
                on_missing: MissingTarget::SkipRecord,
            },
        }
    }

    pub const fn root(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Root { target },
        }
    }

    pub const fn parent() -> Self {
        Self {
            name: "parent",
            role: FieldRole::Parent,
        }
    }

    pub const fn payload(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Payload,
        }
    }

    pub const fn file(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::File,
        }
    }

    pub const fn artifact(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Artifact,
        }
    }

    pub const fn override_field(name: &'static str) -> Self {
        Self {
            name,
            role: FieldRole::Override,
        }
    }

    /// Whether the value is carried over verbatim from the source record.
    pub fn is_copied(&self) -> bool {
        matches!(self.role, FieldRole::Plain | FieldRole::Payload)
    }
}

/// How the payload of a collection is interpreted by the reference patcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Field definition: `config` keyed by the record's own `type`.
    Config,
    /// Entry: `value` keyed by the `type` of the field definition it points to.
    Value { field_collection: &'static str },
}

/// Static description of one collection.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDef],
    /// Relation that ties a record to its site when loading a live site.
    pub owner: Option<&'static str>,
    pub payload: Option<PayloadKind>,
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn parent_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Parent)
            .map(|f| f.name)
    }

    pub fn is_hierarchical(&self) -> bool {
        self.parent_field().is_some()
    }

    /// Cross-collection relations as `(field, target, policy)`.
    pub fn relations(&self) -> impl Iterator<Item = (&'static str, &'static str, MissingTarget)> + '_ {
        self.fields.iter().filter_map(|f| match f.role {
            FieldRole::Relation { target, on_missing } => Some((f.name, target, on_missing)),
            _ => None,
        })
    }

    pub fn payload_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Payload)
            .map(|f| f.name)
    }

    pub fn file_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::File)
            .map(|f| f.name)
    }

    pub fn artifact_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Artifact)
            .map(|f| f.name)
    }

    /// Target collection of the owner field, if any.
    pub fn owner_target(&self) -> Option<&'static str> {
        let owner = self.field(self.owner?)?;
        match owner.role {
            FieldRole::Root { target } | FieldRole::Relation { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Collections that must be fully mapped before this one is built.
    pub fn dependencies(&self) -> impl Iterator<Item = &'static str> + '_ {
        let own = self.name;
        self.fields
            .iter()
            .filter_map(|f| match f.role {
                FieldRole::Root { target } | FieldRole::Relation { target, .. } => Some(target),
                _ => None,
            })
            .filter(move |target| *target != own)
    }
}
