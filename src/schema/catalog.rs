//! Static schema table for every collection that takes part in a site clone.
//!
//! The table replaces runtime reflection over collection metadata: it names the
//! copied fields, the self-parent field, the typed relation targets and the
//! cached artifacts of each collection, and it fixes the build order.

use super::collection::{CollectionSchema, FieldDef, PayloadKind};
use crate::core::{CloneError, Result};
use crate::storage::RecordStore;
use std::collections::HashMap;

pub const SITE_GROUPS: &str = "site_groups";
pub const SITES: &str = "sites";
pub const SITE_UPLOADS: &str = "site_uploads";
pub const SITE_SYMBOLS: &str = "site_symbols";
pub const PAGE_TYPES: &str = "page_types";
pub const SITE_FIELDS: &str = "site_fields";
pub const SITE_SYMBOL_FIELDS: &str = "site_symbol_fields";
pub const PAGE_TYPE_FIELDS: &str = "page_type_fields";
pub const SITE_ENTRIES: &str = "site_entries";
pub const SITE_SYMBOL_ENTRIES: &str = "site_symbol_entries";
pub const PAGE_TYPE_ENTRIES: &str = "page_type_entries";
pub const PAGE_TYPE_SYMBOLS: &str = "page_type_symbols";
pub const PAGE_TYPE_SECTIONS: &str = "page_type_sections";
pub const PAGE_TYPE_SECTION_ENTRIES: &str = "page_type_section_entries";
pub const PAGES: &str = "pages";
pub const PAGE_ENTRIES: &str = "page_entries";
pub const PAGE_SECTIONS: &str = "page_sections";
pub const PAGE_SECTION_ENTRIES: &str = "page_section_entries";

const SYSTEM_TIMESTAMPS: [FieldDef; 2] = [FieldDef::system("created"), FieldDef::system("updated")];

pub const SITE_GROUPS_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_GROUPS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("name"),
        FieldDef::plain("index"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: None,
    payload: None,
};

pub const SITES_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::override_field("name"),
        FieldDef::plain("description"),
        FieldDef::override_field("host"),
        FieldDef::override_field("group"),
        FieldDef::plain("head"),
        FieldDef::plain("foot"),
        FieldDef::artifact("preview"),
        FieldDef::plain("index"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: None,
    payload: None,
};

pub const SITE_UPLOADS_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_UPLOADS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::root("site", SITES),
        FieldDef::file("file"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("site"),
    payload: None,
};

pub const SITE_SYMBOLS_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_SYMBOLS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("name"),
        FieldDef::plain("js"),
        FieldDef::plain("css"),
        FieldDef::plain("html"),
        FieldDef::root("site", SITES),
        FieldDef::artifact("compiled_js"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("site"),
    payload: None,
};

pub const PAGE_TYPES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("name"),
        FieldDef::plain("head"),
        FieldDef::plain("foot"),
        FieldDef::plain("color"),
        FieldDef::plain("icon"),
        FieldDef::root("site", SITES),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("site"),
    payload: None,
};

pub const SITE_FIELDS_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_FIELDS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("key"),
        FieldDef::plain("label"),
        FieldDef::plain("type"),
        FieldDef::root("site", SITES),
        FieldDef::payload("config"),
        FieldDef::parent(),
        FieldDef::plain("index"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("site"),
    payload: Some(PayloadKind::Config),
};

pub const SITE_SYMBOL_FIELDS_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_SYMBOL_FIELDS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("key"),
        FieldDef::plain("label"),
        FieldDef::plain("type"),
        FieldDef::relation("symbol", SITE_SYMBOLS),
        FieldDef::payload("config"),
        FieldDef::plain("index"),
        FieldDef::parent(),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("symbol"),
    payload: Some(PayloadKind::Config),
};

pub const PAGE_TYPE_FIELDS_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPE_FIELDS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("key"),
        FieldDef::plain("label"),
        FieldDef::plain("type"),
        FieldDef::relation("page_type", PAGE_TYPES),
        FieldDef::parent(),
        FieldDef::payload("config"),
        FieldDef::plain("index"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("page_type"),
    payload: Some(PayloadKind::Config),
};

const fn entry_fields_for(field_collection: &'static str) -> [FieldDef; 8] {
    [
        FieldDef::system("id"),
        FieldDef::plain("locale"),
        FieldDef::relation("field", field_collection),
        FieldDef::parent(),
        FieldDef::plain("index"),
        FieldDef::payload("value"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ]
}

const SITE_ENTRY_FIELDS: [FieldDef; 8] = entry_fields_for(SITE_FIELDS);
const SITE_SYMBOL_ENTRY_FIELDS: [FieldDef; 8] = entry_fields_for(SITE_SYMBOL_FIELDS);
const PAGE_TYPE_ENTRY_FIELDS: [FieldDef; 8] = entry_fields_for(PAGE_TYPE_FIELDS);

pub const SITE_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_ENTRIES,
    fields: &SITE_ENTRY_FIELDS,
    owner: Some("field"),
    payload: Some(PayloadKind::Value {
        field_collection: SITE_FIELDS,
    }),
};

pub const SITE_SYMBOL_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: SITE_SYMBOL_ENTRIES,
    fields: &SITE_SYMBOL_ENTRY_FIELDS,
    owner: Some("field"),
    payload: Some(PayloadKind::Value {
        field_collection: SITE_SYMBOL_FIELDS,
    }),
};

pub const PAGE_TYPE_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPE_ENTRIES,
    fields: &PAGE_TYPE_ENTRY_FIELDS,
    owner: Some("field"),
    payload: Some(PayloadKind::Value {
        field_collection: PAGE_TYPE_FIELDS,
    }),
};

pub const PAGE_TYPE_SYMBOLS_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPE_SYMBOLS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::required("page_type", PAGE_TYPES),
        FieldDef::required("symbol", SITE_SYMBOLS),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("page_type"),
    payload: None,
};

pub const PAGE_TYPE_SECTIONS_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPE_SECTIONS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::required("page_type", PAGE_TYPES),
        FieldDef::required("symbol", SITE_SYMBOLS),
        FieldDef::plain("index"),
        FieldDef::plain("zone"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("page_type"),
    payload: None,
};

pub const PAGE_TYPE_SECTION_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_TYPE_SECTION_ENTRIES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("locale"),
        FieldDef::relation("section", PAGE_TYPE_SECTIONS),
        FieldDef::relation("field", SITE_SYMBOL_FIELDS),
        FieldDef::parent(),
        FieldDef::plain("index"),
        FieldDef::payload("value"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("section"),
    payload: Some(PayloadKind::Value {
        field_collection: SITE_SYMBOL_FIELDS,
    }),
};

pub const PAGES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("name"),
        FieldDef::plain("slug"),
        FieldDef::artifact("compiled_html"),
        FieldDef::relation("page_type", PAGE_TYPES),
        FieldDef::parent(),
        FieldDef::root("site", SITES),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
        FieldDef::plain("index"),
    ],
    owner: Some("site"),
    payload: None,
};

pub const PAGE_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_ENTRIES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("locale"),
        FieldDef::relation("page", PAGES),
        FieldDef::relation("field", PAGE_TYPE_FIELDS),
        FieldDef::parent(),
        FieldDef::plain("index"),
        FieldDef::payload("value"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("page"),
    payload: Some(PayloadKind::Value {
        field_collection: PAGE_TYPE_FIELDS,
    }),
};

pub const PAGE_SECTIONS_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_SECTIONS,
    fields: &[
        FieldDef::system("id"),
        FieldDef::relation("page", PAGES),
        FieldDef::relation("symbol", SITE_SYMBOLS),
        FieldDef::plain("index"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("page"),
    payload: None,
};

pub const PAGE_SECTION_ENTRIES_SCHEMA: CollectionSchema = CollectionSchema {
    name: PAGE_SECTION_ENTRIES,
    fields: &[
        FieldDef::system("id"),
        FieldDef::plain("locale"),
        FieldDef::relation("section", PAGE_SECTIONS),
        FieldDef::relation("field", SITE_SYMBOL_FIELDS),
        FieldDef::parent(),
        FieldDef::plain("index"),
        FieldDef::payload("value"),
        SYSTEM_TIMESTAMPS[0],
        SYSTEM_TIMESTAMPS[1],
    ],
    owner: Some("section"),
    payload: Some(PayloadKind::Value {
        field_collection: SITE_SYMBOL_FIELDS,
    }),
};

/// Dependency groups, in build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildGroup {
    Root,
    Independents,
    FieldDefinitions,
    Entries,
    Associations,
    Content,
}

/// Every cloned collection, in the order the clone builds them.
pub const BUILD_ORDER: &[(BuildGroup, CollectionSchema)] = &[
    (BuildGroup::Root, SITES_SCHEMA),
    (BuildGroup::Independents, SITE_UPLOADS_SCHEMA),
    (BuildGroup::Independents, SITE_SYMBOLS_SCHEMA),
    (BuildGroup::Independents, PAGE_TYPES_SCHEMA),
    (BuildGroup::FieldDefinitions, SITE_FIELDS_SCHEMA),
    (BuildGroup::FieldDefinitions, SITE_SYMBOL_FIELDS_SCHEMA),
    (BuildGroup::FieldDefinitions, PAGE_TYPE_FIELDS_SCHEMA),
    (BuildGroup::Entries, SITE_ENTRIES_SCHEMA),
    (BuildGroup::Entries, SITE_SYMBOL_ENTRIES_SCHEMA),
    (BuildGroup::Entries, PAGE_TYPE_ENTRIES_SCHEMA),
    (BuildGroup::Associations, PAGE_TYPE_SYMBOLS_SCHEMA),
    (BuildGroup::Associations, PAGE_TYPE_SECTIONS_SCHEMA),
    (BuildGroup::Associations, PAGE_TYPE_SECTION_ENTRIES_SCHEMA),
    (BuildGroup::Content, PAGES_SCHEMA),
    (BuildGroup::Content, PAGE_ENTRIES_SCHEMA),
    (BuildGroup::Content, PAGE_SECTIONS_SCHEMA),
    (BuildGroup::Content, PAGE_SECTION_ENTRIES_SCHEMA),
];

/// Lookup over the static schema table.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    collections: HashMap<&'static str, CollectionSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        let mut collections: HashMap<&'static str, CollectionSchema> = BUILD_ORDER
            .iter()
            .map(|(_, schema)| (schema.name, *schema))
            .collect();
        collections.insert(SITE_GROUPS, SITE_GROUPS_SCHEMA);
        Self { collections }
    }

    pub fn get(&self, name: &str) -> Result<&CollectionSchema> {
        self.collections
            .get(name)
            .ok_or_else(|| CloneError::MissingCollectionSchema(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Every known collection name, cloned or not.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.collections.keys().copied()
    }

    /// Cloned collections in build order.
    pub fn build_order(&self) -> impl Iterator<Item = &'static CollectionSchema> {
        BUILD_ORDER.iter().map(|(_, schema)| schema)
    }

    /// Collections whose `config` payload is patched, in patch order.
    pub fn config_collections(&self) -> impl Iterator<Item = &'static CollectionSchema> {
        self.build_order()
            .filter(|schema| schema.payload == Some(PayloadKind::Config))
    }

    /// Collections whose `value` payload is patched, in patch order.
    pub fn value_collections(&self) -> impl Iterator<Item = &'static CollectionSchema> {
        self.build_order()
            .filter(|schema| matches!(schema.payload, Some(PayloadKind::Value { .. })))
    }

    /// Checks that no collection is built before a collection it formally references.
    pub fn validate_build_order(&self) -> Result<()> {
        let mut built: Vec<&str> = Vec::new();
        for schema in self.build_order() {
            for dependency in schema.dependencies() {
                if !built.contains(&dependency) {
                    return Err(CloneError::InvalidRecord(format!(
                        "collection '{}' references '{}' before it is built",
                        schema.name, dependency
                    )));
                }
            }
            built.push(schema.name);
        }
        Ok(())
    }

    /// Checks that the target store knows every collection the clone writes to.
    pub async fn validate_store(&self, store: &dyn RecordStore) -> Result<()> {
        for schema in self.build_order() {
            if !store.has_collection(schema.name).await {
                return Err(CloneError::MissingCollectionSchema(schema.name.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}
