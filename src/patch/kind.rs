//! Field type tags and the embedded references each one carries.

use crate::remap::{IdMaps, Resolved};
use crate::schema::catalog::{PAGE_TYPE_FIELDS, PAGE_TYPES, PAGES, SITE_FIELDS, SITE_UPLOADS};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Repeater,
    Group,
    Text,
    Markdown,
    RichText,
    Link,
    Image,
    Icon,
    Number,
    Date,
    Url,
    PageField,
    SiteField,
    Page,
    PageList,
    Slider,
    Switch,
    Select,
    Info,
    Unknown(String),
}

impl FieldKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "repeater" => FieldKind::Repeater,
            "group" => FieldKind::Group,
            "text" => FieldKind::Text,
            "markdown" => FieldKind::Markdown,
            "rich-text" => FieldKind::RichText,
            "link" => FieldKind::Link,
            "image" => FieldKind::Image,
            "icon" => FieldKind::Icon,
            "number" => FieldKind::Number,
            "date" => FieldKind::Date,
            "url" => FieldKind::Url,
            "page-field" => FieldKind::PageField,
            "site-field" => FieldKind::SiteField,
            "page" => FieldKind::Page,
            "page-list" => FieldKind::PageList,
            "slider" => FieldKind::Slider,
            "switch" => FieldKind::Switch,
            "select" => FieldKind::Select,
            "info" => FieldKind::Info,
            other => FieldKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Repeater => "repeater",
            FieldKind::Group => "group",
            FieldKind::Text => "text",
            FieldKind::Markdown => "markdown",
            FieldKind::RichText => "rich-text",
            FieldKind::Link => "link",
            FieldKind::Image => "image",
            FieldKind::Icon => "icon",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Url => "url",
            FieldKind::PageField => "page-field",
            FieldKind::SiteField => "site-field",
            FieldKind::Page => "page",
            FieldKind::PageList => "page-list",
            FieldKind::Slider => "slider",
            FieldKind::Switch => "switch",
            FieldKind::Select => "select",
            FieldKind::Info => "info",
            FieldKind::Unknown(tag) => tag,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldKind::Unknown(_))
    }

    /// Rewrites the references inside a field definition's `config`.
    ///
    /// `own_collection` is the field collection the definition lives in;
    /// `condition.field` always points back into it.
    pub fn patch_config(&self, config: &mut Value, own_collection: &str, ctx: &mut PatchContext<'_>) {
        let Value::Object(object) = config else {
            return;
        };

        match self {
            FieldKind::Page | FieldKind::PageList => {
                if let Some(slot) = object.get_mut("page_type") {
                    ctx.rewrite(slot, PAGE_TYPES);
                }
            }
            FieldKind::PageField => {
                if let Some(slot) = object.get_mut("field") {
                    ctx.rewrite(slot, PAGE_TYPE_FIELDS);
                }
            }
            FieldKind::SiteField => {
                if let Some(slot) = object.get_mut("field") {
                    ctx.rewrite(slot, SITE_FIELDS);
                }
            }
            FieldKind::Unknown(_) => ctx.unknown += 1,
            FieldKind::Repeater
            | FieldKind::Group
            | FieldKind::Text
            | FieldKind::Markdown
            | FieldKind::RichText
            | FieldKind::Link
            | FieldKind::Image
            | FieldKind::Icon
            | FieldKind::Number
            | FieldKind::Date
            | FieldKind::Url
            | FieldKind::Slider
            | FieldKind::Switch
            | FieldKind::Select
            | FieldKind::Info => {}
        }

        if let Some(Value::Object(condition)) = object.get_mut("condition") {
            if let Some(slot) = condition.get_mut("field") {
                ctx.rewrite(slot, own_collection);
            }
        }
    }

    /// Rewrites the references inside an entry's `value`.
    pub fn patch_value(&self, value: &mut Value, ctx: &mut PatchContext<'_>) {
        match self {
            FieldKind::Image => {
                if let Some(slot) = value.get_mut("upload") {
                    ctx.rewrite(slot, SITE_UPLOADS);
                }
            }
            FieldKind::Link => {
                if let Some(slot) = value.get_mut("page") {
                    ctx.rewrite(slot, PAGES);
                }
            }
            FieldKind::Page => {
                if value.is_string() {
                    ctx.rewrite(value, PAGES);
                } else if let Some(slot) = value.get_mut("value") {
                    ctx.rewrite(slot, PAGES);
                }
            }
            FieldKind::Unknown(_) => ctx.unknown += 1,
            FieldKind::Repeater
            | FieldKind::Group
            | FieldKind::Text
            | FieldKind::Markdown
            | FieldKind::RichText
            | FieldKind::Icon
            | FieldKind::Number
            | FieldKind::Date
            | FieldKind::Url
            | FieldKind::PageField
            | FieldKind::SiteField
            | FieldKind::PageList
            | FieldKind::Slider
            | FieldKind::Switch
            | FieldKind::Select
            | FieldKind::Info => {}
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup state and counters for patching one payload.
pub struct PatchContext<'a> {
    maps: &'a IdMaps,
    pub rewritten: usize,
    pub dangling: usize,
    pub unknown: usize,
}

impl<'a> PatchContext<'a> {
    pub fn new(maps: &'a IdMaps) -> Self {
        Self {
            maps,
            rewritten: 0,
            dangling: 0,
            unknown: 0,
        }
    }

    /// Replaces a non-empty string id in `slot` with its new id.
    ///
    /// An id with no mapping stays as it is and is counted as dangling.
    fn rewrite(&mut self, slot: &mut Value, target: &str) {
        let Value::String(old) = slot else {
            return;
        };
        if old.is_empty() {
            return;
        }
        match self.maps.resolve(target, old) {
            Resolved::Target(new) => {
                *slot = Value::String(new.to_string());
                self.rewritten += 1;
            }
            Resolved::NoTarget => self.dangling += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::SITE_SYMBOL_FIELDS;
    use serde_json::json;

    fn maps() -> IdMaps {
        let mut maps = IdMaps::new();
        maps.insert(PAGE_TYPES, "PT1".into(), "PT2".into()).unwrap();
        maps.insert(SITE_FIELDS, "SF1".into(), "SF2".into()).unwrap();
        maps.insert(SITE_SYMBOL_FIELDS, "SSF1".into(), "SSF2".into()).unwrap();
        maps.insert(PAGES, "PG1".into(), "PG3".into()).unwrap();
        maps.insert(SITE_UPLOADS, "U1".into(), "U2".into()).unwrap();
        maps
    }

    #[test]
    fn test_tags_round_trip() {
        for tag in ["rich-text", "page-list", "site-field", "info"] {
            assert_eq!(FieldKind::from_tag(tag).as_str(), tag);
        }
        assert_eq!(FieldKind::from_tag("carousel"), FieldKind::Unknown("carousel".into()));
    }

    #[test]
    fn test_page_config_resolved_and_dangling() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);
        let mut config = json!({"page_type": "PT1"});
        FieldKind::Page.patch_config(&mut config, PAGE_TYPE_FIELDS, &mut ctx);
        assert_eq!(config, json!({"page_type": "PT2"}));

        let mut config = json!({"page_type": "PT9"});
        FieldKind::PageList.patch_config(&mut config, PAGE_TYPE_FIELDS, &mut ctx);
        assert_eq!(config, json!({"page_type": "PT9"}));
        assert_eq!((ctx.rewritten, ctx.dangling), (1, 1));
    }

    #[test]
    fn test_condition_field_uses_own_collection() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);
        let mut config = json!({"condition": {"field": "SSF1", "value": "on"}});
        FieldKind::Text.patch_config(&mut config, SITE_SYMBOL_FIELDS, &mut ctx);
        assert_eq!(config, json!({"condition": {"field": "SSF2", "value": "on"}}));
    }

    #[test]
    fn test_site_field_config() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);
        let mut config = json!({"field": "SF1"});
        FieldKind::SiteField.patch_config(&mut config, SITE_SYMBOL_FIELDS, &mut ctx);
        assert_eq!(config, json!({"field": "SF2"}));
    }

    #[test]
    fn test_entry_values() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);

        let mut image = json!({"upload": "U1", "alt": "logo"});
        FieldKind::Image.patch_value(&mut image, &mut ctx);
        assert_eq!(image, json!({"upload": "U2", "alt": "logo"}));

        let mut link = json!({"page": "PG1", "label": "Home"});
        FieldKind::Link.patch_value(&mut link, &mut ctx);
        assert_eq!(link["page"], json!("PG3"));

        let mut page = json!("PG1");
        FieldKind::Page.patch_value(&mut page, &mut ctx);
        assert_eq!(page, json!("PG3"));

        let mut nested = json!({"value": "PG1"});
        FieldKind::Page.patch_value(&mut nested, &mut ctx);
        assert_eq!(nested, json!({"value": "PG3"}));

        assert_eq!(ctx.rewritten, 4);
    }

    #[test]
    fn test_unknown_kind_is_counted_and_left_alone() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);
        let mut value = json!({"page": "PG1"});
        FieldKind::Unknown("carousel".into()).patch_value(&mut value, &mut ctx);
        assert_eq!(value, json!({"page": "PG1"}));
        assert_eq!((ctx.rewritten, ctx.unknown), (0, 1));
    }

    #[test]
    fn test_empty_and_non_string_ids_are_ignored() {
        let maps = maps();
        let mut ctx = PatchContext::new(&maps);
        let mut value = json!({"upload": ""});
        FieldKind::Image.patch_value(&mut value, &mut ctx);
        let mut value = json!({"upload": null, "url": "https://x"});
        FieldKind::Image.patch_value(&mut value, &mut ctx);
        assert_eq!((ctx.rewritten, ctx.dangling), (0, 0));
    }
}
