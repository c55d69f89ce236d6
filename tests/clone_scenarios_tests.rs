use serde_json::{Value, json};
use siteclone::core::FieldMap;
use siteclone::snapshot::{RecordSet, SourceRecord};
use siteclone::{
    CloneError, CloneRequest, InMemoryBlobStore, InMemoryStore, Record, RecordId, RecordStore,
    SiteCloner, SourceGraph,
};

fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn rec(id: &str, value: Value) -> SourceRecord {
    SourceRecord::new(id, fields(value))
}

fn graph(collections: Vec<(&str, Vec<SourceRecord>)>) -> SourceGraph {
    let root = rec(
        "S1",
        json!({
            "name": "Source", "description": "demo", "host": "source.example.com",
            "group": "G1", "head": "<meta>", "foot": "", "preview": "<html>preview</html>",
            "index": 0, "created": "2026-01-01", "updated": "2026-01-01"
        }),
    );
    let mut records = RecordSet::new();
    records.push("sites", root.clone());
    for (collection, list) in collections {
        records.set(collection, list);
    }
    SourceGraph::new(root, records)
}

fn new_id(outcome: &siteclone::CloneOutcome, collection: &str, old: &str) -> RecordId {
    outcome
        .id_maps
        .resolve(collection, old)
        .target()
        .cloned()
        .unwrap_or_else(|| panic!("{collection}/{old} was not cloned"))
}

async fn fetch(store: &InMemoryStore, collection: &str, id: &RecordId) -> Record {
    store.find(collection, id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_basic_clone_rebuilds_page_tree() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("page_types", vec![rec("PT1", json!({"name": "Default", "site": "S1"}))]),
        (
            "pages",
            vec![
                rec("PG2", json!({"name": "About", "slug": "about", "page_type": "PT1", "parent": "PG1", "site": "S1", "index": 0})),
                rec("PG1", json!({"name": "Home", "slug": "", "page_type": "PT1", "parent": "", "site": "S1", "index": 0, "compiled_html": "<html/>"})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy.example.com").group("G2"))
        .await
        .unwrap();

    let site = &outcome.site;
    assert_ne!(site.id.as_str(), "S1");
    assert_eq!(site.get_str("name"), Some("Copy"));
    assert_eq!(site.get_str("host"), Some("copy.example.com"));
    assert_eq!(site.get_str("group"), Some("G2"));
    assert_eq!(site.get_str("head"), Some("<meta>"));
    assert_eq!(site.get("preview"), Some(&json!("")));
    assert!(site.get("created").is_none());

    let pt2 = new_id(&outcome, "page_types", "PT1");
    let pg3 = new_id(&outcome, "pages", "PG1");
    let pg4 = new_id(&outcome, "pages", "PG2");
    assert_ne!(pt2.as_str(), "PT1");

    let home = fetch(&store, "pages", &pg3).await;
    let about = fetch(&store, "pages", &pg4).await;
    assert_eq!(home.get_str("page_type"), Some(pt2.as_str()));
    assert_eq!(home.get_str("site"), Some(site.id.as_str()));
    assert_eq!(home.get_str("parent"), None);
    assert_eq!(home.get("compiled_html"), Some(&json!("")));
    assert_eq!(about.get_str("parent"), Some(pg3.as_str()));

    let pages = outcome.report.get("pages").unwrap();
    assert_eq!((pages.source, pages.build.created, pages.build.orphaned), (2, 2, 0));
    assert_eq!(store.count("pages").await, 2);
}

#[tokio::test]
async fn test_every_created_record_has_one_map_entry() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("site_symbols", vec![rec("SY1", json!({"name": "Hero", "site": "S1"}))]),
        (
            "site_symbol_fields",
            vec![
                rec("SSF1", json!({"key": "items", "type": "repeater", "symbol": "SY1", "parent": ""})),
                rec("SSF2", json!({"key": "title", "type": "text", "symbol": "SY1", "parent": "SSF1"})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    assert_eq!(store.total_records().await, outcome.report.total_created());
    for collection in ["sites", "site_symbols", "site_symbol_fields"] {
        let map = outcome.id_maps.get(collection).unwrap();
        assert_eq!(map.len(), store.count(collection).await);
        for (old, new) in map.iter() {
            assert_ne!(old, new);
            assert!(store.find(collection, new).await.unwrap().is_some());
        }
    }
}

#[tokio::test]
async fn test_entry_with_missing_parent_is_orphaned() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("page_types", vec![rec("PT1", json!({"name": "Default", "site": "S1"}))]),
        ("page_type_fields", vec![rec("PTF1", json!({"key": "intro", "type": "text", "page_type": "PT1", "parent": "", "config": {}}))]),
        ("pages", vec![rec("PG1", json!({"name": "Home", "page_type": "PT1", "parent": "", "site": "S1"}))]),
        (
            "page_entries",
            vec![
                rec("PE1", json!({"locale": "en", "page": "PG1", "field": "PTF1", "parent": "", "value": "hi"})),
                rec("PE2", json!({"locale": "en", "page": "PG1", "field": "PTF1", "parent": "NOT-IN-SOURCE", "value": "lost"})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let entries = outcome.report.get("page_entries").unwrap();
    assert_eq!(entries.build.created, 1);
    assert_eq!(entries.build.orphaned, 1);
    assert_eq!(entries.build.cyclic, 0);
    assert!(!outcome.id_maps.get("page_entries").unwrap().contains(&RecordId::from("PE2")));
    assert_eq!(store.count("page_entries").await, 1);
}

#[tokio::test]
async fn test_orphaned_subtree_is_excluded_whole() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![(
        "site_fields",
        vec![
            rec("SF1", json!({"key": "a", "type": "text", "site": "S1", "parent": ""})),
            rec("SF2", json!({"key": "b", "type": "group", "site": "S1", "parent": "MISSING"})),
            rec("SF3", json!({"key": "c", "type": "text", "site": "S1", "parent": "SF2"})),
            rec("SF4", json!({"key": "d", "type": "text", "site": "S1", "parent": "SF3"})),
        ],
    )]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let report = outcome.report.get("site_fields").unwrap();
    assert_eq!((report.build.created, report.build.orphaned), (1, 3));
    assert_eq!(store.count("site_fields").await, 1);
}

#[tokio::test]
async fn test_parent_cycle_is_orphaned_not_fatal() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![(
        "site_fields",
        vec![
            rec("SF1", json!({"key": "root", "type": "text", "site": "S1", "parent": ""})),
            rec("SFA", json!({"key": "a", "type": "group", "site": "S1", "parent": "SFB"})),
            rec("SFB", json!({"key": "b", "type": "group", "site": "S1", "parent": "SFA"})),
            rec("SFC", json!({"key": "c", "type": "text", "site": "S1", "parent": "SFA"})),
        ],
    )]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let report = outcome.report.get("site_fields").unwrap();
    assert_eq!(report.build.created, 1);
    assert_eq!(report.build.orphaned, 3);
    assert_eq!(report.build.cyclic, 2);
}

#[tokio::test]
async fn test_embedded_site_field_reference_resolved() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("site_symbols", vec![rec("SY1", json!({"name": "Footer", "site": "S1"}))]),
        ("site_fields", vec![rec("SF1", json!({"key": "email", "type": "text", "site": "S1", "parent": "", "config": {}}))]),
        ("site_symbol_fields", vec![rec("SSF1", json!({"key": "email", "type": "site-field", "symbol": "SY1", "parent": "", "config": {"field": "SF1"}}))]),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let sf2 = new_id(&outcome, "site_fields", "SF1");
    let ssf = fetch(&store, "site_symbol_fields", &new_id(&outcome, "site_symbol_fields", "SSF1")).await;
    assert_eq!(ssf.get("config"), Some(&json!({"field": sf2.as_str()})));

    let report = outcome.report.get("site_symbol_fields").unwrap();
    assert_eq!((report.patch.patched, report.patch.dangling), (1, 0));
}

#[tokio::test]
async fn test_embedded_site_field_reference_left_dangling() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("site_symbols", vec![rec("SY1", json!({"name": "Footer", "site": "S1"}))]),
        ("site_symbol_fields", vec![rec("SSF1", json!({"key": "email", "type": "site-field", "symbol": "SY1", "parent": "", "config": {"field": "SF1"}}))]),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let ssf = fetch(&store, "site_symbol_fields", &new_id(&outcome, "site_symbol_fields", "SSF1")).await;
    assert_eq!(ssf.get("config"), Some(&json!({"field": "SF1"})));

    let report = outcome.report.get("site_symbol_fields").unwrap();
    assert_eq!((report.patch.patched, report.patch.dangling), (0, 1));
    assert_eq!(outcome.report.total_dangling(), 1);
}

#[tokio::test]
async fn test_page_config_and_entry_values_are_patched() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S1"}))]),
        (
            "site_fields",
            vec![
                rec("SF1", json!({"key": "home", "type": "page", "site": "S1", "parent": "", "config": "{\"page_type\":\"PT1\"}"})),
                rec("SF2", json!({"key": "cta", "type": "link", "site": "S1", "parent": "", "config": {}})),
                rec("SF3", json!({"key": "raw", "type": "text", "site": "S1", "parent": "", "config": "{\"rows\":3}"})),
            ],
        ),
        ("pages", vec![rec("PG1", json!({"name": "Home", "page_type": "PT1", "parent": "", "site": "S1"}))]),
        (
            "site_entries",
            vec![
                rec("SE1", json!({"locale": "en", "field": "SF1", "parent": "", "value": "PG1"})),
                rec("SE2", json!({"locale": "en", "field": "SF2", "parent": "", "value": {"page": "PG1", "label": "Go"}})),
                rec("SE3", json!({"locale": "en", "field": "SF3", "parent": "", "value": "PG1"})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let pt2 = new_id(&outcome, "page_types", "PT1");
    let pg3 = new_id(&outcome, "pages", "PG1");

    let home_field = fetch(&store, "site_fields", &new_id(&outcome, "site_fields", "SF1")).await;
    assert_eq!(home_field.get("config"), Some(&json!({"page_type": pt2.as_str()})));

    let raw_field = fetch(&store, "site_fields", &new_id(&outcome, "site_fields", "SF3")).await;
    assert_eq!(raw_field.get("config"), Some(&json!("{\"rows\":3}")));

    let page_entry = fetch(&store, "site_entries", &new_id(&outcome, "site_entries", "SE1")).await;
    assert_eq!(page_entry.get("value"), Some(&json!(pg3.as_str())));

    let link_entry = fetch(&store, "site_entries", &new_id(&outcome, "site_entries", "SE2")).await;
    assert_eq!(link_entry.get("value"), Some(&json!({"page": pg3.as_str(), "label": "Go"})));

    let text_entry = fetch(&store, "site_entries", &new_id(&outcome, "site_entries", "SE3")).await;
    assert_eq!(text_entry.get("value"), Some(&json!("PG1")));

    assert_eq!(outcome.report.get("site_entries").unwrap().patch.patched, 2);
}

#[tokio::test]
async fn test_section_entry_values_are_patched() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("site_symbols", vec![rec("SY1", json!({"name": "Hero", "site": "S1"}))]),
        (
            "site_symbol_fields",
            vec![
                rec("SSF1", json!({"key": "cta", "type": "link", "symbol": "SY1", "parent": "", "config": {}})),
                rec("SSF2", json!({"key": "target", "type": "page", "symbol": "SY1", "parent": "", "config": {}})),
            ],
        ),
        ("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S1"}))]),
        (
            "page_type_sections",
            vec![rec("PTX1", json!({"page_type": "PT1", "symbol": "SY1", "index": 0, "zone": "body"}))],
        ),
        (
            "page_type_section_entries",
            vec![rec("PTXE1", json!({"locale": "en", "section": "PTX1", "field": "SSF2", "parent": "", "value": "PG1"}))],
        ),
        ("pages", vec![rec("PG1", json!({"name": "Home", "page_type": "PT1", "parent": "", "site": "S1"}))]),
        ("page_sections", vec![rec("PX1", json!({"page": "PG1", "symbol": "SY1", "index": 0}))]),
        (
            "page_section_entries",
            vec![rec("PXE1", json!({"locale": "en", "section": "PX1", "field": "SSF1", "parent": "", "value": {"page": "PG1", "label": "Go"}}))],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let pg2 = new_id(&outcome, "pages", "PG1");

    let link = fetch(&store, "page_section_entries", &new_id(&outcome, "page_section_entries", "PXE1")).await;
    assert_eq!(link.get_str("section"), Some(new_id(&outcome, "page_sections", "PX1").as_str()));
    assert_eq!(link.get_str("field"), Some(new_id(&outcome, "site_symbol_fields", "SSF1").as_str()));
    assert_eq!(link.get("value"), Some(&json!({"page": pg2.as_str(), "label": "Go"})));

    let target = fetch(
        &store,
        "page_type_section_entries",
        &new_id(&outcome, "page_type_section_entries", "PTXE1"),
    )
    .await;
    assert_eq!(target.get("value"), Some(&json!(pg2.as_str())));

    assert_eq!(outcome.report.get("page_section_entries").unwrap().patch.patched, 1);
    assert_eq!(outcome.report.get("page_type_section_entries").unwrap().patch.patched, 1);
}

#[tokio::test]
async fn test_root_owned_records_always_point_at_new_site() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S-OLD"}))]),
        (
            "pages",
            vec![
                rec("PG1", json!({"name": "Home", "page_type": "PT1", "parent": ""})),
                rec("PG2", json!({"name": "About", "page_type": "PT1", "parent": "PG1", "site": ""})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let site = outcome.site.id.as_str();
    let page_type = fetch(&store, "page_types", &new_id(&outcome, "page_types", "PT1")).await;
    assert_eq!(page_type.get_str("site"), Some(site));
    for old in ["PG1", "PG2"] {
        let page = fetch(&store, "pages", &new_id(&outcome, "pages", old)).await;
        assert_eq!(page.get_str("site"), Some(site));
    }
}

#[tokio::test]
async fn test_condition_field_points_into_same_collection() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S1"}))]),
        (
            "page_type_fields",
            vec![
                rec("PTF1", json!({"key": "show", "type": "switch", "page_type": "PT1", "parent": "", "config": {}})),
                rec("PTF2", json!({"key": "body", "type": "markdown", "page_type": "PT1", "parent": "", "config": {"condition": {"field": "PTF1", "value": true}}})),
                rec("PTF3", json!({"key": "teaser", "type": "page-field", "page_type": "PT1", "parent": "", "config": {"field": "PTF2"}})),
            ],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let ptf1 = new_id(&outcome, "page_type_fields", "PTF1");
    let ptf2 = new_id(&outcome, "page_type_fields", "PTF2");
    let body = fetch(&store, "page_type_fields", &ptf2).await;
    assert_eq!(
        body.get("config"),
        Some(&json!({"condition": {"field": ptf1.as_str(), "value": true}}))
    );
    let teaser = fetch(&store, "page_type_fields", &new_id(&outcome, "page_type_fields", "PTF3")).await;
    assert_eq!(teaser.get("config"), Some(&json!({"field": ptf2.as_str()})));
}

#[tokio::test]
async fn test_association_without_symbol_is_skipped() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        ("site_symbols", vec![rec("SY1", json!({"name": "Hero", "site": "S1", "compiled_js": "x()"}))]),
        ("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S1"}))]),
        (
            "page_type_symbols",
            vec![
                rec("PTS1", json!({"page_type": "PT1", "symbol": "SY1"})),
                rec("PTS2", json!({"page_type": "PT1", "symbol": "SY-GONE"})),
            ],
        ),
        (
            "page_type_sections",
            vec![rec("PTX1", json!({"page_type": "PT1", "symbol": "SY-GONE", "index": 0, "zone": "body"}))],
        ),
        (
            "page_type_section_entries",
            vec![rec("PTXE1", json!({"locale": "en", "section": "PTX1", "field": "", "parent": "", "value": "x"}))],
        ),
    ]);

    let outcome = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap();

    let symbols = outcome.report.get("page_type_symbols").unwrap();
    assert_eq!((symbols.build.created, symbols.build.skipped), (1, 1));
    let sections = outcome.report.get("page_type_sections").unwrap();
    assert_eq!((sections.build.created, sections.build.skipped), (0, 1));

    let entry = fetch(
        &store,
        "page_type_section_entries",
        &new_id(&outcome, "page_type_section_entries", "PTXE1"),
    )
    .await;
    assert_eq!(entry.get_str("section"), None);

    let symbol = fetch(&store, "site_symbols", &new_id(&outcome, "site_symbols", "SY1")).await;
    assert_eq!(symbol.get("compiled_js"), Some(&json!("")));
}

#[tokio::test]
async fn test_duplicate_source_id_aborts() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![(
        "page_types",
        vec![
            rec("PT1", json!({"name": "A", "site": "S1"})),
            rec("PT1", json!({"name": "B", "site": "S1"})),
        ],
    )]);

    let err = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap_err();

    assert!(matches!(err, CloneError::TransactionAborted(_)));
    assert!(matches!(err.root_cause(), CloneError::DuplicateSourceId { .. }));
    assert_eq!(store.total_records().await, 0);
}

#[tokio::test]
async fn test_missing_collection_schema() {
    let store = InMemoryStore::new();
    store.create_collection("sites").await.unwrap();
    let blobs = InMemoryBlobStore::new();

    let err = SiteCloner::new(&store, &blobs)
        .clone_site(&graph(vec![]), &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap_err();

    assert!(matches!(err, CloneError::MissingCollectionSchema(_)));
    assert_eq!(store.total_records().await, 0);
}

#[tokio::test]
async fn test_independent_clones_do_not_share_ids() {
    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![("page_types", vec![rec("PT1", json!({"name": "Post", "site": "S1"}))])]);
    let cloner = SiteCloner::new(&store, &blobs);

    let req_a = CloneRequest::new("A", "a");
    let req_b = CloneRequest::new("B", "b");
    let (a, b) = tokio::join!(
        cloner.clone_site(&source, &req_a),
        cloner.clone_site(&source, &req_b),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.site.id, b.site.id);
    assert_ne!(new_id(&a, "page_types", "PT1"), new_id(&b, "page_types", "PT1"));
    assert_eq!(store.count("sites").await, 2);
    assert_eq!(store.count("page_types").await, 2);
}

/// Delegates to an in-memory store but refuses writes to one collection.
struct FailingStore {
    inner: InMemoryStore,
    fail_on: &'static str,
}

#[async_trait::async_trait]
impl RecordStore for FailingStore {
    async fn has_collection(&self, collection: &str) -> bool {
        self.inner.has_collection(collection).await
    }

    async fn find(&self, collection: &str, id: &RecordId) -> siteclone::Result<Option<Record>> {
        self.inner.find(collection, id).await
    }

    async fn list(&self, collection: &str) -> siteclone::Result<Vec<Record>> {
        self.inner.list(collection).await
    }

    async fn begin(&self) -> siteclone::Result<siteclone::transaction::TransactionId> {
        self.inner.begin().await
    }

    async fn create(
        &self,
        txn: siteclone::transaction::TransactionId,
        record: Record,
    ) -> siteclone::Result<()> {
        if record.collection == self.fail_on {
            return Err(CloneError::Persistence("disk full".into()));
        }
        self.inner.create(txn, record).await
    }

    async fn update(
        &self,
        txn: siteclone::transaction::TransactionId,
        record: Record,
    ) -> siteclone::Result<()> {
        self.inner.update(txn, record).await
    }

    async fn find_in(
        &self,
        txn: siteclone::transaction::TransactionId,
        collection: &str,
        id: &RecordId,
    ) -> siteclone::Result<Option<Record>> {
        self.inner.find_in(txn, collection, id).await
    }

    async fn commit(&self, txn: siteclone::transaction::TransactionId) -> siteclone::Result<()> {
        self.inner.commit(txn).await
    }

    async fn rollback(&self, txn: siteclone::transaction::TransactionId) -> siteclone::Result<()> {
        self.inner.rollback(txn).await
    }
}

#[tokio::test]
async fn test_write_failure_rolls_back_records_and_files() {
    let store = FailingStore {
        inner: InMemoryStore::with_site_schema(),
        fail_on: "pages",
    };
    let blobs = InMemoryBlobStore::new();
    let source = graph(vec![
        (
            "site_uploads",
            vec![rec("U1", json!({"site": "S1", "file": "logo.png"}))
                .with_file(siteclone::FileBlob::new("logo.png", vec![1, 2, 3]))],
        ),
        ("page_types", vec![rec("PT1", json!({"name": "Default", "site": "S1"}))]),
        ("pages", vec![rec("PG1", json!({"name": "Home", "page_type": "PT1", "parent": "", "site": "S1"}))]),
    ]);

    let err = SiteCloner::new(&store, &blobs)
        .clone_site(&source, &CloneRequest::new("Copy", "copy"))
        .await
        .unwrap_err();

    assert!(matches!(err, CloneError::TransactionAborted(_)));
    assert!(matches!(err.root_cause(), CloneError::Persistence(msg) if msg == "disk full"));
    assert_eq!(store.inner.total_records().await, 0);
    assert!(blobs.is_empty().await);
    assert_eq!(store.inner.transactions().active_count().await, 0);
}
