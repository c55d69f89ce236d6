use super::{BuildOutcome, CollectionBuilder, Prepared, plan_hierarchy, prepare_fields};
use crate::core::Result;
use crate::schema::CollectionSchema;
use crate::snapshot::SourceRecord;
use serde_json::Value;
use tracing::{Level, event};

impl CollectionBuilder<'_> {
    /// Creates a self-referential collection parent-before-child.
    ///
    /// Records whose parent is outside the source set, on a cycle, or was
    /// itself not created are left out together with their subtree.
    pub async fn build_tree(
        &mut self,
        schema: &CollectionSchema,
        parent_field: &str,
        records: &[SourceRecord],
    ) -> Result<BuildOutcome> {
        let plan = plan_hierarchy(records, parent_field);
        let mut outcome = BuildOutcome::default();

        for &index in &plan.order {
            let source = &records[index];
            let parent = match source.get_str(parent_field) {
                None => None,
                Some(old) => match self.maps.resolve(schema.name, old).target() {
                    Some(new) => Some(new.clone()),
                    None => {
                        outcome.stats.orphaned += 1;
                        continue;
                    }
                },
            };

            match prepare_fields(schema, source, self.maps, self.root) {
                Prepared::Skip { field } => {
                    event!(
                        Level::DEBUG,
                        collection = schema.name,
                        id = %source.id,
                        field,
                        "record skipped, relation target not cloned"
                    );
                    outcome.stats.skipped += 1;
                }
                Prepared::Ready(mut fields) => {
                    let parent = parent.map(|id| id.to_string()).unwrap_or_default();
                    fields.insert(parent_field.to_string(), Value::String(parent));
                    let new_id = self.create(schema, source, fields).await?;
                    outcome.created.push((index, new_id));
                    outcome.stats.created += 1;
                }
            }
        }

        outcome.stats.orphaned += plan.orphans.len();
        outcome.stats.cyclic = plan.cyclic.len();

        if outcome.stats.orphaned > 0 {
            event!(
                Level::WARN,
                collection = schema.name,
                orphaned = outcome.stats.orphaned,
                cyclic = outcome.stats.cyclic,
                "records with unresolved ancestors left out"
            );
        }

        Ok(outcome)
    }
}
