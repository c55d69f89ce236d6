use super::{BuildOutcome, CollectionBuilder, Prepared, prepare_fields};
use crate::core::Result;
use crate::schema::CollectionSchema;
use crate::snapshot::SourceRecord;
use tracing::{Level, event};

impl CollectionBuilder<'_> {
    /// Single pass create-and-remap for collections without a parent field.
    pub async fn build_flat(
        &mut self,
        schema: &CollectionSchema,
        records: &[SourceRecord],
    ) -> Result<BuildOutcome> {
        let mut outcome = BuildOutcome::default();

        for (index, source) in records.iter().enumerate() {
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
                Prepared::Ready(fields) => {
                    let new_id = self.create(schema, source, fields).await?;
                    outcome.created.push((index, new_id));
                    outcome.stats.created += 1;
                }
            }
        }

        Ok(outcome)
    }
}
