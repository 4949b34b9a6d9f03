use async_trait::async_trait;
use quasar_utils::QuasarResult;

use crate::transforms::record::NavigationAid;

/// Writes normalized records into the unified table.
#[async_trait]
pub trait NavAidSink: Send + Sync {
    fn name(&self) -> &str;

    /// Insert the record, or overwrite every normalized column of the row
    /// that already holds its `source_key`.
    async fn upsert(&self, aid: &NavigationAid) -> QuasarResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::row::SourceRow;
    use crate::transforms::schema::SchemaId;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct KeyedSink {
        rows: Mutex<HashMap<String, NavigationAid>>,
    }

    #[async_trait]
    impl NavAidSink for KeyedSink {
        fn name(&self) -> &str { "keyed" }
        async fn upsert(&self, aid: &NavigationAid) -> QuasarResult<()> {
            self.rows.lock().await.insert(aid.source_key.clone(), aid.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn sink_trait_overwrites_by_key() {
        let sink = KeyedSink { rows: Mutex::new(HashMap::new()) };
        let schema = SchemaId::from("a__b__c");
        let row = SourceRow::new().with("fidn", "1").with_point(1.0, 1.0);
        let mut aid = NavigationAid::base(&schema, &row, "buoy", "lateral").unwrap();

        sink.upsert(&aid).await.unwrap();
        aid.name = Some("renamed".into());
        sink.upsert(&aid).await.unwrap();

        let rows = sink.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows["a__b__c:1"].name.as_deref(), Some("renamed"));
    }
}
