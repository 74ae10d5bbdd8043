/// Configuration for the `MongoDB` item repository backend.
#[derive(Debug, Clone)]
pub struct MongoItemsConfig {
    /// Collection holding one document per item.
    pub collection: String,
}

impl Default for MongoItemsConfig {
    fn default() -> Self {
        Self {
            collection: String::from("items"),
        }
    }
}
