/// Configuration for the `GridFS` blob store backend.
#[derive(Debug, Clone)]
pub struct GridFsConfig {
    /// Bucket name. Files live in `<bucket>.files`, chunks in `<bucket>.chunks`.
    pub bucket: String,

    /// Size of each stored chunk in bytes.
    pub chunk_size_bytes: u32,
}

impl Default for GridFsConfig {
    fn default() -> Self {
        Self {
            bucket: String::from("uploads"),
            chunk_size_bytes: 255 * 1024,
        }
    }
}

impl GridFsConfig {
    /// Name of the collection holding file metadata documents.
    pub fn files_collection(&self) -> String {
        format!("{}.files", self.bucket)
    }
}
