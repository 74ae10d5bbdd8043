use axum::extract::multipart::{Field, MultipartError};

/// One multipart part, classified at the request boundary.
pub enum Part<'a> {
    /// A plain form value.
    Text { name: String, value: String },
    /// An uploaded file whose content has not been read yet.
    File {
        name: String,
        filename: String,
        field: Field<'a>,
    },
}

impl<'a> Part<'a> {
    /// Classify a multipart field.
    ///
    /// A part is a file only if it carries a non-empty filename. File inputs
    /// left blank by the browser arrive with `filename=""`; those yield
    /// `None` and should be skipped.
    pub async fn from_field(field: Field<'a>) -> Result<Option<Self>, MultipartError> {
        let name = field.name().unwrap_or_default().to_owned();
        match field.file_name() {
            Some("") => Ok(None),
            Some(filename) => {
                let filename = filename.to_owned();
                Ok(Some(Self::File {
                    name,
                    filename,
                    field,
                }))
            }
            None => {
                let value = field.text().await?;
                Ok(Some(Self::Text { name, value }))
            }
        }
    }

    /// The form field name of this part.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}
