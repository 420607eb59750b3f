use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("Descriptor parsing failed: {0}")]
    DescriptorParsing(String),

    #[error("Duplicate coordinate {coordinate} in {list}")]
    DuplicateCoordinate { coordinate: String, list: String },

    #[error("Property '{property}' is already used by another entry; refusing to repoint it for {coordinate}")]
    PropertyConflict {
        property: String,
        coordinate: String,
    },

    #[error("Property '{0}' is referenced but not defined in this descriptor")]
    UndefinedProperty(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, CopilotError>;
