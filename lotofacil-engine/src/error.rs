use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("erreur d'E/S : {0}")]
    Io(#[from] std::io::Error),

    #[error("erreur JSON : {0}")]
    Json(#[from] serde_json::Error),

    #[error("erreur de configuration TOML : {0}")]
    Toml(#[from] toml::de::Error),

    #[error("pool invalide : {0}")]
    InvalidPool(String),

    #[error("intervalle k invalide : {0}")]
    InvalidRange(String),

    #[error("configuration invalide : {0}")]
    InvalidConfig(String),

    #[error("numéros invalides : {0}")]
    InvalidNumbers(String),

    #[error("ligne {line} : {reason}")]
    Parse { line: usize, reason: String },

    #[error("introuvable : {0}")]
    NotFound(String),

    #[error("aucun tirage disponible")]
    NoDraws,
}

pub type Result<T> = std::result::Result<T, EngineError>;
