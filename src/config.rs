//! Configuração do stemsplit carregada a partir de `stemsplit.toml`.
//!
//! A struct [`SplitterConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `STEMSPLIT_LICENSE` tem precedência sobre o arquivo.

use serde::Deserialize;
use std::path::Path;

use crate::error::SplitError;

/// Configuração de nível superior carregada de `stemsplit.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitterConfig {
    /// Chave de licença do serviço de separação.
    #[serde(default)]
    pub license: String,

    /// URL base da API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Intervalo entre consultas de status, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_api_base_url() -> String {
    "https://www.lalal.ai/api/".to_string()
}

// Valor padrão para o intervalo de polling: 5s.
fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            license: String::new(),
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SplitterConfig {
    /// Carrega a configuração de `stemsplit.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, SplitError> {
        let path = Path::new("stemsplit.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<SplitterConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        if let Ok(key) = std::env::var("STEMSPLIT_LICENSE")
            && !key.is_empty()
        {
            config.license = key;
        }

        Ok(config)
    }
}
