//! Configuração do esteira carregada a partir de `esteira.toml`.
//!
//! Valores não presentes no arquivo usam defaults. As variáveis de ambiente
//! `ESTEIRA_API_KEY` e `ESTEIRA_BASE_URL` têm precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::store::TableNames;

/// Caminho padrão do `--config`, relativo ao diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "esteira.toml";

/// Configuração de nível superior carregada de `esteira.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EsteiraConfig {
    /// URL base do backend gerenciado (sem o sufixo `/rest/v1`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chave de acesso enviada como `apikey` e bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Tempo máximo de cada requisição, em segundos.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default)]
    pub tables: TableNames,
}

// Valor padrão da URL base: backend local.
fn default_base_url() -> String {
    "http://localhost:54321".to_string()
}

// Valor padrão do timeout de requisição: 30s.
fn default_timeout_secs() -> u64 {
    30
}

// Valor padrão do timeout de conexão: 10s.
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for EsteiraConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            tables: TableNames::default(),
        }
    }
}

impl EsteiraConfig {
    /// Carrega de um caminho explícito; usa os padrões se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<EsteiraConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("ESTEIRA_API_KEY")
            && !key.is_empty()
        {
            config.api_key = key;
        }
        if let Ok(url) = std::env::var("ESTEIRA_BASE_URL")
            && !url.is_empty()
        {
            config.base_url = url;
        }

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
