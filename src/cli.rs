//! Interface de linha de comando do esteira baseada em clap.
//!
//! Subcomandos [`Command`] (recalcular, demo) e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

/// esteira — recálculo do status de workflow dos clientes.
#[derive(Debug, Parser)]
#[command(name = "esteira", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Arquivo de configuração.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Habilita logs de depuração.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recalcula o workflow de um ou mais clientes no backend configurado.
    Recalcular {
        /// Ids dos clientes.
        #[arg(required = true)]
        client_ids: Vec<String>,

        /// Imprime o registro gravado e os sinais dos documentos em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Executa o motor contra dados de exemplo em memória.
    Demo,
}
