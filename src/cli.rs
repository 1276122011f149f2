//! Interface de linha de comando do stemsplit baseada em clap.
//!
//! Define a struct [`Cli`] com as flags de entrada/saída, as opções de
//! processamento (--stem, --filter, --splitter) e o modo de lote (--batch).

use std::path::PathBuf;

use clap::Parser;

use crate::api::{FilterLevel, SplitterModel, Stem};

/// stemsplit — cliente de lote para um serviço remoto de separação de stems.
#[derive(Debug, Parser)]
#[command(name = "stemsplit", version, about)]
pub struct Cli {
    /// Chave de licença do serviço (tem precedência sobre a configuração).
    #[arg(long)]
    pub license: Option<String>,

    /// Arquivo de entrada ou diretório com os arquivos a processar.
    #[arg(long)]
    pub input: PathBuf,

    /// Diretório de saída para as faixas baixadas.
    #[arg(long, default_value = ".")]
    pub output: PathBuf,

    /// Stem a extrair.
    #[arg(long, value_enum, default_value_t = Stem::Vocals)]
    pub stem: Stem,

    /// Intensidade da separação.
    #[arg(long, value_enum, default_value_t = FilterLevel::Normal)]
    pub filter: FilterLevel,

    /// Rede neural a utilizar (orion apenas para vocals/voice).
    #[arg(long, value_enum, default_value_t = SplitterModel::Phoenix)]
    pub splitter: SplitterModel,

    /// Envia todos os arquivos em um único lote assíncrono.
    #[arg(long)]
    pub batch: bool,

    /// Intervalo entre consultas de status, em segundos.
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Tempo máximo de espera pelo lote, em segundos; jobs ainda pendentes
    /// são reportados como "timed out".
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Remove arquivo fonte e faixas do armazenamento remoto após o download.
    #[arg(long)]
    pub delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_minimal_invocation() {
        let cli = Cli::parse_from(["stemsplit", "--input", "songs/"]);
        assert_eq!(cli.input, PathBuf::from("songs/"));
        assert_eq!(cli.output, PathBuf::from("."));
        assert_eq!(cli.stem, Stem::Vocals);
        assert_eq!(cli.filter, FilterLevel::Normal);
        assert_eq!(cli.splitter, SplitterModel::Phoenix);
        assert!(!cli.batch);
        assert!(!cli.delete);
        assert!(cli.license.is_none());
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn cli_parses_processing_options() {
        let cli = Cli::parse_from([
            "stemsplit",
            "--input",
            "song.mp3",
            "--stem",
            "electric-guitar",
            "--filter",
            "aggressive",
            "--splitter",
            "orion",
        ]);
        assert_eq!(cli.stem, Stem::ElectricGuitar);
        assert_eq!(cli.filter, FilterLevel::Aggressive);
        assert_eq!(cli.splitter, SplitterModel::Orion);
    }

    #[test]
    fn cli_parses_batch_mode_flags() {
        let cli = Cli::parse_from([
            "stemsplit",
            "--license",
            "lic-123",
            "--input",
            "songs/",
            "--batch",
            "--poll-interval",
            "2",
            "--timeout",
            "600",
            "--delete",
        ]);
        assert!(cli.batch);
        assert!(cli.delete);
        assert_eq!(cli.license.as_deref(), Some("lic-123"));
        assert_eq!(cli.poll_interval, Some(2));
        assert_eq!(cli.timeout, Some(600));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
