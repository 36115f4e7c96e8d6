//! Saída de terminal do esteira: spinner durante o recálculo e resumo colorido.
//!
//! Usa `indicatif` para o spinner e `console` para as cores.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::Recalculation;
use crate::error::EngineError;
use crate::model::{ClientWorkflowStatus, StepStatus};

/// Indicador visual de um lote de recalculações.
pub struct RecalcProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
}

impl RecalcProgress {
    /// Inicia o spinner com a quantidade de clientes do lote.
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("Recalculando {total} cliente(s)..."));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
        }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Imprime o resultado de um cliente: resumo das etapas ou o erro.
    pub fn report(&self, client_id: &str, result: &Result<Recalculation, EngineError>) {
        match result {
            Ok(done) => {
                println!(
                    "  {} {client_id} ({})",
                    self.green.apply_to("✓"),
                    self.dim.apply_to(format!("{:?}", done.write).to_lowercase())
                );
                self.print_steps(&done.record);
            }
            Err(e) => {
                println!("  {} {client_id}: {e}", self.red.apply_to("✗"));
            }
        }
    }

    /// Imprime o registro e os sinais em JSON.
    pub fn print_json(&self, done: &Recalculation) {
        println!("{}", serde_json::to_string_pretty(done).unwrap_or_default());
    }

    fn print_steps(&self, record: &ClientWorkflowStatus) {
        let rows = [
            ("cadastro", flag(record.client_registered)),
            ("checklist", record.checklist_status.to_string()),
            (
                "bau",
                format!(
                    "{} / {}",
                    flag(record.admission_requested),
                    step(record.admission_status)
                ),
            ),
            ("bo", step(record.police_report_status)),
            ("laudo", step(record.medical_report_status)),
            ("protocolo", step(record.filing_status)),
            ("pericia", flag(record.exam_cleared)),
            ("financeiro", flag(record.financial_cleared)),
            ("juridico", flag(record.legal_cleared)),
        ];
        for (label, value) in rows {
            let styled = match value.as_str() {
                "sim" | "concluido" => self.green.apply_to(value.clone()),
                "-" | "nao" | "pendente" => self.dim.apply_to(value.clone()),
                _ => self.yellow.apply_to(value.clone()),
            };
            println!("      {label:<11} {styled}");
        }
    }
}

fn flag(value: bool) -> String {
    if value { "sim" } else { "nao" }.to_string()
}

fn step(status: Option<StepStatus>) -> String {
    status.map_or_else(|| "-".to_string(), |s| s.to_string())
}
