use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use esteira::cli::{Cli, Command};
use esteira::config::EsteiraConfig;
use esteira::model::{
    AdmissionRecord, ChecklistRecord, ClaimFiling, ClientProfile, DocumentRef, ExamRecord,
};
use esteira::store::{MemoryStore, RestStore, WorkflowSink, WorkflowSource};
use esteira::ui::RecalcProgress;
use esteira::{WorkflowEngine, WorkflowEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Recalcular { client_ids, json } => {
            let config = EsteiraConfig::load_from(&cli.config)?;
            if config.api_key.is_empty() {
                bail!("api_key missing: set it in {} or ESTEIRA_API_KEY", cli.config.display());
            }
            let store = RestStore::new(
                &config.base_url,
                config.api_key.clone(),
                config.tables.clone(),
                config.timeout(),
                config.connect_timeout(),
            )?;
            run_batch(WorkflowEngine::new(store), &client_ids, json).await
        }
        Command::Demo => {
            let store = MemoryStore::new();
            seed_demo(&store).await;
            let ids = ["cli-001", "cli-002", "cli-003"].map(String::from);
            run_batch(WorkflowEngine::new(store), &ids, false).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_batch<S>(engine: WorkflowEngine<S>, client_ids: &[String], json: bool) -> Result<()>
where
    S: WorkflowSource + WorkflowSink + 'static,
{
    let engine = Arc::new(engine);

    // Assinante das visões em cache: aqui apenas registra o que ficou desatualizado.
    let mut events = engine.events().subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(WorkflowEvent::Recalculated {
            client_id,
            invalidated,
        }) = events.recv().await
        {
            let keys: Vec<String> = invalidated.iter().map(ToString::to_string).collect();
            tracing::debug!(client_id, stale = ?keys, "cache views invalidated");
        }
    });

    let progress = RecalcProgress::start(client_ids.len());
    let results = engine.recalculate_many(client_ids).await;
    progress.finish();

    let mut failed = 0;
    for (client_id, result) in &results {
        match (json, result) {
            (true, Ok(done)) => progress.print_json(done),
            _ => progress.report(client_id, result),
        }
        if result.is_err() {
            failed += 1;
        }
    }

    drop(engine);
    listener.abort();

    if failed > 0 {
        bail!("{failed} of {} recalculation(s) failed", results.len());
    }
    Ok(())
}

async fn seed_demo(store: &MemoryStore) {
    // Checklist parcial, BAU solicitado e protocolo em análise.
    store
        .seed("cli-001", |c| {
            c.client = Some(ClientProfile::default());
            c.checklist = Some(ChecklistRecord::from(json!({
                "id": "chk-001",
                "status": "em_preenchimento",
                "concluded_at": null,
                "bo_status": "sim_pendente",
                "acidente_data": "2024-05-10",
                "acidente_local": "Av. Brasil",
                "vitima_condutor": true,
                "hospital_atendimento": null,
                "testemunhas": []
            })));
            c.admissions = vec![AdmissionRecord { status: "solicitado".into() }];
            c.filings = vec![ClaimFiling { status: "em_analise".into() }];
        })
        .await;

    // Só documentos enviados, sem checklist.
    store
        .seed("cli-002", |c| {
            c.client = Some(ClientProfile::default());
            c.documents = vec![
                DocumentRef::named("PRONTUARIO_HOSPITALAR.pdf"),
                DocumentRef::named("boletim_ocorrencia.pdf"),
                DocumentRef::named("laudo_ortopedico.pdf"),
                DocumentRef::named("comprovante_conta_nubank.png"),
            ];
        })
        .await;

    // Caso avançado: perícia realizada, financeiro lançado e processo judicial.
    store
        .seed("cli-003", |c| {
            c.client = Some(ClientProfile {
                police_report: true,
                police_report_number: Some("2024/001234".into()),
            });
            c.checklist = Some(ChecklistRecord::from(json!({
                "id": "chk-003",
                "status": "concluido",
                "concluded_at": "2024-04-01T12:00:00Z"
            })));
            c.filings = vec![ClaimFiling { status: "pago".into() }];
            c.exams = vec![ExamRecord { status: "realizada".into() }];
            c.financial_entries = 1;
            c.judicial_filings = 1;
            c.workflow = json!({
                "client_id": "cli-003",
                "laudo_medico_url": "https://arquivos/laudo-003.pdf",
                "cid": "S82.1"
            })
            .as_object()
            .cloned();
        })
        .await;
}
