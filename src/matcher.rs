//! Inferência de categorias a partir do nome dos arquivos enviados.
//!
//! Cada categoria tem um conjunto fixo de palavras-chave em [`KEYWORD_TABLE`].
//! Um documento pertence à categoria quando o nome em maiúsculas contém
//! qualquer uma delas como substring (não é busca por palavra inteira, então
//! "BO" também casa com "BOLETO").

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::DocumentRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    /// Boletim de atendimento de urgência / prontuário (BAU).
    Admission,
    /// Boletim de ocorrência (BO) ou CAT.
    PoliceReport,
    /// Laudo, atestado ou parecer médico.
    MedicalReport,
    /// Comprovante de conta bancária.
    BankAccount,
    /// Carteira nacional de habilitação.
    DriverLicense,
    /// Exame de imagem.
    ImagingExam,
    /// Comprovante de residência.
    ProofOfResidence,
    /// Carteira de trabalho.
    WorkRecord,
}

impl DocumentCategory {
    pub fn keywords(self) -> &'static [&'static str] {
        KEYWORD_TABLE
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentCategory::Admission => "bau",
            DocumentCategory::PoliceReport => "bo",
            DocumentCategory::MedicalReport => "laudo",
            DocumentCategory::BankAccount => "conta_bancaria",
            DocumentCategory::DriverLicense => "cnh",
            DocumentCategory::ImagingExam => "exame_imagem",
            DocumentCategory::ProofOfResidence => "comprovante_residencia",
            DocumentCategory::WorkRecord => "ctps",
        };
        f.write_str(label)
    }
}

/// Palavras-chave por categoria, já em maiúsculas.
pub const KEYWORD_TABLE: &[(DocumentCategory, &[&str])] = &[
    (DocumentCategory::Admission, &["BAU", "PRONTUARIO", "PRONTUÁRIO"]),
    (DocumentCategory::PoliceReport, &["BO", "BOLETIM", "CAT"]),
    (DocumentCategory::MedicalReport, &["LAUDO", "ATESTADO", "PARECER"]),
    (DocumentCategory::BankAccount, &["CONTA", "BANCARI", "PICPAY", "NUBANK"]),
    (DocumentCategory::DriverLicense, &["CNH", "HABILITACAO", "HABILITAÇÃO"]),
    (
        DocumentCategory::ImagingExam,
        &["RAIO", "RX", "TOMOGRAFIA", "RESSONANCIA", "RESSONÂNCIA", "ULTRASSOM"],
    ),
    (
        DocumentCategory::ProofOfResidence,
        &["RESIDENCIA", "RESIDÊNCIA", "ENDERECO", "ENDEREÇO"],
    ),
    (DocumentCategory::WorkRecord, &["CTPS", "CARTEIRA DE TRABALHO"]),
];

/// Resultado do matcher: uma entrada por categoria da tabela.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocumentSignals(BTreeMap<DocumentCategory, bool>);

impl DocumentSignals {
    pub fn has(&self, category: DocumentCategory) -> bool {
        self.0.get(&category).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocumentCategory, bool)> + '_ {
        self.0.iter().map(|(category, hit)| (*category, *hit))
    }
}

/// Testa um único nome de arquivo contra as palavras-chave de uma categoria.
pub fn name_matches(file_name: &str, category: DocumentCategory) -> bool {
    let upper = file_name.to_uppercase();
    category.keywords().iter().any(|kw| upper.contains(kw))
}

/// Reduz a lista de documentos a um mapa categoria → encontrado.
pub fn match_documents(documents: &[DocumentRef]) -> DocumentSignals {
    let upper_names: Vec<String> = documents
        .iter()
        .map(|doc| doc.file_name.to_uppercase())
        .collect();

    let signals = KEYWORD_TABLE
        .iter()
        .map(|&(category, keywords)| {
            let hit = upper_names
                .iter()
                .any(|name| keywords.iter().any(|kw| name.contains(kw)));
            (category, hit)
        })
        .collect();

    DocumentSignals(signals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(names: &[&str]) -> Vec<DocumentRef> {
        names.iter().map(|n| DocumentRef::named(*n)).collect()
    }

    #[test]
    fn empty_list_has_every_category_false() {
        let signals = match_documents(&[]);
        assert_eq!(signals.iter().count(), KEYWORD_TABLE.len());
        assert!(signals.iter().all(|(_, hit)| !hit));
    }

    #[test]
    fn admission_from_prontuario() {
        let signals = match_documents(&docs(&["PRONTUARIO_HOSPITALAR.pdf"]));
        assert!(signals.has(DocumentCategory::Admission));
        assert!(!signals.has(DocumentCategory::MedicalReport));
    }

    #[test]
    fn accented_lowercase_name_matches() {
        let signals = match_documents(&docs(&["prontuário do hospital.jpg"]));
        assert!(signals.has(DocumentCategory::Admission));
    }

    #[test]
    fn police_report_from_lowercase_boletim() {
        let signals = match_documents(&docs(&["boletim_ocorrencia.pdf"]));
        assert!(signals.has(DocumentCategory::PoliceReport));
    }

    #[test]
    fn substring_match_is_not_whole_word() {
        // "BOLETO" contém "BO".
        assert!(name_matches("boleto_agosto.pdf", DocumentCategory::PoliceReport));
        assert!(name_matches("extrato_nubank.png", DocumentCategory::BankAccount));
        assert!(name_matches("dados bancarios.pdf", DocumentCategory::BankAccount));
    }

    #[test]
    fn medical_report_keywords() {
        assert!(name_matches("Atestado medico.pdf", DocumentCategory::MedicalReport));
        assert!(name_matches("parecer-ortopedia.pdf", DocumentCategory::MedicalReport));
        assert!(!name_matches("receita.pdf", DocumentCategory::MedicalReport));
    }

    #[test]
    fn signal_true_iff_some_name_contains_a_keyword() {
        let list = docs(&["foto.jpg", "cnh_frente.png", "Laudo.PDF", "rg.pdf"]);
        let signals = match_documents(&list);
        for (category, hit) in signals.iter() {
            let expected = list.iter().any(|d| name_matches(&d.file_name, category));
            assert_eq!(hit, expected, "category {category}");
        }
        assert!(signals.has(DocumentCategory::DriverLicense));
        assert!(signals.has(DocumentCategory::MedicalReport));
    }

    #[test]
    fn every_category_has_keywords() {
        for (category, keywords) in KEYWORD_TABLE {
            assert!(!keywords.is_empty(), "{category} sem palavras-chave");
            assert_eq!(category.keywords(), *keywords);
        }
    }
}
