// src/services/receipt_storage.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;

pub const MEDIA_URL_PREFIX: &str = "/media";
const RECEIPTS_DIR: &str = "receipts";

/// Arquivo recebido no campo `receipt` de um formulário multipart.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Onde os recibos anexados aos pagamentos ficam guardados.
/// `store` devolve a referência pública que vai para `payments.receipt`.
#[async_trait]
pub trait ReceiptStorage: Send + Sync {
    async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError>;

    /// Remove o arquivo de uma referência devolvida por `store`.
    /// Referência desconhecida ou arquivo já removido não é erro.
    async fn discard(&self, reference: &str) -> Result<(), AppError>;
}

/// Descarta sem propagar: a falha só vai para o log.
pub async fn discard_quietly(storage: &dyn ReceiptStorage, reference: &str) {
    if let Err(e) = storage.discard(reference).await {
        tracing::warn!(receipt = %reference, error = %e, "⚠️ Falha ao remover recibo");
    }
}

// Disco local sob MEDIA_ROOT/receipts
#[derive(Debug, Clone)]
pub struct LocalReceiptStorage {
    media_root: PathBuf,
}

impl LocalReceiptStorage {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self { media_root: media_root.into() }
    }
}

/// Extensão do nome enviado, só se for curta e alfanumérica.
fn safe_extension(original_name: Option<&str>) -> Option<String> {
    let ext = Path::new(original_name?).extension()?.to_str()?;
    let valid = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

// Só nomes gerados por `store`: sem separadores e sem começar com ponto
fn stored_file_name(reference: &str) -> Option<&str> {
    let name = reference
        .strip_prefix(MEDIA_URL_PREFIX)?
        .strip_prefix('/')?
        .strip_prefix(RECEIPTS_DIR)?
        .strip_prefix('/')?;
    let valid = !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\']);
    valid.then_some(name)
}

#[async_trait]
impl ReceiptStorage for LocalReceiptStorage {
    async fn store(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String, AppError> {
        let dir = self.media_root.join(RECEIPTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = match safe_extension(original_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::debug!(file = %file_name, size = bytes.len(), "📎 Recibo gravado");
        Ok(format!("{MEDIA_URL_PREFIX}/{RECEIPTS_DIR}/{file_name}"))
    }

    async fn discard(&self, reference: &str) -> Result<(), AppError> {
        let Some(file_name) = stored_file_name(reference) else {
            tracing::debug!(receipt = %reference, "Referência fora de /media/receipts, nada a remover");
            return Ok(());
        };

        match tokio::fs::remove_file(self.media_root.join(RECEIPTS_DIR).join(file_name)).await {
            Ok(()) => {
                tracing::debug!(file = %file_name, "🗑️ Recibo removido");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("recibo.PNG"), Some("png"))]
    #[case(Some("scan.final.pdf"), Some("pdf"))]
    #[case(Some("sem-extensao"), None)]
    #[case(Some("x.p$p"), None)]
    #[case(None, None)]
    fn keeps_only_safe_extensions(#[case] name: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(safe_extension(name).as_deref(), expected);
    }

    #[tokio::test]
    async fn stores_file_under_receipts_and_returns_media_reference() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalReceiptStorage::new(dir.path());

        let reference = storage.store(Some("nota.jpg"), b"conteudo").await.unwrap();

        assert!(reference.starts_with("/media/receipts/"));
        assert!(reference.ends_with(".jpg"));

        let relative = reference.trim_start_matches("/media/");
        let written = tokio::fs::read(dir.path().join(relative)).await.unwrap();
        assert_eq!(written, b"conteudo");
    }

    #[rstest]
    #[case("/media/receipts/abc.pdf", Some("abc.pdf"))]
    #[case("/media/receipts/", None)]
    #[case("/media/receipts/../segredo", None)]
    #[case("/media/receipts/.env", None)]
    #[case("/media/outros/abc.pdf", None)]
    #[case("https://cdn.exemplo.com/abc.pdf", None)]
    fn only_references_inside_receipts_map_to_files(#[case] reference: &str, #[case] expected: Option<&str>) {
        assert_eq!(stored_file_name(reference), expected);
    }

    #[tokio::test]
    async fn discard_removes_a_stored_file_and_tolerates_repeats() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalReceiptStorage::new(dir.path());

        let reference = storage.store(Some("nota.pdf"), b"pdf").await.unwrap();
        let path = dir.path().join(reference.trim_start_matches("/media/"));
        assert!(path.exists());

        storage.discard(&reference).await.unwrap();
        assert!(!path.exists());

        // Segunda remoção não falha
        storage.discard(&reference).await.unwrap();
    }

    #[tokio::test]
    async fn discard_ignores_references_it_did_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("segredo.txt");
        tokio::fs::write(&outside, b"fica").await.unwrap();

        let storage = LocalReceiptStorage::new(dir.path().join("media"));
        storage.discard("/media/receipts/../../segredo.txt").await.unwrap();

        assert!(outside.exists());
    }
}
