// src/common/i18n.rs

use std::collections::HashMap;

/// Idiomas que a API sabe responder. O primeiro é o fallback.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "pt"];
pub const DEFAULT_LANGUAGE: &str = "en";

// Catálogo: (código, inglês, português)
const CATALOG: &[(&str, &str, &str)] = &[
    // --- Erros ---
    ("validation_failed", "One or more fields are invalid.", "Um ou mais campos são inválidos."),
    ("bulk_validation_failed", "Import rejected: one or more leads are invalid. Nothing was created.", "Importação rejeitada: um ou mais leads são inválidos. Nada foi criado."),
    ("bulk_payload_not_list", "Expected a list of leads.", "Era esperada uma lista de leads."),
    ("malformed_body", "The request body could not be read.", "Não foi possível ler o corpo da requisição."),
    ("invalid_credentials", "No active account found with the given credentials.", "Nenhuma conta ativa encontrada com essas credenciais."),
    ("invalid_token", "Authentication token is invalid or missing.", "Token de autenticação inválido ou ausente."),
    ("username_taken", "A user with that username already exists.", "Já existe um usuário com esse nome."),
    ("user_not_found", "User not found.", "Usuário não encontrado."),
    ("permission_denied", "You do not have permission to perform this action.", "Você não tem permissão para realizar esta ação."),
    ("lead_not_found", "Lead not found", "Lead não encontrado"),
    ("payment_not_found", "Payment record not found", "Pagamento não encontrado"),
    ("record_not_found", "Not found.", "Registro não encontrado."),
    ("record_conflict", "The record could not be saved because it conflicts with existing data.", "O registro não pôde ser salvo porque conflita com dados existentes."),
    ("conversion_failed", "Database error during creation: {detail}", "Erro de banco de dados durante a criação: {detail}"),
    ("task_creation_failed", "Task creation failed: Database conflict.", "Falha ao criar a tarefa: conflito no banco de dados."),
    ("receipt_missing", "No receipt file was uploaded.", "Nenhum arquivo de recibo foi enviado."),
    ("internal_error", "An unexpected error occurred.", "Ocorreu um erro inesperado."),
    // --- Sucesso ---
    ("lead_converted", "Deal finalized and Payment record created!", "Negócio fechado e pagamento registrado!"),
    ("payment_sent_to_tasks", "Sent to Task Manager!", "Enviado para o Gerenciador de Tarefas!"),
    ("lead_moved_to_sales_tasks", "Added to Sales Task Manager!", "Adicionado às tarefas de vendas!"),
    ("leads_imported", "Successfully imported {count} leads.", "{count} leads importados com sucesso."),
    ("leads_deleted", "Successfully deleted {count} leads.", "{count} leads removidos com sucesso."),
];

/// Catálogo de mensagens por idioma, montado uma vez no boot.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut en = HashMap::new();
        let mut pt = HashMap::new();
        for (key, en_msg, pt_msg) in CATALOG {
            en.insert(*key, *en_msg);
            pt.insert(*key, *pt_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("en", en);
        catalogs.insert("pt", pt);
        Self { catalogs }
    }

    /// Traduz uma chave. Idioma desconhecido cai no inglês; chave desconhecida volta ela mesma.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LANGUAGE)
                    .and_then(|catalog| catalog.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo placeholders `{nome}`.
    pub fn translate_with(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let mut message = self.translate(lang, key);
        for (name, value) in params {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }
}
