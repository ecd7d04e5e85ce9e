// src/common/db_utils.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// Parâmetros de listagem aceitos por todas as coleções.
// `status` e `date_after` só têm efeito em leads.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub status: Option<String>,
    pub date_after: Option<NaiveDate>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Página absurda satura no maior OFFSET possível (página vazia), nunca estoura.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// Termo de busca sem espaços nas pontas; vazio conta como ausente.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

// Envelope de resposta paginada
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, query: &ListQuery) -> Self {
        let page_size = query.page_size();
        Self {
            count,
            page: query.page(),
            page_size,
            total_pages: (count + page_size - 1) / page_size,
            results,
        }
    }
}

/// Resolve `ordering` contra a whitelist da entidade.
/// Retorna a coluna (sempre vinda da whitelist) e se é decrescente. Padrão: `-id`.
pub fn resolve_ordering(ordering: Option<&str>, allowed: &[&'static str]) -> (&'static str, bool) {
    let Some(raw) = ordering.map(str::trim).filter(|o| !o.is_empty()) else {
        return ("id", true);
    };
    let (field, descending) = match raw.strip_prefix('-') {
        Some(field) => (field, true),
        None => (raw, false),
    };
    allowed
        .iter()
        .find(|column| **column == field)
        .map(|column| (*column, descending))
        .unwrap_or(("id", true))
}

/// Monta o padrão de ILIKE escapando os curingas do próprio termo.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
