// src/models/access.rs

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Tipos de registro que a API expõe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum EntityKind {
    Lead,
    Customer,
    Payment,
    Task,
    Tender,
    TechData,
    SalesTask,
}

// Domínio que governa a escrita de cada tipo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Sales,
    Tech,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Lead,
        EntityKind::Customer,
        EntityKind::Payment,
        EntityKind::Task,
        EntityKind::Tender,
        EntityKind::TechData,
        EntityKind::SalesTask,
    ];

    pub fn domain(self) -> Domain {
        match self {
            EntityKind::Lead
            | EntityKind::Customer
            | EntityKind::Payment
            | EntityKind::SalesTask => Domain::Sales,
            EntityKind::Task | EntityKind::Tender | EntityKind::TechData => Domain::Tech,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Lead => "Lead",
            EntityKind::Customer => "Customer",
            EntityKind::Payment => "Payment",
            EntityKind::Task => "Task",
            EntityKind::Tender => "Tender",
            EntityKind::TechData => "TechData",
            EntityKind::SalesTask => "SalesTask",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Conjunto de linhas que o chamador enxerga.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    OwnedBy(i64),
}
