//! Raw schedule rows
//!
//! A [`RawRecord`] is one exported schedule row with a fixed set of columns.
//! Every column is optional; absent columns are explicit [`Cell::Null`] values
//! rather than missing map keys. Column keys are accepted in snake_case and as
//! the headers produced by the pt-BR project export.

use serde::{Deserialize, Serialize};

use super::cell::Cell;

/// One row of a schedule export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(alias = "Id", alias = "ID")]
    pub id: Cell,

    #[serde(alias = "Nome")]
    pub name: Cell,

    #[serde(alias = "Ativo")]
    pub active: Cell,

    #[serde(alias = "Resumo")]
    pub summary: Cell,

    #[serde(alias = "Predecessoras")]
    pub predecessors: Cell,

    #[serde(alias = "Início")]
    pub start: Cell,

    #[serde(alias = "Término")]
    pub end: Cell,

    #[serde(alias = "Início_real")]
    pub actual_start: Cell,

    #[serde(alias = "Término_real")]
    pub actual_end: Cell,

    #[serde(alias = "Duração")]
    pub duration: Cell,

    #[serde(alias = "Trabalho")]
    pub work: Cell,

    #[serde(alias = "Peso")]
    pub weight: Cell,

    #[serde(alias = "Número_da_estrutura_de_tópicos")]
    pub outline_number: Cell,

    #[serde(alias = "Nível_da_estrutura_de_tópicos")]
    pub outline_level: Cell,

    /// Explicit module assignment
    #[serde(alias = "MÓDULO_ASC")]
    pub module: Cell,

    /// Block identifier as typed by the planner
    #[serde(alias = "ID_Bloco")]
    pub block: Cell,

    #[serde(alias = "SAP_Diagrama_de_Rede")]
    pub network_id: Cell,

    #[serde(alias = "SAP_Tarefa")]
    pub sap_task_id: Cell,

    #[serde(alias = "SAP_Elemento_PEP")]
    pub pep_id: Cell,

    #[serde(alias = "Agrupamento")]
    pub grouping: Cell,
}

impl RawRecord {
    /// Creates a record with only a name and outline level, used by tests and fixtures
    pub fn named(name: impl Into<String>, level: i64) -> Self {
        Self {
            name: Cell::Text(name.into()),
            outline_level: Cell::from(level),
            ..Self::default()
        }
    }
}
