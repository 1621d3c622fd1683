use crate::record::{Record, DELIMITER};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

const OUT_TYPE_AMOUNT_CLIENTS: &str = "001";
const OUT_TYPE_AMOUNT_SALESMAN: &str = "002";
const OUT_TYPE_EXPENSIVE_SALE: &str = "003";
const OUT_TYPE_WORST_SALESMAN: &str = "004";

const OUT_LABEL_AMOUNT_CLIENTS: &str = "AmountClients";
const OUT_LABEL_AMOUNT_SALESMAN: &str = "AmountSalesman";
const OUT_LABEL_EXPENSIVE_SALE: &str = "MostExpensiveSale";
const OUT_LABEL_WORST_SALESMAN: &str = "WorstSalesman";

/// Running total for one salesman name, with the ordinal at which the name
/// first appeared so that ties can break deterministically to the earliest
/// name in file order.
#[derive(Debug)]
struct NameTotal {
    total: Decimal,
    first_seen: usize,
}

/// Running statistics for one file scan.
///
/// Created fresh per file, mutated only by the single-threaded line scan,
/// consumed once by [`Aggregates::finish`]. Nothing here is shared between
/// concurrently processed files.
///
/// The requirement leaves open whether client and salesman records can
/// repeat, so both identity collections are sets and duplicates collapse.
/// Sales totals are keyed by the free-text name on sale lines, which is
/// intentionally distinct from the CPF identity set.
#[derive(Debug, Default)]
pub struct Aggregates {
    client_cnpjs: HashSet<String>,
    salesman_cpfs: HashSet<String>,
    sales_by_name: HashMap<String, NameTotal>,
    best_sale_id: Option<String>,
    best_sale_value: Decimal,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed record into the running statistics.
    pub fn apply(&mut self, record: Record) {
        match record {
            Record::Salesman { cpf } => {
                self.salesman_cpfs.insert(cpf);
            }
            Record::Customer { cnpj } => {
                self.client_cnpjs.insert(cnpj);
            }
            Record::Sale {
                id,
                total,
                salesman,
            } => {
                // Strictly greater: on equal value the earliest-seen sale
                // keeps the title. The initial best value is zero, so a sale
                // totalling zero never becomes the most expensive one.
                if total > self.best_sale_value {
                    self.best_sale_value = total;
                    self.best_sale_id = Some(id);
                }

                let next_ordinal = self.sales_by_name.len();
                let entry = self.sales_by_name.entry(salesman).or_insert(NameTotal {
                    total: Decimal::ZERO,
                    first_seen: next_ordinal,
                });
                entry.total += total;
            }
        }
    }

    /// Derive the final summary, consuming the running state.
    pub fn finish(self) -> FileSummary {
        // Minimum accumulated total wins; ties break to the name seen first
        // in file order so the result does not depend on map iteration order.
        let worst_salesman = self
            .sales_by_name
            .iter()
            .min_by(|a, b| {
                a.1.total
                    .cmp(&b.1.total)
                    .then(a.1.first_seen.cmp(&b.1.first_seen))
            })
            .map(|(name, _)| name.clone());

        FileSummary {
            amount_of_clients: self.client_cnpjs.len(),
            amount_of_salesmen: self.salesman_cpfs.len(),
            most_expensive_sale_id: self.best_sale_id,
            worst_salesman,
        }
    }
}

/// Final statistics for one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub amount_of_clients: usize,
    pub amount_of_salesmen: usize,
    /// Absent when no sale line had a value greater than zero.
    pub most_expensive_sale_id: Option<String>,
    /// Absent when the file contained no sale lines.
    pub worst_salesman: Option<String>,
}

impl FileSummary {
    /// Render the four fixed output lines.
    ///
    /// Absent sale-derived fields render as empty values rather than raising
    /// an error.
    pub fn render(&self) -> String {
        let best_sale = self.most_expensive_sale_id.as_deref().unwrap_or("");
        let worst = self.worst_salesman.as_deref().unwrap_or("");
        format!(
            "{t1}{d}{l1}{d}{clients}\n{t2}{d}{l2}{d}{salesmen}\n{t3}{d}{l3}{d}{best_sale}\n{t4}{d}{l4}{d}{worst}\n",
            d = DELIMITER,
            t1 = OUT_TYPE_AMOUNT_CLIENTS,
            l1 = OUT_LABEL_AMOUNT_CLIENTS,
            clients = self.amount_of_clients,
            t2 = OUT_TYPE_AMOUNT_SALESMAN,
            l2 = OUT_LABEL_AMOUNT_SALESMAN,
            salesmen = self.amount_of_salesmen,
            t3 = OUT_TYPE_EXPENSIVE_SALE,
            l3 = OUT_LABEL_EXPENSIVE_SALE,
            t4 = OUT_TYPE_WORST_SALESMAN,
            l4 = OUT_LABEL_WORST_SALESMAN,
        )
    }
}
