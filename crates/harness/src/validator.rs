//! End-state validation of a completed run.

use common::Identifier;
use inventory_store::{GoodsRow, InventoryStore};

use crate::config::RunConfig;
use crate::error::ValidationError;

/// Re-read end state plus the figures it was judged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub expected_stock: u32,
    pub final_row: GoodsRow,
    pub orders: u64,
}

/// Stock left over after serially granting as many attempts as the stock
/// covers.
fn expected_final_stock(initial_stock: u32, config: &RunConfig) -> u32 {
    let demanded = config.total_submissions as u64 * u64::from(config.quantity_per_order);
    // Partial fills do not exist, so the drain stops at the largest
    // multiple of the quantity that fits.
    let grantable = (u64::from(initial_stock) / u64::from(config.quantity_per_order))
        .min(demanded / u64::from(config.quantity_per_order));
    (u64::from(initial_stock) - grantable * u64::from(config.quantity_per_order)) as u32
}

/// Re-reads the goods row and judges the run's end state.
///
/// Correct strategies must land exactly on the serial outcome. The
/// unguarded baseline must show strictly more stock than that, which is
/// the lost-update signature; when it does not (including every
/// single-worker run, where no interleaving exists) the exact check
/// applies, and an exact unguarded multi-worker result is reported as
/// [`ValidationError::LostUpdateNotReproduced`] rather than a pass.
pub async fn validate_run<K, S>(
    store: &S,
    goods_id: &K,
    initial: GoodsRow,
    config: &RunConfig,
) -> Result<ValidationReport, ValidationError>
where
    K: Identifier,
    S: InventoryStore<K>,
{
    let final_row = store.read_row(goods_id).await?;
    let orders = store.count_orders(goods_id).await?;

    if final_row.total() != initial.total() {
        return Err(ValidationError::InvariantViolated {
            initial_total: initial.total(),
            final_total: final_row.total(),
        });
    }

    let expected_stock = expected_final_stock(initial.stock, config);
    let expected_sales = initial.sales + (initial.stock - expected_stock);
    let report = ValidationReport {
        expected_stock,
        final_row,
        orders,
    };

    let exact_required = config.strategy.is_correct() || config.thread_count == 1;
    if exact_required {
        if final_row.stock != expected_stock {
            return Err(ValidationError::StockMismatch {
                expected: expected_stock,
                actual: final_row.stock,
            });
        }
        if final_row.sales != expected_sales {
            return Err(ValidationError::SalesMismatch {
                expected: expected_sales,
                actual: final_row.sales,
            });
        }
        return Ok(report);
    }

    if final_row.stock <= expected_stock {
        return Err(ValidationError::LostUpdateNotReproduced { expected_stock });
    }
    Ok(report)
}
