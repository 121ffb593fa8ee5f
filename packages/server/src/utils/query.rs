use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;

use crate::models::shared::{escape_like, page_offset};

/// Condition matching rows where any of `columns` contains `term`, ignoring case.
///
/// Returns `None` for a blank term so callers can skip the filter.
pub fn contains_any<C>(columns: &[C], term: &str) -> Option<Condition>
where
    C: ColumnTrait,
{
    let term = escape_like(term.trim());
    if term.is_empty() {
        return None;
    }

    let pattern = format!("%{}%", term.to_lowercase());
    let condition = columns.iter().fold(Condition::any(), |any, &column| {
        any.add(
            Expr::expr(Func::lower(Expr::col(column)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    });
    Some(condition)
}

/// Read one page of `select` in the given order, plus the total number of matching rows.
///
/// `page` is 1-based. The order should end on a unique column so pages are stable.
pub async fn fetch_page<E, C>(
    db: &C,
    select: Select<E>,
    order: &[(E::Column, Order)],
    page: u64,
    per_page: u64,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let total = select.clone().paginate(db, per_page).num_items().await?;

    let rows = order
        .iter()
        .fold(select, |select, (column, dir)| {
            select.order_by(*column, dir.clone())
        })
        .offset(Some(page_offset(page, per_page)))
        .limit(Some(per_page))
        .all(db)
        .await?;

    Ok((rows, total))
}
