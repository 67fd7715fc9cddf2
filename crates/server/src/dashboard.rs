use api_types::dashboard::{CategoryTotalView, DashboardQuery, DashboardView};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{ServerError, current_user_id, server::ServerState};
use engine::CategoryTotal;

fn category_total_view(total: CategoryTotal) -> CategoryTotalView {
    CategoryTotalView {
        category_id: total.category_id,
        name: total.name,
        total_minor: total.total_minor,
    }
}

pub async fn get(
    Extension(user): Extension<engine::users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardView>, ServerError> {
    let user_id = current_user_id(&user)?;
    let summary = state.engine.dashboard(user_id, query.from, query.to).await?;
    Ok(Json(DashboardView {
        total_balance_minor: summary.total_balance_minor,
        income_minor: summary.income_minor,
        expense_minor: summary.expense_minor,
        goals_saved_minor: summary.goals_saved_minor,
        goals_target_minor: summary.goals_target_minor,
        incomes_by_category: summary
            .incomes_by_category
            .into_iter()
            .map(category_total_view)
            .collect(),
        expenses_by_category: summary
            .expenses_by_category
            .into_iter()
            .map(category_total_view)
            .collect(),
    }))
}
