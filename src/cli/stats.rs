//! Project statistics command

use super::helpers::open_store;
use school_eval_core::{
    config::Settings,
    error::Result,
    stats::compute_project_stats,
    storage::SurveyStore,
    types::ProjectId,
};

/// Print the statistics of a project as a table or JSON
pub async fn handle(settings: &Settings, project_id: &str, json: bool) -> Result<()> {
    let project_id = ProjectId::from_string(project_id)?;
    let store = open_store(settings, false).await?;

    let project = store.get_project(project_id).await?;
    let stats = compute_project_stats(store.as_ref(), project_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} ({}년, {})", project.title, project.year, project.status);
    println!("   Questions: {}", stats.total_questions);
    println!("   Responses: {}", stats.total_responses);
    println!("   Average rating: {:.2}", stats.average_rating);
    println!();
    println!("   {:<8} {:>9} {:>8} {:>11}", "type", "responses", "average", "completion");
    for row in &stats.chart_data {
        let completion = stats
            .completion_rate
            .get(&row.respondent_type)
            .map(|r| format!("{}%", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<8} {:>9} {:>8.2} {:>11}",
            row.respondent_type.as_str(),
            row.response_count,
            row.average_score,
            completion
        );
    }
    Ok(())
}
