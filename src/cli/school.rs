//! School account and role commands

use super::helpers::open_store;
use school_eval_core::{
    auth::hash_credential,
    config::Settings,
    error::{EvalError, Result},
    storage::{NewSchool, SurveyStore},
    types::UserRoleType,
};
use tracing::debug;
use uuid::Uuid;

/// Register a school with a bcrypt credential
pub async fn add_school(
    settings: &Settings,
    code: String,
    name: String,
    password: String,
    region: Option<String>,
    school_type: Option<String>,
) -> Result<()> {
    let store = open_store(settings, false).await?;

    debug!("Hashing credential for {}", code);
    let cost = settings.auth.bcrypt_cost;
    let password_hash = tokio::task::spawn_blocking(move || hash_credential(&password, cost))
        .await
        .map_err(|e| EvalError::Other(format!("credential hashing aborted: {}", e)))??;

    let school = store
        .create_school(&NewSchool {
            school_code: code,
            school_name: name,
            password_hash,
            region,
            school_type,
        })
        .await?;

    println!("Registered school {} ({})", school.school_code, school.school_name);
    println!("   id: {}", school.id);
    Ok(())
}

/// Grant a user a role within a school
pub async fn grant_role(
    settings: &Settings,
    user_id: Uuid,
    school_code: &str,
    role: &str,
) -> Result<()> {
    let role: UserRoleType = role.parse()?;
    let store = open_store(settings, false).await?;

    let school = store
        .find_school_by_code(school_code)
        .await?
        .ok_or_else(|| EvalError::not_found("school", school_code))?;

    let granted = store.assign_role(user_id, school.id, role).await?;
    println!(
        "Granted {} on {} to user {}",
        granted.role, school.school_code, granted.user_id
    );
    Ok(())
}

/// Print the roles granted within a school
pub async fn list_roles(settings: &Settings, school_code: &str) -> Result<()> {
    let store = open_store(settings, false).await?;

    let school = store
        .find_school_by_code(school_code)
        .await?
        .ok_or_else(|| EvalError::not_found("school", school_code))?;

    let roles = store.list_roles(school.id).await?;
    if roles.is_empty() {
        println!("No roles granted on {}", school.school_code);
        return Ok(());
    }

    println!("Roles on {} ({})", school.school_code, school.school_name);
    for role in &roles {
        println!(
            "   {}  {:<8} since {}",
            role.user_id,
            role.role.as_str(),
            role.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
