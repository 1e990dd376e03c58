use super::*;

pub async fn bootstrap_quality_head_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<BootstrapQualityHeadRequest>,
) -> ApiResult<StatusCode> {
    state
        .role_service
        .bootstrap_quality_head(&user, payload.registration_code.as_str())
        .await?;

    Ok(StatusCode::CREATED)
}

pub async fn role_of_handler(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state.role_service.role_of(subject.as_str()).await?;

    Ok(Json(RoleResponse {
        subject,
        role: role.map(|role| role.as_str().to_owned()),
    }))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RoleAssignmentRequest>,
) -> ApiResult<StatusCode> {
    let role = payload
        .role
        .as_deref()
        .map(Role::from_str)
        .transpose()?;

    state
        .role_service
        .assign_role(&user, payload.subject.as_str(), role)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
