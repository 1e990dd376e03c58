use super::*;

pub async fn list_inspections_handler(
    State(state): State<AppState>,
    Query(query): Query<ListInspectionsQuery>,
) -> ApiResult<Json<Vec<InspectionResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(InspectionStatus::from_str)
        .transpose()?;

    let inspections = state
        .inspection_service
        .list_inspections(InspectionFilter {
            status,
            product_id: query.product_id.map(ProductId::from_uuid),
            created_by: query.created_by,
        })
        .await?
        .into_iter()
        .map(InspectionResponse::from)
        .collect();

    Ok(Json(inspections))
}

pub async fn create_inspection_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateInspectionRequest>,
) -> ApiResult<(StatusCode, Json<InspectionResponse>)> {
    let inspection = state
        .inspection_service
        .create_inspection(
            &user,
            CreateInspectionInput {
                product_id: ProductId::from_uuid(payload.product_id),
                batch_number: payload.batch_number,
                remarks: payload.remarks,
                results: payload.results.into_iter().map(Into::into).collect(),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InspectionResponse::from(inspection)),
    ))
}

pub async fn get_inspection_handler(
    State(state): State<AppState>,
    Path(inspection_id): Path<uuid::Uuid>,
) -> ApiResult<Json<InspectionDetailResponse>> {
    let detail = state
        .inspection_service
        .get_inspection(InspectionId::from_uuid(inspection_id))
        .await?;

    Ok(Json(InspectionDetailResponse {
        inspection: InspectionResponse::from(detail.inspection),
        results: detail
            .results
            .into_iter()
            .map(InspectionResultResponse::from)
            .collect(),
        evidence: detail
            .evidence
            .into_iter()
            .map(EvidenceResponse::from)
            .collect(),
        history: detail
            .history
            .into_iter()
            .map(ApprovalHistoryEntryResponse::from)
            .collect(),
    }))
}

pub async fn decide_inspection_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(inspection_id): Path<uuid::Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> ApiResult<Json<InspectionResponse>> {
    let action = payload.approval_action()?;

    let inspection = state
        .inspection_service
        .decide(
            InspectionId::from_uuid(inspection_id),
            &user,
            action,
            payload.comment.as_str(),
        )
        .await?;

    Ok(Json(InspectionResponse::from(inspection)))
}

pub async fn update_inspection_details_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(inspection_id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateInspectionDetailsRequest>,
) -> ApiResult<Json<InspectionResponse>> {
    let inspection = state
        .inspection_service
        .update_details(
            &user,
            InspectionId::from_uuid(inspection_id),
            UpdateDetailsInput {
                batch_number: payload.batch_number,
                remarks: payload.remarks,
            },
        )
        .await?;

    Ok(Json(InspectionResponse::from(inspection)))
}

pub async fn add_evidence_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(inspection_id): Path<uuid::Uuid>,
    Json(payload): Json<AddEvidenceRequest>,
) -> ApiResult<(StatusCode, Json<EvidenceResponse>)> {
    let evidence = state
        .inspection_service
        .add_evidence(
            &user,
            InspectionId::from_uuid(inspection_id),
            payload.uri,
            payload.description,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(EvidenceResponse::from(evidence))))
}
