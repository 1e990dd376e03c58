use super::*;

pub async fn list_products_handler(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let products = state
        .catalog_service
        .list_products(query.active_only.unwrap_or(false))
        .await?
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok(Json(products))
}

pub async fn create_product_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .catalog_service
        .create_product(
            &user,
            CreateProductInput {
                name: payload.name,
                part_number: payload.part_number,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn deactivate_product_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(product_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .deactivate_product(&user, ProductId::from_uuid(product_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_specifications_handler(
    State(state): State<AppState>,
    Path(product_id): Path<uuid::Uuid>,
) -> ApiResult<Json<Vec<SpecificationResponse>>> {
    let specifications = state
        .catalog_service
        .list_specifications(ProductId::from_uuid(product_id))
        .await?
        .into_iter()
        .map(SpecificationResponse::from)
        .collect();

    Ok(Json(specifications))
}

pub async fn create_specification_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(product_id): Path<uuid::Uuid>,
    Json(payload): Json<CreateSpecificationRequest>,
) -> ApiResult<(StatusCode, Json<SpecificationResponse>)> {
    let specification = state
        .catalog_service
        .create_specification(
            &user,
            CreateSpecificationInput {
                product_id: ProductId::from_uuid(product_id),
                name: payload.name,
                requirement: payload.requirement,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SpecificationResponse::from(specification)),
    ))
}

pub async fn delete_specification_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(specification_id): Path<uuid::Uuid>,
) -> ApiResult<StatusCode> {
    state
        .catalog_service
        .delete_specification(&user, SpecificationId::from_uuid(specification_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
