//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, JsonOrForm,
    errors::responses::{BadRequestValidationResponse, InternalServerErrorResponse, NotFoundResponse},
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::Operation;
use crate::models::{
    ListQuery, MessageResponse, Pagination, Product, ProductInput, ProductListResponse,
    ProductResponse,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            Product, ProductInput, Pagination,
            ProductResponse, ProductListResponse, MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

type SharedService<R> = State<Arc<ProductService<R>>>;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products))
        .route("/create", post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(shared_service)
}

/// List products with optional filters and pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListQuery),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ProductListResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): SharedService<R>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ProductListResponse>, AppError> {
    let query = pairs
        .map(|Query(pairs)| ListQuery::from_pairs(pairs))
        .unwrap_or_default();

    let page = service
        .list_products(query)
        .await
        .map_err(|e| e.into_app_error(Operation::List))?;

    Ok(Json(ProductListResponse {
        message: "Products retrieved successfully".to_string(),
        products: page.products,
        pagination: page.pagination,
    }))
}

/// Create a new product
///
/// A `data:image/...` value in `image` is uploaded and replaced by its hosted URL.
/// The body may be JSON or an urlencoded form.
#[utoipa::path(
    post,
    path = "/create",
    tag = "Products",
    request_body(
        content(
            (ProductInput = "application/json"),
            (ProductInput = "application/x-www-form-urlencoded")
        )
    ),
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): SharedService<R>,
    JsonOrForm(body): JsonOrForm,
) -> Result<impl IntoResponse, AppError> {
    let product = service
        .create_product(body)
        .await
        .map_err(|e| e.into_app_error(Operation::Create))?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): SharedService<R>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = service
        .get_product(&id)
        .await
        .map_err(|e| e.into_app_error(Operation::Get))?;

    Ok(Json(ProductResponse {
        message: "Product retrieved successfully".to_string(),
        product,
    }))
}

/// Replace every field of a product
///
/// Omitting `image` keeps the stored one; `null` or `""` removes it.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body(
        content(
            (ProductInput = "application/json"),
            (ProductInput = "application/x-www-form-urlencoded")
        )
    ),
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): SharedService<R>,
    Path(id): Path<String>,
    JsonOrForm(body): JsonOrForm,
) -> Result<Json<ProductResponse>, AppError> {
    let product = service
        .update_product(&id, body)
        .await
        .map_err(|e| e.into_app_error(Operation::Update))?;

    Ok(Json(ProductResponse {
        message: "Product updated successfully".to_string(),
        product,
    }))
}

/// Delete a product and its hosted image
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = MessageResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): SharedService<R>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    service
        .delete_product(&id)
        .await
        .map_err(|e| e.into_app_error(Operation::Delete))?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}
